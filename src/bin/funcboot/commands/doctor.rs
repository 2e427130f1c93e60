//! `funcboot doctor` command

use anyhow::Result;

use crate::cli::DoctorArgs;
use crate::GlobalOptions;
use funcboot::ops::{doctor, format_report};
use funcboot::util::{GlobalContext, SystemRunner};

pub fn execute(args: DoctorArgs, opts: &GlobalOptions) -> Result<()> {
    let ctx = match args.path {
        Some(path) => GlobalContext::with_cwd(path)?,
        None => GlobalContext::new()?,
    };

    let report = doctor(ctx.cwd(), &SystemRunner)?;

    if opts.shell.is_json() {
        opts.shell.json_event(&serde_json::to_value(&report)?);
    } else {
        print!("{}", format_report(&report, opts.verbose));
    }

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
