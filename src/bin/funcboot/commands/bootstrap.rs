//! `funcboot bootstrap` command

use anyhow::Result;

use crate::cli::BootstrapArgs;
use crate::GlobalOptions;
use funcboot::ops::{bootstrap, BootstrapConfig};
use funcboot::util::{GlobalContext, SystemRunner};

pub fn execute(args: BootstrapArgs, opts: &GlobalOptions) -> Result<()> {
    let ctx = match args.path {
        Some(ref path) => GlobalContext::with_cwd(path)?,
        None => GlobalContext::new()?,
    };

    let config = resolve_config(&args, &ctx);
    tracing::debug!("bootstrap config: {:?}", config);

    let report = bootstrap(&config, &SystemRunner, &opts.shell)?;

    if opts.shell.is_json() {
        let mut event = serde_json::to_value(&report)?;
        if let Some(map) = event.as_object_mut() {
            map.insert("reason".to_string(), "bootstrap".into());
        }
        opts.shell.json_event(&event);
    }

    Ok(())
}

/// Config files first, then flags and `FUNCBOOT_*` variables on top.
fn resolve_config(args: &BootstrapArgs, ctx: &GlobalContext) -> BootstrapConfig {
    let settings = ctx.load_config().bootstrap;
    let mut config = BootstrapConfig::new(ctx.cwd()).with_settings(&settings);

    if let Some(ref name) = args.project_name {
        config.project_name = Some(name.clone());
    }
    if let Some(ref module) = args.module_name {
        config.module_name = module.clone();
    }
    if let Some(ref app_dir) = args.app_dir {
        config.app_dir = app_dir.clone();
    }
    if let Some(ref function) = args.function_name {
        config.function_name = function.clone();
    }
    if let Some(ref version) = args.python_version {
        config.python_version = version.clone();
    }
    if let Some(link) = args.link {
        config.link = link;
    }
    if args.no_sync {
        config.sync = false;
    }

    config
}
