//! `funcboot patch` command

use anyhow::Result;

use crate::cli::PatchCommand;
use crate::GlobalOptions;
use funcboot::core::{DependencyEntry, EditOutcome, ManifestEdit};
use funcboot::ops::patch_manifest;
use funcboot::util::shell::Status;

pub fn execute(cmd: PatchCommand, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;

    let (edit, manifest) = match cmd {
        PatchCommand::AddDependency { entry, target } => {
            let entry: DependencyEntry = entry.parse()?;
            (ManifestEdit::AddDependency(entry), target.manifest)
        }
        PatchCommand::AddMember { member, target } => {
            (ManifestEdit::WorkspaceMember(member), target.manifest)
        }
        PatchCommand::AddSource { package, target } => {
            (ManifestEdit::SourceBinding(package), target.manifest)
        }
    };

    let outcome = patch_manifest(&manifest, &edit)?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "patch",
            "manifest": manifest.display().to_string(),
            "edit": edit.to_string(),
            "applied": outcome == EditOutcome::Applied,
        }));
        return Ok(());
    }

    match outcome {
        EditOutcome::Applied => shell.status(
            Status::Added,
            format!("{} to {}", edit, manifest.display()),
        ),
        EditOutcome::AlreadyPresent => shell.status(
            Status::Skipped,
            format!("{} (already in {})", edit, manifest.display()),
        ),
    }

    Ok(())
}
