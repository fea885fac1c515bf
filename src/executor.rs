//! Sequential execution of step jobs inside a read folder.

pub mod job;

use std::path::Path;
use std::process::Command;

use crate::conda::ToolSet;
use crate::error::Error;
use crate::executor::job::Job;

/// Run a job through `sh -c` inside `folder`.
///
/// The resolved bin directory of every tool in `uses` is prepended to PATH
/// so the job picks up exactly the installs chosen by resolution. Steps run
/// strictly sequentially; a non-zero exit aborts with `Error::StepFailed`.
///
/// # Arguments
///
/// * `job` - The assembled command line.
/// * `step` - Step name, used for logging and failure reports.
/// * `folder` - Working directory for the job.
/// * `tools` - Resolved tool snapshot.
/// * `uses` - Tools whose bin directories the job needs on PATH.
pub fn run_job(
    job: &Job,
    step: &str,
    folder: &Path,
    tools: &ToolSet,
    uses: &[&str],
) -> Result<(), Error> {
    let mut dirs = Vec::with_capacity(uses.len());
    for tool in uses {
        let bin = tools
            .bin_dir(tool)
            .ok_or_else(|| Error::MissingTools(vec![tool.to_string()]))?;
        dirs.push(bin.display().to_string());
    }
    dirs.push(std::env::var("PATH").unwrap_or_default());

    log::info!("INFO [{}]: {}", step, job.cmd());

    let output = Command::new("sh")
        .arg("-c")
        .arg(job.cmd())
        .current_dir(folder)
        .env("PATH", dirs.join(":"))
        .output()?;

    if !output.status.success() {
        return Err(Error::StepFailed {
            step: step.to_string(),
            folder: folder.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(())
}
