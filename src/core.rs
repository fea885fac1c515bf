//! Run orchestration: preflight, resolution, and the folder loop.

pub mod coverage;
pub mod folders;
pub mod pipeline;
pub mod steps;

use log::{info, warn};

use crate::cli::ModelArgs;
use crate::conda::{resolve, EnvironmentManager, ToolSet};
use crate::config::Config;
use crate::consts::*;
use crate::error::Error;
use crate::models;

/// Execute the full pipeline for every qualifying read folder.
///
/// Builds the step list once, then runs it in order for one folder at a
/// time. Any step failure aborts the entire run: later cleanup steps assume
/// the earlier stages succeeded, so continuing with other folders after a
/// failure is not safe.
pub fn run(config: Config, manager: &impl EnvironmentManager) -> Result<(), Error> {
    info!(
        "INFO: run started at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    config.preflight()?;

    let setup = resolve(manager)?;
    let missing = setup.missing_tools();
    if !missing.is_empty() {
        return Err(Error::MissingTools(missing));
    }

    for (env, contributed) in &setup.envs {
        info!("INFO: environment '{}' provides {}", env, contributed.join(", "));
    }

    let tools = ToolSet::from_setup(&setup);
    let steps = pipeline::assemble(&config);
    info!("INFO: assembled pipeline with {} steps", steps.len());

    info!("INFO: working on files in {}", config.run.reads_dir.display());
    for folder in folders::folders(&config.run.reads_dir, config.run.skip_unclassified)? {
        info!("INFO: executing in {}", folder.display());

        match coverage::estimate(&folder, config.run.genome_size) {
            Ok(est) if est.depth < config.run.coverage => warn!(
                "WARN: estimated coverage {:.1}x ({} reads) is below the {:.1}x target",
                est.depth, est.reads, config.run.coverage
            ),
            Ok(est) => info!(
                "INFO: estimated coverage {:.1}x from {} reads",
                est.depth, est.reads
            ),
            Err(e) => warn!("WARN: could not estimate coverage: {}", e),
        }

        for step in &steps {
            step.run(&folder, &tools)?;
        }
    }

    Ok(())
}

/// Print the per-environment report and the resolved tool table.
pub fn show_envs(manager: &impl EnvironmentManager) -> Result<(), Error> {
    let setup = resolve(manager)?;

    println!("Environments contributing required tools:");
    for (env, contributed) in &setup.envs {
        println!("  {}: {}", env, contributed.join(", "));
    }

    println!("\nResolved tool table:");
    let mut tools: Vec<_> = setup.tools.iter().collect();
    tools.sort_by(|a, b| a.0.cmp(b.0));
    for (tool, install) in tools {
        println!("  {} {} ({})", tool, install.version, install.prefix.display());
    }

    for managed in MANAGED_ENVS {
        if !setup.envs.iter().any(|(env, _)| env == managed) {
            warn!("WARN: managed environment '{}' is not provisioned", managed);
        }
    }

    let missing = setup.missing_tools();
    if !missing.is_empty() {
        warn!("WARN: tools not installed in any environment: {}", missing.join(", "));
    }

    Ok(())
}

/// Print the installed medaka models matching the given criteria.
pub fn show_models(manager: &impl EnvironmentManager, args: &ModelArgs) -> Result<(), Error> {
    let setup = resolve(manager)?;
    let tools = ToolSet::from_setup(&setup);

    let all = models::list_models(&tools)?;
    for model in models::filter_models(&all, &args.to_filter()) {
        println!("{}", model);
    }

    Ok(())
}
