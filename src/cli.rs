use clap::{Parser, Subcommand};

use std::path::PathBuf;

use crate::consts::*;
use crate::models::ModelFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubArgs,
}

#[derive(Debug, Subcommand)]
pub enum SubArgs {
    /// Run the assembly pipeline over every qualifying read folder
    #[command(name = "run")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },
    /// Show discovered conda environments and the resolved tool table
    #[command(name = "envs")]
    Envs,
    /// List installed medaka models, optionally filtered by attribute
    #[command(name = "models")]
    Models {
        #[command(flatten)]
        args: ModelArgs,
    },
}

/// Run the pipeline from start to finish
///
/// # Example
///
/// ```bash,no_run
/// nanoamp run -c config.toml
/// ```
#[derive(Debug, Parser)]
pub struct RunArgs {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to the configuration file",
        value_name = "CONFIG",
        default_value = "config.toml"
    )]
    pub config: PathBuf,
}

/// Filter criteria for medaka model listing; unset flags are wildcards.
/// Both the compact tokens (`r941`, `min`, `g507`) and the human labels
/// (`R9.4.1`, `MinION`, `Guppy 5.0.7`) are accepted.
#[derive(Debug, Parser, Clone, Default)]
pub struct ModelArgs {
    #[arg(long = "pore", help = "Pore/flow-cell type", value_name = "PORE")]
    pub pore: Option<String>,

    #[arg(long = "device", help = "Device class", value_name = "DEVICE")]
    pub device: Option<String>,

    #[arg(long = "guppy", help = "Basecaller version", value_name = "GUPPY")]
    pub guppy: Option<String>,

    #[arg(long = "variant", help = "Training variant", value_name = "VARIANT")]
    pub variant: Option<String>,
}

impl ModelArgs {
    /// Convert CLI selections into decode-attribute criteria, mapping human
    /// labels to their compact tokens and treating the `--` sentinel as
    /// no selection.
    pub fn to_filter(&self) -> ModelFilter {
        ModelFilter {
            pore: normalize(&self.pore, PORE_LABELS),
            device: normalize(&self.device, DEVICE_LABELS),
            basecaller: normalize(&self.guppy, GUPPY_LABELS),
            variant: normalize(&self.variant, &[]),
        }
    }
}

fn normalize(value: &Option<String>, labels: &[(&str, &str)]) -> Option<String> {
    let value = value.as_deref()?;
    if value.is_empty() || value == NO_SELECTION {
        return None;
    }

    Some(
        labels
            .iter()
            .find(|(label, _)| *label == value)
            .map(|(_, token)| token.to_string())
            .unwrap_or_else(|| value.to_string()),
    )
}
