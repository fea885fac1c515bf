use serde::Deserialize;

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use crate::error::Error;

/// A struct representing a run configuration file.
///
/// Captured once per run invocation and never mutated afterwards; the
/// pipeline assembler owns it for the duration of step-list construction.
///
/// # Example
///
/// ``` toml
/// [run]
/// reads_dir = "/data/run42"
/// threads = 8
/// keep_intermediate = false
/// genome_size = 5.2
/// coverage = 60.0
/// min_read_length = 1000
/// skip_unclassified = true
///
/// [assemblers]
/// flye = true
/// raven = false
/// miniasm = false
///
/// [polishing]
/// racon_skip = false
/// medaka_model = "r941_min_sup_g507"
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub run: RunConfig,
    #[serde(default)]
    pub assemblers: AssemblerConfig,
    #[serde(default)]
    pub polishing: PolishConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Root folder holding the basecalled read folders.
    pub reads_dir: PathBuf,
    /// Expected genome size in megabases.
    pub genome_size: f64,
    /// Target read coverage fed to read filtering.
    pub coverage: f64,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub keep_intermediate: bool,
    #[serde(default = "default_min_read_length")]
    pub min_read_length: u64,
    #[serde(default)]
    pub skip_unclassified: bool,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssemblerConfig {
    pub flye: bool,
    pub raven: bool,
    pub miniasm: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self { flye: true, raven: false, miniasm: false }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PolishConfig {
    pub racon_skip: bool,
    /// Manually chosen medaka model; empty or `--` means automatic.
    pub medaka_model: Option<String>,
}

fn default_threads() -> usize {
    4
}

fn default_min_read_length() -> u64 {
    1000
}

impl Config {
    /// Read a configuration file and return a Config struct.
    ///
    /// # Arguments
    ///
    /// * `config` - A PathBuf containing the path to the configuration file.
    ///
    /// # Example
    ///
    /// ``` rust, no_run
    /// use nanoamp::config::Config;
    ///
    /// let config = Config::read("config.toml".into()).unwrap();
    /// ```
    pub fn read(config: PathBuf) -> Result<Self, Error> {
        let mut file = File::open(config)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Entry-point preflight validation.
    ///
    /// The pipeline assembler itself is purely mechanical; invalid run
    /// parameters must be rejected here before any step list is built.
    pub fn preflight(&self) -> Result<(), Error> {
        if !self.run.reads_dir.is_dir() {
            return Err(Error::InvalidReadsDir(self.run.reads_dir.clone()));
        }
        if self.run.threads == 0 {
            return Err(Error::InvalidParam("run.threads"));
        }
        if self.run.genome_size <= 0.0 {
            return Err(Error::InvalidParam("run.genome_size"));
        }
        if self.run.coverage <= 0.0 {
            return Err(Error::InvalidParam("run.coverage"));
        }

        Ok(())
    }

    /// Filtering budget: genome size (Mb) times target coverage, rounded
    /// down to whole bases.
    pub fn max_bases(&self) -> u64 {
        (self.run.genome_size * 1_000_000.0 * self.run.coverage) as u64
    }

    /// Selected assemblers in the fixed enumeration order; this order is
    /// the tie-break for multi-assembler runs and must not change.
    pub fn selected_assemblers(&self) -> Vec<Assembler> {
        Assembler::ALL
            .iter()
            .copied()
            .filter(|assembler| match assembler {
                Assembler::Flye => self.assemblers.flye,
                Assembler::Raven => self.assemblers.raven,
                Assembler::Miniasm => self.assemblers.miniasm,
            })
            .collect()
    }

    /// Manually selected medaka model, with the selector sentinel and empty
    /// strings normalized to automatic choice.
    pub fn medaka_model(&self) -> Option<String> {
        self.polishing
            .medaka_model
            .as_deref()
            .filter(|model| !model.is_empty() && *model != crate::consts::NO_SELECTION)
            .map(str::to_string)
    }
}

/// An enum representing the supported assemblers.
///
/// # Example
///
/// ``` rust
/// use nanoamp::config::Assembler;
///
/// let assembler = Assembler::Flye;
/// assert_eq!(assembler.to_str(), "flye");
/// ```
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assembler {
    Flye,
    Raven,
    Miniasm,
}

impl Assembler {
    /// Fixed enumeration order for the assembler loop.
    pub const ALL: [Assembler; 3] = [Assembler::Flye, Assembler::Raven, Assembler::Miniasm];

    /// Create an Assembler enum from a string.
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "flye" => Ok(Self::Flye),
            "raven" => Ok(Self::Raven),
            "miniasm" => Ok(Self::Miniasm),
            _ => Err(format!("ERROR: Invalid assembler: {}", s)),
        }
    }

    /// Convert an Assembler enum to a string.
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Flye => "flye",
            Self::Raven => "raven",
            Self::Miniasm => "miniasm",
        }
    }

    /// Whether this assembler produces an assembly graph that racon can
    /// polish; only Flye qualifies.
    pub fn is_graph_based(&self) -> bool {
        matches!(self, Self::Flye)
    }
}

impl std::fmt::Display for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}
