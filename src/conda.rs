//! Conda environment discovery and tool resolution.
//!
//! Several environments may each carry a different, possibly stale, install
//! of the same required tool. Resolution folds every environment's package
//! listing into a single authoritative (prefix, version) pick per tool,
//! preferring the newest version unless a privileged `nanoamp_` environment
//! claims the tool, in which case it wins unconditionally.

use log::warn;
use semver::Version;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::consts::*;
use crate::error::Error;

/// Read access to the external environment manager.
///
/// Both operations are opaque blocking calls; a non-zero exit from the
/// underlying manager must surface as `Error::EnvManager` with the raw
/// stderr attached.
pub trait EnvironmentManager {
    /// List installed environments as (name, prefix) pairs. Anonymous
    /// environments are reported with an empty name.
    fn list_envs(&self) -> Result<Vec<(String, PathBuf)>, Error>;

    /// List (package, version) pairs installed in one environment.
    fn list_packages(&self, env: &str) -> Result<Vec<(String, String)>, Error>;
}

/// Production manager backed by the `conda` CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct CondaCli;

impl CondaCli {
    fn run(&self, args: &[&str]) -> Result<String, Error> {
        let output = Command::new("conda").args(args).output()?;

        if !output.status.success() {
            return Err(Error::EnvManager {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl EnvironmentManager for CondaCli {
    /// Parse `conda env list`: two header lines, a trailing blank line,
    /// then one env per line. Rows with a single column are anonymous
    /// prefixes without a name.
    fn list_envs(&self) -> Result<Vec<(String, PathBuf)>, Error> {
        let stdout = self.run(&["env", "list"])?;
        let lines: Vec<&str> = stdout.lines().collect();
        let body = if lines.len() > 3 { &lines[2..lines.len() - 1] } else { &[] };

        Ok(body
            .iter()
            .filter_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                let prefix = PathBuf::from(*fields.last()?);
                let name = if fields.len() > 1 { fields[0].to_string() } else { String::new() };
                Some((name, prefix))
            })
            .collect())
    }

    /// Parse `conda list -n <env>`: three header lines, then
    /// `name version build channel` rows.
    fn list_packages(&self, env: &str) -> Result<Vec<(String, String)>, Error> {
        let stdout = self.run(&["list", "-n", env])?;

        Ok(stdout
            .lines()
            .skip(3)
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                Some((fields.next()?.to_string(), fields.next()?.to_string()))
            })
            .collect())
    }
}

/// One authoritative tool install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInstall {
    pub prefix: PathBuf,
    pub version: String,
}

/// Result of folding all environments through the resolution rule.
///
/// # Fields
///
/// * `envs` - Per-environment report: each environment contributing at
///   least one required tool, with the tools it carries, in enumeration order.
/// * `tools` - Resolved tool table, at most one entry per required tool.
#[derive(Debug, Clone, Default)]
pub struct CondaSetup {
    pub envs: Vec<(String, Vec<String>)>,
    pub tools: HashMap<String, ToolInstall>,
}

impl CondaSetup {
    /// Required tools with no resolved install; non-empty means the
    /// preflight check must fail.
    pub fn missing_tools(&self) -> Vec<String> {
        REQUIRED_TOOLS
            .iter()
            .filter(|tool| !self.tools.contains_key(**tool))
            .map(|tool| tool.to_string())
            .collect()
    }
}

/// Resolve one authoritative (prefix, version) pick per required tool.
///
/// The pick for a tool is overwritten when there is no pick yet, when the
/// candidate version is strictly newer (semantic-version order, equal
/// versions keep the first environment encountered), or unconditionally
/// when the environment name carries the privileged `nanoamp_` prefix.
///
/// # Arguments
///
/// * `manager` - The environment manager to query.
///
/// # Returns
///
/// A Result containing the per-environment report and resolved tool table,
/// or the manager's failure.
pub fn resolve(manager: &impl EnvironmentManager) -> Result<CondaSetup, Error> {
    let mut setup = CondaSetup::default();

    for (env_name, prefix) in manager.list_envs()? {
        if env_name.is_empty() {
            continue;
        }

        let privileged = env_name.starts_with(PRIVILEGED_ENV_PREFIX);
        let mut contributed = Vec::new();

        for (package, version) in manager.list_packages(&env_name)? {
            if !REQUIRED_TOOLS.contains(&package.as_str()) {
                continue;
            }
            contributed.push(package.clone());

            let overwrite = match setup.tools.get(&package) {
                None => true,
                Some(current) => {
                    privileged || parse_version(&version) > parse_version(&current.version)
                }
            };

            if overwrite {
                setup.tools.insert(
                    package,
                    ToolInstall { prefix: prefix.clone(), version },
                );
            }
        }

        if !contributed.is_empty() {
            setup.envs.push((env_name, contributed));
        }
    }

    Ok(setup)
}

/// Parse a conda version string leniently into a semver Version.
///
/// Conda packages are not strict semver (`2.24`, `1.6.1rc1`); missing
/// components are padded with zeros and trailing non-numeric text is cut
/// at the first offending character. Unparseable strings sort lowest.
fn parse_version(version: &str) -> Version {
    if let Ok(parsed) = Version::parse(version) {
        return parsed;
    }

    let numeric: String = version
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut parts = numeric
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0));

    Version::new(
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

/// Immutable snapshot of resolved tool bin directories, threaded through
/// the run loop into step execution.
#[derive(Debug, Clone, Default)]
pub struct ToolSet {
    bins: HashMap<String, PathBuf>,
}

impl ToolSet {
    /// Build the snapshot from a resolved setup; each tool maps to the
    /// `bin` directory under its environment prefix.
    pub fn from_setup(setup: &CondaSetup) -> Self {
        Self {
            bins: setup
                .tools
                .iter()
                .map(|(tool, install)| (tool.clone(), install.prefix.join("bin")))
                .collect(),
        }
    }

    pub fn bin_dir(&self, tool: &str) -> Option<&Path> {
        self.bins.get(tool).map(PathBuf::as_path)
    }

    /// Build a Command for `binary` with `tool`'s resolved bin directory
    /// prepended to PATH.
    pub fn command(&self, tool: &str, binary: &str) -> Result<Command, Error> {
        let bin = self
            .bin_dir(tool)
            .ok_or_else(|| Error::MissingTools(vec![tool.to_string()]))?;

        let path = std::env::var("PATH").unwrap_or_default();
        if path.is_empty() {
            warn!("WARN: PATH is empty, relying on resolved prefixes only");
        }

        let mut cmd = Command::new(binary);
        cmd.env("PATH", format!("{}:{}", bin.display(), path));

        Ok(cmd)
    }
}
