//! The step catalog: every unit of pipeline work over one read folder.
//!
//! Steps are stateless value objects built exclusively by the pipeline
//! assembler and consumed by the run loop. Tool-invoking steps assemble a
//! shell job and hand it to the executor; cleanup steps perform local
//! filesystem removals only.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::conda::ToolSet;
use crate::config::Assembler;
use crate::consts::*;
use crate::error::Error;
use crate::executor::{job::Job, run_job};

/// A single unit of pipeline work applied to one folder.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Split duplex read pairs into simplex reads under `split/`.
    SplitDuplex { threads: usize },
    /// Length/coverage filtering of the split reads into `filtered.fastq`.
    Filter { min_len: u64, max_bases: u64 },
    /// Draft assembly into `assemblies/<assembler>/`.
    Assembly { threads: usize, assembler: Assembler },
    /// Racon polish of the flye draft.
    RaconPolish { threads: usize },
    /// Medaka consensus polish of an assembler's draft.
    MedakaPolish {
        threads: usize,
        assembler: Assembler,
        model: Option<String>,
        racon: bool,
    },
    /// Remove the duplex-split working directory.
    CleanDuplex,
    /// Remove one assembler's working files, keeping its final draft.
    CleanAssembly { assembler: Assembler, racon: bool },
    /// Remove the filtered read file and concatenation scratch.
    CleanFilter,
    /// Move the raw read files into `original_backup/`.
    FinalClean,
}

impl Step {
    /// Short step name for logging and failure reports.
    pub fn name(&self) -> String {
        match self {
            Self::SplitDuplex { .. } => "split-duplex".into(),
            Self::Filter { .. } => "filter".into(),
            Self::Assembly { assembler, .. } => format!("assembly-{}", assembler),
            Self::RaconPolish { .. } => "racon-polish".into(),
            Self::MedakaPolish { assembler, .. } => format!("medaka-polish-{}", assembler),
            Self::CleanDuplex => "clean-duplex".into(),
            Self::CleanAssembly { assembler, .. } => format!("clean-assembly-{}", assembler),
            Self::CleanFilter => "clean-filter".into(),
            Self::FinalClean => "final-clean".into(),
        }
    }

    /// Execute this step in `folder` against the resolved tool snapshot.
    pub fn run(&self, folder: &Path, tools: &ToolSet) -> Result<(), Error> {
        match self {
            Self::CleanDuplex => clean_duplex(folder),
            Self::CleanAssembly { assembler, racon } => clean_assembly(folder, *assembler, *racon),
            Self::CleanFilter => clean_filter(folder),
            Self::FinalClean => final_clean(folder),
            _ => run_job(&self.job(), &self.name(), folder, tools, self.uses()),
        }
    }

    /// Tools whose resolved bin directories the step's job needs on PATH.
    fn uses(&self) -> &'static [&'static str] {
        match self {
            Self::SplitDuplex { .. } => &["duplex-tools"],
            Self::Filter { .. } => &["filtlong"],
            Self::Assembly { assembler, .. } => match assembler {
                Assembler::Flye => &["flye"],
                Assembler::Raven => &["raven-assembler"],
                Assembler::Miniasm => &["minimap2", "miniasm", "minipolish"],
            },
            Self::RaconPolish { .. } => &["minimap2", "racon"],
            Self::MedakaPolish { .. } => &["medaka"],
            _ => &[],
        }
    }

    /// Assemble the shell job for a tool-invoking step.
    pub fn job(&self) -> Job {
        match self {
            Self::SplitDuplex { threads } => Job::new()
                .task("duplex_tools")
                .args(["split_on_adapter", ".", SPLIT_DIR, "Native"])
                .arg("--threads")
                .arg(threads.to_string()),

            Self::Filter { min_len, max_bases } => Job::new()
                .task("cat")
                .arg(format!("{}/*{}", SPLIT_DIR, FASTQ_GZ))
                .stdout("reads.fastq.gz")
                .then(
                    Job::new()
                        .task("filtlong")
                        .arg("--min_length")
                        .arg(min_len.to_string())
                        .arg("--target_bases")
                        .arg(max_bases.to_string())
                        .arg("reads.fastq.gz")
                        .stdout(FILTERED_FASTQ),
                ),

            Self::Assembly { threads, assembler } => assembly_job(*threads, *assembler),

            Self::RaconPolish { threads } => {
                let dir = format!("{}/flye", ASSEMBLIES_DIR);
                Job::new()
                    .task("minimap2")
                    .args(["-x", "map-ont", "-t"])
                    .arg(threads.to_string())
                    .arg(format!("{}/assembly.fasta", dir))
                    .arg(FILTERED_FASTQ)
                    .stdout(&format!("{}/racon.paf", dir))
                    .then(
                        Job::new()
                            .task("racon")
                            .arg("-t")
                            .arg(threads.to_string())
                            .arg(FILTERED_FASTQ)
                            .arg(format!("{}/racon.paf", dir))
                            .arg(format!("{}/assembly.fasta", dir))
                            .stdout(&format!("{}/assembly{}.fasta", dir, RACON_SUFFIX)),
                    )
            }

            Self::MedakaPolish { threads, assembler, model, racon } => {
                let mut job = Job::new()
                    .task("medaka_consensus")
                    .arg("-i")
                    .arg(FILTERED_FASTQ)
                    .arg("-d")
                    .arg(draft_path(*assembler, *racon))
                    .arg("-o")
                    .arg(format!("{}/{}{}", ASSEMBLIES_DIR, assembler, MEDAKA_SUFFIX))
                    .arg("-t")
                    .arg(threads.to_string());

                if let Some(model) = model {
                    job = job.arg("-m").arg(model);
                }

                job
            }

            // cleanup steps never spawn a job
            _ => Job::new(),
        }
    }
}

/// The draft fasta that medaka polishes for a given assembler; for flye
/// this is the racon output when racon ran.
fn draft_path(assembler: Assembler, racon: bool) -> String {
    if assembler.is_graph_based() && racon {
        format!("{}/{}/assembly{}.fasta", ASSEMBLIES_DIR, assembler, RACON_SUFFIX)
    } else {
        format!("{}/{}/assembly.fasta", ASSEMBLIES_DIR, assembler)
    }
}

fn assembly_job(threads: usize, assembler: Assembler) -> Job {
    let dir = format!("{}/{}", ASSEMBLIES_DIR, assembler);

    match assembler {
        Assembler::Flye => Job::new()
            .task("flye")
            .arg("--nano-raw")
            .arg(FILTERED_FASTQ)
            .arg("--out-dir")
            .arg(&dir)
            .arg("--threads")
            .arg(threads.to_string()),

        Assembler::Raven => Job::new()
            .task("mkdir")
            .arg("-p")
            .arg(&dir)
            .then(
                Job::new()
                    .task("raven")
                    .arg("--threads")
                    .arg(threads.to_string())
                    .arg(FILTERED_FASTQ)
                    .stdout(&format!("{}/assembly.fasta", dir)),
            ),

        Assembler::Miniasm => Job::new()
            .task("mkdir")
            .arg("-p")
            .arg(&dir)
            .then(
                Job::new()
                    .task("minimap2")
                    .args(["-x", "ava-ont", "-t"])
                    .arg(threads.to_string())
                    .arg(FILTERED_FASTQ)
                    .arg(FILTERED_FASTQ)
                    .stdout(&format!("{}/overlaps.paf", dir)),
            )
            .then(
                Job::new()
                    .task("miniasm")
                    .arg("-f")
                    .arg(FILTERED_FASTQ)
                    .arg(format!("{}/overlaps.paf", dir))
                    .stdout(&format!("{}/raw.gfa", dir)),
            )
            .then(
                Job::new()
                    .task("minipolish")
                    .arg("-t")
                    .arg(threads.to_string())
                    .arg(FILTERED_FASTQ)
                    .arg(format!("{}/raw.gfa", dir))
                    .stdout(&format!("{}/assembly.gfa", dir)),
            )
            .then(
                Job::new()
                    .task("awk")
                    .arg("'/^S/ {print \">\"$2\"\\n\"$3}'")
                    .arg(format!("{}/assembly.gfa", dir))
                    .stdout(&format!("{}/assembly.fasta", dir)),
            ),
    }
}

fn clean_duplex(folder: &Path) -> Result<(), Error> {
    remove_dir_if_present(&folder.join(SPLIT_DIR))
}

fn clean_filter(folder: &Path) -> Result<(), Error> {
    remove_file_if_present(&folder.join(FILTERED_FASTQ))?;
    remove_file_if_present(&folder.join("reads.fastq.gz"))
}

/// Drop an assembler's working files, keeping the draft (and racon draft)
/// fasta next to the medaka output.
fn clean_assembly(folder: &Path, assembler: Assembler, racon: bool) -> Result<(), Error> {
    let dir = folder.join(ASSEMBLIES_DIR).join(assembler.to_str());

    let intermediates: &[&str] = match assembler {
        Assembler::Flye => &[
            "00-assembly",
            "10-consensus",
            "20-repeat",
            "30-contigger",
            "40-polishing",
            "params.json",
            "flye.log",
            "assembly_graph.gfa",
            "assembly_graph.gv",
            "assembly_info.txt",
        ],
        Assembler::Raven => &["raven.cereal"],
        Assembler::Miniasm => &["overlaps.paf", "raw.gfa", "assembly.gfa"],
    };

    for name in intermediates {
        let path = dir.join(name);
        if path.is_dir() {
            remove_dir_if_present(&path)?;
        } else {
            remove_file_if_present(&path)?;
        }
    }

    if assembler.is_graph_based() && racon {
        remove_file_if_present(&dir.join("racon.paf"))?;
    }

    Ok(())
}

/// Relocate the raw read files into `original_backup/`; the folder source
/// skips that name on a rerun, so backed-up reads are never re-processed.
fn final_clean(folder: &Path) -> Result<(), Error> {
    let backup = folder.join(ORIGINAL_BACKUP_DIR);
    fs::create_dir_all(&backup)?;

    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && (name.ends_with(FASTQ) || name.ends_with(FASTQ_GZ)) {
            fs::rename(entry.path(), backup.join(&name))?;
        }
    }

    Ok(())
}

fn remove_file_if_present(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

fn remove_dir_if_present(path: &Path) -> Result<(), Error> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn split_job_passes_threads() {
        let job = Step::SplitDuplex { threads: 8 }.job();
        assert_eq!(
            job.cmd(),
            "duplex_tools split_on_adapter . split Native --threads 8"
        );
    }

    #[test]
    fn filter_job_carries_thresholds() {
        let job = Step::Filter { min_len: 1000, max_bases: 312_000_000 }.job();
        assert!(job.cmd().contains("--min_length 1000"));
        assert!(job.cmd().contains("--target_bases 312000000"));
        assert!(job.cmd().ends_with("> filtered.fastq"));
    }

    #[test]
    fn medaka_draft_follows_racon_flag() {
        let polished = Step::MedakaPolish {
            threads: 4,
            assembler: Assembler::Flye,
            model: None,
            racon: true,
        };
        assert!(polished.job().cmd().contains("-d assemblies/flye/assembly_racon.fasta"));

        let unpolished = Step::MedakaPolish {
            threads: 4,
            assembler: Assembler::Flye,
            model: None,
            racon: false,
        };
        assert!(unpolished.job().cmd().contains("-d assemblies/flye/assembly.fasta"));

        // racon never applies to non-graph assemblers
        let raven = Step::MedakaPolish {
            threads: 4,
            assembler: Assembler::Raven,
            model: None,
            racon: true,
        };
        assert!(raven.job().cmd().contains("-d assemblies/raven/assembly.fasta"));
    }

    #[test]
    fn medaka_manual_model_is_forwarded() {
        let step = Step::MedakaPolish {
            threads: 4,
            assembler: Assembler::Flye,
            model: Some("r941_min_sup_g507".into()),
            racon: false,
        };
        assert!(step.job().cmd().ends_with("-m r941_min_sup_g507"));

        let automatic = Step::MedakaPolish {
            threads: 4,
            assembler: Assembler::Flye,
            model: None,
            racon: false,
        };
        assert!(!automatic.job().cmd().contains("-m "));
    }

    #[test]
    fn clean_steps_tolerate_missing_targets() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolSet::default();

        Step::CleanDuplex.run(dir.path(), &tools).unwrap();
        Step::CleanFilter.run(dir.path(), &tools).unwrap();
        Step::CleanAssembly { assembler: Assembler::Flye, racon: true }
            .run(dir.path(), &tools)
            .unwrap();
    }

    #[test]
    fn clean_assembly_keeps_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let flye = dir.path().join("assemblies/flye");
        fs::create_dir_all(flye.join("40-polishing")).unwrap();
        for name in ["assembly.fasta", "assembly_racon.fasta", "flye.log", "racon.paf"] {
            File::create(flye.join(name)).unwrap();
        }

        Step::CleanAssembly { assembler: Assembler::Flye, racon: true }
            .run(dir.path(), &ToolSet::default())
            .unwrap();

        assert!(flye.join("assembly.fasta").exists());
        assert!(flye.join("assembly_racon.fasta").exists());
        assert!(!flye.join("flye.log").exists());
        assert!(!flye.join("racon.paf").exists());
        assert!(!flye.join("40-polishing").exists());
    }

    #[test]
    fn final_clean_moves_reads_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("reads1.fastq")).unwrap();
        File::create(dir.path().join("reads2.fastq.gz")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        Step::FinalClean.run(dir.path(), &ToolSet::default()).unwrap();

        let backup = dir.path().join(ORIGINAL_BACKUP_DIR);
        assert!(backup.join("reads1.fastq").exists());
        assert!(backup.join("reads2.fastq.gz").exists());
        assert!(!dir.path().join("reads1.fastq").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
