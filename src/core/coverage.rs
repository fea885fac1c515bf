//! Pre-run read-depth estimation per folder.

use flate2::read::GzDecoder;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::consts::*;
use crate::error::Error;

/// Read depth of one folder against the expected genome size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageEstimate {
    pub reads: u64,
    pub bases: u64,
    pub depth: f64,
}

/// Estimate read depth from the folder's fastq files.
///
/// Sums sequence-line lengths across every `.fastq`/`.fastq.gz` directly in
/// the folder and divides by the expected genome size in megabases. Fed to
/// the run loop as a pre-run advisory only; it never gates execution.
pub fn estimate(folder: &Path, genome_size_mb: f64) -> Result<CoverageEstimate, Error> {
    let mut reads = 0u64;
    let mut bases = 0u64;

    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let file = File::open(entry.path())?;

        let (file_reads, file_bases) = if name.ends_with(FASTQ_GZ) {
            count_reads(BufReader::new(GzDecoder::new(file)))?
        } else if name.ends_with(FASTQ) {
            count_reads(BufReader::new(file))?
        } else {
            continue;
        };

        reads += file_reads;
        bases += file_bases;
    }

    Ok(CoverageEstimate {
        reads,
        bases,
        depth: bases as f64 / (genome_size_mb * 1_000_000.0),
    })
}

/// Count records and sequence bases in a fastq stream; the sequence is the
/// second line of every four-line record.
fn count_reads<R: BufRead>(reader: R) -> Result<(u64, u64), Error> {
    let mut reads = 0u64;
    let mut bases = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        if idx % 4 == 1 {
            reads += 1;
            bases += line?.trim_end().len() as u64;
        }
    }

    Ok((reads, bases))
}
