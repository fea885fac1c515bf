//! Discovery of the read folders a pipeline run fans out over.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

use crate::consts::*;
use crate::error::Error;

/// Lazy, finite producer of qualifying read folders under a root.
///
/// Qualifying immediate subdirectories come first in directory-scan order
/// (not sorted), then the root itself iff it directly contains read files.
/// Each construction rescans the directory; nothing is cached across calls.
pub struct Folders {
    root: PathBuf,
    entries: ReadDir,
    skip_unclassified: bool,
    root_pending: bool,
}

/// Open a restartable folder scan over `root`.
///
/// # Arguments
///
/// * `root` - The basecalled-reads root directory.
/// * `skip_unclassified` - Exclude children named after unclassified reads.
pub fn folders(root: &Path, skip_unclassified: bool) -> Result<Folders, Error> {
    Ok(Folders {
        root: root.to_path_buf(),
        entries: fs::read_dir(root)?,
        skip_unclassified,
        root_pending: true,
    })
}

impl Iterator for Folders {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(entry) = self.entries.next() {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(_) => continue,
            };
            if self.use_folder(&path) {
                return Some(path);
            }
        }

        // the root itself qualifies by suffix check only; the prefix rules
        // exist to stop recursion into already-processed children
        if self.root_pending {
            self.root_pending = false;
            if has_read_files(&self.root) {
                return Some(self.root.clone());
            }
        }

        None
    }
}

impl Folders {
    fn use_folder(&self, path: &Path) -> bool {
        if !path.is_dir() || !has_read_files(path) {
            return false;
        }

        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return false,
        };

        // safeguard against rerunning from an unclean folder: never descend
        // into backups of prior runs or into assembly output
        if name.starts_with(ORIGINAL_PREFIX) || name.starts_with(ASSEMBLIES_PREFIX) {
            return false;
        }
        if self.skip_unclassified && name.starts_with(UNCLASSIFIED_PREFIX) {
            return false;
        }

        true
    }
}

/// Whether a directory directly contains at least one sequence-read file.
pub fn has_read_files(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(entries) => entries.flatten().any(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                && (name.ends_with(FASTQ) || name.ends_with(FASTQ_GZ))
        }),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;

    fn mkchild(root: &Path, name: &str, files: &[&str]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            File::create(dir.join(file)).unwrap();
        }
    }

    fn scan(root: &Path, skip_unclassified: bool) -> HashSet<PathBuf> {
        folders(root, skip_unclassified).unwrap().collect()
    }

    #[test]
    fn yields_children_with_read_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);
        mkchild(tmp.path(), "barcode02", &["reads.fastq.gz"]);
        mkchild(tmp.path(), "barcode03", &["notes.txt"]);
        mkchild(tmp.path(), "empty", &[]);
        File::create(tmp.path().join("loose.fasta")).unwrap();

        let found = scan(tmp.path(), false);
        assert_eq!(
            found,
            HashSet::from([tmp.path().join("barcode01"), tmp.path().join("barcode02")])
        );
    }

    #[test]
    fn never_yields_original_backup_or_assemblies() {
        let tmp = tempfile::tempdir().unwrap();
        mkchild(tmp.path(), "original_backup", &["reads.fastq"]);
        mkchild(tmp.path(), "original", &["reads.fastq"]);
        mkchild(tmp.path(), "assemblies", &["reads.fastq"]);
        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);

        let found = scan(tmp.path(), false);
        assert_eq!(found, HashSet::from([tmp.path().join("barcode01")]));
    }

    #[test]
    fn skip_unclassified_is_opt_in() {
        let tmp = tempfile::tempdir().unwrap();
        mkchild(tmp.path(), "unclassified", &["reads.fastq"]);
        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);

        let relaxed = scan(tmp.path(), false);
        assert!(relaxed.contains(&tmp.path().join("unclassified")));

        let strict = scan(tmp.path(), true);
        assert_eq!(strict, HashSet::from([tmp.path().join("barcode01")]));
    }

    #[test]
    fn root_is_yielded_last_iff_it_has_read_files() {
        let tmp = tempfile::tempdir().unwrap();
        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);

        let found: Vec<PathBuf> = folders(tmp.path(), false).unwrap().collect();
        assert_eq!(found, vec![tmp.path().join("barcode01")]);

        File::create(tmp.path().join("direct.fastq")).unwrap();
        let found: Vec<PathBuf> = folders(tmp.path(), false).unwrap().collect();
        assert_eq!(found.last().unwrap(), tmp.path());
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn root_suffix_check_ignores_prefix_rules() {
        // a root that itself starts with an excluded prefix still qualifies
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("unclassified_run");
        fs::create_dir(&root).unwrap();
        File::create(root.join("reads.fastq")).unwrap();

        let found: Vec<PathBuf> = folders(&root, true).unwrap().collect();
        assert_eq!(found, vec![root]);
    }

    #[test]
    fn stepwise_iteration_filters_while_scanning() {
        // exclusion rules apply mid-scan, one next() call at a time
        let tmp = tempfile::tempdir().unwrap();
        mkchild(tmp.path(), "original_backup", &["reads.fastq"]);
        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);
        mkchild(tmp.path(), "notes", &["summary.txt"]);
        mkchild(tmp.path(), "unclassified", &["reads.fastq"]);
        mkchild(tmp.path(), "barcode02", &["reads.fastq.gz"]);

        let mut iter = folders(tmp.path(), true).unwrap();
        let mut seen = HashSet::new();
        while let Some(folder) = iter.next() {
            seen.insert(folder);
        }

        assert_eq!(
            seen,
            HashSet::from([tmp.path().join("barcode01"), tmp.path().join("barcode02")])
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn empty_source_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(tmp.path(), false).is_empty());
    }

    #[test]
    fn rescans_on_each_call() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(scan(tmp.path(), false).is_empty());

        mkchild(tmp.path(), "barcode01", &["reads.fastq"]);
        assert_eq!(scan(tmp.path(), false).len(), 1);
    }
}
