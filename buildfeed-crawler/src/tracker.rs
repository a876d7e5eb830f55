//! Tracker store
//!
//! Records which builds of a job have already been forwarded. The file
//! backend keeps one append-only text file per job with one build ID per
//! line, so a crash mid-run loses at most the record being written. Each
//! job's file is parsed once per store; later appends check the in-memory
//! set and only look at the last byte of the file.

use buildfeed_core::domain::job::{BuildId, JobName};
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::TrackerError;

/// Durable set of forwarded builds per job
pub trait TrackerStore: Send + Sync {
    /// Returns the builds recorded for a job
    ///
    /// A job without any record yet has an empty set.
    fn load(&self, job_name: &JobName) -> Result<BTreeSet<BuildId>, TrackerError>;

    /// Durably records a forwarded build
    ///
    /// Appending a build that is already recorded is a no-op.
    fn append(&self, job_name: &JobName, build_id: BuildId) -> Result<(), TrackerError>;
}

/// Tracker files under a directory, `<dir>/<job>.txt`
///
/// The store assumes it is the only writer of its files while it is alive.
#[derive(Debug)]
pub struct FileTrackerStore {
    dir: PathBuf,
    known: Mutex<HashMap<JobName, BTreeSet<BuildId>>>,
}

impl FileTrackerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            known: Mutex::new(HashMap::new()),
        }
    }

    /// Path of a job's tracker file
    pub fn path(&self, job_name: &JobName) -> PathBuf {
        self.dir.join(format!("{}.txt", job_name))
    }

    fn read_ids(&self, path: &Path) -> Result<BTreeSet<BuildId>, TrackerError> {
        match fs::read_to_string(path) {
            Ok(content) => parse(path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No tracker file at {}, starting empty", path.display());
                Ok(BTreeSet::new())
            }
            Err(e) => Err(io_error(path, e)),
        }
    }
}

impl TrackerStore for FileTrackerStore {
    fn load(&self, job_name: &JobName) -> Result<BTreeSet<BuildId>, TrackerError> {
        let ids = self.read_ids(&self.path(job_name))?;

        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        known.insert(job_name.clone(), ids.clone());
        Ok(ids)
    }

    fn append(&self, job_name: &JobName, build_id: BuildId) -> Result<(), TrackerError> {
        let path = self.path(job_name);
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);

        let ids = match known.entry(job_name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(self.read_ids(&path)?),
        };
        if ids.contains(&build_id) {
            debug!("Build {} already tracked for {}", build_id, job_name);
            return Ok(());
        }

        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))?;

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        // A torn last line must not merge with the new record
        let line = if ends_with_newline(&mut file).map_err(|e| io_error(&path, e))? {
            format!("{}\n", build_id)
        } else {
            format!("\n{}\n", build_id)
        };

        file.write_all(line.as_bytes()).map_err(|e| io_error(&path, e))?;
        file.sync_data().map_err(|e| io_error(&path, e))?;
        ids.insert(build_id);

        debug!("Tracked build {} in {}", build_id, path.display());
        Ok(())
    }
}

fn parse(path: &Path, content: &str) -> Result<BTreeSet<BuildId>, TrackerError> {
    let mut lines: Vec<&str> = content.split('\n').collect();

    // Everything after the last newline is a record whose write never finished
    if let Some(fragment) = lines.pop().filter(|f| !f.trim().is_empty()) {
        warn!(
            "Ignoring unterminated last line {:?} in {}",
            fragment,
            path.display()
        );
    }

    let mut ids = BTreeSet::new();
    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let id = line.parse::<BuildId>().map_err(|_| TrackerError::Corrupt {
            path: path.to_path_buf(),
            line: index + 1,
            content: line.to_string(),
        })?;
        ids.insert(id);
    }

    Ok(ids)
}

/// True for an empty file or one whose last byte is a newline
fn ends_with_newline(file: &mut fs::File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn io_error(path: &Path, source: io::Error) -> TrackerError {
    TrackerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobName {
        "periodic-ci-e2e".parse().unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path().join("not-created-yet"));

        assert!(store.load(&job()).unwrap().is_empty());
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path().join("tracker"));

        store.append(&job(), BuildId::new(300000000000002)).unwrap();
        store.append(&job(), BuildId::new(300000000000001)).unwrap();

        let ids = store.load(&job()).unwrap();
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec![BuildId::new(300000000000001), BuildId::new(300000000000002)]
        );

        let content = fs::read_to_string(store.path(&job())).unwrap();
        assert_eq!(content, "300000000000002\n300000000000001\n");
    }

    #[test]
    fn test_append_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());

        store.append(&job(), BuildId::new(300000000000001)).unwrap();
        store.append(&job(), BuildId::new(300000000000001)).unwrap();

        let content = fs::read_to_string(store.path(&job())).unwrap();
        assert_eq!(content, "300000000000001\n");

        // A fresh store sees the record on disk
        let reopened = FileTrackerStore::new(dir.path());
        reopened.append(&job(), BuildId::new(300000000000001)).unwrap();
        let content = fs::read_to_string(store.path(&job())).unwrap();
        assert_eq!(content, "300000000000001\n");
    }

    #[test]
    fn test_append_after_load_does_not_reread_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        fs::write(store.path(&job()), "300000000000001\n").unwrap();
        assert_eq!(store.load(&job()).unwrap().len(), 1);

        // Written behind the store's back; only load would reject it
        let mut file = OpenOptions::new().append(true).open(store.path(&job())).unwrap();
        file.write_all(b"not-a-build\n").unwrap();

        store.append(&job(), BuildId::new(300000000000002)).unwrap();
        store.append(&job(), BuildId::new(300000000000001)).unwrap();

        let content = fs::read_to_string(store.path(&job())).unwrap();
        assert_eq!(content, "300000000000001\nnot-a-build\n300000000000002\n");
    }

    #[test]
    fn test_jobs_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        let other: JobName = "periodic-ci-lint".parse().unwrap();

        store.append(&job(), BuildId::new(300000000000001)).unwrap();

        assert!(store.load(&other).unwrap().is_empty());
        assert_eq!(store.load(&job()).unwrap().len(), 1);
    }

    #[test]
    fn test_torn_last_line_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        fs::write(store.path(&job()), "300000000000001\n3000000").unwrap();

        let ids = store.load(&job()).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![BuildId::new(300000000000001)]);
    }

    #[test]
    fn test_append_after_torn_write_starts_new_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        fs::write(store.path(&job()), "300000000000001\n3000000").unwrap();

        store.append(&job(), BuildId::new(300000000000002)).unwrap();

        let content = fs::read_to_string(store.path(&job())).unwrap();
        assert_eq!(content, "300000000000001\n3000000\n300000000000002\n");
        assert!(store.load(&job()).unwrap().contains(&BuildId::new(300000000000002)));
    }

    #[test]
    fn test_blank_lines_and_crlf_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        fs::write(store.path(&job()), "300000000000001\r\n\n  \n300000000000002\n").unwrap();

        assert_eq!(store.load(&job()).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_line_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTrackerStore::new(dir.path());
        fs::write(store.path(&job()), "300000000000001\nnot-a-build\n300000000000002\n").unwrap();

        match store.load(&job()) {
            Err(TrackerError::Corrupt { line, content, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "not-a-build");
            }
            other => panic!("expected corrupt tracker, got {:?}", other),
        }

        // Appending must not paper over the corruption either
        assert!(store.append(&job(), BuildId::new(300000000000003)).is_err());
    }
}
