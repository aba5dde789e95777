//! Timestamped document backups.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use docfill_core::Backup;
use tracing::debug;

/// Copies documents to `<stem>.<YYYYmmdd-HHMMSS>.bak.<ext>`.
///
/// Copies go next to the source unless a backup directory is configured.
/// The directory is created on demand. When two backups of the same file
/// land in the same second a `-N` counter is appended to the timestamp.
#[derive(Debug, Clone, Default)]
pub struct FileBackup {
    dir: Option<PathBuf>,
}

impl FileBackup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write copies into `dir` instead of next to the source.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

impl Backup for FileBackup {
    fn backup(&self, path: &Path) -> io::Result<PathBuf> {
        let mut source = File::open(path)?;

        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&dir)?;
        }

        let stem = path
            .file_stem()
            .map_or_else(|| "document".into(), |s| s.to_string_lossy());
        let extension = path
            .extension()
            .map_or_else(|| "docx".into(), |e| e.to_string_lossy());
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();

        for attempt in 0u32.. {
            let name = if attempt == 0 {
                format!("{stem}.{stamp}.bak.{extension}")
            } else {
                format!("{stem}.{stamp}-{attempt}.bak.{extension}")
            };
            let candidate = dir.join(name);

            // create_new keeps concurrent backups from claiming the same name
            let mut target = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };
            io::copy(&mut source, &mut target)?;
            target.sync_all()?;
            debug!(source = %path.display(), backup = %candidate.display(), "Created backup");
            return Ok(candidate);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free backup name",
        ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[test]
    fn test_backup_next_to_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("report.docx");
        std::fs::write(&source, b"original").unwrap();

        let backup = FileBackup::new().backup(&source).unwrap();

        assert_eq!(backup.parent(), Some(dir.path()));
        let name = file_name(&backup);
        assert!(name.starts_with("report."), "{name}");
        assert!(name.ends_with(".bak.docx"), "{name}");
        // report.YYYYmmdd-HHMMSS.bak.docx
        assert_eq!(name.len(), "report.".len() + 15 + ".bak.docx".len());
        assert_eq!(std::fs::read(&backup).unwrap(), b"original");
    }

    #[test]
    fn test_backup_dir_created() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("letter.docx");
        std::fs::write(&source, b"data").unwrap();
        let target_dir = dir.path().join("backups/nested");

        let backup = FileBackup::new()
            .with_dir(&target_dir)
            .backup(&source)
            .unwrap();

        assert_eq!(backup.parent(), Some(target_dir.as_path()));
        assert_eq!(std::fs::read(&backup).unwrap(), b"data");
    }

    #[test]
    fn test_repeated_backups_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("memo.docx");
        std::fs::write(&source, b"v1").unwrap();

        let backup = FileBackup::new();
        let first = backup.backup(&source).unwrap();
        let second = backup.backup(&source).unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert_eq!(std::fs::read(&second).unwrap(), b"v1");
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let error = FileBackup::new()
            .backup(&dir.path().join("absent.docx"))
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
