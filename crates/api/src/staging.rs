//! Local staging of uploaded archives
//!
//! A submission is written to `UPLOAD_DIR` before relaying. `StagedFile` owns that
//! path and removes it when dropped, so every exit from the upload handler
//! (error, cancellation, panic) leaves the directory clean.

use chrono::{DateTime, SecondsFormat, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};

/// How many adjacent timestamps we try before giving up on a unique name
const MAX_NAME_ATTEMPTS: i64 = 64;

#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    original_name: String,
    size: u64,
    removed: bool,
}

impl StagedFile {
    /// Create an empty staging file named `{millis}_{sanitized}` inside `dir`.
    ///
    /// Opened with create-new so concurrent submissions of the same name never share
    /// a path; on collision the timestamp is bumped by one millisecond.
    pub async fn create(dir: &Path, original_name: &str) -> io::Result<(Self, File)> {
        let mut millis = Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(staging_file_name(millis, original_name));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    tracing::debug!("Staging upload at {:?}", path);
                    let staged = StagedFile {
                        path,
                        original_name: original_name.to_string(),
                        size: 0,
                        removed: false,
                    };
                    return Ok((staged, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "no free staging file name",
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Remove the staged file now. Failures are logged, never surfaced.
    pub async fn cleanup(mut self) {
        self.removed = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::info!("Temp file cleaned up: {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temp file {:?}: {}", self.path, e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Temp file cleaned up: {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temp file {:?}: {}", self.path, e),
        }
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn staging_file_name(millis: i64, original_name: &str) -> String {
    format!("{}_{}", millis, sanitize_file_name(original_name))
}

/// Last path component of a client-supplied file name.
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Destination name: `{team}_{ISO-8601 with ':' and '.' replaced by '-'}_{original}`.
pub fn remote_file_name(team_name: &str, at: DateTime<Utc>, original_name: &str) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}_{}_{}", team_name, timestamp, base_name(original_name))
}

/// Server-side archive check: ZIP media type or a `.zip` extension.
pub fn is_zip_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let zip_type = matches!(
        content_type.map(|t| t.trim().to_ascii_lowercase()).as_deref(),
        Some("application/zip") | Some("application/x-zip-compressed")
    );
    zip_type || file_name.to_ascii_lowercase().ends_with(".zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("my project (v2).zip"), "my_project__v2_.zip");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("team-a_final.zip"), "team-a_final.zip");
    }

    #[test]
    fn test_remote_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::milliseconds(42);
        assert_eq!(
            remote_file_name("Nullbytes", at, "proj.zip"),
            "Nullbytes_2024-03-09T14-05-07-042Z_proj.zip"
        );
        assert_eq!(
            remote_file_name("Nullbytes", at, "C:\\Users\\me\\proj.zip"),
            "Nullbytes_2024-03-09T14-05-07-042Z_proj.zip"
        );
    }

    #[test]
    fn test_is_zip_upload() {
        assert!(is_zip_upload("proj.zip", None));
        assert!(is_zip_upload("PROJ.ZIP", Some("application/octet-stream")));
        assert!(is_zip_upload("archive", Some("application/x-zip-compressed")));
        assert!(!is_zip_upload("proj.tar.gz", Some("application/gzip")));
        assert!(!is_zip_upload("notes.txt", None));
    }

    #[tokio::test]
    async fn test_drop_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let (staged, mut file) = StagedFile::create(dir.path(), "proj.zip").await.unwrap();
        file.write_all(b"PK").await.unwrap();
        drop(file);

        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _f1) = StagedFile::create(dir.path(), "proj.zip").await.unwrap();
        let (second, _f2) = StagedFile::create(dir.path(), "proj.zip").await.unwrap();

        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);

        first.cleanup().await;
        second.cleanup().await;
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
