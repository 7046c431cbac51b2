//! Log file placement and rotation.
//!
//! The subscriber itself is installed by the binary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const LOG_FILE_NAME: &str = "mdbkit.log";

/// Where the log goes when the config does not say.
///
/// Uses the platform state directory (`~/.local/state` on Linux), then the
/// local data directory, then the temp directory.
pub fn default_log_file_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("mdbkit")
        .join(LOG_FILE_NAME)
}

/// Create the directory that will hold `log_path`.
pub fn ensure_log_dir(log_path: &Path) -> io::Result<()> {
    match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Size-triggered rotation into numbered siblings (`mdbkit.log.1` newest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Rotate once the live file reaches this many bytes.
    pub max_size: u64,
    /// Numbered files kept; the one past this is removed.
    pub keep: u32,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            keep: 5,
        }
    }
}

impl RotationPolicy {
    /// Rotate `log_path` if it has grown to `max_size`. Returns whether a
    /// rotation happened.
    pub fn rotate(&self, log_path: &Path) -> io::Result<bool> {
        let size = match fs::metadata(log_path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if size < self.max_size || self.keep == 0 {
            return Ok(false);
        }

        // Walk from the oldest slot down so nothing is overwritten.
        for index in (1..=self.keep).rev() {
            let from = numbered(log_path, index);
            if !from.exists() {
                continue;
            }
            if index == self.keep {
                fs::remove_file(&from)?;
            } else {
                fs::rename(&from, numbered(log_path, index + 1))?;
            }
        }
        fs::rename(log_path, numbered(log_path, 1))?;
        Ok(true)
    }
}

fn numbered(base: &Path, index: u32) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{index}"));
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_is_a_log_file_under_mdbkit() {
        let path = default_log_file_path();
        assert!(path.ends_with(Path::new("mdbkit").join(LOG_FILE_NAME)), "{path:?}");
    }

    #[test]
    fn numbered_sibling() {
        let base = Path::new("/var/log/mdbkit.log");
        assert_eq!(numbered(base, 2), PathBuf::from("/var/log/mdbkit.log.2"));
    }

    #[test]
    fn missing_or_small_file_is_left_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        let policy = RotationPolicy::default();
        assert!(!policy.rotate(&log).unwrap());

        fs::write(&log, "short").unwrap();
        assert!(!policy.rotate(&log).unwrap());
        assert!(log.exists());
    }

    #[test]
    fn rotation_shifts_and_drops_oldest() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        fs::write(dir.path().join("mdbkit.log.1"), "old1").unwrap();
        fs::write(dir.path().join("mdbkit.log.2"), "old2").unwrap();
        fs::write(&log, "x".repeat(64)).unwrap();

        let policy = RotationPolicy {
            max_size: 32,
            keep: 2,
        };
        assert!(policy.rotate(&log).unwrap());

        assert!(!log.exists());
        let read = |n: u32| fs::read_to_string(dir.path().join(format!("mdbkit.log.{n}"))).unwrap();
        assert_eq!(read(1), "x".repeat(64));
        assert_eq!(read(2), "old1");
        assert!(!dir.path().join("mdbkit.log.3").exists());
    }

    #[test]
    fn zero_keep_never_rotates() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        fs::write(&log, "x".repeat(64)).unwrap();
        let policy = RotationPolicy {
            max_size: 1,
            keep: 0,
        };
        assert!(!policy.rotate(&log).unwrap());
        assert!(log.exists());
    }

    #[test]
    fn ensure_log_dir_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("a/b/mdbkit.log");
        ensure_log_dir(&log).unwrap();
        ensure_log_dir(&log).unwrap();
        assert!(dir.path().join("a/b").is_dir());
        ensure_log_dir(Path::new("bare.log")).unwrap();
    }
}
