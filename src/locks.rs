use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

pub const LOCK_FILE: &str = ".showcase.lock";

#[derive(Debug)]
pub enum LockError {
    Busy { path: PathBuf, holder: Option<u32> },
    Io(std::io::Error),
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockError::Busy {
                path,
                holder: Some(pid),
            } => write!(f, "store is locked by pid {}: {}", pid, path.display()),
            LockError::Busy { path, holder: None } => {
                write!(f, "store is locked: {}", path.display())
            }
            LockError::Io(err) => write!(f, "lock I/O error: {}", err),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LockError::Busy { .. } => None,
            LockError::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for LockError {
    fn from(value: std::io::Error) -> Self {
        LockError::Io(value)
    }
}

/// Exclusive writer lock for a store root. The lock is a `create_new` file
/// holding the owner's pid; dropping the guard removes it.
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
    _file: File,
}

impl WriteLock {
    pub fn acquire(root: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = root.join(LOCK_FILE);
        let start = Instant::now();
        loop {
            match try_acquire(&path)? {
                Some(guard) => return Ok(guard),
                None if start.elapsed() >= timeout => {
                    return Err(LockError::Busy {
                        holder: read_holder(&path),
                        path,
                    });
                }
                None => thread::sleep(Duration::from_millis(10)),
            }
        }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn try_acquire(path: &Path) -> Result<Option<WriteLock>, LockError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            writeln!(file, "{}", std::process::id())?;
            Ok(Some(WriteLock {
                path: path.to_path_buf(),
                _file: file,
            }))
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(err) => Err(LockError::Io(err)),
    }
}

fn read_holder(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use uuid::Uuid;

    use super::{LockError, WriteLock, LOCK_FILE};

    fn unique_root() -> PathBuf {
        std::env::temp_dir().join(format!("showcase-lock-test-{}", Uuid::now_v7()))
    }

    #[test]
    fn lock_file_records_pid_and_is_removed_on_drop() {
        let root = unique_root();
        let guard = WriteLock::acquire(&root, Duration::from_millis(20))
            .expect("first lock should succeed");
        let contents =
            std::fs::read_to_string(root.join(LOCK_FILE)).expect("lock file should exist");
        assert_eq!(contents.trim(), std::process::id().to_string());
        drop(guard);
        assert!(!root.join(LOCK_FILE).exists());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn second_writer_times_out_with_holder() {
        let root = unique_root();
        let first = WriteLock::acquire(&root, Duration::from_millis(20))
            .expect("first lock should succeed");
        let err = WriteLock::acquire(&root, Duration::from_millis(20))
            .expect_err("lock should time out when already held");
        assert!(matches!(err, LockError::Busy { holder: Some(_), .. }));
        assert!(err.to_string().contains("store is locked by pid"));
        drop(first);
        WriteLock::acquire(&root, Duration::from_millis(20))
            .expect("lock should be free after drop");
        let _ = std::fs::remove_dir_all(root);
    }
}
