use std::io;
use std::path::Path;

/// Filesystem operations used for deployment data directories
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}
