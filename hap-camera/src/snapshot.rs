//! Still images served alongside the live stream.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use shared::error::Result;

/// Produces a still image for a requested size.
pub trait SnapshotProvider: Send {
    fn snapshot(&mut self, width: u16, height: u16) -> Result<Bytes>;
}

/// Serves the same image file for every request, whatever the size.
#[derive(Clone, Debug)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotProvider for FileSnapshot {
    fn snapshot(&mut self, width: u16, height: u16) -> Result<Bytes> {
        log::trace!("snapshot {}x{} from {}", width, height, self.path.display());
        Ok(Bytes::from(fs::read(&self.path)?))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shared::error::Error;
    use std::io;

    #[test]
    fn test_file_snapshot() {
        let path = std::env::temp_dir().join(format!("hap-camera-snapshot-{}.jpg", std::process::id()));
        fs::write(&path, [0xff, 0xd8, 0xff, 0xd9]).unwrap();

        let mut provider = FileSnapshot::new(&path);
        assert_eq!(&provider.snapshot(640, 480).unwrap()[..], &[0xff, 0xd8, 0xff, 0xd9]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let mut provider = FileSnapshot::new("/nonexistent/snapshot.jpg");
        let err = provider.snapshot(640, 480).unwrap_err();
        assert_eq!(err, Error::from(io::Error::from(io::ErrorKind::NotFound)));
    }
}
