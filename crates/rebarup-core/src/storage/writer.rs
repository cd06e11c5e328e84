//! Staged file next to the install target, renamed into place once complete.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Mode for installed artifacts: owner rwx, group/other rx.
#[cfg(unix)]
pub const EXECUTABLE_MODE: u32 = 0o755;

/// A `.part` file being filled. Dropping it without `finalize` removes it.
pub struct StagedFile {
    file: Option<File>,
    temp_path: PathBuf,
}

impl StagedFile {
    /// Create (or truncate) the temp file at `temp_path`.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(Self {
            file: Some(file),
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Write all of `data`, flush it to disk and mark the file executable.
    pub fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::other("staged file already closed"))?;
        file.write_all(data)?;
        file.sync_all()?;
        set_executable(file)?;
        Ok(())
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file onto `final_path`, replacing whatever is there.
    /// Both paths must be on the same filesystem.
    pub fn finalize(mut self, final_path: &Path) -> io::Result<()> {
        drop(self.file.take());
        std::fs::rename(&self.temp_path, final_path)?;
        // Renamed away; nothing left for Drop to clean.
        self.temp_path = PathBuf::new();
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        drop(self.file.take());
        if !self.temp_path.as_os_str().is_empty() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.temp_path.display(), "failed to remove temp file: {}", e);
                }
            }
        }
    }
}

#[cfg(unix)]
fn set_executable(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(EXECUTABLE_MODE))
}

#[cfg(not(unix))]
fn set_executable(_file: &File) -> io::Result<()> {
    Ok(())
}
