//! Installing artifact bytes into the tool home.
//!
//! Bytes go to `<target>.part` in the same directory, are fsynced and made
//! executable, then renamed over the target. A failed install leaves the
//! previous artifact (if any) untouched and no `.part` file behind.

mod writer;

pub use writer::StagedFile;
#[cfg(unix)]
pub use writer::EXECUTABLE_MODE;

use crate::error::InstallError;
use crate::tool::ToolIdentifier;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `rebar3` → `rebar3.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes artifacts under a fixed tool home.
#[derive(Debug, Clone)]
pub struct Installer {
    tool_home: PathBuf,
}

impl Installer {
    pub fn new(tool_home: impl Into<PathBuf>) -> Self {
        Self {
            tool_home: tool_home.into(),
        }
    }

    pub fn tool_home(&self) -> &Path {
        &self.tool_home
    }

    /// Where `tool` is (or would be) installed. Uses the canonical tool home
    /// once it exists, matching the path [`Installer::install`] returns.
    pub fn target_path(&self, tool: ToolIdentifier) -> PathBuf {
        let home = self
            .tool_home
            .canonicalize()
            .unwrap_or_else(|_| self.tool_home.clone());
        home.join(tool.binary_name())
    }

    /// Install `bytes` as `tool`, returning the absolute install path.
    pub fn install(&self, tool: ToolIdentifier, bytes: &[u8]) -> Result<PathBuf, InstallError> {
        std::fs::create_dir_all(&self.tool_home).map_err(write_err(&self.tool_home))?;
        let home = self
            .tool_home
            .canonicalize()
            .map_err(write_err(&self.tool_home))?;
        let target = home.join(tool.binary_name());
        let tp = temp_path(&target);

        let mut staged = StagedFile::create(&tp).map_err(write_err(&tp))?;
        staged.write_all(bytes).map_err(write_err(&tp))?;
        staged.finalize(&target).map_err(write_err(&target))?;

        tracing::info!(%tool, path = %target.display(), bytes = bytes.len(), "installed");
        Ok(target)
    }
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> InstallError {
    let path = path.to_path_buf();
    move |source| InstallError::WriteError { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_part() {
        let p = temp_path(Path::new("rebar3"));
        assert_eq!(p.to_string_lossy(), "rebar3.part");
        let p2 = temp_path(Path::new("/tmp/tools/rebar"));
        assert_eq!(p2.to_string_lossy(), "/tmp/tools/rebar.part");
    }

    #[test]
    fn install_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("a").join("b");
        let installer = Installer::new(&home);
        let path = installer.install(ToolIdentifier::Rebar3, b"escript").unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, home.canonicalize().unwrap().join("rebar3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"escript");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn target_path_matches_installed_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("x")).unwrap();
        std::fs::create_dir_all(dir.path().join("tools")).unwrap();
        let home = dir.path().join("x").join("..").join("tools");
        let installer = Installer::new(&home);
        let before = installer.target_path(ToolIdentifier::Rebar);
        let installed = installer.install(ToolIdentifier::Rebar, b"x").unwrap();
        assert_eq!(before, installed);
    }

    #[cfg(unix)]
    #[test]
    fn installed_file_is_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let installer = Installer::new(dir.path());
        let path = installer.install(ToolIdentifier::Rebar, b"x").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, EXECUTABLE_MODE);
    }

    #[test]
    fn reinstall_overwrites_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let installer = Installer::new(dir.path());
        installer.install(ToolIdentifier::Rebar3, b"old").unwrap();
        let first = installer.install(ToolIdentifier::Rebar3, b"new").unwrap();
        let second = installer.install(ToolIdentifier::Rebar3, b"new").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), b"new");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("rebar3")]);
    }

    #[test]
    fn failed_install_leaves_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let installer = Installer::new(dir.path());
        let path = installer.install(ToolIdentifier::Rebar, b"previous").unwrap();

        // A directory squatting on the temp name makes staging fail.
        std::fs::create_dir(temp_path(&path)).unwrap();
        let err = installer.install(ToolIdentifier::Rebar, b"next").unwrap_err();
        assert!(matches!(err, InstallError::WriteError { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn dropped_staged_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let tp = dir.path().join("rebar3.part");
        {
            let mut staged = StagedFile::create(&tp).unwrap();
            staged.write_all(b"partial").unwrap();
            assert!(staged.temp_path().exists());
        }
        assert!(!tp.exists());
    }

    #[test]
    fn tool_home_that_is_a_file_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("home");
        std::fs::write(&blocker, b"").unwrap();
        let installer = Installer::new(&blocker);
        assert!(matches!(
            installer.install(ToolIdentifier::Rebar3, b"x"),
            Err(InstallError::WriteError { .. })
        ));
    }
}
