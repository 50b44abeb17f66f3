//! Workspace directory derivation.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Fixed workspace directories kept next to the install tree.
///
/// All five are joined to the parent of the install directory, so operator
/// data stays a sibling of the application itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspacePaths {
    /// Project uploads (aliased as the upload directory).
    pub projects: PathBuf,
    /// Bundled applications.
    pub applications: PathBuf,
    /// Exported geographic views.
    pub geo_exports: PathBuf,
    /// Automation playbooks.
    pub playbooks: PathBuf,
    /// File transfer staging area.
    pub file_transfer: PathBuf,
}

impl WorkspacePaths {
    /// Derive the workspace layout from the install directory.
    ///
    /// Pure path arithmetic: nothing is created or checked on disk. An
    /// install directory without a parent anchors the workspace at the
    /// directory itself.
    #[must_use]
    pub fn derive(install_dir: &Path) -> Self {
        let base = install_dir.parent().unwrap_or(install_dir);
        Self {
            projects: base.join("projects"),
            applications: base.join("applications"),
            geo_exports: base.join("geo_exports"),
            playbooks: base.join("playbooks"),
            file_transfer: base.join("file_transfer"),
        }
    }

    /// Locate the install directory from the running executable.
    ///
    /// # Errors
    ///
    /// Returns an error when the executable path cannot be read from the
    /// operating system.
    pub fn install_dir() -> io::Result<PathBuf> {
        let exe = env::current_exe()?;
        Ok(exe.parent().unwrap_or(&exe).to_path_buf())
    }
}
