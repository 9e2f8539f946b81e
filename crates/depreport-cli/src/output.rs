//! Report destination, staged before the run and swapped in at the end.

use std::fs::{File, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use tempfile::NamedTempFile;

/// A report that lands at its destination only on [`ReportFile::commit`].
///
/// The staging file sits in the destination directory, so an unusable
/// `--output-file` is reported before any GitHub request and the final move is
/// a rename on the same filesystem. Dropping an uncommitted report removes the
/// staging file and leaves an existing report untouched.
pub struct ReportFile {
    path: PathBuf,
    staged: NamedTempFile,
}

impl ReportFile {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staged = tempfile::Builder::new()
            .prefix(".dependabot-report")
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("cannot write into '{}'", dir.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            staged,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` and move it over the destination.
    ///
    /// An existing report keeps its permissions; a new one is readable by
    /// everyone, like a file created with the default umask.
    pub fn commit(mut self, data: &[u8]) -> anyhow::Result<()> {
        self.staged.write_all(data)?;
        self.staged.flush()?;
        let permissions = match std::fs::metadata(&self.path) {
            Ok(existing) => existing.permissions(),
            Err(_) => new_report_permissions(self.staged.as_file())?,
        };
        self.staged.as_file().set_permissions(permissions)?;
        self.staged
            .persist(&self.path)
            .with_context(|| format!("cannot replace '{}'", self.path.display()))?;
        Ok(())
    }
}

#[cfg(unix)]
fn new_report_permissions(_staged: &File) -> io::Result<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_report_permissions(staged: &File) -> io::Result<Permissions> {
    Ok(staged.metadata()?.permissions())
}
