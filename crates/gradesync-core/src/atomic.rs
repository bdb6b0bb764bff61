//! Write-then-replace file transactions.
//!
//! A [`FileTransaction`] writes into a temporary file in the destination's
//! directory and renames it over the destination on [`commit`]. Dropping an
//! uncommitted transaction removes the temporary file, so a failed run never
//! leaves a partially written destination behind.
//!
//! [`commit`]: FileTransaction::commit

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// A pending replacement of one file.
#[derive(Debug)]
pub struct FileTransaction {
    dest: PathBuf,
    temp: NamedTempFile,
}

impl FileTransaction {
    /// Open a temporary file next to `dest`, creating parent directories.
    pub fn begin(dest: &Path) -> Result<Self> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
        let temp = NamedTempFile::new_in(&parent)
            .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
        Ok(Self {
            dest: dest.to_path_buf(),
            temp,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Flush, sync and move the temporary file over the destination.
    pub fn commit(mut self) -> Result<()> {
        self.temp
            .flush()
            .with_context(|| format!("failed to flush {}", self.dest.display()))?;
        self.temp
            .as_file()
            .sync_all()
            .with_context(|| format!("failed to sync {}", self.dest.display()))?;
        let dest = self.dest;
        self.temp
            .persist(&dest)
            .map_err(|e| e.error)
            .with_context(|| format!("failed to replace {}", dest.display()))?;
        tracing::debug!("replaced {}", dest.display());
        Ok(())
    }
}

impl Write for FileTransaction {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.temp.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.temp.flush()
    }
}

/// Replace `dest` with `bytes` in one transaction.
pub fn write_bytes(dest: &Path, bytes: &[u8]) -> Result<()> {
    let mut tx = FileTransaction::begin(dest)?;
    tx.write_all(bytes)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    tx.commit()
}

/// Run `fill` against a transaction and commit only if it succeeds.
pub fn write_with<F>(dest: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut FileTransaction) -> Result<()>,
{
    let mut tx = FileTransaction::begin(dest)?;
    fill(&mut tx)?;
    tx.commit()
}
