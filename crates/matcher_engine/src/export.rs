use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory unusable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Creates `dir` when missing; fails if it exists as something else.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => fs::create_dir_all(dir)
            .map_err(|e| PersistError::OutputDir(format!("{}: {e}", dir.display()))),
        Err(err) => Err(PersistError::OutputDir(format!("{}: {err}", dir.display()))),
    }
}

/// Writes export documents so a reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct ExportWriter {
    dir: PathBuf,
}

impl ExportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, document: &Value) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;
        let target = self.dir.join(filename);

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(staged.as_file_mut(), document)?;
        staged.write_all(b"\n")?;
        staged.as_file_mut().sync_all()?;
        staged.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}
