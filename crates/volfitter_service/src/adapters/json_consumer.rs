//! Writes fitted surfaces to a JSON file.

use crate::error::ServiceError;
use crate::ports::FinalIvConsumer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use volfitter_core::types::FittedSurface;

/// Overwrites one JSON file with each surface it receives.
#[derive(Debug, Clone)]
pub struct JsonFileConsumer {
    path: PathBuf,
}

impl JsonFileConsumer {
    /// Create a consumer writing to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FinalIvConsumer for JsonFileConsumer {
    fn consume(&self, surface: &FittedSurface) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, surface)?;
        writer.flush()?;

        info!(
            path = %self.path.display(),
            expiries = surface.curves.len(),
            "Fitted surface written"
        );
        Ok(())
    }
}
