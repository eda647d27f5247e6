//! Reference log file maintenance
//!
//! Reflogs live under `logs/<refname>`, mirroring the loose reference tree.
//! The reference backend only maintains the filenames: when a reference is
//! renamed its log file moves with it. Log content is written elsewhere.

use crate::artifacts::refs::ref_name::RefName;
use crate::errors::Result;
use derive_new::new;
use std::path::{Path, PathBuf};

/// Reference log manager
#[derive(Debug, new)]
pub struct Reflog {
    /// Path to the logs directory
    path: Box<Path>,
}

impl Reflog {
    /// The log file path for a reference name
    pub fn log_path(&self, name: &RefName) -> PathBuf {
        self.path.join(name.to_path())
    }

    /// Move the log file of a renamed reference
    ///
    /// A reference without a log file is a no-op.
    pub fn rename_log(&self, old_name: &RefName, new_name: &RefName) -> Result<()> {
        let old_path = self.log_path(old_name);
        if !old_path.exists() {
            return Ok(());
        }

        let new_path = self.log_path(new_name);
        if let Some(parent) = new_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::rename(&old_path, &new_path)?;
        Ok(())
    }
}
