//! Resume points for interrupted imports

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Last sheet row whose batch was committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub source: PathBuf,
    pub sheet: String,
    pub last_committed_row: usize,
}

impl Checkpoint {
    /// Load a checkpoint; a missing file is `None`
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Checkpoint {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::CheckpointFormat {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Load a checkpoint and check it belongs to this source and sheet
    pub fn load_for(path: &Path, source: &Path, sheet: &str) -> Result<Option<Self>> {
        let Some(checkpoint) = Self::load(path)? else {
            return Ok(None);
        };
        if checkpoint.source != source || checkpoint.sheet != sheet {
            return Err(Error::CheckpointMismatch {
                path: path.to_path_buf(),
                expected: format!("{} [{}]", source.display(), sheet),
                found: format!("{} [{}]", checkpoint.source.display(), checkpoint.sheet),
            });
        }
        Ok(Some(checkpoint))
    }

    /// Write through a temporary file so a crash never leaves a partial checkpoint
    pub fn save(&self, path: &Path) -> Result<()> {
        let io_err = |source: std::io::Error| Error::Checkpoint {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| Error::CheckpointFormat {
            path: path.to_path_buf(),
            source,
        })?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    /// Delete the checkpoint file if present
    pub fn remove(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(Error::Checkpoint {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint() -> Checkpoint {
        Checkpoint {
            source: PathBuf::from("precios.xlsx"),
            sheet: "Hoja1".to_string(),
            last_committed_row: 51,
        }
    }

    #[test]
    fn test_save_load_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.checkpoint.json");

        assert_eq!(Checkpoint::load(&path).unwrap(), None);

        checkpoint().save(&path).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap(), Some(checkpoint()));
        assert!(!path.with_extension("tmp").exists());

        Checkpoint::remove(&path).unwrap();
        assert!(!path.exists());
        Checkpoint::remove(&path).unwrap();
    }

    #[test]
    fn test_mismatched_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.checkpoint.json");
        checkpoint().save(&path).unwrap();

        let ok = Checkpoint::load_for(&path, Path::new("precios.xlsx"), "Hoja1").unwrap();
        assert_eq!(ok.map(|c| c.last_committed_row), Some(51));

        let err = Checkpoint::load_for(&path, Path::new("precios.xlsx"), "Hoja2").unwrap_err();
        assert!(matches!(err, Error::CheckpointMismatch { .. }));
    }

    #[test]
    fn test_corrupt_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.checkpoint.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(Error::CheckpointFormat { .. })
        ));
    }
}
