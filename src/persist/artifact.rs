use super::FlowchartState;
use crate::error::PersistError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use std::fs;
use std::path::Path;

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl FlowchartState {
    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string_pretty(self).map_err(|e| PersistError::Serialize(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        serde_json::from_str(json).map_err(|e| PersistError::Deserialize(e.to_string()))
    }

    /// Encodes the state with bincode's standard configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        encode_to_vec(self, standard()).map_err(|e| PersistError::Serialize(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        decode_from_slice(bytes, standard())
            .map(|(state, _)| state)
            .map_err(|e| PersistError::Deserialize(e.to_string()))
    }

    /// Writes the state to `path`. A `.json` extension selects JSON,
    /// anything else the binary format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            self.to_json()?.into_bytes()
        } else {
            self.to_bytes()?
        };
        fs::write(path, bytes).map_err(|e| io_error(path, e))
    }

    /// Reads a state written by [`save`](Self::save).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
        if is_json(path) {
            let text = String::from_utf8(bytes).map_err(|e| PersistError::Deserialize(e.to_string()))?;
            Self::from_json(&text)
        } else {
            Self::from_bytes(&bytes)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
