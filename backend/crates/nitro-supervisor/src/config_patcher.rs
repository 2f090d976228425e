//! Read-merge-write of the server's JSON config.

use crate::{SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::Path;

use error_location::ErrorLocation;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Section of the server config holding model settings.
pub const MODEL_SECTION_KEY: &str = "custom_config";
/// Key the server reads the model location from.
pub const MODEL_PATH_KEY: &str = "llama_model_path";

const INDENT: &[u8] = b"    ";

pub struct ConfigPatcher;

impl ConfigPatcher {
    /// Point the server config at `model_path`, keeping every other field.
    ///
    /// A missing (or blank) file starts from an empty document. A file that
    /// does not hold a JSON object, or whose model section is set to anything
    /// but an object, is reported as corrupt and left untouched.
    #[track_caller]
    pub fn apply(config_path: &Path, model_path: &Path) -> SupervisorResult<()> {
        let mut document = Self::read_document(config_path)?;

        let section = document
            .entry(MODEL_SECTION_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if Self::is_unset(section) {
            *section = Value::Object(Map::new());
        }

        let Value::Object(section) = section else {
            return Err(SupervisorError::config_corrupt(
                config_path,
                format!("`{MODEL_SECTION_KEY}` must be an object"),
            ));
        };

        section.insert(
            MODEL_PATH_KEY.to_string(),
            Value::String(model_path.to_string_lossy().into_owned()),
        );

        Self::write_document(config_path, &document)?;

        info!(
            "Server config {} now loads {}",
            config_path.display(),
            model_path.display()
        );

        Ok(())
    }

    /// `null`, `false`, `0` and `""` count as a missing section.
    fn is_unset(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Bool(flag) => !flag,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(_) | Value::Object(_) => false,
        }
    }

    /// Read the existing document, or an empty one if the file is absent.
    #[track_caller]
    pub fn read_document(config_path: &Path) -> SupervisorResult<Map<String, Value>> {
        let raw = match std::fs::read_to_string(config_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No server config at {}, starting from an empty document",
                    config_path.display()
                );
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(SupervisorError::config_corrupt(
                    config_path,
                    format!("unreadable: {e}"),
                ));
            }
        };

        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(SupervisorError::config_corrupt(
                config_path,
                "top-level value must be an object",
            )),
            Err(e) => Err(SupervisorError::config_corrupt(config_path, e.to_string())),
        }
    }

    /// Write atomically via temp file, 4-space indented.
    fn write_document(config_path: &Path, document: &Map<String, Value>) -> SupervisorResult<()> {
        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| Self::write_error(config_path, std::io::Error::other(e)))?;

        if let Some(dir) = config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| Self::write_error(config_path, e))?;
        }

        let temp_path = config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content).map_err(|e| Self::write_error(config_path, e))?;
        std::fs::rename(&temp_path, config_path).map_err(|e| Self::write_error(config_path, e))?;

        Ok(())
    }

    #[track_caller]
    fn write_error(config_path: &Path, source: std::io::Error) -> SupervisorError {
        SupervisorError::ConfigWrite {
            path: config_path.to_path_buf(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
