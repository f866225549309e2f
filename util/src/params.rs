//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot load the parameter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the JSON parameter file {0:?}: {1}")]
    JsonDeserialiseError(PathBuf, serde_json::Error),

    #[error("Cannot read the TOML parameter file {0:?}: {1}")]
    TomlDeserialiseError(PathBuf, toml::de::Error),

    #[error("Unsupported parameter file extension {1:?} for {0:?}, expected `json` or `toml`")]
    UnknownFormat(PathBuf, Option<String>),
}

/// Supported parameter file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Load a parameter file.
///
/// The format is chosen from the file extension, `.json` files are parsed with `serde_json` and
/// `.toml` files with `toml`.
pub fn load<P, F>(param_file_path: F) -> Result<P, LoadError>
where
    P: DeserializeOwned,
    F: AsRef<Path>,
{
    let path = param_file_path.as_ref().to_path_buf();

    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Format::Json,
        Some("toml") => Format::Toml,
        other => {
            return Err(LoadError::UnknownFormat(
                path.clone(),
                other.map(String::from),
            ))
        }
    };

    // Load the file into a string
    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e)),
    };

    from_str(&params_str, format, path)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Parse the string into the parameter struct
fn from_str<P>(params_str: &str, format: Format, path: PathBuf) -> Result<P, LoadError>
where
    P: DeserializeOwned,
{
    match format {
        Format::Json => {
            serde_json::from_str(params_str).map_err(|e| LoadError::JsonDeserialiseError(path, e))
        }
        Format::Toml => {
            toml::from_str(params_str).map_err(|e| LoadError::TomlDeserialiseError(path, e))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Dummy {
        name: String,
        value: f64,
    }

    #[test]
    fn test_from_str() {
        let json: Dummy = from_str(
            r#"{ "name": "trail", "value": 2.5 }"#,
            Format::Json,
            PathBuf::from("dummy.json"),
        )
        .unwrap();
        let toml: Dummy = from_str(
            "name = \"trail\"\nvalue = 2.5\n",
            Format::Toml,
            PathBuf::from("dummy.toml"),
        )
        .unwrap();

        assert_eq!(json, toml);
        assert_eq!(json.value, 2.5);
    }

    #[test]
    fn test_load_errors() {
        match load::<Dummy, _>("params.yaml") {
            Err(LoadError::UnknownFormat(_, Some(ext))) => assert_eq!(ext, "yaml"),
            r => panic!("Expected unknown format error, got {:?}", r),
        }

        match load::<Dummy, _>("this/file/does/not/exist.json") {
            Err(LoadError::FileLoadError(_, _)) => (),
            r => panic!("Expected file load error, got {:?}", r),
        }
    }
}
