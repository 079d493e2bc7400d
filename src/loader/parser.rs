use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Reads the JSON file at `file_path` into `T`.
///
/// Fails with `Error::IoError` if the file cannot be read and with
/// `Error::DeserializationError` if its content does not match `T`.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let path = file_path.as_ref();
    let data = fs::read_to_string(path)?;
    log::debug!("Read {} bytes from {}", data.len(), path.display());

    Ok(serde_json::from_str(&data)?)
}
