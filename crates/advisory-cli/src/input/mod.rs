pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Resolve command input: `--input` file first, then piped stdin.
/// `None` when neither supplied anything.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value::<T>(data)?)),
        None => Ok(None),
    }
}

/// Same as [`read_input`] but untyped.
pub fn read_input_value(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    read_input::<Value>(path)
}
