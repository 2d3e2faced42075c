//! Generic JSON read/transform/write pipeline
//!
//! Every JSON document the tool touches (`package.json`, `unpm-local.json`,
//! `unpm-packages.json`) goes through the same path: read the file, hand an
//! owned copy to the caller's transform, write the result back as a whole
//! pretty-printed document. The file is only replaced after the transform
//! succeeds, and the caller never holds a reference that could be mutated
//! behind its back.
//!
//! # Examples
//!
//! ```no_run
//! use unpm::jsonfile;
//! use serde_json::Value;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let updated: Value = jsonfile::transform_json_file("package.json", |mut doc: Value| {
//!     doc["version"] = "1.2.0".into();
//!     Ok(doc)
//! })?;
//! println!("now at {}", updated["version"]);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Other(format!("Failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::InvalidManifest(format!("{}: {}", path.display(), e))
    })
}

/// Serialize and write a JSON file, pretty-printed with a trailing newline
pub fn write_json_pretty<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

/// Read a JSON document, apply a transform, write the result back.
///
/// The transform receives the document by value and returns the replacement.
/// Nothing is written when the transform fails, so a failed update leaves
/// the file exactly as it was.
pub fn transform_json_file<T, F, P>(path: P, transform: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce(T) -> Result<T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let current: T = read_json(path)?;
    let next = transform(current)?;
    write_json_pretty(path, &next)?;
    Ok(next)
}

/// Like [`transform_json_file`], but a missing file starts from `T::default()`.
///
/// This is how the registry `ensure` operations create their documents on
/// first use.
pub fn transform_json_file_or_default<T, F, P>(path: P, transform: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(T) -> Result<T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let current: T = if path.exists() {
        read_json(path)?
    } else {
        T::default()
    };
    let next = transform(current)?;
    write_json_pretty(path, &next)?;
    Ok(next)
}
