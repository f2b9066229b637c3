//! Parser layer
//! - types.rs: Common types (InstalledPackage, ComposerRepository, ParseError)
//! - composer_lock.rs: composer.lock reader
//! - composer_json.rs: composer.json repository list
//! - auth_json.rs: auth.json basic credentials

use std::path::Path;

use serde::de::DeserializeOwned;

pub mod auth_json;
pub mod composer_json;
pub mod composer_lock;
pub mod types;

pub use auth_json::AuthConfig;
pub use composer_json::read_repositories;
pub use composer_lock::read_installed_packages;
pub use types::{ComposerRepository, InstalledPackage, ParseError};

/// Read and deserialize a JSON project file
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ParseError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ParseError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| ParseError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
