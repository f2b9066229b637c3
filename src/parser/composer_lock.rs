//! composer.lock reader

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::parser::read_json;
use crate::parser::types::{InstalledPackage, ParseError};

#[derive(Debug, Deserialize)]
struct LockFile {
    packages: Option<Vec<LockedPackage>>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Option<Vec<LockedPackage>>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
    #[serde(default, rename = "notification-url")]
    notification_url: Option<String>,
    #[serde(default)]
    dist: Option<Dist>,
}

#[derive(Debug, Deserialize)]
struct Dist {
    #[serde(default)]
    url: Option<String>,
}

impl From<LockedPackage> for InstalledPackage {
    fn from(package: LockedPackage) -> Self {
        let source_url = package
            .notification_url
            .or_else(|| package.dist.and_then(|dist| dist.url));
        InstalledPackage {
            name: package.name,
            version: package.version,
            source_url,
        }
    }
}

/// Installed packages (`packages` then `packages-dev`) in lock file order
pub fn read_installed_packages(lock_path: &Path) -> Result<Vec<InstalledPackage>, ParseError> {
    let lock: LockFile = read_json(lock_path)?;

    let Some(packages) = lock.packages else {
        return Err(ParseError::Invalid {
            path: lock_path.to_path_buf(),
            reason: "missing \"packages\" section".to_string(),
        });
    };

    let installed: Vec<InstalledPackage> = packages
        .into_iter()
        .chain(lock.packages_dev.unwrap_or_default())
        .map(InstalledPackage::from)
        .collect();

    debug!("Read {} packages from {:?}", installed.len(), lock_path);
    Ok(installed)
}
