//! auth.json basic credentials

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::parser::read_json;
use crate::parser::types::ParseError;
use crate::version::fetcher::Credentials;

#[derive(Debug, Deserialize)]
struct BasicAuth {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Default, Deserialize)]
struct AuthJson {
    #[serde(default, rename = "http-basic")]
    http_basic: HashMap<String, BasicAuth>,
}

/// HTTP basic credentials keyed by host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthConfig {
    http_basic: HashMap<String, Credentials>,
}

impl AuthConfig {
    pub fn load(path: &Path) -> Result<Self, ParseError> {
        let auth: AuthJson = read_json(path)?;
        let http_basic = auth
            .http_basic
            .into_iter()
            .map(|(host, basic)| {
                (
                    host.to_ascii_lowercase(),
                    Credentials::new(&basic.username, &basic.password),
                )
            })
            .collect();
        Ok(Self { http_basic })
    }

    pub fn credentials_for(&self, host: &str) -> Option<&Credentials> {
        self.http_basic.get(&host.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.http_basic.is_empty()
    }
}
