//! Access credentials, read once at process start.
//!
//! The upstream controller reads `ACCESS_KEY_ID`/`ACCESS_SECRET` as package
//! globals at import time; a mutable global is not idiomatic here, so this
//! crate reads them once in `main` and threads an `Arc<AliyunCredentials>`
//! through every client instead.

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct AliyunCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl AliyunCredentials {
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("ACCESS_KEY_ID")
            .map_err(|_| Error::ConfigError("ACCESS_KEY_ID is not set".to_string()))?;
        let access_key_secret = std::env::var("ACCESS_SECRET")
            .map_err(|_| Error::ConfigError("ACCESS_SECRET is not set".to_string()))?;
        if access_key_id.is_empty() || access_key_secret.is_empty() {
            return Err(Error::ConfigError(
                "ACCESS_KEY_ID/ACCESS_SECRET must not be empty".to_string(),
            ));
        }
        Ok(Self {
            access_key_id,
            access_key_secret,
        })
    }
}
