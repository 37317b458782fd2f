//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into services. The helpers
//! here take the raw environment values as arguments instead of reading the process
//! environment, so request handling and tests never depend on global state.

use crate::constants::{
    DEFAULT_BOT_FILE, DEFAULT_DATA_DIR, DEFAULT_MIRROR_TIMEOUT_SECS, DEFAULT_REMOTE_URL,
    DEFAULT_REST_ADDR,
};
use crate::{KbError, KbResult};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of the flat-file HTTP service.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    bind_addr: SocketAddr,
    bot_file: PathBuf,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr, bot_file: PathBuf) -> Self {
        Self {
            bind_addr,
            bot_file,
        }
    }

    /// Builds the config from raw `KB_REST_ADDR` and `KB_BOT_FILE` values.
    ///
    /// # Errors
    ///
    /// Returns `KbError::InvalidConfig` if the address does not parse.
    pub fn from_env_values(addr: Option<String>, bot_file: Option<String>) -> KbResult<Self> {
        let raw_addr = addr.unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
        let bind_addr = raw_addr
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| KbError::InvalidConfig(format!("invalid bind address {raw_addr}: {e}")))?;

        let bot_file = bot_file
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BOT_FILE));

        Ok(Self::new(bind_addr, bot_file))
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn bot_file(&self) -> &Path {
        &self.bot_file
    }
}

/// Configuration of the knowledge-base client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    data_dir: PathBuf,
    remote_url: Option<String>,
    mirror_timeout: Duration,
    base_collection: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(
        data_dir: PathBuf,
        remote_url: Option<String>,
        mirror_timeout: Duration,
        base_collection: Option<PathBuf>,
    ) -> Self {
        Self {
            data_dir,
            remote_url,
            mirror_timeout,
            base_collection,
        }
    }

    /// Builds the config from raw `KB_DATA_DIR`, `KB_REMOTE_URL`, `KB_MIRROR_TIMEOUT_SECS`,
    /// and `KB_BASE_COLLECTION` values.
    pub fn from_env_values(
        data_dir: Option<String>,
        remote_url: Option<String>,
        mirror_timeout: Option<String>,
        base_collection: Option<String>,
    ) -> KbResult<Self> {
        let data_dir = data_dir
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let base_collection = base_collection
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self::new(
            data_dir,
            remote_url_from_env_value(remote_url)?,
            mirror_timeout_from_env_value(mirror_timeout)?,
            base_collection,
        ))
    }

    /// Directory holding the local slot files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `None` disables the mirror.
    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn mirror_timeout(&self) -> Duration {
        self.mirror_timeout
    }

    /// Base collection file, or `None` for the built-in collection.
    pub fn base_collection(&self) -> Option<&Path> {
        self.base_collection.as_deref()
    }

    /// Copy of this config with the mirror turned off.
    pub fn offline(mut self) -> Self {
        self.remote_url = None;
        self
    }
}

/// Resolves the remote URL.
///
/// Unset means the default local service; `off` or `none` (any case) disables the mirror.
///
/// # Errors
///
/// Returns `KbError::InvalidConfig` if the URL is not `http://` or `https://`.
pub fn remote_url_from_env_value(value: Option<String>) -> KbResult<Option<String>> {
    let Some(raw) = value else {
        return Ok(Some(DEFAULT_REMOTE_URL.to_string()));
    };
    let url = raw.trim();

    if url.eq_ignore_ascii_case("off") || url.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(KbError::InvalidConfig(format!(
            "remote url must start with http:// or https://, got {url:?}"
        )));
    }
    Ok(Some(url.trim_end_matches('/').to_string()))
}

/// Resolves the mirror timeout in whole seconds.
///
/// # Errors
///
/// Returns `KbError::InvalidConfig` for a non-numeric or zero value.
pub fn mirror_timeout_from_env_value(value: Option<String>) -> KbResult<Duration> {
    let Some(raw) = value else {
        return Ok(Duration::from_secs(DEFAULT_MIRROR_TIMEOUT_SECS));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(KbError::InvalidConfig(
            "mirror timeout must be at least 1 second".into(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(KbError::InvalidConfig(format!(
            "invalid mirror timeout {raw:?}: {e}"
        ))),
    }
}
