//! Constants used throughout the knowledge-base core crate.
//!
//! Default locations and the fixed local slot key live here so the server, the CLI, and the
//! tests agree on them.

/// Key of the local durable slot holding the custom collection.
pub const STORAGE_KEY: &str = "bot-solutions-extra";

/// File extension used by the file-backed slot store.
pub const SLOT_FILE_EXTENSION: &str = "json";

/// Default bind address of the flat-file HTTP service.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3001";

/// Default location of the flat file served by the HTTP service.
pub const DEFAULT_BOT_FILE: &str = "api/bot.json";

/// Default base URL the mirror client talks to.
pub const DEFAULT_REMOTE_URL: &str = "http://localhost:3001";

/// Default directory for client-side durable slots.
pub const DEFAULT_DATA_DIR: &str = ".kb";

/// Default timeout for a single mirror request, in seconds.
pub const DEFAULT_MIRROR_TIMEOUT_SECS: u64 = 10;

/// Base collection shipped with the application.
pub(crate) const EMBEDDED_BASE_COLLECTION: &str = include_str!("../data/bot.json");
