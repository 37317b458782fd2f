//! Route paths of the flat-file service.

/// Read (GET) or replace (POST) the whole stored collection.
pub const BOT: &str = "/api/bot";

/// Append a single solution (POST).
pub const BOT_ADD: &str = "/api/bot/add";

/// Liveness probe (GET).
pub const HEALTH: &str = "/health";
