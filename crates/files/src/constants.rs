/// Suffix appended to the target filename while a write is in flight.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Contents written when the array file is first created.
pub(crate) const EMPTY_ARRAY: &str = "[]";
