/// Default interval between scheduled Jamaat syncs in seconds (6 hours).
pub const DEFAULT_JAMAAT_SYNC_INTERVAL_SECS: u64 = 6 * 3600;

/// Default interval between scheduled Member syncs in seconds (24 hours).
pub const DEFAULT_MEMBER_SYNC_INTERVAL_SECS: u64 = 24 * 3600;

/// Decimal places kept when reporting the mapping percentage.
pub const MAPPING_PERCENTAGE_DECIMALS: i32 = 2;

/// Default path of the persisted store snapshot.
pub const DEFAULT_STORE_PATH: &str = "data/tanzeem-store.json";

/// Default path of the external directory snapshot used by the file client.
pub const DEFAULT_DIRECTORY_PATH: &str = "data/directory.json";

/// Timeout for a single external fetch, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// Label used in sync error strings for Jamaat records.
pub const JAMAAT_RECORD_KIND: &str = "Jamaat";

/// Label used in sync error strings for Member records.
pub const MEMBER_RECORD_KIND: &str = "Member";
