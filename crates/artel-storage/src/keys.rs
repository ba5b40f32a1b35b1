//! Storage key constants.

/// Storage keys used by the session subsystem
pub struct StorageKeys;

impl StorageKeys {
    /// Short-lived bearer token for authenticated API calls
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Long-lived token for obtaining new access tokens
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Cached role tag (worker, business, individual)
    pub const USER_TYPE: &'static str = "user_type";
}
