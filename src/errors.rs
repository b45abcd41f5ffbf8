use thiserror::Error;

/// Result shape shared by every sensor and digital-IO adapter.
///
/// Callers must branch on the tag, never on sentinel values: a reading of
/// `0.0` is a real reading, an absent peripheral is `ReadError::Unavailable`.
pub type Reading<T> = Result<T, ReadError>;

/// Failure modes an adapter is allowed to report past its boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The peripheral backing this adapter was never initialized, or the
    /// handle manager is degraded. Expected and non-fatal.
    #[error("peripheral unavailable")]
    Unavailable,

    /// A bounded wait expired, usually disconnected or mis-wired hardware.
    #[error("wait timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// A single bus or line transfer failed. Callers may retry at their own
    /// cadence; the adapter itself never retries.
    #[error("transient I/O failure: {0}")]
    Transient(String),
}

/// Handle-acquisition errors raised inside the manager and its backends.
#[derive(Error, Debug)]
pub enum HalError {
    #[error("GPIO chip {chip} could not be opened: {reason}")]
    ChipOpen { chip: u32, reason: String },

    #[error("claiming pin {pin} as {direction} failed: {reason}")]
    PinClaim {
        pin: u32,
        direction: &'static str,
        reason: String,
    },

    #[error("I2C bus {bus} could not be opened: {reason}")]
    BusOpen { bus: u8, reason: String },

    #[error("initialization failed after recovery attempt: {0}")]
    InitExhausted(String),

    #[error("peripheral access is only supported on Linux")]
    UnsupportedPlatform,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Opaque render-backend failure. Logged by the display adapter, never
/// propagated to callers.
#[derive(Error, Debug)]
#[error("display backend error: {0}")]
pub struct DisplayError(pub String);

pub type HalResult<T> = Result<T, HalError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
