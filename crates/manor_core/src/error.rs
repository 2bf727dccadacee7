//! Error types for the manor economy engine.

use thiserror::Error;

use crate::ids::CastleId;

/// Result type alias using [`ManorError`].
pub type Result<T> = std::result::Result<T, ManorError>;

/// Persistence operation that failed, attached to [`ManorError`] for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Loading seed production rows.
    LoadProduction,
    /// Loading crop procurement rows.
    LoadProcure,
    /// Writing all rows of a castle.
    SaveAll,
    /// Deleting all rows of a castle.
    DeleteAll,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::LoadProduction => "load production",
            Self::LoadProcure => "load procure",
            Self::SaveAll => "save",
            Self::DeleteAll => "delete",
        };
        f.write_str(name)
    }
}

/// Failure reported by a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rows could not be encoded for storage.
    #[error("Failed to encode rows: {0}")]
    Encode(String),

    /// Stored bytes could not be decoded into rows.
    #[error("Failed to decode rows: {0}")]
    Decode(String),

    /// Backend rejected the operation for another reason.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error type for the manor engine.
#[derive(Debug, Error)]
pub enum ManorError {
    /// Persistence backend failed for a castle.
    #[error("Failed to {op} manor data for castle {castle}: {source}")]
    Store {
        /// Castle whose data was being accessed.
        castle: CastleId,
        /// Operation that failed.
        op: StoreOp,
        /// Backend error.
        #[source]
        source: StoreError,
    },

    /// Persistence call did not finish before its deadline.
    #[error("Timed out trying to {op} manor data for castle {castle}")]
    StoreTimeout {
        /// Castle whose data was being accessed.
        castle: CastleId,
        /// Operation that timed out.
        op: StoreOp,
    },

    /// Counter constructed with more remaining than it started with.
    #[error(
        "Invalid counter for resource {id}: amount {amount} exceeds start amount {start_amount}"
    )]
    InvalidCounter {
        /// Seed or crop identifier.
        id: u32,
        /// Requested remaining amount.
        amount: u64,
        /// Requested start amount.
        start_amount: u64,
    },

    /// Castle is not managed by this manor.
    #[error("Castle {0} has no manor")]
    UnknownCastle(CastleId),

    /// Schedule boundaries do not form a valid day.
    #[error("Invalid manor schedule: {0}")]
    InvalidSchedule(String),

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Background loop stopped because shutdown was requested.
    #[error("Manor task cancelled")]
    Cancelled,
}
