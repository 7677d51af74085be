// ⚠️ Error Types - typed failures for every engine boundary
// UI layers must be able to tell "nothing to show" from "could not load"

use thiserror::Error;

/// A single record could not be decoded from its on-chain encoding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid hex in field '{field}': {reason}")]
    InvalidHex { field: String, reason: String },

    #[error("field '{field}' is not valid UTF-8 after hex decoding")]
    InvalidUtf8 { field: String },

    #[error("permit type index {0} is out of range (expected 0..=2)")]
    PermitTypeOutOfRange(u64),

    #[error("unknown permit type name '{0}'")]
    UnknownPermitType(String),

    #[error("specimen quantity '{0}' is not an unsigned decimal integer")]
    InvalidQuantity(String),

    #[error("event log is missing return value '{0}'")]
    MissingReturnValue(String),

    #[error("return value '{field}' has unexpected shape: {reason}")]
    MalformedReturnValue { field: String, reason: String },
}

/// A concurrent batch against the blockchain-access collaborator failed.
///
/// One failing sub-request aborts the whole batch; no partial results.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("fetching '{event_name}' logs from block {from_block} failed: {reason}")]
    EventFetch {
        event_name: String,
        from_block: u64,
        reason: String,
    },

    #[error("fetched '{event_name}' log could not be decoded: {source}")]
    EventDecode {
        event_name: String,
        #[source]
        source: DecodeError,
    },

    #[error("lookup of block {block_number} failed: {reason}")]
    BlockLookup { block_number: u64, reason: String },

    #[error("block {0} was not found")]
    BlockNotFound(u64),

    #[error("whitelist status lookup for {address} failed: {reason}")]
    WhitelistStatus { address: String, reason: String },
}

/// A drafted permit could not be turned into a contract call.
///
/// Raised before any network call is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEncodingError {
    #[error("permit is missing required field '{0}'")]
    MissingPermitField(&'static str),

    #[error("specimen #{index} is missing required field '{field}'")]
    MissingSpecimenField { index: usize, field: &'static str },

    #[error("a permit needs at least one specimen")]
    NoSpecimens,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address '{0}' must start with 0x")]
    MissingPrefix(String),

    #[error("address '{0}' must have 40 hex digits")]
    WrongLength(String),

    #[error("address '{0}' contains non-hex characters")]
    NotHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort attribute '{0}' (expected one of: permitHash, exportCountry, importCountry, timestamp, status, blockNumber)")]
pub struct SortAttributeError(pub String);

#[derive(Error, Debug)]
pub enum WhitelistError {
    #[error("{addresses} addresses but {statuses} statuses")]
    StatusCountMismatch { addresses: usize, statuses: usize },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}
