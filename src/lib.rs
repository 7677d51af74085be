// Permit Ledger - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod permit;
pub mod codec;      // Contract wire format ↔ domain values
pub mod merge;      // created/processed reconciliation
pub mod temporal;   // Event fetch + block timestamp enrichment
pub mod sort;       // Permits table ordering
pub mod refresh;    // fetch → merge → enrich
pub mod whitelist;  // Authority whitelist management
pub mod tx;         // Submission status tracking
pub mod chain;      // In-memory chain for fixtures and tests
pub mod config;
pub mod db;

// Re-export commonly used types
pub use error::{
    AddressError, DecodeError, LookupError, SortAttributeError,
    SubmissionEncodingError, WhitelistError,
};
pub use permit::{
    EventKind, PartyAddress, Permit, PermitDraft, PermitEvent, PermitForm,
    PermitType, Specimen, SpecimenDraft,
    PERMIT_CONFIRMED_EVENT, PERMIT_CREATED_EVENT,
};
pub use codec::{
    decode_permit, decode_specimen, encode_permit_for_submission, format_event_log,
    hex_to_utf8, utf8_to_hex,
    CreatePermitArgs, RawBlock, RawEventLog, RawPermit, RawSpecimen,
};
pub use merge::merge_permit_events;
pub use temporal::{enrich_timestamps, fetch_all_permit_events, BlockSource, EventSource};
pub use sort::{sort_permit_events, SortAttribute, PERMITS_TABLE_COLUMNS};
pub use refresh::refresh_permit_events;
pub use whitelist::{
    load_country_whitelist, AccountAddress, CountryWhitelist, WhitelistCall, WhitelistSource,
};
pub use tx::{TxObservation, TxState};
pub use chain::MemoryChain;
pub use config::AppConfig;
pub use db::{
    AuditEvent, SnapshotDiff,
    setup_database, save_snapshot, load_snapshot, get_permit_event,
    insert_event, get_events_for_entity, export_events_csv,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
