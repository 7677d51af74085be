// 📜 Permit Model - CITES permits, specimens and lifecycle events
// Decoded snapshots are read-only; drafts are edited by building new values

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

// ============================================================================
// FIXED VOCABULARIES
// ============================================================================

/// Name of the contract event emitted when a permit is created
pub const PERMIT_CREATED_EVENT: &str = "PermitCreated";

/// Name of the contract event emitted when a permit is confirmed by the importer
pub const PERMIT_CONFIRMED_EVENT: &str = "PermitConfirmed";

/// PermitType - position in [`PERMIT_TYPES`] IS the on-chain encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermitType {
    #[serde(rename = "EXPORT")]
    Export,
    #[serde(rename = "RE-EXPORT")]
    ReExport,
    #[serde(rename = "OTHER")]
    Other,
}

/// Wire order of permit types. Reordering breaks compatibility with the deployed contract.
pub const PERMIT_TYPES: [PermitType; 3] = [PermitType::Export, PermitType::ReExport, PermitType::Other];

impl PermitType {
    pub fn name(&self) -> &'static str {
        match self {
            PermitType::Export => "EXPORT",
            PermitType::ReExport => "RE-EXPORT",
            PermitType::Other => "OTHER",
        }
    }

    /// Index of this type in the on-chain type table
    pub fn index(&self) -> u8 {
        match self {
            PermitType::Export => 0,
            PermitType::ReExport => 1,
            PermitType::Other => 2,
        }
    }

    /// Positional lookup into the type table
    pub fn from_index(index: u64) -> Result<Self, DecodeError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| PERMIT_TYPES.get(i).copied())
            .ok_or(DecodeError::PermitTypeOutOfRange(index))
    }

    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        PERMIT_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == name)
            .ok_or_else(|| DecodeError::UnknownPermitType(name.to_string()))
    }
}

/// PermitForm - whether the permit is issued digitally (by the exporter) or
/// captured from paper (by the importer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermitForm {
    #[serde(rename = "DIGITAL")]
    Digital,
    #[serde(rename = "PAPER")]
    Paper,
}

pub const PERMIT_FORMS: [PermitForm; 2] = [PermitForm::Digital, PermitForm::Paper];

impl PermitForm {
    pub fn name(&self) -> &'static str {
        match self {
            PermitForm::Digital => "DIGITAL",
            PermitForm::Paper => "PAPER",
        }
    }
}

/// EventKind - lifecycle marker derived from the contract's two event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Processed,
}

impl EventKind {
    /// Anything that is not the creation event counts as processed
    pub fn from_event_name(event_name: &str) -> Self {
        if event_name == PERMIT_CREATED_EVENT {
            EventKind::Created
        } else {
            EventKind::Processed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Processed => "processed",
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, EventKind::Processed)
    }
}

// ============================================================================
// DECODED RECORDS
// ============================================================================

/// Name / street / city of an exporter or importer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyAddress {
    pub name: String,
    pub street: String,
    pub city: String,
}

/// Permit - a single export/import authorization, decoded from chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
    pub export_country: String,
    pub import_country: String,
    pub permit_type: PermitType,
    pub exporter: PartyAddress,
    pub importer: PartyAddress,
    pub specimen_hashes: Vec<String>,
    pub nonce: String,
}

/// Specimen - a line item attached to exactly one permit via `permit_hash`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specimen {
    pub permit_hash: String,
    /// Decimal text of the on-chain `uint256`
    pub quantity: String,
    pub scientific_name: String,
    pub common_name: String,
    pub description: String,
    pub origin_hash: String,
    pub re_export_hash: String,
}

/// PermitEvent - reconciled view of one permit's latest lifecycle event
///
/// A reconciled set holds at most one event per `permit_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitEvent {
    #[serde(rename = "status")]
    pub kind: EventKind,
    pub block_number: u64,
    pub permit_hash: String,
    pub export_country: String,
    pub import_country: String,
    /// Milliseconds since epoch, set by the timestamp enricher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl PermitEvent {
    pub fn new(
        kind: EventKind,
        block_number: u64,
        permit_hash: impl Into<String>,
        export_country: impl Into<String>,
        import_country: impl Into<String>,
    ) -> Self {
        PermitEvent {
            kind,
            block_number,
            permit_hash: permit_hash.into(),
            export_country: export_country.into(),
            import_country: import_country.into(),
            timestamp: None,
        }
    }

    /// Copy of this event with a resolved timestamp
    pub fn with_timestamp(&self, timestamp_ms: i64) -> Self {
        PermitEvent {
            timestamp: Some(timestamp_ms),
            ..self.clone()
        }
    }
}

// ============================================================================
// DRAFTS (not yet submitted)
// ============================================================================

/// PermitDraft - editable permit before submission
///
/// Fields are optional so a missing value is caught at encode time rather
/// than producing a malformed contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitDraft {
    #[serde(default)]
    pub export_country: Option<String>,
    #[serde(default)]
    pub import_country: Option<String>,
    #[serde(default)]
    pub permit_type: Option<PermitType>,
    /// name, street, city
    #[serde(default)]
    pub importer: [Option<String>; 3],
    /// name, street, city
    #[serde(default)]
    pub exporter: [Option<String>; 3],
}

impl Default for PermitDraft {
    fn default() -> Self {
        PermitDraft {
            export_country: Some(String::new()),
            import_country: Some(String::new()),
            permit_type: Some(PERMIT_TYPES[0]),
            importer: [Some(String::new()), Some(String::new()), Some(String::new())],
            exporter: [Some(String::new()), Some(String::new()), Some(String::new())],
        }
    }
}

impl PermitDraft {
    /// Place the authority's country on the side of the permit the form dictates
    ///
    /// DIGITAL permits are issued by the exporting authority, PAPER permits are
    /// captured by the importing authority. The other side is cleared.
    pub fn for_form(&self, form: PermitForm, authority_country: &str) -> PermitDraft {
        let (export_country, import_country) = match form {
            PermitForm::Digital => (authority_country.to_string(), String::new()),
            PermitForm::Paper => (String::new(), authority_country.to_string()),
        };
        PermitDraft {
            export_country: Some(export_country),
            import_country: Some(import_country),
            ..self.clone()
        }
    }

    pub fn with_permit_type(&self, permit_type: PermitType) -> PermitDraft {
        PermitDraft {
            permit_type: Some(permit_type),
            ..self.clone()
        }
    }

    pub fn with_export_country(&self, country: &str) -> PermitDraft {
        PermitDraft {
            export_country: Some(country.to_string()),
            ..self.clone()
        }
    }

    pub fn with_import_country(&self, country: &str) -> PermitDraft {
        PermitDraft {
            import_country: Some(country.to_string()),
            ..self.clone()
        }
    }

    /// Replace one line (0 = name, 1 = street, 2 = city) of the importer address
    pub fn with_importer_line(&self, line: usize, value: &str) -> PermitDraft {
        let mut importer = self.importer.clone();
        if let Some(slot) = importer.get_mut(line) {
            *slot = Some(value.to_string());
        }
        PermitDraft {
            importer,
            ..self.clone()
        }
    }

    /// Replace one line (0 = name, 1 = street, 2 = city) of the exporter address
    pub fn with_exporter_line(&self, line: usize, value: &str) -> PermitDraft {
        let mut exporter = self.exporter.clone();
        if let Some(slot) = exporter.get_mut(line) {
            *slot = Some(value.to_string());
        }
        PermitDraft {
            exporter,
            ..self.clone()
        }
    }
}

/// SpecimenDraft - editable specimen line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenDraft {
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub origin_hash: Option<String>,
    #[serde(default)]
    pub re_export_hash: Option<String>,
}

impl Default for SpecimenDraft {
    fn default() -> Self {
        SpecimenDraft {
            quantity: Some(0),
            scientific_name: Some(String::new()),
            common_name: Some(String::new()),
            description: Some(String::new()),
            origin_hash: Some(String::new()),
            re_export_hash: Some(String::new()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
