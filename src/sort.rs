// ↕️ Event Sorter - order reconciled events by a table column
// Numeric columns compare as numbers, text columns lexicographically

use crate::error::SortAttributeError;
use crate::permit::PermitEvent;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SORT ATTRIBUTE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortAttribute {
    PermitHash,
    ExportCountry,
    ImportCountry,
    Timestamp,
    Status,
    BlockNumber,
}

/// Columns of the permits table, in display order
pub const PERMITS_TABLE_COLUMNS: [SortAttribute; 5] = [
    SortAttribute::PermitHash,
    SortAttribute::ExportCountry,
    SortAttribute::ImportCountry,
    SortAttribute::Timestamp,
    SortAttribute::Status,
];

impl SortAttribute {
    pub fn label(&self) -> &'static str {
        match self {
            SortAttribute::PermitHash => "permitHash",
            SortAttribute::ExportCountry => "exportCountry",
            SortAttribute::ImportCountry => "importCountry",
            SortAttribute::Timestamp => "timestamp",
            SortAttribute::Status => "status",
            SortAttribute::BlockNumber => "blockNumber",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SortAttribute::PermitHash | SortAttribute::Timestamp | SortAttribute::BlockNumber
        )
    }

    /// Compare two events on this attribute, ascending
    pub fn compare(&self, a: &PermitEvent, b: &PermitEvent) -> Ordering {
        match self {
            SortAttribute::PermitHash => compare_identifiers(&a.permit_hash, &b.permit_hash),
            SortAttribute::Timestamp => compare_timestamps(a.timestamp, b.timestamp),
            SortAttribute::BlockNumber => a.block_number.cmp(&b.block_number),
            SortAttribute::ExportCountry => a.export_country.cmp(&b.export_country),
            SortAttribute::ImportCountry => a.import_country.cmp(&b.import_country),
            SortAttribute::Status => a.kind.as_str().cmp(b.kind.as_str()),
        }
    }
}

impl fmt::Display for SortAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortAttribute {
    type Err = SortAttributeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SortAttribute::PermitHash,
            SortAttribute::ExportCountry,
            SortAttribute::ImportCountry,
            SortAttribute::Timestamp,
            SortAttribute::Status,
            SortAttribute::BlockNumber,
        ]
        .into_iter()
        .find(|a| a.label() == s.trim())
        .ok_or_else(|| SortAttributeError(s.to_string()))
    }
}

// ============================================================================
// NUMERIC IDENTIFIERS
// ============================================================================

/// Canonical big-endian base-16 digits of a `0x` hex or decimal identifier
///
/// Leading zeros are dropped so digit-count then digit-order gives numeric
/// order at any width (permit hashes are 256-bit).
fn numeric_digits(identifier: &str) -> Option<Vec<u8>> {
    let trimmed = identifier.trim();

    let digits: Vec<u8> = if let Some(hex_part) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_part.is_empty() {
            return None;
        }
        hex_part
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<_>>>()?
    } else {
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        decimal_to_hex_digits(trimmed)
    };

    let first = digits.iter().position(|d| *d != 0).unwrap_or(digits.len());
    Some(digits[first..].to_vec())
}

/// Schoolbook base conversion: decimal text → base-16 digits, most significant first
fn decimal_to_hex_digits(decimal: &str) -> Vec<u8> {
    let mut hex_digits: Vec<u8> = Vec::new(); // least significant first
    for c in decimal.bytes() {
        let mut carry = (c - b'0') as u32;
        for d in hex_digits.iter_mut() {
            let value = *d as u32 * 10 + carry;
            *d = (value % 16) as u8;
            carry = value / 16;
        }
        while carry > 0 {
            hex_digits.push((carry % 16) as u8);
            carry /= 16;
        }
    }
    hex_digits.reverse();
    hex_digits
}

/// Numeric order on permit identifiers
///
/// Identifiers that are not numbers sort after all numeric ones and tie with
/// each other, so the stable sort keeps their input order.
pub fn compare_identifiers(a: &str, b: &str) -> Ordering {
    match (numeric_digits(a), numeric_digits(b)) {
        (Some(x), Some(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Missing timestamps (not yet enriched) sort before resolved ones
fn compare_timestamps(a: Option<i64>, b: Option<i64>) -> Ordering {
    a.cmp(&b)
}

// ============================================================================
// SORT
// ============================================================================

/// Reorder events by `attribute`; ties keep their input order in either direction
pub fn sort_permit_events(
    events: Vec<PermitEvent>,
    attribute: SortAttribute,
    ascending: bool,
) -> Vec<PermitEvent> {
    let mut sorted = events;
    sorted.sort_by(|a, b| {
        let order = attribute.compare(a, b);
        if ascending {
            order
        } else {
            order.reverse()
        }
    });
    sorted
}

// ============================================================================
// TESTS
// ============================================================================
