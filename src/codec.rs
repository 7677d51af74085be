// 🧬 Codec - on-chain encodings <-> application records
// Hex-encoded text fields, positional tuples and web3-shaped event logs

use crate::error::{DecodeError, SubmissionEncodingError};
use crate::permit::{
    EventKind, PartyAddress, Permit, PermitDraft, PermitEvent, PermitType, Specimen,
    SpecimenDraft,
};
use crate::whitelist::AccountAddress;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// HEX TEXT
// ============================================================================

/// Decode a hex-encoded text field to UTF-8
///
/// Accepts an optional `0x` prefix. Leading and trailing NUL bytes are
/// stripped, since fixed-width `bytesN` values come back zero-padded.
pub fn decode_hex_text(field: &str, hex_value: &str) -> Result<String, DecodeError> {
    let digits = hex_value
        .strip_prefix("0x")
        .or_else(|| hex_value.strip_prefix("0X"))
        .unwrap_or(hex_value);

    let bytes = hex::decode(digits).map_err(|e| DecodeError::InvalidHex {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| *b != 0).map_or(start, |i| i + 1);

    String::from_utf8(bytes[start..end].to_vec()).map_err(|_| DecodeError::InvalidUtf8 {
        field: field.to_string(),
    })
}

pub fn hex_to_utf8(hex_value: &str) -> Result<String, DecodeError> {
    decode_hex_text("value", hex_value)
}

/// Encode text as `0x`-prefixed lowercase hex of its UTF-8 bytes
pub fn utf8_to_hex(text: &str) -> String {
    format!("0x{}", hex::encode(text.as_bytes()))
}

// ============================================================================
// RAW INBOUND RECORDS
// ============================================================================

/// Integer that web3 may hand over as a JSON number or a decimal string
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(u64),
    Text(String),
}

impl Scalar {
    fn into_u64(self) -> Result<u64, String> {
        match self {
            Scalar::Int(n) => Ok(n),
            Scalar::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("'{}' is not an unsigned integer: {}", s, e)),
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn de_uint<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer)?
        .into_u64()
        .map_err(serde::de::Error::custom)
}

/// Positional permit tuple as returned by the `getPermit` call
#[derive(Deserialize)]
struct RawPermitTuple(
    String,
    String,
    Scalar,
    [String; 3],
    [String; 3],
    Vec<String>,
    Scalar,
);

/// RawPermit - the 7-field permit tuple with positions given names
///
/// Deserializes from the positional JSON array
/// `[exportHex, importHex, typeIndex, exporter[3], importer[3], specimenHashes, nonce]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPermitTuple")]
pub struct RawPermit {
    pub export_country: String,
    pub import_country: String,
    pub permit_type: u64,
    pub exporter: [String; 3],
    pub importer: [String; 3],
    pub specimen_hashes: Vec<String>,
    pub nonce: String,
}

impl TryFrom<RawPermitTuple> for RawPermit {
    type Error = String;

    fn try_from(t: RawPermitTuple) -> Result<Self, Self::Error> {
        Ok(RawPermit {
            export_country: t.0,
            import_country: t.1,
            permit_type: t.2.into_u64()?,
            exporter: t.3,
            importer: t.4,
            specimen_hashes: t.5,
            nonce: t.6.into_text(),
        })
    }
}

/// Positional specimen tuple as returned by the `getSpecimen` call
#[derive(Deserialize)]
struct RawSpecimenTuple(String, Scalar, String, String, String, String, String);

/// RawSpecimen - the 7-field specimen tuple
///
/// `[permitHash, quantity, sciHex, commonHex, descHex, originHash, reExportHash]`
///
/// Quantity is a `uint256` and is kept as the decimal text the node returned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSpecimenTuple")]
pub struct RawSpecimen {
    pub permit_hash: String,
    pub quantity: String,
    pub scientific_name: String,
    pub common_name: String,
    pub description: String,
    pub origin_hash: String,
    pub re_export_hash: String,
}

impl TryFrom<RawSpecimenTuple> for RawSpecimen {
    type Error = String;

    fn try_from(t: RawSpecimenTuple) -> Result<Self, Self::Error> {
        Ok(RawSpecimen {
            permit_hash: t.0,
            quantity: t.1.into_text(),
            scientific_name: t.2,
            common_name: t.3,
            description: t.4,
            origin_hash: t.5,
            re_export_hash: t.6,
        })
    }
}

/// RawEventLog - a past event log as delivered by the chain collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventLog {
    #[serde(deserialize_with = "de_uint")]
    pub block_number: u64,
    pub event: String,
    #[serde(default)]
    pub return_values: BTreeMap<String, Value>,
}

impl RawEventLog {
    /// Build a permit log the way the contract emits it (countries hex-encoded)
    pub fn permit_log(
        event: &str,
        block_number: u64,
        permit_hash: &str,
        export_country: &str,
        import_country: &str,
    ) -> Self {
        let mut return_values = BTreeMap::new();
        return_values.insert("permitHash".to_string(), Value::from(permit_hash));
        return_values.insert("exportCountry".to_string(), Value::from(utf8_to_hex(export_country)));
        return_values.insert("importCountry".to_string(), Value::from(utf8_to_hex(import_country)));
        RawEventLog {
            block_number,
            event: event.to_string(),
            return_values,
        }
    }
}

/// RawBlock - block record exposing a UNIX-seconds timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(deserialize_with = "de_uint")]
    pub number: u64,
    #[serde(deserialize_with = "de_uint")]
    pub timestamp: u64,
}

// ============================================================================
// DECODE
// ============================================================================

fn decode_party(field: &str, lines: &[String; 3]) -> Result<PartyAddress, DecodeError> {
    Ok(PartyAddress {
        name: decode_hex_text(&format!("{}.name", field), &lines[0])?,
        street: decode_hex_text(&format!("{}.street", field), &lines[1])?,
        city: decode_hex_text(&format!("{}.city", field), &lines[2])?,
    })
}

/// Decode a raw permit tuple into a [`Permit`]
pub fn decode_permit(raw: &RawPermit) -> Result<Permit, DecodeError> {
    Ok(Permit {
        export_country: decode_hex_text("exportCountry", &raw.export_country)?,
        import_country: decode_hex_text("importCountry", &raw.import_country)?,
        permit_type: PermitType::from_index(raw.permit_type)?,
        exporter: decode_party("exporter", &raw.exporter)?,
        importer: decode_party("importer", &raw.importer)?,
        specimen_hashes: raw.specimen_hashes.clone(),
        nonce: raw.nonce.clone(),
    })
}

fn check_quantity(quantity: &str) -> Result<&str, DecodeError> {
    if quantity.is_empty() || !quantity.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DecodeError::InvalidQuantity(quantity.to_string()));
    }
    Ok(quantity)
}

/// Decode a raw specimen tuple into a [`Specimen`]
pub fn decode_specimen(raw: &RawSpecimen) -> Result<Specimen, DecodeError> {
    Ok(Specimen {
        permit_hash: raw.permit_hash.clone(),
        quantity: check_quantity(&raw.quantity)?.to_string(),
        scientific_name: decode_hex_text("scientificName", &raw.scientific_name)?,
        common_name: decode_hex_text("commonName", &raw.common_name)?,
        description: decode_hex_text("description", &raw.description)?,
        origin_hash: raw.origin_hash.clone(),
        re_export_hash: raw.re_export_hash.clone(),
    })
}

fn return_value_text(log: &RawEventLog, key: &str) -> Result<String, DecodeError> {
    match log.return_values.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(DecodeError::MalformedReturnValue {
            field: key.to_string(),
            reason: format!("expected string, got {}", other),
        }),
        None => Err(DecodeError::MissingReturnValue(key.to_string())),
    }
}

/// Turn a raw permit event log into a [`PermitEvent`] (no timestamp yet)
pub fn format_event_log(log: &RawEventLog) -> Result<PermitEvent, DecodeError> {
    let permit_hash = return_value_text(log, "permitHash")?;
    let export_country = decode_hex_text("exportCountry", &return_value_text(log, "exportCountry")?)?;
    let import_country = decode_hex_text("importCountry", &return_value_text(log, "importCountry")?)?;

    Ok(PermitEvent::new(
        EventKind::from_event_name(&log.event),
        log.block_number,
        permit_hash,
        export_country,
        import_country,
    ))
}

// ============================================================================
// ENCODE (submission)
// ============================================================================

/// Per-specimen fields transposed into one sequence per field
///
/// The `createPermit` call takes one array per field rather than an array of structs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenColumns {
    pub quantities: Vec<u64>,
    pub scientific_names: Vec<String>,
    pub common_names: Vec<String>,
    pub descriptions: Vec<String>,
    pub origin_hashes: Vec<String>,
    pub re_export_hashes: Vec<String>,
}

impl SpecimenColumns {
    fn push(&mut self, specimen: &CompleteSpecimen<'_>) {
        self.quantities.push(specimen.quantity);
        self.scientific_names.push(utf8_to_hex(specimen.scientific_name));
        self.common_names.push(utf8_to_hex(specimen.common_name));
        self.descriptions.push(utf8_to_hex(specimen.description));
        self.origin_hashes.push(utf8_to_hex(specimen.origin_hash));
        self.re_export_hashes.push(utf8_to_hex(specimen.re_export_hash));
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// Sender/context object appended as the last call argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SenderContext {
    pub from: String,
}

/// CreatePermitArgs - wire-ready arguments of the `createPermit` contract call
///
/// Field order is the deployed contract's parameter order and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermitArgs {
    pub export_country: String,
    pub import_country: String,
    pub permit_type: u8,
    pub importer: [String; 3],
    pub exporter: [String; 3],
    pub specimens: SpecimenColumns,
    pub sender: SenderContext,
}

impl CreatePermitArgs {
    /// Ordered positional argument list for the contract call
    pub fn to_call_arguments(&self) -> Vec<Value> {
        let s = &self.specimens;
        vec![
            Value::from(self.export_country.clone()),
            Value::from(self.import_country.clone()),
            Value::from(self.permit_type),
            Value::from(self.importer.to_vec()),
            Value::from(self.exporter.to_vec()),
            Value::from(s.quantities.clone()),
            Value::from(s.scientific_names.clone()),
            Value::from(s.common_names.clone()),
            Value::from(s.descriptions.clone()),
            Value::from(s.origin_hashes.clone()),
            Value::from(s.re_export_hashes.clone()),
            serde_json::json!({ "from": self.sender.from }),
        ]
    }
}

struct CompleteSpecimen<'a> {
    quantity: u64,
    scientific_name: &'a str,
    common_name: &'a str,
    description: &'a str,
    origin_hash: &'a str,
    re_export_hash: &'a str,
}

fn require<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, SubmissionEncodingError> {
    value
        .as_deref()
        .ok_or(SubmissionEncodingError::MissingPermitField(field))
}

fn require_specimen<'a>(
    index: usize,
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, SubmissionEncodingError> {
    value
        .as_deref()
        .ok_or(SubmissionEncodingError::MissingSpecimenField { index, field })
}

fn complete_specimen(index: usize, draft: &SpecimenDraft) -> Result<CompleteSpecimen<'_>, SubmissionEncodingError> {
    Ok(CompleteSpecimen {
        quantity: draft
            .quantity
            .ok_or(SubmissionEncodingError::MissingSpecimenField { index, field: "quantity" })?,
        scientific_name: require_specimen(index, &draft.scientific_name, "scientificName")?,
        common_name: require_specimen(index, &draft.common_name, "commonName")?,
        description: require_specimen(index, &draft.description, "description")?,
        origin_hash: require_specimen(index, &draft.origin_hash, "originHash")?,
        re_export_hash: require_specimen(index, &draft.re_export_hash, "reExportHash")?,
    })
}

fn encode_party(lines: &[Option<String>; 3], fields: [&'static str; 3]) -> Result<[String; 3], SubmissionEncodingError> {
    Ok([
        utf8_to_hex(require(&lines[0], fields[0])?),
        utf8_to_hex(require(&lines[1], fields[1])?),
        utf8_to_hex(require(&lines[2], fields[2])?),
    ])
}

/// Encode a drafted permit and its specimens for the `createPermit` call
///
/// Every required field is checked before anything is encoded.
pub fn encode_permit_for_submission(
    draft: &PermitDraft,
    specimens: &[SpecimenDraft],
    sender: &AccountAddress,
) -> Result<CreatePermitArgs, SubmissionEncodingError> {
    let export_country = require(&draft.export_country, "exportCountry")?;
    let import_country = require(&draft.import_country, "importCountry")?;
    let permit_type = draft
        .permit_type
        .ok_or(SubmissionEncodingError::MissingPermitField("permitType"))?;
    let importer = encode_party(&draft.importer, ["importer.name", "importer.street", "importer.city"])?;
    let exporter = encode_party(&draft.exporter, ["exporter.name", "exporter.street", "exporter.city"])?;

    if specimens.is_empty() {
        return Err(SubmissionEncodingError::NoSpecimens);
    }
    let complete = specimens
        .iter()
        .enumerate()
        .map(|(i, s)| complete_specimen(i, s))
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = SpecimenColumns::default();
    for specimen in &complete {
        columns.push(specimen);
    }

    Ok(CreatePermitArgs {
        export_country: utf8_to_hex(export_country),
        import_country: utf8_to_hex(import_country),
        permit_type: permit_type.index(),
        importer,
        exporter,
        specimens: columns,
        sender: SenderContext {
            from: sender.as_str().to_string(),
        },
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permit::{PERMIT_CONFIRMED_EVENT, PERMIT_CREATED_EVENT};

    fn sender() -> AccountAddress {
        AccountAddress::parse("0x627306090abab3a6e1400e9345bc60c78a8bef57").unwrap()
    }

    fn create_test_draft() -> PermitDraft {
        PermitDraft::default()
            .with_export_country("DE")
            .with_import_country("CH")
            .with_permit_type(PermitType::ReExport)
            .with_exporter_line(0, "Tierpark Berlin")
            .with_exporter_line(1, "Am Tierpark 125")
            .with_exporter_line(2, "Berlin")
            .with_importer_line(0, "Zoo Zürich")
            .with_importer_line(1, "Zürichbergstrasse 221")
            .with_importer_line(2, "Zürich")
    }

    fn create_test_specimen(quantity: u64, scientific: &str, common: &str) -> SpecimenDraft {
        SpecimenDraft {
            quantity: Some(quantity),
            scientific_name: Some(scientific.to_string()),
            common_name: Some(common.to_string()),
            description: Some(format!("{} (live)", common)),
            origin_hash: Some("origin".to_string()),
            re_export_hash: Some(String::new()),
        }
    }

    #[test]
    fn test_hex_text_round_trip() {
        for text in ["DE", "", "Zürichbergstrasse 221", "Panthera tigris"] {
            assert_eq!(hex_to_utf8(&utf8_to_hex(text)).unwrap(), text);
        }
        assert_eq!(utf8_to_hex("DE"), "0x4445");
    }

    #[test]
    fn test_hex_text_strips_nul_padding() {
        assert_eq!(hex_to_utf8("0x4445000000").unwrap(), "DE");
        assert_eq!(hex_to_utf8("0x0000444500").unwrap(), "DE");
        assert_eq!(hex_to_utf8("4445").unwrap(), "DE");
        assert_eq!(hex_to_utf8("0x").unwrap(), "");
    }

    #[test]
    fn test_hex_text_rejects_malformed() {
        assert!(matches!(
            decode_hex_text("exportCountry", "0x444"),
            Err(DecodeError::InvalidHex { ref field, .. }) if field == "exportCountry"
        ));
        assert!(matches!(hex_to_utf8("0xzz"), Err(DecodeError::InvalidHex { .. })));
        assert!(matches!(hex_to_utf8("0xff"), Err(DecodeError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_decode_permit_from_tuple_json() {
        let json = serde_json::json!([
            "0x4445",
            "0x4348",
            "1",
            ["0x41", "0x42", "0x43"],
            ["0x44", "0x45", "0x46"],
            ["0xaaa", "0xbbb"],
            "7"
        ]);
        let raw: RawPermit = serde_json::from_value(json).unwrap();
        let permit = decode_permit(&raw).unwrap();

        assert_eq!(permit.export_country, "DE");
        assert_eq!(permit.import_country, "CH");
        assert_eq!(permit.permit_type, PermitType::ReExport);
        assert_eq!(permit.exporter.name, "A");
        assert_eq!(permit.exporter.city, "C");
        assert_eq!(permit.importer.street, "E");
        assert_eq!(permit.specimen_hashes, vec!["0xaaa", "0xbbb"]);
        assert_eq!(permit.nonce, "7");
    }

    #[test]
    fn test_decode_permit_type_out_of_range() {
        let raw = RawPermit {
            export_country: "0x4445".to_string(),
            import_country: "0x4348".to_string(),
            permit_type: 3,
            exporter: ["0x".to_string(), "0x".to_string(), "0x".to_string()],
            importer: ["0x".to_string(), "0x".to_string(), "0x".to_string()],
            specimen_hashes: vec![],
            nonce: "0".to_string(),
        };

        assert_eq!(decode_permit(&raw), Err(DecodeError::PermitTypeOutOfRange(3)));
    }

    #[test]
    fn test_decode_specimen_from_tuple_json() {
        let json = serde_json::json!([
            "0xpermit",
            12,
            utf8_to_hex("Panthera tigris"),
            utf8_to_hex("Tiger"),
            utf8_to_hex("live animal"),
            "0xorigin",
            "0x"
        ]);
        let raw: RawSpecimen = serde_json::from_value(json).unwrap();
        let specimen = decode_specimen(&raw).unwrap();

        assert_eq!(specimen.permit_hash, "0xpermit");
        assert_eq!(specimen.quantity, "12");
        assert_eq!(specimen.scientific_name, "Panthera tigris");
        assert_eq!(specimen.common_name, "Tiger");
        assert_eq!(specimen.description, "live animal");
        assert_eq!(specimen.origin_hash, "0xorigin");
        assert_eq!(specimen.re_export_hash, "0x");
    }

    #[test]
    fn test_specimen_quantity_beyond_u64_passes_through() {
        let json = serde_json::json!(["0x1", "18446744073709551616", "0x", "0x", "0x", "0x", "0x"]);
        let raw: RawSpecimen = serde_json::from_value(json).unwrap();

        let specimen = decode_specimen(&raw).unwrap();
        assert_eq!(specimen.quantity, "18446744073709551616");
    }

    #[test]
    fn test_specimen_non_numeric_quantity_is_decode_error() {
        let json = serde_json::json!(["0x1", "lots", "0x", "0x", "0x", "0x", "0x"]);
        let raw: RawSpecimen = serde_json::from_value(json).unwrap();

        assert_eq!(
            decode_specimen(&raw),
            Err(DecodeError::InvalidQuantity("lots".to_string()))
        );
        let negative = RawSpecimen { quantity: "-3".to_string(), ..raw };
        assert!(decode_specimen(&negative).is_err());
    }

    #[test]
    fn test_encode_then_decode_reproduces_text() {
        let draft = create_test_draft();
        let specimens = vec![
            create_test_specimen(2, "Panthera tigris", "Tiger"),
            create_test_specimen(5, "Python regius", "Ball python"),
        ];
        let args = encode_permit_for_submission(&draft, &specimens, &sender()).unwrap();

        // Feed the encoded fields back through the decoder
        let raw = RawPermit {
            export_country: args.export_country.clone(),
            import_country: args.import_country.clone(),
            permit_type: args.permit_type as u64,
            exporter: args.exporter.clone(),
            importer: args.importer.clone(),
            specimen_hashes: vec![],
            nonce: "0".to_string(),
        };
        let permit = decode_permit(&raw).unwrap();
        assert_eq!(permit.export_country, "DE");
        assert_eq!(permit.import_country, "CH");
        assert_eq!(permit.permit_type, PermitType::ReExport);
        assert_eq!(permit.importer.name, "Zoo Zürich");
        assert_eq!(permit.exporter.street, "Am Tierpark 125");

        for (i, original) in specimens.iter().enumerate() {
            let raw = RawSpecimen {
                permit_hash: "0x1".to_string(),
                quantity: args.specimens.quantities[i].to_string(),
                scientific_name: args.specimens.scientific_names[i].clone(),
                common_name: args.specimens.common_names[i].clone(),
                description: args.specimens.descriptions[i].clone(),
                origin_hash: args.specimens.origin_hashes[i].clone(),
                re_export_hash: args.specimens.re_export_hashes[i].clone(),
            };
            let decoded = decode_specimen(&raw).unwrap();
            assert_eq!(Some(decoded.quantity), original.quantity.map(|q| q.to_string()));
            assert_eq!(Some(decoded.scientific_name), original.scientific_name);
            assert_eq!(Some(decoded.common_name), original.common_name);
            assert_eq!(Some(decoded.description), original.description);
        }
    }

    #[test]
    fn test_encode_transposes_in_specimen_order() {
        let specimens = vec![
            create_test_specimen(1, "A", "a"),
            create_test_specimen(2, "B", "b"),
            create_test_specimen(3, "C", "c"),
        ];
        let args = encode_permit_for_submission(&create_test_draft(), &specimens, &sender()).unwrap();

        assert_eq!(args.specimens.len(), 3);
        assert_eq!(args.specimens.quantities, vec![1, 2, 3]);
        assert_eq!(
            args.specimens.scientific_names,
            vec![utf8_to_hex("A"), utf8_to_hex("B"), utf8_to_hex("C")]
        );
        assert_eq!(args.specimens.origin_hashes[0], utf8_to_hex("origin"));
        assert_eq!(args.specimens.re_export_hashes[2], "0x");
    }

    #[test]
    fn test_call_arguments_order() {
        let specimens = vec![create_test_specimen(4, "Panthera tigris", "Tiger")];
        let args = encode_permit_for_submission(&create_test_draft(), &specimens, &sender()).unwrap();
        let call = args.to_call_arguments();

        assert_eq!(call.len(), 12);
        assert_eq!(call[0], Value::from(utf8_to_hex("DE")));
        assert_eq!(call[1], Value::from(utf8_to_hex("CH")));
        assert_eq!(call[2], Value::from(1u8));
        // importer comes before exporter in the contract signature
        assert_eq!(call[3][0], Value::from(utf8_to_hex("Zoo Zürich")));
        assert_eq!(call[4][0], Value::from(utf8_to_hex("Tierpark Berlin")));
        assert_eq!(call[5], serde_json::json!([4]));
        assert_eq!(call[11]["from"], "0x627306090abab3a6e1400e9345bc60c78a8bef57");
    }

    #[test]
    fn test_encode_rejects_missing_fields() {
        let specimens = vec![create_test_specimen(1, "A", "a")];

        let mut draft = create_test_draft();
        draft.import_country = None;
        assert_eq!(
            encode_permit_for_submission(&draft, &specimens, &sender()),
            Err(SubmissionEncodingError::MissingPermitField("importCountry"))
        );

        let mut draft = create_test_draft();
        draft.exporter[1] = None;
        assert_eq!(
            encode_permit_for_submission(&draft, &specimens, &sender()),
            Err(SubmissionEncodingError::MissingPermitField("exporter.street"))
        );

        assert_eq!(
            encode_permit_for_submission(&create_test_draft(), &[], &sender()),
            Err(SubmissionEncodingError::NoSpecimens)
        );

        let mut broken = create_test_specimen(1, "B", "b");
        broken.common_name = None;
        assert_eq!(
            encode_permit_for_submission(&create_test_draft(), &[specimens[0].clone(), broken], &sender()),
            Err(SubmissionEncodingError::MissingSpecimenField { index: 1, field: "commonName" })
        );
    }

    #[test]
    fn test_format_event_log() {
        let created = RawEventLog::permit_log(PERMIT_CREATED_EVENT, 5, "0xA", "DE", "CH");
        let event = format_event_log(&created).unwrap();
        assert_eq!(event.kind, EventKind::Created);
        assert_eq!(event.block_number, 5);
        assert_eq!(event.permit_hash, "0xA");
        assert_eq!(event.export_country, "DE");
        assert_eq!(event.import_country, "CH");
        assert_eq!(event.timestamp, None);

        let confirmed = RawEventLog::permit_log(PERMIT_CONFIRMED_EVENT, 9, "0xA", "DE", "CH");
        assert_eq!(format_event_log(&confirmed).unwrap().kind, EventKind::Processed);
    }

    #[test]
    fn test_format_event_log_from_web3_json() {
        let log: RawEventLog = serde_json::from_value(serde_json::json!({
            "blockNumber": 42,
            "event": "PermitCreated",
            "returnValues": {
                "0": "0x1",
                "permitHash": "0x1",
                "exportCountry": "0x4445",
                "importCountry": "0x4348"
            }
        }))
        .unwrap();

        let event = format_event_log(&log).unwrap();
        assert_eq!(event.block_number, 42);
        assert_eq!(event.export_country, "DE");
    }

    #[test]
    fn test_format_event_log_missing_return_value() {
        let mut log = RawEventLog::permit_log(PERMIT_CREATED_EVENT, 1, "0x1", "DE", "CH");
        log.return_values.remove("importCountry");

        assert_eq!(
            format_event_log(&log),
            Err(DecodeError::MissingReturnValue("importCountry".to_string()))
        );
    }
}
