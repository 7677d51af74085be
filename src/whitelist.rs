// 🛂 Whitelist - validated authority addresses and whitelist contract calls
// Addresses are parsed once; downstream code never re-checks validity

use crate::codec::{decode_hex_text, utf8_to_hex};
use crate::error::{AddressError, DecodeError, LookupError, WhitelistError};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

// ============================================================================
// ACCOUNT ADDRESS
// ============================================================================

/// AccountAddress - a `0x`-prefixed 20-byte account address
///
/// Only constructible through [`AccountAddress::parse`]. Case is preserved;
/// mixed-case checksums are not verified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if digits.len() != 40 {
            return Err(AddressError::WrongLength(trimmed.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::NotHex(trimmed.to_string()));
        }

        Ok(AccountAddress(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive identity (two spellings of one account compare equal)
    pub fn same_account(&self, other: &AccountAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        AccountAddress::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Decode the value of `authorityToCountry(account)` into a country code
pub fn authority_country(raw_hex: &str) -> Result<String, DecodeError> {
    decode_hex_text("authorityToCountry", raw_hex)
}

// ============================================================================
// CONTRACT CALLS
// ============================================================================

/// WhitelistCall - a state-changing call against the whitelist contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhitelistCall {
    AddAddress {
        address: AccountAddress,
        country_hex: String,
    },
    RemoveAddress {
        address: AccountAddress,
    },
    RemoveAddresses {
        addresses: Vec<AccountAddress>,
    },
}

impl WhitelistCall {
    /// Whitelist `address` for `country` (plain text, hex-encoded here)
    pub fn add(address: AccountAddress, country: &str) -> Self {
        WhitelistCall::AddAddress {
            address,
            country_hex: utf8_to_hex(country),
        }
    }

    pub fn remove(address: AccountAddress) -> Self {
        WhitelistCall::RemoveAddress { address }
    }

    pub fn method(&self) -> &'static str {
        match self {
            WhitelistCall::AddAddress { .. } => "addAddress",
            WhitelistCall::RemoveAddress { .. } => "removeAddress",
            WhitelistCall::RemoveAddresses { .. } => "removeAddresses",
        }
    }

    /// Ordered call arguments, ending with the sender context
    pub fn arguments(&self, sender: &AccountAddress) -> Vec<Value> {
        let mut args = match self {
            WhitelistCall::AddAddress { address, country_hex } => {
                vec![Value::from(address.as_str()), Value::from(country_hex.as_str())]
            }
            WhitelistCall::RemoveAddress { address } => vec![Value::from(address.as_str())],
            WhitelistCall::RemoveAddresses { addresses } => vec![Value::from(
                addresses.iter().map(|a| a.as_str().to_string()).collect::<Vec<_>>(),
            )],
        };
        args.push(serde_json::json!({ "from": sender.as_str() }));
        args
    }
}

// ============================================================================
// COUNTRY WHITELIST VIEW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhitelistEntry {
    /// 1-based row number
    pub number: usize,
    pub address: AccountAddress,
    pub whitelisted: bool,
}

impl WhitelistEntry {
    /// The call that flips this entry's status
    pub fn toggle_call(&self, country: &str) -> WhitelistCall {
        if self.whitelisted {
            WhitelistCall::remove(self.address.clone())
        } else {
            WhitelistCall::add(self.address.clone(), country)
        }
    }
}

/// CountryWhitelist - every address ever registered for a country with its current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryWhitelist {
    pub country: String,
    pub entries: Vec<WhitelistEntry>,
}

impl CountryWhitelist {
    /// Pair the per-country address list with the looked-up statuses
    pub fn from_lookup(
        country: &str,
        addresses: &[AccountAddress],
        statuses: &[bool],
    ) -> Result<Self, WhitelistError> {
        if addresses.len() != statuses.len() {
            return Err(WhitelistError::StatusCountMismatch {
                addresses: addresses.len(),
                statuses: statuses.len(),
            });
        }

        let entries = addresses
            .iter()
            .zip(statuses)
            .enumerate()
            .map(|(i, (address, whitelisted))| WhitelistEntry {
                number: i + 1,
                address: address.clone(),
                whitelisted: *whitelisted,
            })
            .collect();

        Ok(CountryWhitelist {
            country: country.to_string(),
            entries,
        })
    }

    pub fn whitelisted(&self) -> impl Iterator<Item = &WhitelistEntry> {
        self.entries.iter().filter(|e| e.whitelisted)
    }
}

/// Collaborator answering `whitelist(address)` calls
#[async_trait]
pub trait WhitelistSource: Send + Sync {
    async fn is_whitelisted(&self, address: &AccountAddress) -> anyhow::Result<bool>;
}

/// Look up every address's status concurrently; one failure fails the batch
pub async fn fetch_whitelist_statuses<S: WhitelistSource + ?Sized>(
    source: &S,
    addresses: &[AccountAddress],
) -> Result<Vec<bool>, LookupError> {
    debug!(count = addresses.len(), "looking up whitelist statuses");

    try_join_all(addresses.iter().map(|address| async move {
        source
            .is_whitelisted(address)
            .await
            .map_err(|e| LookupError::WhitelistStatus {
                address: address.to_string(),
                reason: e.to_string(),
            })
    }))
    .await
}

/// Parse user-supplied address strings, failing on the first invalid one
pub fn parse_addresses<T: AsRef<str>>(raw: &[T]) -> Result<Vec<AccountAddress>, WhitelistError> {
    Ok(raw
        .iter()
        .map(|a| AccountAddress::parse(a.as_ref()))
        .collect::<Result<Vec<_>, _>>()?)
}

/// Build the numbered whitelist view of `country` for the given addresses
pub async fn load_country_whitelist<S, T>(
    source: &S,
    country: &str,
    raw_addresses: &[T],
) -> Result<CountryWhitelist, WhitelistError>
where
    S: WhitelistSource + ?Sized,
    T: AsRef<str>,
{
    let addresses = parse_addresses(raw_addresses)?;
    let statuses = fetch_whitelist_statuses(source, &addresses).await?;
    CountryWhitelist::from_lookup(country, &addresses, &statuses)
}

// ============================================================================
// SELECTION
// ============================================================================

/// Selection - addresses ticked for bulk removal, in the order they were ticked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    addresses: Vec<AccountAddress>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// New selection with `address` added if absent, removed if present
    pub fn toggled(&self, address: &AccountAddress) -> Selection {
        let mut addresses = self.addresses.clone();
        match addresses.iter().position(|a| a == address) {
            Some(i) => {
                addresses.remove(i);
            }
            None => addresses.push(address.clone()),
        }
        Selection { addresses }
    }

    pub fn contains(&self, address: &AccountAddress) -> bool {
        self.addresses.contains(address)
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn addresses(&self) -> &[AccountAddress] {
        &self.addresses
    }

    /// Bulk removal call, only when something is selected
    pub fn removal_call(&self) -> Option<WhitelistCall> {
        if self.addresses.is_empty() {
            None
        } else {
            Some(WhitelistCall::RemoveAddresses {
                addresses: self.addresses.clone(),
            })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
