// 🚦 Transaction Status - explicit state machine for a submitted contract call
// Idle → Pending → Succeeded | Failed, driven by discrete observations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TxState {
    #[default]
    Idle,
    /// Submitted, hash not yet known
    Submitted,
    Pending { tx_hash: String },
    Succeeded { tx_hash: String },
    Failed { tx_hash: Option<String>, status: String },
}

/// Something the transaction-tracking collaborator reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxObservation {
    Submitted,
    HashObserved { tx_hash: String },
    StatusReported { tx_hash: String, status: String },
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Unknown,
    Ok,
    Critical,
}

/// Message shown to the user for the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: &'static str,
}

impl TxState {
    fn tracked_hash(&self) -> Option<&str> {
        match self {
            TxState::Pending { tx_hash } | TxState::Succeeded { tx_hash } => Some(tx_hash.as_str()),
            TxState::Failed { tx_hash, .. } => tx_hash.as_deref(),
            TxState::Idle | TxState::Submitted => None,
        }
    }

    /// Next state after `observation`
    ///
    /// Status reports for a hash other than the tracked one are ignored.
    pub fn apply(&self, observation: &TxObservation) -> TxState {
        match observation {
            TxObservation::Reset => TxState::Idle,
            TxObservation::Submitted => TxState::Submitted,
            TxObservation::HashObserved { tx_hash } => match self {
                TxState::Pending { tx_hash: current } if current == tx_hash => self.clone(),
                TxState::Succeeded { .. } | TxState::Failed { .. }
                    if self.tracked_hash() == Some(tx_hash.as_str()) =>
                {
                    self.clone()
                }
                _ => TxState::Pending {
                    tx_hash: tx_hash.clone(),
                },
            },
            TxObservation::StatusReported { tx_hash, status } => {
                if self.tracked_hash() != Some(tx_hash.as_str()) {
                    return self.clone();
                }
                match status.as_str() {
                    "pending" => TxState::Pending {
                        tx_hash: tx_hash.clone(),
                    },
                    "success" => TxState::Succeeded {
                        tx_hash: tx_hash.clone(),
                    },
                    other => TxState::Failed {
                        tx_hash: Some(tx_hash.clone()),
                        status: other.to_string(),
                    },
                }
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Succeeded { .. } | TxState::Failed { .. })
    }

    pub fn notice(&self) -> Option<Notice> {
        match self {
            TxState::Idle => None,
            TxState::Submitted | TxState::Pending { .. } => Some(Notice {
                level: NoticeLevel::Unknown,
                text: "Permit creation is pending...",
            }),
            TxState::Succeeded { .. } => Some(Notice {
                level: NoticeLevel::Ok,
                text: "Permit creation was successful!",
            }),
            TxState::Failed { .. } => Some(Notice {
                level: NoticeLevel::Critical,
                text: "Permit creation failed.",
            }),
        }
    }
}
