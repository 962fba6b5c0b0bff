//! Error taxonomy and classification of raw provider failures.

use crate::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no wallet provider available")]
    NoWallet,

    #[error("user rejected the request")]
    UserRejected,

    #[error("wallet is on the wrong network, expected chain {expected}")]
    WrongNetwork { expected: u64 },

    #[error("contract is not deployed at the configured address")]
    ContractNotDeployed,

    #[error("insufficient funds for transaction")]
    InsufficientFunds,

    #[error("network error: {0}")]
    Network(String),

    #[error("gas estimation failed")]
    GasEstimation,

    #[error("transaction reverted")]
    TransactionFailed,

    #[error("painting fee could not be resolved")]
    FeeUnavailable,

    #[error("coordinate ({x}, {y}) is outside the grid")]
    CoordinateOutOfBounds { x: u8, y: u8 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid {kind}: {value}")]
    Invalid { kind: &'static str, value: String },

    #[error("wallet error: {0}")]
    Wallet(String),
}

impl Error {
    /// Map a raw provider failure onto the taxonomy. Wallets do not agree on
    /// error codes, so the message text is inspected as a fallback.
    pub fn classify(raw: ProviderError) -> Self {
        if raw.is_user_rejection() {
            return Error::UserRejected;
        }
        let message = raw.message.to_lowercase();
        if message.contains("user rejected") || message.contains("user denied") {
            Error::UserRejected
        } else if message.contains("insufficient funds") {
            Error::InsufficientFunds
        } else if message.contains("could not decode result data") {
            Error::ContractNotDeployed
        } else if message.contains("network") {
            Error::Network(raw.message)
        } else if message.contains("gas") {
            Error::GasEstimation
        } else {
            Error::Wallet(raw.message)
        }
    }

    /// The single human-readable line published to the status channel.
    pub fn user_message(&self) -> String {
        match self {
            Error::NoWallet => "No wallet detected. Please install a wallet extension.".to_owned(),
            Error::UserRejected => "Transaction rejected by user".to_owned(),
            Error::WrongNetwork { .. } => {
                "Wrong network. Please switch to the configured network.".to_owned()
            }
            Error::ContractNotDeployed => {
                "Smart contract not deployed. Please deploy the contract first.".to_owned()
            }
            Error::InsufficientFunds => "Insufficient funds for transaction".to_owned(),
            Error::Network(_) => {
                "Network error. Please check your connection and try again.".to_owned()
            }
            Error::GasEstimation => "Gas estimation failed. Please try again.".to_owned(),
            Error::FeeUnavailable => {
                "Could not get painting fee. Contract may not be deployed.".to_owned()
            }
            Error::TransactionFailed
            | Error::CoordinateOutOfBounds { .. }
            | Error::Storage(_)
            | Error::Invalid { .. }
            | Error::Wallet(_) => "Transaction failed".to_owned(),
        }
    }
}

impl From<ProviderError> for Error {
    fn from(raw: ProviderError) -> Self {
        Error::classify(raw)
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
