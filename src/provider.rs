//! Wallet boundary. Everything the coordinator needs from a wallet provider
//! is behind [`WalletProvider`], so the pipeline runs against fakes in tests.

use crate::{
    config::ChainSpec,
    contract::PaintContract,
    types::Address,
};
use std::fmt;
use tokio::sync::mpsc;

/// EIP-1193 code for a request the user declined.
pub const ERROR_CODE_USER_REJECTED: i64 = 4001;

/// EIP-3085 code for a chain the wallet has not been told about.
pub const ERROR_CODE_UNKNOWN_CHAIN: i64 = 4902;

/// Raw failure reported by the wallet. Classification into the crate error
/// taxonomy happens in [`crate::error::Error::classify`].
#[derive(Clone, Debug)]
pub struct ProviderError {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(ERROR_CODE_USER_REJECTED)
    }

    pub fn is_unknown_chain(&self) -> bool {
        self.code == Some(ERROR_CODE_UNKNOWN_CHAIN)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "provider error {}: {}", code, self.message),
            None => write!(f, "provider error: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Passive wallet-side events the connection reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletNotification {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

pub trait WalletProvider {
    type Contract: PaintContract;

    /// Ask the wallet for accounts, prompting the user if necessary.
    fn request_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<Address>, ProviderError>> + Send;

    /// Accounts already authorized for this origin. Never prompts.
    fn authorized_accounts(
        &self,
    ) -> impl Future<Output = Result<Vec<Address>, ProviderError>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<u64, ProviderError>> + Send;

    fn switch_chain(
        &self,
        chain_id: u64,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Register a network the wallet does not know. Wallets switch to the new
    /// network as part of a successful add.
    fn add_chain(
        &self,
        spec: &ChainSpec,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Bind the paint contract at `address` with `signer` as the sender.
    fn bind_contract(
        &self,
        address: Address,
        signer: Address,
    ) -> Result<Self::Contract, ProviderError>;

    /// Subscribe to account and chain change notifications.
    fn notifications(&self) -> mpsc::UnboundedReceiver<WalletNotification>;
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn provider_error__recognizes_wire_codes() {
        assert!(ProviderError::new("no").with_code(4001).is_user_rejection());
        assert!(ProviderError::new("?").with_code(4902).is_unknown_chain());
        assert!(!ProviderError::new("boom").is_user_rejection());
        assert!(!ProviderError::new("boom").is_unknown_chain());
    }

    #[test]
    fn provider_error__display_includes_code_when_present() {
        let with = ProviderError::new("denied").with_code(4001);
        assert_eq!(with.to_string(), "provider error 4001: denied");
        let without = ProviderError::new("denied");
        assert_eq!(without.to_string(), "provider error: denied");
    }
}
