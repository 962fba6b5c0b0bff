//! Wallet connection lifecycle and passive wallet-event handling.

use crate::{
    Result,
    config::ClientConfig,
    error::Error,
    provider::{
        WalletNotification,
        WalletProvider,
    },
    types::Address,
};
use std::sync::{
    Arc,
    Mutex,
};
use tracing::{
    info,
    warn,
};

/// Presentation-facing snapshot of the wallet session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectionState {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected: bool,
    pub connecting: bool,
    pub error: Option<String>,
}

/// Owns the provider handle, the session state, and the active contract
/// binding. `None` for the provider models a host with no wallet installed.
pub struct ChainConnection<P: WalletProvider> {
    provider: Option<Arc<P>>,
    config: ClientConfig,
    state: Arc<Mutex<ConnectionState>>,
    binding: Arc<Mutex<Option<P::Contract>>>,
}

impl<P: WalletProvider> Clone for ChainConnection<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            binding: Arc::clone(&self.binding),
        }
    }
}

impl<P: WalletProvider> ChainConnection<P> {
    pub fn new(provider: Option<P>, config: ClientConfig) -> Self {
        Self {
            provider: provider.map(Arc::new),
            config,
            state: Arc::new(Mutex::new(ConnectionState::default())),
            binding: Arc::new(Mutex::new(None)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn account(&self) -> Option<Address> {
        self.state.lock().unwrap().account
    }

    pub fn binding(&self) -> Option<P::Contract> {
        self.binding.lock().unwrap().clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect the wallet: request accounts, make sure the active network is
    /// the configured one (switching or registering it as needed), then bind
    /// the contract. On failure the state carries the user-facing error.
    pub async fn connect(&self) -> Result<()> {
        let result = self.connect_inner().await;
        {
            let mut state = self.state.lock().unwrap();
            state.connecting = false;
            if let Err(err) = &result {
                state.error = Some(err.user_message());
            }
        }
        result
    }

    async fn connect_inner(&self) -> Result<()> {
        let provider = self.provider.as_ref().ok_or(Error::NoWallet)?;

        {
            let mut state = self.state.lock().unwrap();
            state.connecting = true;
            state.error = None;
        }

        let accounts = provider.request_accounts().await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| Error::Wallet("no accounts returned by the wallet".to_owned()))?;

        let target = self.config.chain.chain_id;
        let mut chain_id = provider.chain_id().await?;
        if chain_id != target {
            self.switch_to_target(provider).await?;
            chain_id = provider.chain_id().await?;
            if chain_id != target {
                return Err(Error::WrongNetwork { expected: target });
            }
        }

        let contract = provider.bind_contract(self.config.contract_address, account)?;

        {
            let mut state = self.state.lock().unwrap();
            state.account = Some(account);
            state.chain_id = Some(chain_id);
            state.connected = true;
            state.error = None;
        }
        *self.binding.lock().unwrap() = Some(contract);

        info!(%account, chain_id, "wallet connected");
        Ok(())
    }

    /// Switch to the configured chain, registering it with the wallet first
    /// when it reports the chain as unknown.
    async fn switch_to_target(&self, provider: &P) -> Result<()> {
        let target = self.config.chain.chain_id;
        match provider.switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unknown_chain() => {
                info!(chain_id = target, "registering unknown chain with the wallet");
                provider.add_chain(&self.config.chain).await.map_err(|err| {
                    if err.is_user_rejection() {
                        Error::UserRejected
                    } else {
                        Error::WrongNetwork { expected: target }
                    }
                })
            }
            Err(err) if err.is_user_rejection() => Err(Error::UserRejected),
            Err(_) => Err(Error::WrongNetwork { expected: target }),
        }
    }

    /// Full reset. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        *self.state.lock().unwrap() = ConnectionState::default();
        *self.binding.lock().unwrap() = None;
        info!("wallet disconnected");
    }

    /// Silently resume a previously authorized session. Only connects when
    /// the wallet is already on the configured network; never surfaces errors.
    pub async fn try_resume(&self) {
        let Some(provider) = self.provider.as_ref() else {
            return;
        };
        let accounts = match provider.authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(%err, "silent account probe failed");
                return;
            }
        };
        if accounts.is_empty() {
            return;
        }
        match provider.chain_id().await {
            Ok(chain_id) if chain_id == self.config.chain.chain_id => {
                if let Err(err) = self.connect().await {
                    warn!(%err, "session resume failed");
                }
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "chain probe failed during resume"),
        }
    }

    /// React to a passive wallet-side event.
    pub fn handle_notification(&self, notification: WalletNotification) {
        match notification {
            WalletNotification::AccountsChanged(accounts) => match accounts.first().copied() {
                None => self.disconnect(),
                Some(account) => {
                    if self.account() != Some(account) {
                        self.switch_account(account);
                    }
                }
            },
            WalletNotification::ChainChanged(chain_id) => self.handle_chain_changed(chain_id),
        }
    }

    fn switch_account(&self, account: Address) {
        if let Some(provider) = self.provider.as_ref() {
            match provider.bind_contract(self.config.contract_address, account) {
                Ok(contract) => *self.binding.lock().unwrap() = Some(contract),
                Err(err) => warn!(%err, "contract rebind failed after account switch"),
            }
        }
        self.state.lock().unwrap().account = Some(account);
        info!(%account, "active account switched");
    }

    fn handle_chain_changed(&self, chain_id: u64) {
        let mut state = self.state.lock().unwrap();
        state.chain_id = Some(chain_id);
        if chain_id == self.config.chain.chain_id {
            state.error = None;
            // Account survives a network round trip; the session recovers.
            state.connected = state.account.is_some();
        } else {
            state.error = Some(format!("Please switch to {}", self.config.chain.name));
            state.connected = false;
        }
    }
}

impl<P> ChainConnection<P>
where
    P: WalletProvider + Send + Sync + 'static,
    P::Contract: Send,
{
    /// Drive the provider's notification feed until it closes.
    pub fn spawn_notification_listener(&self) -> tokio::task::JoinHandle<()> {
        let connection = self.clone();
        let mut notifications = match connection.provider.as_ref() {
            Some(provider) => provider.notifications(),
            None => {
                let (_sender, receiver) = tokio::sync::mpsc::unbounded_channel();
                receiver
            }
        };
        tokio::spawn(async move {
            while let Some(notification) = notifications.recv().await {
                connection.handle_notification(notification);
            }
        })
    }
}
