//! The paint-transaction state machine.

use crate::{
    Result,
    cache::LocalStateCache,
    connection::ChainConnection,
    contract::PaintContract,
    error::Error,
    fee::{
        FeeOracle,
        FeeQuote,
    },
    provider::WalletProvider,
    status::{
        StatusChannel,
        StatusKind,
    },
    store::{
        NullPixelStore,
        PixelStore,
    },
    types::{
        Coordinate,
        PaintRecord,
    },
};
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
};
use tracing::{
    error,
    info,
    warn,
};

/// Where the current (or last) submission sits in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubmitPhase {
    Idle,
    Preparing,
    AwaitingUserConfirmation,
    Submitted,
    Confirmed,
    Failed,
}

impl SubmitPhase {
    fn is_terminal(self) -> bool {
        matches!(self, SubmitPhase::Confirmed | SubmitPhase::Failed)
    }
}

/// How a submission ended. `Rejected` covers the silent preconditions: the
/// caller gets an answer but no state or status changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Confirmed,
    Failed,
    Rejected,
}

/// Coordinates one paint submission at a time over a wallet connection, a fee
/// oracle, the local pixel cache and the status channel.
pub struct PixelPainter<P: WalletProvider, S: PixelStore = NullPixelStore> {
    connection: ChainConnection<P>,
    fee_oracle: FeeOracle,
    cache: LocalStateCache<S>,
    status: StatusChannel,
    phase: Arc<Mutex<SubmitPhase>>,
    in_flight: Arc<AtomicBool>,
    fee_quote: Arc<Mutex<Option<FeeQuote>>>,
}

impl<P: WalletProvider, S: PixelStore + Clone> Clone for PixelPainter<P, S> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            fee_oracle: self.fee_oracle.clone(),
            cache: self.cache.clone(),
            status: self.status.clone(),
            phase: Arc::clone(&self.phase),
            in_flight: Arc::clone(&self.in_flight),
            fee_quote: Arc::clone(&self.fee_quote),
        }
    }
}

/// Releases the in-flight slot on every exit path.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl<P: WalletProvider> PixelPainter<P, NullPixelStore> {
    pub fn new(connection: ChainConnection<P>) -> Self {
        Self::with_cache(connection, LocalStateCache::in_memory())
    }
}

impl<P: WalletProvider, S: PixelStore> PixelPainter<P, S> {
    pub fn with_cache(connection: ChainConnection<P>, cache: LocalStateCache<S>) -> Self {
        let fee_oracle = FeeOracle::new(connection.config().fee_policy);
        Self {
            connection,
            fee_oracle,
            cache,
            status: StatusChannel::new(),
            phase: Arc::new(Mutex::new(SubmitPhase::Idle)),
            in_flight: Arc::new(AtomicBool::new(false)),
            fee_quote: Arc::new(Mutex::new(None)),
        }
    }

    pub fn connection(&self) -> &ChainConnection<P> {
        &self.connection
    }

    pub fn status(&self) -> StatusChannel {
        self.status.clone()
    }

    /// Current phase. A finished submission whose status message has expired
    /// reads as `Idle` again.
    pub fn phase(&self) -> SubmitPhase {
        let phase = *self.phase.lock().unwrap();
        if phase.is_terminal() && self.status.current().is_none() {
            SubmitPhase::Idle
        } else {
            phase
        }
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn pixels(&self) -> HashMap<String, PaintRecord> {
        self.cache.snapshot()
    }

    /// Last resolved fee, rendered in native currency units.
    pub fn fee_display(&self) -> Option<String> {
        let decimals = self.connection.config().chain.currency_decimals;
        let quote = *self.fee_quote.lock().unwrap();
        quote.map(|quote| quote.display(decimals))
    }

    /// Re-resolve the painting fee against the current binding. An undeployed
    /// target publishes the not-deployed error but still stores the quote so
    /// the surface can render a zero fee.
    pub async fn refresh_fee(&self) -> Result<FeeQuote> {
        let binding = self.connection.binding();
        let quote = self.fee_oracle.current_fee(binding.as_ref()).await?;
        if !quote.deployed {
            self.status
                .publish(StatusKind::Error, Error::ContractNotDeployed.user_message());
        }
        *self.fee_quote.lock().unwrap() = Some(quote);
        Ok(quote)
    }

    /// Load the whole grid into the cache. A missing or undeployed binding is
    /// a no-op, not an error.
    pub async fn load_all(&self) -> Result<usize> {
        match self.connection.binding() {
            Some(binding) if binding.is_deployed() => self.cache.load_all(&binding).await,
            _ => Ok(0),
        }
    }

    pub async fn load_batch(&self, coordinates: &[Coordinate]) -> Result<usize> {
        match self.connection.binding() {
            Some(binding) if binding.is_deployed() => {
                self.cache.load_batch(&binding, coordinates).await
            }
            _ => Ok(0),
        }
    }

    /// Submit one paint transaction end to end.
    ///
    /// Preconditions (connected wallet, live binding, nothing in flight,
    /// coordinate on the grid) fail silently as `Rejected`. Everything past
    /// them either confirms and reconciles the cache, or fails with the
    /// classified error published to the status channel.
    pub async fn submit(&self, x: u8, y: u8, color: &str) -> SubmitOutcome {
        let coordinate = match Coordinate::new(x, y) {
            Ok(coordinate) => coordinate,
            Err(err) => {
                warn!(%err, "paint request for an off-grid cell");
                return SubmitOutcome::Rejected;
            }
        };
        if !self.connection.is_connected() {
            return SubmitOutcome::Rejected;
        }
        let Some(binding) = self.connection.binding() else {
            return SubmitOutcome::Rejected;
        };
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SubmitOutcome::Rejected;
        }
        let _guard = InFlightGuard {
            flag: Arc::clone(&self.in_flight),
        };

        match self.submit_inner(&binding, coordinate, color).await {
            Ok(()) => SubmitOutcome::Confirmed,
            Err(err) => {
                error!(%err, %coordinate, "paint submission failed");
                *self.phase.lock().unwrap() = SubmitPhase::Failed;
                self.status.publish(StatusKind::Error, err.user_message());
                SubmitOutcome::Failed
            }
        }
    }

    async fn submit_inner(
        &self,
        binding: &P::Contract,
        coordinate: Coordinate,
        color: &str,
    ) -> Result<()> {
        // Never send value at an address without code.
        if !binding.is_deployed() {
            return Err(Error::ContractNotDeployed);
        }

        *self.phase.lock().unwrap() = SubmitPhase::Preparing;
        self.status
            .publish(StatusKind::Pending, "Preparing transaction...");

        // The fee is re-read at submission time; a stale quote is never sent.
        let quote = self
            .fee_oracle
            .current_fee(Some(binding))
            .await
            .map_err(|err| {
                warn!(%err, "fee resolution failed during submit");
                Error::FeeUnavailable
            })?;
        if !quote.deployed {
            return Err(Error::ContractNotDeployed);
        }
        *self.fee_quote.lock().unwrap() = Some(quote);

        *self.phase.lock().unwrap() = SubmitPhase::AwaitingUserConfirmation;
        self.status.publish(
            StatusKind::Pending,
            "Please confirm the transaction in your wallet...",
        );

        let gas_limit = self.connection.config().gas_limit;
        let tx_hash = binding
            .paint_pixel(coordinate, color, quote.wei, gas_limit)
            .await?;

        *self.phase.lock().unwrap() = SubmitPhase::Submitted;
        self.status.publish(
            StatusKind::Pending,
            format!("Transaction submitted: {}...", tx_hash.short()),
        );

        let receipt = binding.wait_for_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            return Err(Error::TransactionFailed);
        }

        let painter = self
            .connection
            .account()
            .ok_or_else(|| Error::Wallet("account vanished mid-submission".to_owned()))?;
        self.cache.reconcile(
            coordinate,
            PaintRecord {
                color: color.to_owned(),
                painter,
                timestamp: Utc::now().timestamp(),
                tx_hash: Some(tx_hash),
                contract: Some(binding.address()),
            },
        );

        *self.phase.lock().unwrap() = SubmitPhase::Confirmed;
        self.status
            .publish(StatusKind::Success, "Pixel painted successfully!");
        info!(%coordinate, %tx_hash, "pixel painted");
        Ok(())
    }
}

impl<P, S> PixelPainter<P, S>
where
    P: WalletProvider,
    P::Contract: Send + 'static,
    S: PixelStore + Send + Sync + Clone + 'static,
{
    /// Apply the contract's paint-event feed to the cache until it closes.
    /// A missing binding yields a task that finishes immediately.
    pub fn spawn_event_listener(&self) -> tokio::task::JoinHandle<()> {
        let cache = self.cache.clone();
        let mut events = match self.connection.binding() {
            Some(binding) => binding.paint_events(),
            None => {
                let (_sender, receiver) = tokio::sync::mpsc::unbounded_channel();
                receiver
            }
        };
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                cache.apply_event(&event);
            }
        })
    }
}
