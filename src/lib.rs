//! Client-side coordinator for a fee-gated, 100x100 on-chain pixel grid.
//!
//! The crate sequences the full paint-transaction lifecycle: connect a wallet,
//! resolve the current painting fee, submit the payable call, await the
//! receipt, reconcile the local pixel cache, and surface a short-lived status
//! message for the presentation layer. Wallet and contract access go through
//! the [`provider::WalletProvider`] and [`contract::PaintContract`] seams so
//! the whole pipeline runs against fakes in tests.

pub mod cache;
pub mod config;
pub mod connection;
pub mod contract;
pub mod error;
pub mod fee;
pub mod painter;
pub mod provider;
pub mod status;
pub mod store;
pub mod types;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use cache::LocalStateCache;
pub use config::{ChainSpec, ClientConfig};
pub use connection::{ChainConnection, ConnectionState};
pub use contract::PaintContract;
pub use error::Error;
pub use fee::{FeeOracle, FeePolicy, FeeQuote};
pub use painter::{PixelPainter, SubmitOutcome, SubmitPhase};
pub use provider::{ProviderError, WalletNotification, WalletProvider};
pub use status::{ActionStatus, StatusChannel, StatusKind};
pub use store::{NullPixelStore, PixelStore, SledPixelStore};
pub use types::{
    Address,
    BatchPage,
    Coordinate,
    PaintEvent,
    PaintRecord,
    Receipt,
    ReceiptStatus,
    TxHash,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Install a default `tracing` subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
