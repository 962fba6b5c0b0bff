//! Contract boundary. A [`PaintContract`] is a contract instance already
//! bound to a signer account by the provider.

use crate::{
    provider::ProviderError,
    types::{
        Address,
        BatchPage,
        Coordinate,
        PaintEvent,
        Receipt,
        TxHash,
    },
};
use tokio::sync::mpsc;

pub trait PaintContract: Clone {
    /// Address this binding points at. A zero address means the client was
    /// configured without a deployment.
    fn address(&self) -> Address;

    /// Current painting fee in smallest currency units.
    fn painting_fee(&self) -> impl Future<Output = Result<u128, ProviderError>> + Send;

    /// Submit the payable paint call. Resolves once the wallet has signed and
    /// broadcast the transaction, before inclusion.
    fn paint_pixel(
        &self,
        coordinate: Coordinate,
        color: &str,
        value: u128,
        gas_limit: u64,
    ) -> impl Future<Output = Result<TxHash, ProviderError>> + Send;

    /// Wait for the transaction to be included and return its receipt.
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<Receipt, ProviderError>> + Send;

    /// Read a page of cells in one call. The returned arrays parallel the
    /// requested coordinates.
    fn pixels_batch(
        &self,
        coordinates: &[Coordinate],
    ) -> impl Future<Output = Result<BatchPage, ProviderError>> + Send;

    /// Subscribe to paint events emitted by the contract.
    fn paint_events(&self) -> mpsc::UnboundedReceiver<PaintEvent>;

    fn is_deployed(&self) -> bool {
        !self.address().is_zero()
    }
}
