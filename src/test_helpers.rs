//! Fake wallet and contract implementations for tests.

use crate::{
    cache::LocalStateCache,
    config::{
        ChainSpec,
        ClientConfig,
    },
    connection::ChainConnection,
    contract::PaintContract,
    painter::PixelPainter,
    provider::{
        ERROR_CODE_UNKNOWN_CHAIN,
        ERROR_CODE_USER_REJECTED,
        ProviderError,
        WalletNotification,
        WalletProvider,
    },
    types::{
        Address,
        BatchPage,
        Coordinate,
        PaintEvent,
        Receipt,
        ReceiptStatus,
        TxHash,
    },
};
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    sync::{
        Arc,
        Mutex,
    },
};
use tokio::sync::{
    Notify,
    mpsc,
};

pub fn account(tag: u8) -> Address {
    Address::new([tag; 20])
}

pub fn deployed_contract_address() -> Address {
    Address::new([0xCC; 20])
}

pub fn test_config() -> ClientConfig {
    ClientConfig::new(ChainSpec::monad_testnet(), deployed_contract_address())
}

struct ContractInner {
    address: Address,
    fee_wei: u128,
    fee_error: Option<ProviderError>,
    paint_error: Option<ProviderError>,
    receipt_status: ReceiptStatus,
    pixels: HashMap<String, (String, Address, i64)>,
    fee_calls: usize,
    paint_calls: usize,
    batch_calls: usize,
    fail_batch_after: Option<usize>,
    hold_confirmation: bool,
    next_tx_nonce: u8,
    event_senders: Vec<mpsc::UnboundedSender<PaintEvent>>,
}

/// In-memory [`PaintContract`] with per-call failure knobs and counters.
#[derive(Clone)]
pub struct FakePaintContract {
    inner: Arc<Mutex<ContractInner>>,
    gate: Arc<Notify>,
}

impl FakePaintContract {
    pub fn new(address: Address) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContractInner {
                address,
                fee_wei: 1_000_000_000_000_000,
                fee_error: None,
                paint_error: None,
                receipt_status: ReceiptStatus::Success,
                pixels: HashMap::new(),
                fee_calls: 0,
                paint_calls: 0,
                batch_calls: 0,
                fail_batch_after: None,
                hold_confirmation: false,
                next_tx_nonce: 0,
                event_senders: Vec::new(),
            })),
            gate: Arc::new(Notify::new()),
        }
    }

    pub fn set_fee(&self, wei: u128) {
        self.inner.lock().unwrap().fee_wei = wei;
    }

    /// Make the fee view fail the way an ABI call against empty code does.
    pub fn fail_fee_with_decode_error(&self) {
        self.inner.lock().unwrap().fee_error =
            Some(ProviderError::new("could not decode result data (value=\"0x\")"));
    }

    pub fn set_fee_error(&self, error: ProviderError) {
        self.inner.lock().unwrap().fee_error = Some(error);
    }

    pub fn set_paint_error(&self, error: ProviderError) {
        self.inner.lock().unwrap().paint_error = Some(error);
    }

    pub fn set_receipt_status(&self, status: ReceiptStatus) {
        self.inner.lock().unwrap().receipt_status = status;
    }

    pub fn seed_pixel(&self, coordinate: Coordinate, color: &str, painter: Address) {
        self.inner
            .lock()
            .unwrap()
            .pixels
            .insert(coordinate.key(), (color.to_owned(), painter, 1_700_000_000));
    }

    /// Fail every batch read after the first `calls` successful ones.
    pub fn fail_batch_after(&self, calls: usize) {
        self.inner.lock().unwrap().fail_batch_after = Some(calls);
    }

    /// Park paint calls on a gate until [`Self::release_confirmations`].
    pub fn hold_confirmations(&self) {
        self.inner.lock().unwrap().hold_confirmation = true;
    }

    pub fn release_confirmations(&self) {
        self.inner.lock().unwrap().hold_confirmation = false;
        self.gate.notify_waiters();
    }

    pub fn emit_paint(&self, event: PaintEvent) {
        let senders = self.inner.lock().unwrap().event_senders.clone();
        for sender in senders {
            let _ = sender.send(event.clone());
        }
    }

    pub fn fee_calls(&self) -> usize {
        self.inner.lock().unwrap().fee_calls
    }

    pub fn paint_calls(&self) -> usize {
        self.inner.lock().unwrap().paint_calls
    }

    pub fn batch_calls(&self) -> usize {
        self.inner.lock().unwrap().batch_calls
    }

    fn set_address(&self, address: Address) {
        self.inner.lock().unwrap().address = address;
    }
}

impl PaintContract for FakePaintContract {
    fn address(&self) -> Address {
        self.inner.lock().unwrap().address
    }

    async fn painting_fee(&self) -> Result<u128, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.fee_calls += 1;
        match inner.fee_error.clone() {
            Some(error) => Err(error),
            None => Ok(inner.fee_wei),
        }
    }

    async fn paint_pixel(
        &self,
        coordinate: Coordinate,
        color: &str,
        _value: u128,
        _gas_limit: u64,
    ) -> Result<TxHash, ProviderError> {
        let (held, tx_hash) = {
            let mut inner = self.inner.lock().unwrap();
            inner.paint_calls += 1;
            if let Some(error) = inner.paint_error.clone() {
                return Err(error);
            }
            inner.next_tx_nonce += 1;
            let mut bytes = [0u8; 32];
            bytes[0] = inner.next_tx_nonce;
            inner
                .pixels
                .insert(coordinate.key(), (color.to_owned(), Address::ZERO, 0));
            (inner.hold_confirmation, TxHash::new(bytes))
        };
        if held {
            self.gate.notified().await;
        }
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<Receipt, ProviderError> {
        let status = self.inner.lock().unwrap().receipt_status;
        Ok(Receipt { tx_hash, status })
    }

    async fn pixels_batch(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<BatchPage, ProviderError> {
        let inner = &mut *self.inner.lock().unwrap();
        inner.batch_calls += 1;
        if let Some(limit) = inner.fail_batch_after {
            if inner.batch_calls > limit {
                return Err(ProviderError::new("network request failed"));
            }
        }
        let mut page = BatchPage::default();
        for coordinate in coordinates {
            match inner.pixels.get(&coordinate.key()) {
                Some((color, painter, timestamp)) => {
                    page.colors.push(color.clone());
                    page.painters.push(*painter);
                    page.timestamps.push(*timestamp);
                }
                None => {
                    page.colors.push(String::new());
                    page.painters.push(Address::ZERO);
                    page.timestamps.push(0);
                }
            }
        }
        Ok(page)
    }

    fn paint_events(&self) -> mpsc::UnboundedReceiver<PaintEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().event_senders.push(sender);
        receiver
    }
}

struct ProviderInner {
    accounts: Vec<Address>,
    authorized: Vec<Address>,
    chain_id: u64,
    known_chains: HashSet<u64>,
    reject_account_requests: bool,
    reject_chain_switches: bool,
    switch_calls: usize,
    add_chain_calls: usize,
    notification_senders: Vec<mpsc::UnboundedSender<WalletNotification>>,
}

/// In-memory [`WalletProvider`] over a shared [`FakePaintContract`].
#[derive(Clone)]
pub struct FakeWalletProvider {
    inner: Arc<Mutex<ProviderInner>>,
    contract: FakePaintContract,
}

impl FakeWalletProvider {
    /// A wallet sitting on `chain_id`, knowing only that chain.
    pub fn on_chain(chain_id: u64, accounts: Vec<Address>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ProviderInner {
                accounts,
                authorized: Vec::new(),
                chain_id,
                known_chains: HashSet::from([chain_id]),
                reject_account_requests: false,
                reject_chain_switches: false,
                switch_calls: 0,
                add_chain_calls: 0,
                notification_senders: Vec::new(),
            })),
            contract: FakePaintContract::new(Address::ZERO),
        }
    }

    /// A wallet already on the Monad testnet.
    pub fn on_target_chain(accounts: Vec<Address>) -> Self {
        Self::on_chain(ChainSpec::monad_testnet().chain_id, accounts)
    }

    pub fn authorize(&self, accounts: Vec<Address>) {
        self.inner.lock().unwrap().authorized = accounts;
    }

    pub fn reject_account_requests(&self) {
        self.inner.lock().unwrap().reject_account_requests = true;
    }

    pub fn reject_chain_switches(&self) {
        self.inner.lock().unwrap().reject_chain_switches = true;
    }

    pub fn contract(&self) -> FakePaintContract {
        self.contract.clone()
    }

    pub fn emit(&self, notification: WalletNotification) {
        let senders = self.inner.lock().unwrap().notification_senders.clone();
        for sender in senders {
            let _ = sender.send(notification.clone());
        }
    }

    pub fn switch_calls(&self) -> usize {
        self.inner.lock().unwrap().switch_calls
    }

    pub fn add_chain_calls(&self) -> usize {
        self.inner.lock().unwrap().add_chain_calls
    }
}

impl WalletProvider for FakeWalletProvider {
    type Contract = FakePaintContract;

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let inner = self.inner.lock().unwrap();
        if inner.reject_account_requests {
            return Err(
                ProviderError::new("User rejected the request.").with_code(ERROR_CODE_USER_REJECTED)
            );
        }
        Ok(inner.accounts.clone())
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.inner.lock().unwrap().authorized.clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.inner.lock().unwrap().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.switch_calls += 1;
        if inner.reject_chain_switches {
            return Err(
                ProviderError::new("User rejected the request.").with_code(ERROR_CODE_USER_REJECTED)
            );
        }
        if !inner.known_chains.contains(&chain_id) {
            return Err(ProviderError::new("Unrecognized chain ID.")
                .with_code(ERROR_CODE_UNKNOWN_CHAIN));
        }
        inner.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, spec: &ChainSpec) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.add_chain_calls += 1;
        inner.known_chains.insert(spec.chain_id);
        inner.chain_id = spec.chain_id;
        Ok(())
    }

    fn bind_contract(
        &self,
        address: Address,
        _signer: Address,
    ) -> Result<Self::Contract, ProviderError> {
        self.contract.set_address(address);
        Ok(self.contract.clone())
    }

    fn notifications(&self) -> mpsc::UnboundedReceiver<WalletNotification> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().notification_senders.push(sender);
        receiver
    }
}

/// A connected painter over a fresh fake wallet, plus the handles the test
/// needs to steer it.
pub async fn connected_painter() -> (
    PixelPainter<FakeWalletProvider>,
    FakeWalletProvider,
    FakePaintContract,
) {
    connected_painter_with_config(test_config()).await
}

pub async fn connected_painter_with_config(
    config: ClientConfig,
) -> (
    PixelPainter<FakeWalletProvider>,
    FakeWalletProvider,
    FakePaintContract,
) {
    let provider = FakeWalletProvider::on_target_chain(vec![account(1)]);
    let connection = ChainConnection::new(Some(provider.clone()), config);
    connection
        .connect()
        .await
        .unwrap_or_else(|err| panic!("fake wallet connect failed: {err}"));
    let painter = PixelPainter::with_cache(connection, LocalStateCache::in_memory());
    let contract = provider.contract();
    (painter, provider, contract)
}
