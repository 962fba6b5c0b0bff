//! Chain parameters and client configuration.

use crate::{
    fee::FeePolicy,
    types::Address,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;

/// Side length of the square pixel grid.
pub const GRID_DIM: usize = 100;

/// Total number of cells on the grid.
pub const CELL_COUNT: usize = GRID_DIM * GRID_DIM;

/// Cells requested per page when loading the full grid.
pub const LOAD_BATCH_SIZE: usize = 100;

/// Gas ceiling attached to every paint transaction.
pub const PAINT_GAS_LIMIT: u64 = 300_000;

/// How long a published status stays visible before it auto-expires.
pub const STATUS_TTL: Duration = Duration::from_millis(5_000);

/// Fallback painting fee for the fixed policy, in native currency units.
pub const DEFAULT_FIXED_FEE: &str = "0.001";

/// Everything needed to identify the target network and to register it with a
/// wallet that does not know it yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub chain_id: u64,
    pub name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_url: String,
    pub explorer_url: String,
}

impl ChainSpec {
    pub fn monad_testnet() -> Self {
        Self {
            chain_id: 10143,
            name: "Monad Testnet".to_owned(),
            currency_symbol: "MON".to_owned(),
            currency_decimals: 18,
            rpc_url: "https://testnet-rpc.monad.xyz".to_owned(),
            explorer_url: "https://testnet-explorer.monad.xyz".to_owned(),
        }
    }
}

/// Static configuration for one client instance.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub chain: ChainSpec,
    pub contract_address: Address,
    pub fee_policy: FeePolicy,
    pub gas_limit: u64,
}

impl ClientConfig {
    pub fn new(chain: ChainSpec, contract_address: Address) -> Self {
        Self {
            chain,
            contract_address,
            fee_policy: FeePolicy::ContractView,
            gas_limit: PAINT_GAS_LIMIT,
        }
    }

    pub fn with_fee_policy(mut self, fee_policy: FeePolicy) -> Self {
        self.fee_policy = fee_policy;
        self
    }
}
