//! Painting fee resolution and decimal unit conversion.

use crate::{
    Result,
    contract::PaintContract,
    error::Error,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::warn;

/// Where the painting fee comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePolicy {
    /// A fixed amount in smallest currency units.
    Fixed(u128),
    /// Read the fee from the contract's view function.
    ContractView,
}

/// Resolved fee for the next paint transaction. `deployed = false` marks the
/// quote as informational only: the target address has no code, so no
/// transaction should be sent against it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FeeQuote {
    pub wei: u128,
    pub deployed: bool,
}

impl FeeQuote {
    pub fn zero_not_deployed() -> Self {
        Self {
            wei: 0,
            deployed: false,
        }
    }

    pub fn display(&self, decimals: u8) -> String {
        format_units(self.wei, decimals)
    }
}

#[derive(Clone, Debug)]
pub struct FeeOracle {
    policy: FeePolicy,
}

impl FeeOracle {
    pub fn new(policy: FeePolicy) -> Self {
        Self { policy }
    }

    /// Resolve the current fee against the given contract binding.
    ///
    /// A missing or undeployed target under the contract-view policy yields a
    /// zero, not-deployed quote rather than an error: the caller can still
    /// render a fee of zero while refusing to submit.
    pub async fn current_fee<C: PaintContract>(&self, binding: Option<&C>) -> Result<FeeQuote> {
        match self.policy {
            FeePolicy::Fixed(wei) => Ok(FeeQuote {
                wei,
                deployed: true,
            }),
            FeePolicy::ContractView => {
                let Some(contract) = binding else {
                    return Err(Error::FeeUnavailable);
                };
                if !contract.is_deployed() {
                    return Ok(FeeQuote::zero_not_deployed());
                }
                match contract.painting_fee().await {
                    Ok(wei) => Ok(FeeQuote {
                        wei,
                        deployed: true,
                    }),
                    Err(raw) => match Error::classify(raw) {
                        Error::ContractNotDeployed => {
                            warn!("fee view call failed to decode, treating target as undeployed");
                            Ok(FeeQuote::zero_not_deployed())
                        }
                        other => Err(other),
                    },
                }
            }
        }
    }
}

/// Render `amount` smallest units as a decimal string, trailing zeros trimmed.
pub fn format_units(amount: u128, decimals: u8) -> String {
    let scale = 10u128.pow(u32::from(decimals));
    if scale == 1 {
        return amount.to_string();
    }
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:0>width$}", fraction, width = usize::from(decimals));
    let fraction = fraction.trim_end_matches('0');
    format!("{whole}.{fraction}")
}

/// Parse a decimal currency string into smallest units.
pub fn parse_units(text: &str, decimals: u8) -> Result<u128> {
    let invalid = || Error::Invalid {
        kind: "currency amount",
        value: text.to_owned(),
    };

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.len() > usize::from(decimals) {
        return Err(invalid());
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = usize::from(decimals));
        padded.parse().map_err(|_| invalid())?
    };

    let scale = 10u128.pow(u32::from(decimals));
    whole
        .checked_mul(scale)
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::test_helpers::FakePaintContract;
    use crate::types::Address;

    #[test]
    fn format_units__trims_trailing_zeros() {
        assert_eq!(format_units(1_000_000_000_000_000, 18), "0.001");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn parse_units__round_trips_the_default_fee() {
        assert_eq!(parse_units("0.001", 18).unwrap(), 1_000_000_000_000_000);
        assert_eq!(parse_units("1.5", 18).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_units("3", 18).unwrap(), 3_000_000_000_000_000_000);
    }

    #[test]
    fn parse_units__rejects_garbage_and_excess_precision() {
        assert!(parse_units("", 18).is_err());
        assert!(parse_units(".", 18).is_err());
        assert!(parse_units("1.2.3", 18).is_err());
        assert!(parse_units("0.5", 0).is_err());
    }

    #[tokio::test]
    async fn current_fee__fixed_policy_never_touches_the_contract() {
        // given
        let oracle = FeeOracle::new(FeePolicy::Fixed(7));

        // when
        let quote = oracle.current_fee::<FakePaintContract>(None).await.unwrap();

        // then
        assert_eq!(quote, FeeQuote { wei: 7, deployed: true });
    }

    #[tokio::test]
    async fn current_fee__contract_view_without_binding_is_unavailable() {
        // given
        let oracle = FeeOracle::new(FeePolicy::ContractView);

        // when
        let result = oracle.current_fee::<FakePaintContract>(None).await;

        // then
        assert!(matches!(result, Err(Error::FeeUnavailable)));
    }

    #[tokio::test]
    async fn current_fee__zero_address_target_quotes_zero_without_calling_the_view() {
        // given
        let oracle = FeeOracle::new(FeePolicy::ContractView);
        let contract = FakePaintContract::new(Address::ZERO);

        // when
        let quote = oracle.current_fee(Some(&contract)).await.unwrap();

        // then
        assert_eq!(quote, FeeQuote::zero_not_deployed());
        assert_eq!(contract.fee_calls(), 0);
    }

    #[tokio::test]
    async fn current_fee__decode_failure_quotes_zero_not_deployed() {
        // given
        let oracle = FeeOracle::new(FeePolicy::ContractView);
        let contract = FakePaintContract::new(Address::new([5u8; 20]));
        contract.fail_fee_with_decode_error();

        // when
        let quote = oracle.current_fee(Some(&contract)).await.unwrap();

        // then
        assert_eq!(quote, FeeQuote::zero_not_deployed());
    }

    #[tokio::test]
    async fn current_fee__reads_the_view_when_deployed() {
        // given
        let oracle = FeeOracle::new(FeePolicy::ContractView);
        let contract = FakePaintContract::new(Address::new([5u8; 20]));
        contract.set_fee(1_000_000_000_000_000);

        // when
        let quote = oracle.current_fee(Some(&contract)).await.unwrap();

        // then
        assert!(quote.deployed);
        assert_eq!(quote.display(18), "0.001");
    }
}
