//! Core data types shared across the crate.

use crate::{
    Result,
    config,
    error::Error,
};
use serde::{
    Deserialize,
    Serialize,
    de,
};
use std::fmt;

/// One of the 10,000 grid cells. Construction enforces the grid bounds, so a
/// value of this type is always a valid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    x: u8,
    y: u8,
}

impl Coordinate {
    pub fn new(x: u8, y: u8) -> Result<Self> {
        if usize::from(x) >= config::GRID_DIM || usize::from(y) >= config::GRID_DIM {
            return Err(Error::CoordinateOutOfBounds { x, y });
        }
        Ok(Self { x, y })
    }

    /// Cell at `index` in row-major order (`index = y * 100 + x`).
    pub fn from_index(index: usize) -> Result<Self> {
        if index >= config::CELL_COUNT {
            return Err(Error::Invalid {
                kind: "cell index",
                value: index.to_string(),
            });
        }
        Self::new(
            (index % config::GRID_DIM) as u8,
            (index / config::GRID_DIM) as u8,
        )
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    /// The "x-y" string key used by the pixel dataset and its persisted form.
    pub fn key(&self) -> String {
        format!("{}-{}", self.x, self.y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 20-byte account or contract address, displayed as 0x-prefixed hex.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn parse(text: &str) -> Result<Self> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(stripped).map_err(|_| Error::Invalid {
            kind: "address",
            value: text.to_owned(),
        })?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| Error::Invalid {
            kind: "address",
            value: text.to_owned(),
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Address::parse(&text).map_err(de::Error::custom)
    }
}

/// A 32-byte transaction identifier, displayed as 0x-prefixed hex.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(stripped).map_err(|_| Error::Invalid {
            kind: "transaction hash",
            value: text.to_owned(),
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| Error::Invalid {
            kind: "transaction hash",
            value: text.to_owned(),
        })?;
        Ok(Self(bytes))
    }

    /// First ten characters of the hex form, as shown in status messages.
    pub fn short(&self) -> String {
        let full = self.to_string();
        full[..10].to_owned()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for TxHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TxHash::parse(&text).map_err(de::Error::custom)
    }
}

/// The last-known paint action for one cell. Latest write wins; records are
/// never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintRecord {
    pub color: String,
    pub painter: Address,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<Address>,
}

/// An externally observed paint action, delivered by the contract event feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaintEvent {
    pub coordinate: Coordinate,
    pub color: String,
    pub painter: Address,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Confirmation record returned once a submitted transaction is included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub status: ReceiptStatus,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// One page of a batch pixel read. The arrays are parallel, indexed like the
/// requested coordinate list; an empty color string marks an unpainted cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchPage {
    pub colors: Vec<String>,
    pub painters: Vec<Address>,
    pub timestamps: Vec<i64>,
}
