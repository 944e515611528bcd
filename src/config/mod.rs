// src/config/mod.rs - Board catalog configuration
//! # Board Catalog Configuration
//!
//! Board profiles are described in TOML. Pin sets accept single pins and
//! inclusive `"a-b"` ranges, freely mixed:
//!
//! ```toml
//! [generic]
//! pin_count = 32
//!
//! [boards.esp32]
//! name = "ESP32 DevKit V1"
//! aliases = ["esp32dev"]
//! available_pins = ["0-39"]
//! pwm_pins = [2, 4, 5, "12-19"]
//! adc_pins = ["32-36", 39]
//! reserved_pins = [0, 1, "6-11"]
//!
//! [boards.esp32.bus]
//! sda = 21
//! scl = 22
//! ```
//!
//! The `[generic]` table sizes the fallback profile used for unknown boards.

use crate::board::{BoardProfile, BusRole, CatalogError, DEFAULT_GENERIC_PIN_COUNT, PinId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Board table compiled into the crate.
pub const BUILTIN_CATALOG: &str = include_str!("boards.toml");

/// Top-level structure of a catalog file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub generic: GenericConfig,

    #[serde(default)]
    pub boards: BTreeMap<String, BoardConfig>,
}

/// Shape of the fallback profile for unregistered boards
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenericConfig {
    #[serde(default = "default_generic_pin_count")]
    pub pin_count: u32,
}

impl Default for GenericConfig {
    fn default() -> Self {
        Self {
            pin_count: default_generic_pin_count(),
        }
    }
}

/// One board family
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BoardConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    pub available_pins: Vec<PinSpec>,

    #[serde(default)]
    pub pwm_pins: Vec<PinSpec>,

    #[serde(default)]
    pub adc_pins: Vec<PinSpec>,

    #[serde(default)]
    pub reserved_pins: Vec<PinSpec>,

    #[serde(default)]
    pub bus: BusConfig,
}

/// Canonical bus pins of a board. Missing entries mean the board has no
/// fixed pin for that signal.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct BusConfig {
    #[serde(default)]
    pub sda: Option<PinId>,
    #[serde(default)]
    pub scl: Option<PinId>,
    #[serde(default)]
    pub mosi: Option<PinId>,
    #[serde(default)]
    pub miso: Option<PinId>,
    #[serde(default)]
    pub sck: Option<PinId>,
    #[serde(default)]
    pub cs: Option<PinId>,
    #[serde(default)]
    pub tx: Option<PinId>,
    #[serde(default)]
    pub rx: Option<PinId>,
}

/// A single pin or an inclusive range such as `"12-19"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PinSpec {
    Pin(PinId),
    Range(String),
}

fn default_generic_pin_count() -> u32 { DEFAULT_GENERIC_PIN_COUNT }

impl CatalogConfig {
    /// The embedded board table.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Parse a catalog from TOML text
    pub fn parse(contents: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Load a catalog file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::error!("Failed to read board catalog '{}': {}", path.display(), e);
                return Err(CatalogError::Io(e));
            }
        };
        match Self::parse(&contents) {
            Ok(config) => {
                tracing::info!("Loaded board catalog from TOML file: {}", path.display());
                Ok(config)
            }
            Err(e) => {
                tracing::error!("Failed to parse board catalog TOML: {}", e);
                Err(e)
            }
        }
    }

    /// Save the catalog as pretty-printed TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Check every board against the profile invariants without building
    /// a catalog.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (key, board) in &self.boards {
            board.to_profile(key)?;
        }
        Ok(())
    }
}

impl BoardConfig {
    /// Build the immutable profile for this board, enforcing the pin-set
    /// invariants.
    pub fn to_profile(&self, key: &str) -> Result<BoardProfile, CatalogError> {
        BoardProfile::new(
            key,
            self.name.clone().unwrap_or_else(|| key.to_string()),
            expand_pins(key, &self.available_pins)?,
            expand_pins(key, &self.pwm_pins)?,
            expand_pins(key, &self.adc_pins)?,
            expand_pins(key, &self.reserved_pins)?,
            self.bus.defaults(),
        )
    }
}

impl BusConfig {
    pub fn defaults(&self) -> BTreeMap<BusRole, PinId> {
        [
            (BusRole::Sda, self.sda),
            (BusRole::Scl, self.scl),
            (BusRole::Mosi, self.mosi),
            (BusRole::Miso, self.miso),
            (BusRole::Sck, self.sck),
            (BusRole::Cs, self.cs),
            (BusRole::Tx, self.tx),
            (BusRole::Rx, self.rx),
        ]
        .into_iter()
        .filter_map(|(role, pin)| pin.map(|pin| (role, pin)))
        .collect()
    }
}

impl PinSpec {
    /// Expand to the pins it covers.
    pub fn expand(&self, board: &str) -> Result<Vec<PinId>, CatalogError> {
        match self {
            PinSpec::Pin(pin) => Ok(vec![*pin]),
            PinSpec::Range(spec) => {
                let invalid = || CatalogError::InvalidRange {
                    board: board.to_string(),
                    spec: spec.clone(),
                };
                let trimmed = spec.trim();
                let (start, end) = match trimmed.split_once('-') {
                    Some((start, end)) => (start.trim(), end.trim()),
                    None => (trimmed, trimmed),
                };
                let start: PinId = start.parse().map_err(|_| invalid())?;
                let end: PinId = end.parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                Ok((start..=end).collect())
            }
        }
    }
}

fn expand_pins(board: &str, specs: &[PinSpec]) -> Result<BTreeSet<PinId>, CatalogError> {
    let mut pins = BTreeSet::new();
    for spec in specs {
        pins.extend(spec.expand(board)?);
    }
    Ok(pins)
}
