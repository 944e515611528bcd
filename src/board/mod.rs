//! Board capability data: pin identifiers, electrical roles and the
//! per-family `BoardProfile`.

pub mod catalog;

pub use catalog::{BoardCatalog, CatalogError};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Canonical physical pin number. Every component downstream of the
/// normalizer works with this type only.
pub type PinId = u32;

/// Electrical capability a binding requires from its pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinRole {
    Gpio,
    Pwm,
    Adc,
    I2c,
    Spi,
    Uart,
}

impl PinRole {
    pub const ALL: [PinRole; 6] = [
        PinRole::Gpio,
        PinRole::Pwm,
        PinRole::Adc,
        PinRole::I2c,
        PinRole::Spi,
        PinRole::Uart,
    ];

    /// Parse a declared role tag. Accepts the canonical names in any case
    /// plus a few spellings seen in generated pin tables.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_uppercase().replace(['-', ' ', '_'], "");
        match tag.as_str() {
            "GPIO" | "DIGITAL" | "INPUT" | "OUTPUT" | "IO" => Some(PinRole::Gpio),
            "PWM" | "LEDC" => Some(PinRole::Pwm),
            "ADC" | "ANALOG" | "ANALOGIN" => Some(PinRole::Adc),
            "I2C" | "IIC" | "TWI" => Some(PinRole::I2c),
            "SPI" => Some(PinRole::Spi),
            "UART" | "SERIAL" => Some(PinRole::Uart),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PinRole::Gpio => "GPIO",
            PinRole::Pwm => "PWM",
            PinRole::Adc => "ADC",
            PinRole::I2c => "I2C",
            PinRole::Spi => "SPI",
            PinRole::Uart => "UART",
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named signal of one of the standard buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusRole {
    Sda,
    Scl,
    Mosi,
    Miso,
    Sck,
    Cs,
    Tx,
    Rx,
}

impl BusRole {
    /// The bus a signal belongs to.
    pub fn bus(self) -> PinRole {
        match self {
            BusRole::Sda | BusRole::Scl => PinRole::I2c,
            BusRole::Mosi | BusRole::Miso | BusRole::Sck | BusRole::Cs => PinRole::Spi,
            BusRole::Tx | BusRole::Rx => PinRole::Uart,
        }
    }

    /// Signals making up `bus`, in wiring order. Empty for non-bus roles.
    pub fn signals_of(bus: PinRole) -> &'static [BusRole] {
        match bus {
            PinRole::I2c => &[BusRole::Sda, BusRole::Scl],
            PinRole::Spi => &[BusRole::Mosi, BusRole::Miso, BusRole::Sck, BusRole::Cs],
            PinRole::Uart => &[BusRole::Tx, BusRole::Rx],
            _ => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BusRole::Sda => "SDA",
            BusRole::Scl => "SCL",
            BusRole::Mosi => "MOSI",
            BusRole::Miso => "MISO",
            BusRole::Sck => "SCK",
            BusRole::Cs => "CS",
            BusRole::Tx => "TX",
            BusRole::Rx => "RX",
        }
    }
}

impl fmt::Display for BusRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static capability description of one board family.
///
/// Profiles can only be built through [`BoardProfile::new`] (or the generic
/// fallback), which enforces that every capability set is a subset of
/// `available_pins` and that `available_pins` is non-empty. Reserved pins
/// may overlap PWM/ADC pins; reservation is advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    key: String,
    name: String,
    available_pins: BTreeSet<PinId>,
    pwm_pins: BTreeSet<PinId>,
    adc_pins: BTreeSet<PinId>,
    reserved_pins: BTreeSet<PinId>,
    bus_defaults: BTreeMap<BusRole, PinId>,
}

/// Key of the profile handed out for unknown boards.
pub const GENERIC_BOARD_KEY: &str = "generic";

/// Pin count of the generic fallback profile (pins `0..32`).
pub const DEFAULT_GENERIC_PIN_COUNT: u32 = 32;

impl BoardProfile {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        available_pins: BTreeSet<PinId>,
        pwm_pins: BTreeSet<PinId>,
        adc_pins: BTreeSet<PinId>,
        reserved_pins: BTreeSet<PinId>,
        bus_defaults: BTreeMap<BusRole, PinId>,
    ) -> Result<Self, CatalogError> {
        let key = key.into();
        if available_pins.is_empty() {
            return Err(CatalogError::EmptyBoard { board: key });
        }
        for (set, pins) in [
            ("pwm_pins", &pwm_pins),
            ("adc_pins", &adc_pins),
            ("reserved_pins", &reserved_pins),
        ] {
            if let Some(&pin) = pins.difference(&available_pins).next() {
                return Err(CatalogError::NotSubset { board: key, set, pin });
            }
        }
        if let Some((&bus, &pin)) = bus_defaults
            .iter()
            .find(|(_, pin)| !available_pins.contains(*pin))
        {
            return Err(CatalogError::BadBusPin { board: key, bus, pin });
        }
        Ok(Self {
            name: name.into(),
            key,
            available_pins,
            pwm_pins,
            adc_pins,
            reserved_pins,
            bus_defaults,
        })
    }

    /// Best-effort profile for boards nobody registered: `0..pin_count`
    /// plain GPIO, no PWM, ADC, reserved or bus pins. A zero count is
    /// bumped to one pin so the profile stays resolvable.
    pub fn generic(pin_count: u32) -> Self {
        Self {
            key: GENERIC_BOARD_KEY.to_string(),
            name: "Generic board".to_string(),
            available_pins: (0..pin_count.max(1)).collect(),
            pwm_pins: BTreeSet::new(),
            adc_pins: BTreeSet::new(),
            reserved_pins: BTreeSet::new(),
            bus_defaults: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn available_pins(&self) -> &BTreeSet<PinId> {
        &self.available_pins
    }

    pub fn pwm_pins(&self) -> &BTreeSet<PinId> {
        &self.pwm_pins
    }

    pub fn adc_pins(&self) -> &BTreeSet<PinId> {
        &self.adc_pins
    }

    pub fn reserved_pins(&self) -> &BTreeSet<PinId> {
        &self.reserved_pins
    }

    pub fn bus_defaults(&self) -> &BTreeMap<BusRole, PinId> {
        &self.bus_defaults
    }

    pub fn bus_pin(&self, signal: BusRole) -> Option<PinId> {
        self.bus_defaults.get(&signal).copied()
    }

    pub fn is_available(&self, pin: PinId) -> bool {
        self.available_pins.contains(&pin)
    }

    pub fn is_reserved(&self, pin: PinId) -> bool {
        self.reserved_pins.contains(&pin)
    }

    /// Whether `pin` can electrically serve `role`. Only PWM and ADC are
    /// checked against dedicated sets; every other role needs an
    /// available pin.
    pub fn supports(&self, pin: PinId, role: PinRole) -> bool {
        match role {
            PinRole::Pwm => self.pwm_pins.contains(&pin),
            PinRole::Adc => self.adc_pins.contains(&pin),
            _ => self.available_pins.contains(&pin),
        }
    }

    /// Pins a repair for `role` may pick from, in ascending order, with
    /// the preferred candidates first. Plain roles prefer non-reserved
    /// pins and only then fall back to reserved ones.
    pub fn repair_candidates(&self, role: PinRole) -> Vec<PinId> {
        match role {
            PinRole::Pwm => self.pwm_pins.iter().copied().collect(),
            PinRole::Adc => self.adc_pins.iter().copied().collect(),
            _ => {
                let (reserved, open): (Vec<PinId>, Vec<PinId>) = self
                    .available_pins
                    .iter()
                    .copied()
                    .partition(|pin| self.reserved_pins.contains(pin));
                open.into_iter().chain(reserved).collect()
            }
        }
    }
}
