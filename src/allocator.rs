//! Pin allocation for peripherals added to an existing set.
//!
//! The allocator owns the set it fills and tracks used pins only for the
//! lifetime of that set, so two requests on the same board never see each
//! other's claims.

use crate::board::{BusRole, PinId, PinRole};
use crate::pins::{ComponentBinding, PinAssignmentSet, DEFAULT_SIGNAL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeripheralKind {
    Led,
    DigitalSensor,
    Servo,
    AnalogSensor,
    I2c,
    Spi,
    Uart,
}

impl PeripheralKind {
    pub fn role(self) -> PinRole {
        match self {
            PeripheralKind::Led | PeripheralKind::DigitalSensor => PinRole::Gpio,
            PeripheralKind::Servo => PinRole::Pwm,
            PeripheralKind::AnalogSensor => PinRole::Adc,
            PeripheralKind::I2c => PinRole::I2c,
            PeripheralKind::Spi => PinRole::Spi,
            PeripheralKind::Uart => PinRole::Uart,
        }
    }
}

impl FromStr for PeripheralKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "led" | "relay" | "buzzer" => Ok(PeripheralKind::Led),
            "digital_sensor" | "digital" | "button" | "dht11" | "dht22" => {
                Ok(PeripheralKind::DigitalSensor)
            }
            "servo" | "pwm" => Ok(PeripheralKind::Servo),
            "analog_sensor" | "analog" | "potentiometer" | "thermistor" => {
                Ok(PeripheralKind::AnalogSensor)
            }
            "i2c" => Ok(PeripheralKind::I2c),
            "spi" => Ok(PeripheralKind::Spi),
            "uart" | "serial" => Ok(PeripheralKind::Uart),
            other => Err(format!("unknown peripheral kind '{}'", other)),
        }
    }
}

impl fmt::Display for PeripheralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PeripheralKind::Led => "led",
            PeripheralKind::DigitalSensor => "digital_sensor",
            PeripheralKind::Servo => "servo",
            PeripheralKind::AnalogSensor => "analog_sensor",
            PeripheralKind::I2c => "i2c",
            PeripheralKind::Spi => "spi",
            PeripheralKind::Uart => "uart",
        })
    }
}

#[derive(Debug)]
pub struct PinAllocator {
    set: PinAssignmentSet,
    used: BTreeSet<PinId>,
}

impl PinAllocator {
    pub fn new(set: PinAssignmentSet) -> Self {
        let used = set.used_pins();
        Self { set, used }
    }

    pub fn set(&self) -> &PinAssignmentSet {
        &self.set
    }

    pub fn into_set(self) -> PinAssignmentSet {
        self.set
    }

    pub fn is_used(&self, pin: PinId) -> bool {
        self.used.contains(&pin)
    }

    /// Add bindings for `component` and return their indices.
    ///
    /// Either every pin the peripheral needs is found and bound, or nothing
    /// is added and `None` is returned.
    pub fn allocate(&mut self, component: &str, kind: PeripheralKind) -> Option<Vec<usize>> {
        let role = kind.role();
        let mut picked: Vec<(String, PinId)> = Vec::new();
        let mut claimed = self.used.clone();

        match kind {
            PeripheralKind::I2c | PeripheralKind::Spi | PeripheralKind::Uart => {
                for signal in BusRole::signals_of(role) {
                    let pin = self
                        .set
                        .board()
                        .bus_pin(*signal)
                        .filter(|pin| !claimed.contains(pin))
                        .or_else(|| self.first_free_gpio(&claimed))?;
                    claimed.insert(pin);
                    picked.push((signal.as_str().to_string(), pin));
                }
            }
            _ => {
                let pin = match role {
                    PinRole::Pwm | PinRole::Adc => self
                        .set
                        .board()
                        .repair_candidates(role)
                        .into_iter()
                        .find(|pin| !claimed.contains(pin)),
                    _ => self.first_free_gpio(&claimed),
                }?;
                let signal = match kind {
                    PeripheralKind::DigitalSensor => "DATA",
                    _ => DEFAULT_SIGNAL,
                };
                picked.push((signal.to_string(), pin));
            }
        }

        let indices = picked
            .into_iter()
            .map(|(signal, pin)| {
                self.used.insert(pin);
                self.set
                    .push(ComponentBinding::new(component, pin, role).with_signal(signal))
            })
            .collect::<Vec<_>>();

        tracing::debug!("Allocated {} pin(s) for {} ({})", indices.len(), component, kind);
        Some(indices)
    }

    /// Lowest free non-reserved pin.
    fn first_free_gpio(&self, claimed: &BTreeSet<PinId>) -> Option<PinId> {
        let board = self.set.board();
        board
            .available_pins()
            .iter()
            .copied()
            .find(|pin| !board.is_reserved(*pin) && !claimed.contains(pin))
    }
}
