//! Board-wide pin usage view.

use crate::board::{BusRole, PinId, PinRole};
use crate::pins::PinAssignmentSet;
use crate::validate::{validate, ValidationIssue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub board: String,
    /// Distinct pins claimed by the set, ascending.
    pub used: Vec<PinId>,
    /// Unclaimed pins per capability class, ascending. GPIO lists only
    /// non-reserved pins; bus roles list the board's free default pins.
    pub free_by_capability: BTreeMap<PinRole, Vec<PinId>>,
    pub outstanding_conflicts: Vec<ValidationIssue>,
}

impl UsageSummary {
    pub fn free(&self, role: PinRole) -> &[PinId] {
        self.free_by_capability
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_conflicts(&self) -> bool {
        !self.outstanding_conflicts.is_empty()
    }
}

impl fmt::Display for UsageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board: {}", self.board)?;
        writeln!(f, "Used pins ({}): {}", self.used.len(), join(&self.used))?;
        for (role, pins) in &self.free_by_capability {
            writeln!(f, "Free {:<4} ({}): {}", role.as_str(), pins.len(), join(pins))?;
        }
        if self.outstanding_conflicts.is_empty() {
            write!(f, "No outstanding conflicts")
        } else {
            writeln!(f, "Outstanding conflicts:")?;
            for (i, issue) in self.outstanding_conflicts.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                write!(f, "  - {}", issue)?;
            }
            Ok(())
        }
    }
}

fn join(pins: &[PinId]) -> String {
    if pins.is_empty() {
        return "-".to_string();
    }
    pins.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Derive the usage view for `set` against its own board.
///
/// The set carries the profile it was built for, so no separate board
/// argument is taken; checking against another board means rebuilding the
/// set with `PinAssignmentSet::with_bindings`.
pub fn report(set: &PinAssignmentSet) -> UsageSummary {
    let board = set.board();
    let used: BTreeSet<PinId> = set.used_pins();
    let is_free = |pin: PinId| !used.contains(&pin);

    let mut free_by_capability = BTreeMap::new();
    for role in PinRole::ALL {
        let free: Vec<PinId> = match role {
            PinRole::Gpio => board
                .available_pins()
                .iter()
                .copied()
                .filter(|pin| is_free(*pin) && !board.is_reserved(*pin))
                .collect(),
            PinRole::Pwm => board.pwm_pins().iter().copied().filter(|p| is_free(*p)).collect(),
            PinRole::Adc => board.adc_pins().iter().copied().filter(|p| is_free(*p)).collect(),
            PinRole::I2c | PinRole::Spi | PinRole::Uart => {
                let pins: BTreeSet<PinId> = BusRole::signals_of(role)
                    .iter()
                    .filter_map(|signal| board.bus_pin(*signal))
                    .filter(|p| is_free(*p))
                    .collect();
                pins.into_iter().collect()
            }
        };
        free_by_capability.insert(role, free);
    }

    let outstanding_conflicts = validate(set)
        .into_iter()
        .filter(ValidationIssue::is_critical)
        .collect();

    UsageSummary {
        board: board.key().to_string(),
        used: used.into_iter().collect(),
        free_by_capability,
        outstanding_conflicts,
    }
}
