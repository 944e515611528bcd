//! Constraint validation of a pin assignment set against its board.

use crate::board::{PinId, PinRole};
use crate::pins::PinAssignmentSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidPin,
    ReservedPin,
    CapabilityMismatch,
    DuplicatePin,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueKind::InvalidPin => "invalid pin",
            IssueKind::ReservedPin => "reserved pin",
            IssueKind::CapabilityMismatch => "capability mismatch",
            IssueKind::DuplicatePin => "duplicate pin",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
        })
    }
}

/// One observation about a set at one point in time.
///
/// Issues are recomputed on every pass and never patched. `bindings` holds
/// the indices of every binding the issue is about, so consumers never have
/// to recover the subject from `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub subject_component: String,
    pub message: String,
    pub suggested_pin: Option<PinId>,
    pub bindings: Vec<usize>,
}

impl ValidationIssue {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    pub fn involves(&self, binding: usize) -> bool {
        self.bindings.contains(&binding)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

/// Whether any issue blocks a ready-to-build state.
pub fn has_critical(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_critical)
}

/// Indices of all bindings named by a Critical issue.
pub fn critical_bindings(issues: &[ValidationIssue]) -> BTreeSet<usize> {
    issues
        .iter()
        .filter(|issue| issue.is_critical())
        .flat_map(|issue| issue.bindings.iter().copied())
        .collect()
}

/// Check every binding against the board, then against each other.
///
/// Per-binding checks run first, in declaration order: an unavailable pin
/// is reported as `InvalidPin` and nothing else is checked for it; a
/// reserved pin is a Warning; a PWM or ADC binding on a pin without that
/// capability is a `CapabilityMismatch` with the lowest unclaimed capable
/// pin as suggestion. Bindings on the same available pin then produce one
/// `DuplicatePin` issue per pin.
pub fn validate(set: &PinAssignmentSet) -> Vec<ValidationIssue> {
    let board = set.board();
    let bindings = set.bindings();
    let mut issues = Vec::new();
    let mut groups: BTreeMap<PinId, Vec<usize>> = BTreeMap::new();

    for (index, binding) in bindings.iter().enumerate() {
        if !board.is_available(binding.pin) {
            issues.push(ValidationIssue {
                kind: IssueKind::InvalidPin,
                severity: Severity::Critical,
                subject_component: binding.component_name.clone(),
                message: format!(
                    "Pin {} for {} is not available on {}",
                    binding.pin,
                    binding.component_name,
                    board.name()
                ),
                suggested_pin: None,
                bindings: vec![index],
            });
            continue;
        }

        if board.is_reserved(binding.pin) {
            issues.push(ValidationIssue {
                kind: IssueKind::ReservedPin,
                severity: Severity::Warning,
                subject_component: binding.component_name.clone(),
                message: format!(
                    "Pin {} for {} is reserved on {} (boot/flash); use a different pin if possible",
                    binding.pin,
                    binding.component_name,
                    board.name()
                ),
                suggested_pin: None,
                bindings: vec![index],
            });
        }

        let capable = match binding.role {
            PinRole::Pwm => Some(board.pwm_pins()),
            PinRole::Adc => Some(board.adc_pins()),
            _ => None,
        };
        if let Some(capable) = capable {
            if !capable.contains(&binding.pin) {
                let suggested_pin = capable
                    .iter()
                    .copied()
                    .find(|pin| !claimed_by_other(set, index, *pin));
                issues.push(ValidationIssue {
                    kind: IssueKind::CapabilityMismatch,
                    severity: Severity::Critical,
                    subject_component: binding.component_name.clone(),
                    message: format!(
                        "Pin {} is not {}-capable for {}",
                        binding.pin, binding.role, binding.component_name
                    ),
                    suggested_pin,
                    bindings: vec![index],
                });
            }
        }

        groups.entry(binding.pin).or_default().push(index);
    }

    let mut duplicates: Vec<(PinId, Vec<usize>)> = groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .collect();
    duplicates.sort_by_key(|(_, members)| members[0]);

    for (pin, members) in duplicates {
        let names: Vec<&str> = members
            .iter()
            .map(|&i| bindings[i].component_name.as_str())
            .collect();
        issues.push(ValidationIssue {
            kind: IssueKind::DuplicatePin,
            severity: Severity::Critical,
            subject_component: names[0].to_string(),
            message: format!("Pin {} is assigned to multiple components: {}", pin, names.join(", ")),
            suggested_pin: None,
            bindings: members,
        });
    }

    tracing::debug!(
        "Validated {} bindings on {}: {} critical, {} warnings",
        bindings.len(),
        board.key(),
        issues.iter().filter(|i| i.is_critical()).count(),
        issues.iter().filter(|i| !i.is_critical()).count()
    );

    issues
}

fn claimed_by_other(set: &PinAssignmentSet, index: usize, pin: PinId) -> bool {
    set.bindings()
        .iter()
        .enumerate()
        .any(|(other, binding)| other != index && binding.pin == pin)
}
