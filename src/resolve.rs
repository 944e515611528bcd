//! Conflict repair engine.
//!
//! Takes a set with validation problems and moves only the offending
//! bindings to the lowest free pin with the capability they need. Bindings
//! without a Critical issue are frozen: their pins never change and are
//! never handed to another binding.

use crate::board::PinId;
use crate::pins::PinAssignmentSet;
use crate::validate::{
    critical_bindings, has_critical, validate, IssueKind, Severity, ValidationIssue,
};
use std::collections::BTreeSet;

/// Outcome of [`resolve`]: the (possibly repaired) set and the issues that
/// describe it.
///
/// Issue order is: unresolved Critical issues (as originally reported),
/// one Warning per auto-fixed binding, then the Warnings that still apply
/// to the final pins. A Critical raised by the re-check that is not already
/// listed is appended last.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub set: PinAssignmentSet,
    pub issues: Vec<ValidationIssue>,
}

impl Resolution {
    /// No Critical issue is left.
    pub fn is_ready(&self) -> bool {
        !has_critical(&self.issues)
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_critical())
    }

    /// Warnings recording a pin the engine moved.
    pub fn fixes(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|issue| !issue.is_critical() && issue.suggested_pin.is_some())
    }

    pub fn into_parts(self) -> (PinAssignmentSet, Vec<ValidationIssue>) {
        (self.set, self.issues)
    }
}

/// Validate `set` and repair what can be repaired.
///
/// Never fails: when no pin of the needed capability is free the binding
/// keeps its pin and its Critical issue is returned unchanged. Repairs are
/// planned before any pin moves: a binding found to be unrepairable holds
/// its current pin and the plan is redrawn around it, so no repair ever
/// lands on a pin that an unresolved binding keeps. The plan is then
/// applied in one pass and the set is validated once more.
pub fn resolve(mut set: PinAssignmentSet) -> Resolution {
    let initial = validate(&set);
    if !has_critical(&initial) {
        return Resolution { set, issues: initial };
    }

    let critical = critical_bindings(&initial);
    let mut held = BTreeSet::new();
    let plan = loop {
        let plan = plan_repairs(&set, &critical, &held);
        if plan.unresolved.is_subset(&held) {
            break plan;
        }
        held.extend(plan.unresolved.iter().copied());
    };

    let mut fixes = Vec::new();
    for &(index, pin) in &plan.moves {
        let binding = set.bindings()[index].clone();
        tracing::info!(
            "Auto-fix: {} {} → pin {} ({}), was pin {}",
            binding.component_name,
            binding.signal,
            pin,
            binding.role,
            binding.pin
        );
        set.reassign(index, pin);
        fixes.push(ValidationIssue {
            kind: primary_kind(&initial, index),
            severity: Severity::Warning,
            subject_component: binding.component_name.clone(),
            message: format!(
                "Auto-fixed: moved {} from pin {} to pin {} ({})",
                binding.component_name, binding.pin, pin, binding.role
            ),
            suggested_pin: Some(pin),
            bindings: vec![index],
        });
    }
    for &index in &plan.unresolved {
        let binding = &set.bindings()[index];
        tracing::warn!(
            "No free {} pin left for {}; leaving it on pin {}",
            binding.role,
            binding.component_name,
            binding.pin
        );
    }

    let after = validate(&set);
    let mut issues: Vec<ValidationIssue> = initial
        .iter()
        .filter(|issue| {
            issue.is_critical() && issue.bindings.iter().any(|b| plan.unresolved.contains(b))
        })
        .cloned()
        .collect();
    issues.extend(fixes);
    issues.extend(after.iter().filter(|issue| !issue.is_critical()).cloned());
    for issue in after.iter().filter(|issue| issue.is_critical()) {
        if !issues.contains(issue) {
            tracing::warn!("Repair left an unexpected conflict: {}", issue);
            issues.push(issue.clone());
        }
    }

    tracing::info!(
        "Resolved {} bindings on {}: {} moved, {} unresolved",
        set.len(),
        set.board().key(),
        plan.moves.len(),
        plan.unresolved.len()
    );

    Resolution { set, issues }
}

/// Pins chosen for the Critical bindings, before any of them is applied.
#[derive(Debug)]
struct RepairPlan {
    /// Binding index and its new pin, in ascending index order.
    moves: Vec<(usize, PinId)>,
    unresolved: BTreeSet<usize>,
}

/// Walk the Critical bindings in index order and pick the lowest free
/// candidate for each. Frozen pins and the pins of `held` bindings are
/// taken from the start; `held` bindings are not repaired.
fn plan_repairs(
    set: &PinAssignmentSet,
    critical: &BTreeSet<usize>,
    held: &BTreeSet<usize>,
) -> RepairPlan {
    let board = set.board();
    let mut used_pins: BTreeSet<PinId> = set
        .bindings()
        .iter()
        .enumerate()
        .filter(|(index, binding)| {
            !critical.contains(index) || (held.contains(index) && board.is_available(binding.pin))
        })
        .map(|(_, binding)| binding.pin)
        .collect();

    let mut moves = Vec::new();
    let mut unresolved = held.clone();
    for &index in critical.iter().filter(|index| !held.contains(*index)) {
        let binding = &set.bindings()[index];
        let candidate = board
            .repair_candidates(binding.role)
            .into_iter()
            .find(|pin| !used_pins.contains(pin));
        match candidate {
            Some(pin) => {
                used_pins.insert(pin);
                if pin != binding.pin {
                    moves.push((index, pin));
                }
            }
            None => {
                if board.is_available(binding.pin) {
                    used_pins.insert(binding.pin);
                }
                unresolved.insert(index);
            }
        }
    }
    RepairPlan { moves, unresolved }
}

/// Kind recorded on an auto-fix: the binding's first Critical issue in
/// validator order.
fn primary_kind(issues: &[ValidationIssue], index: usize) -> IssueKind {
    issues
        .iter()
        .find(|issue| issue.is_critical() && issue.involves(index))
        .map(|issue| issue.kind)
        .unwrap_or(IssueKind::DuplicatePin)
}
