//! Bindings of named components to pins, and the set they are validated in.

use crate::board::{BoardProfile, PinId, PinRole};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Component-side pin name used when the generator gives none.
pub const DEFAULT_SIGNAL: &str = "Signal";

/// One component's claim on one pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentBinding {
    /// Case-preserved; used in diagnostics and generated identifiers.
    pub component_name: String,
    /// Pin name on the component side (`SDA`, `IN1`, ...).
    pub signal: String,
    pub pin: PinId,
    pub role: PinRole,
    /// Where the claim came from, e.g. "from user prompt".
    pub source_note: String,
}

impl ComponentBinding {
    pub fn new(component_name: impl Into<String>, pin: PinId, role: PinRole) -> Self {
        Self {
            component_name: component_name.into(),
            signal: DEFAULT_SIGNAL.to_string(),
            pin,
            role,
            source_note: String::new(),
        }
    }

    pub fn with_signal(mut self, signal: impl Into<String>) -> Self {
        self.signal = signal.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.source_note = note.into();
        self
    }
}

/// Ordered bindings plus the board they are checked against.
///
/// A set is owned by one resolution request; nothing in the crate keeps a
/// reference to it between calls. Pins can only be changed by the repair
/// engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PinAssignmentSet {
    board: Arc<BoardProfile>,
    bindings: Vec<ComponentBinding>,
}

impl PinAssignmentSet {
    pub fn new(board: Arc<BoardProfile>) -> Self {
        Self {
            board,
            bindings: Vec::new(),
        }
    }

    pub fn with_bindings(board: Arc<BoardProfile>, bindings: Vec<ComponentBinding>) -> Self {
        Self { board, bindings }
    }

    /// Append a binding, returning its index.
    pub fn push(&mut self, binding: ComponentBinding) -> usize {
        self.bindings.push(binding);
        self.bindings.len() - 1
    }

    pub fn board(&self) -> &BoardProfile {
        &self.board
    }

    pub fn board_handle(&self) -> Arc<BoardProfile> {
        Arc::clone(&self.board)
    }

    pub fn bindings(&self) -> &[ComponentBinding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&ComponentBinding> {
        self.bindings.get(index)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every pin currently claimed by some binding.
    pub fn used_pins(&self) -> BTreeSet<PinId> {
        self.bindings.iter().map(|b| b.pin).collect()
    }

    /// Bindings belonging to `component_name`, in declaration order.
    pub fn bindings_for<'a>(&'a self, component_name: &'a str) -> impl Iterator<Item = &'a ComponentBinding> + 'a {
        self.bindings
            .iter()
            .filter(move |b| b.component_name == component_name)
    }

    pub fn into_bindings(self) -> Vec<ComponentBinding> {
        self.bindings
    }

    pub(crate) fn reassign(&mut self, index: usize, pin: PinId) {
        if let Some(binding) = self.bindings.get_mut(index) {
            binding.pin = pin;
        }
    }
}
