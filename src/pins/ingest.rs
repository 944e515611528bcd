//! Raw connection records from upstream generators and the text
//! extractors that produce them.

use super::normalize::{normalize, RawPin};
use super::{ComponentBinding, PinAssignmentSet, DEFAULT_SIGNAL};
use crate::board::{BoardProfile, PinRole};
use crate::validate::{IssueKind, Severity, ValidationIssue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

pub const PROMPT_NOTE: &str = "from user prompt";

static PROMPT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9_ ]*?)\s*[-:=]\s*(\d+)\s*$").expect("prompt pattern")
});

static DEFINE_PIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)#define\s+(\w*(?:PIN|LED|SERVO|MOTOR)\w*)\s+(\d+)").expect("define pattern")
});

static CONST_PIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)const\s+int\s+(\w*(?:PIN|LED|SERVO|MOTOR)\w*)\s*=\s*(\d+)")
        .expect("const pattern")
});

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One pin line of a connection record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawPinEntry {
    pub mcu_pin: RawPin,
    #[serde(default)]
    pub component_pin: Option<String>,
    #[serde(default, rename = "type")]
    pub role: Option<String>,
}

/// A component and the pins the generator wired it to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawConnection {
    pub component: String,
    #[serde(default)]
    pub pins: Vec<RawPinEntry>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RawConnection {
    fn single(component: impl Into<String>, pin: u32, note: String) -> Self {
        let component = component.into();
        Self {
            pins: vec![RawPinEntry {
                mcu_pin: RawPin::from(pin),
                component_pin: Some(DEFAULT_SIGNAL.to_string()),
                role: Some(PinRole::Gpio.as_str().to_string()),
            }],
            component,
            notes: Some(note),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConnectionDocument {
    List(Vec<RawConnection>),
    Wrapped { connections: Vec<RawConnection> },
}

/// Parse connection records from JSON: either a bare array or an object
/// with a `connections` array.
pub fn parse_connections(json: &str) -> Result<Vec<RawConnection>, IngestError> {
    let connections = match serde_json::from_str(json)? {
        ConnectionDocument::List(list) => list,
        ConnectionDocument::Wrapped { connections } => connections,
    };
    Ok(connections)
}

impl PinAssignmentSet {
    /// Build a set from raw records, normalizing every pin.
    ///
    /// A pin with no digits is not added to the set; it is reported as an
    /// `InvalidPin` Warning with an empty binding list so the rest of the
    /// batch still resolves.
    pub fn from_connections(
        board: Arc<BoardProfile>,
        connections: &[RawConnection],
    ) -> (Self, Vec<ValidationIssue>) {
        let mut set = PinAssignmentSet::new(board);
        let mut issues = Vec::new();

        for connection in connections {
            let note = connection.notes.clone().unwrap_or_default();
            for entry in &connection.pins {
                match normalize(&entry.mcu_pin, entry.role.as_deref()) {
                    Ok((pin, role)) => {
                        let signal = entry
                            .component_pin
                            .as_deref()
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .unwrap_or(DEFAULT_SIGNAL);
                        set.push(
                            ComponentBinding::new(connection.component.clone(), pin, role)
                                .with_signal(signal)
                                .with_note(note.clone()),
                        );
                    }
                    Err(e) => {
                        tracing::warn!("Skipping pin for {}: {}", connection.component, e);
                        issues.push(ValidationIssue {
                            kind: IssueKind::InvalidPin,
                            severity: Severity::Warning,
                            subject_component: connection.component.clone(),
                            message: format!(
                                "Could not read pin '{}' for {}; binding skipped",
                                entry.mcu_pin, connection.component
                            ),
                            suggested_pin: None,
                            bindings: Vec::new(),
                        });
                    }
                }
            }
        }

        (set, issues)
    }
}

/// Explicit `LABEL - 19`, `LABEL: 19` or `LABEL = 19` lines in a request.
pub fn extract_prompt_mappings(prompt: &str) -> Vec<RawConnection> {
    let connections: Vec<RawConnection> = prompt
        .lines()
        .filter_map(|line| {
            let caps = PROMPT_LINE.captures(line)?;
            let label = caps[1].trim();
            let pin = caps[2].parse().ok()?;
            let mut connection = RawConnection::single(label, pin, PROMPT_NOTE.to_string());
            if let Some(entry) = connection.pins.first_mut() {
                entry.component_pin = Some(label.to_string());
            }
            Some(connection)
        })
        .collect();

    if !connections.is_empty() {
        tracing::info!("Extracted {} explicit pin mappings from prompt", connections.len());
    }
    connections
}

/// Pin constants in generated code: `#define NAME 13` and
/// `const int NAME = 13;` where NAME mentions PIN, LED, SERVO or MOTOR.
///
/// `#define`s are read before `const`s, and only the first name seen for a
/// given pin is kept.
pub fn extract_define_mappings(code: &str) -> Vec<RawConnection> {
    let mut seen = BTreeSet::new();
    let mut connections = Vec::new();

    let sources = [(&*DEFINE_PIN, "#define"), (&*CONST_PIN, "const")];
    for (pattern, keyword) in sources {
        for caps in pattern.captures_iter(code) {
            let name = &caps[1];
            let Ok(pin) = caps[2].parse::<u32>() else {
                continue;
            };
            if !seen.insert(pin) {
                continue;
            }
            connections.push(RawConnection::single(
                component_from_constant(name),
                pin,
                format!("from code {keyword} {name}"),
            ));
        }
    }
    connections
}

/// `LED_PIN` -> `LED`, `PIN_SERVO` -> `SERVO`; names that are only `PIN`
/// are kept as written.
fn component_from_constant(name: &str) -> String {
    let stripped = name.replace("_PIN", "").replace("PIN_", "");
    if stripped.is_empty() {
        name.to_string()
    } else {
        stripped
    }
}
