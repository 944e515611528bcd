//! Output formats for a resolved set: C pin header, human-readable
//! connection table and the JSON diagnostics payload.

use crate::board::{PinId, PinRole};
use crate::pins::{ComponentBinding, PinAssignmentSet};
use crate::report::{report, UsageSummary};
use crate::resolve::Resolution;
use crate::validate::{has_critical, ValidationIssue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const HEADER_GUARD: &str = "RESOLVED_PINS_H";
const RULE_WIDTH: usize = 50;
const BLOCK_RULE_WIDTH: usize = 40;

/// Uppercase C identifier fragment: anything not alphanumeric becomes `_`.
pub fn identifier(text: &str) -> String {
    let ident: String = text
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// `#define` names for every binding, in binding order.
///
/// `<COMPONENT>_<ROLE>_PIN`, with the signal inserted when one component
/// holds several pins of the same role. A name that still collides gets a
/// numeric suffix.
pub fn define_names(set: &PinAssignmentSet) -> Vec<String> {
    let mut per_role: BTreeMap<(&str, PinRole), usize> = BTreeMap::new();
    for binding in set.bindings() {
        *per_role
            .entry((binding.component_name.as_str(), binding.role))
            .or_default() += 1;
    }

    let mut taken = BTreeSet::new();
    set.bindings()
        .iter()
        .map(|binding| {
            let shared = per_role
                .get(&(binding.component_name.as_str(), binding.role))
                .is_some_and(|count| *count > 1);
            let base = if shared {
                format!(
                    "{}_{}_{}_PIN",
                    identifier(&binding.component_name),
                    identifier(&binding.signal),
                    binding.role
                )
            } else {
                format!("{}_{}_PIN", identifier(&binding.component_name), binding.role)
            };
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

/// Guarded C header with one `#define` per binding.
pub fn pins_header(set: &PinAssignmentSet) -> String {
    let mut lines = vec![
        "/*".to_string(),
        format!(" * Resolved pin definitions for {}", set.board().name()),
        " */".to_string(),
        String::new(),
        format!("#ifndef {HEADER_GUARD}"),
        format!("#define {HEADER_GUARD}"),
        String::new(),
    ];
    for (name, binding) in define_names(set).iter().zip(set.bindings()) {
        lines.push(format!("#define {} {}", name, binding.pin));
    }
    lines.push(String::new());
    lines.push(format!("#endif // {HEADER_GUARD}"));
    lines.push(String::new());
    lines.join("\n")
}

/// Numbered connection list, one block per component in first-seen order.
pub fn connection_table(set: &PinAssignmentSet) -> String {
    let mut lines = vec![
        "PIN CONNECTIONS".to_string(),
        "=".repeat(RULE_WIDTH),
        format!("MCU: {}", set.board().key().to_ascii_uppercase()),
        String::new(),
    ];

    let components = group_by_component(set.bindings());
    for (i, (component, bindings)) in components.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, component));
        lines.push(format!("   {}", "-".repeat(BLOCK_RULE_WIDTH)));
        for binding in bindings {
            lines.push(format!(
                "   MCU Pin {} → {} {} ({})",
                binding.pin, component, binding.signal, binding.role
            ));
        }
        let notes: Vec<&str> = bindings
            .iter()
            .map(|b| b.source_note.as_str())
            .filter(|n| !n.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !notes.is_empty() {
            lines.push(format!("   Note: {}", notes.join("; ")));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!("Total: {} connections", components.len()));
    lines.join("\n")
}

fn group_by_component(bindings: &[ComponentBinding]) -> Vec<(&str, Vec<&ComponentBinding>)> {
    let mut groups: Vec<(&str, Vec<&ComponentBinding>)> = Vec::new();
    for binding in bindings {
        match groups
            .iter()
            .position(|(name, _)| *name == binding.component_name)
        {
            Some(i) => groups[i].1.push(binding),
            None => groups.push((binding.component_name.as_str(), vec![binding])),
        }
    }
    groups
}

/// API payload describing one resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub board: String,
    pub board_name: String,
    /// No Critical issue is outstanding.
    pub ready: bool,
    /// `#define` name to pin.
    pub pins: BTreeMap<String, PinId>,
    pub bindings: Vec<ComponentBinding>,
    pub issues: Vec<ValidationIssue>,
    pub usage: UsageSummary,
}

impl Diagnostics {
    pub fn new(set: &PinAssignmentSet, issues: &[ValidationIssue]) -> Self {
        let pins = define_names(set)
            .into_iter()
            .zip(set.bindings().iter().map(|b| b.pin))
            .collect();
        Self {
            board: set.board().key().to_string(),
            board_name: set.board().name().to_string(),
            ready: !has_critical(issues),
            pins,
            bindings: set.bindings().to_vec(),
            issues: issues.to_vec(),
            usage: report(set),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Resolution> for Diagnostics {
    fn from(resolution: &Resolution) -> Self {
        Diagnostics::new(&resolution.set, &resolution.issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardCatalog;
    use crate::resolve::resolve;

    fn set_on(board: &str, bindings: Vec<ComponentBinding>) -> PinAssignmentSet {
        let catalog = BoardCatalog::builtin().unwrap();
        PinAssignmentSet::with_bindings(catalog.lookup_or_generic(board), bindings)
    }

    fn motor_set() -> PinAssignmentSet {
        set_on(
            "esp32",
            vec![
                ComponentBinding::new("L298N", 19, PinRole::Pwm)
                    .with_signal("ENA")
                    .with_note("from user prompt"),
                ComponentBinding::new("L298N", 21, PinRole::Gpio).with_signal("IN1"),
                ComponentBinding::new("L298N", 18, PinRole::Gpio).with_signal("IN2"),
                ComponentBinding::new("Status LED", 2, PinRole::Gpio),
            ],
        )
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("Status LED"), "STATUS_LED");
        assert_eq!(identifier("dht-22"), "DHT_22");
        assert_eq!(identifier("7seg"), "_7SEG");
    }

    #[test]
    fn test_define_names_insert_signal_when_role_repeats() {
        assert_eq!(
            define_names(&motor_set()),
            vec![
                "L298N_PWM_PIN",
                "L298N_IN1_GPIO_PIN",
                "L298N_IN2_GPIO_PIN",
                "STATUS_LED_GPIO_PIN",
            ]
        );
    }

    #[test]
    fn test_define_names_never_collide() {
        let set = set_on(
            "esp32",
            vec![
                ComponentBinding::new("LED", 2, PinRole::Gpio),
                ComponentBinding::new("LED", 4, PinRole::Gpio),
            ],
        );
        assert_eq!(define_names(&set), vec!["LED_SIGNAL_GPIO_PIN", "LED_SIGNAL_GPIO_PIN_2"]);
    }

    #[test]
    fn test_pins_header() {
        let header = pins_header(&motor_set());
        assert!(header.contains("#ifndef RESOLVED_PINS_H\n#define RESOLVED_PINS_H\n"));
        assert!(header.contains("#define L298N_PWM_PIN 19\n"));
        assert!(header.contains("#define STATUS_LED_GPIO_PIN 2\n"));
        assert!(header.trim_end().ends_with("#endif // RESOLVED_PINS_H"));
    }

    #[test]
    fn test_pins_header_layout() {
        let header = pins_header(&motor_set());
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "/*");
        assert_eq!(lines[1], " * Resolved pin definitions for ESP32 DevKit V1");
        assert_eq!(lines[4], "#ifndef RESOLVED_PINS_H");
        assert_eq!(lines[7], "#define L298N_PWM_PIN 19");
        assert_eq!(lines[lines.len() - 2], "");
        assert_eq!(*lines.last().unwrap(), "#endif // RESOLVED_PINS_H");
        assert!(header.ends_with("RESOLVED_PINS_H\n"));
    }

    #[test]
    fn test_connection_table() {
        let table = connection_table(&motor_set());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "PIN CONNECTIONS");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "MCU: ESP32");
        assert_eq!(lines[4], "1. L298N");
        assert_eq!(lines[5], format!("   {}", "-".repeat(40)));
        assert_eq!(lines[6], "   MCU Pin 19 → L298N ENA (PWM)");
        assert_eq!(lines[7], "   MCU Pin 21 → L298N IN1 (GPIO)");
        assert_eq!(lines[9], "   Note: from user prompt");
        assert!(table.contains("2. Status LED\n"));
        assert!(table.contains("   MCU Pin 2 → Status LED Signal (GPIO)"));
        assert_eq!(*lines.last().unwrap(), "Total: 2 connections");
    }

    #[test]
    fn test_diagnostics_payload() {
        let mut set = motor_set();
        set.push(ComponentBinding::new("Servo", 2, PinRole::Pwm));
        let resolution = resolve(set);
        let diagnostics = Diagnostics::from(&resolution);

        assert!(diagnostics.ready);
        assert_eq!(diagnostics.board, "esp32");
        assert_eq!(diagnostics.pins["SERVO_PWM_PIN"], 4);

        let value: serde_json::Value = serde_json::from_str(&diagnostics.to_json().unwrap()).unwrap();
        assert_eq!(value["ready"], true);
        assert_eq!(value["issues"][0]["kind"], "duplicate_pin");
        assert_eq!(value["issues"][0]["severity"], "warning");
        assert_eq!(value["issues"][0]["suggested_pin"], 4);
        assert_eq!(value["bindings"][0]["role"], "PWM");
    }
}
