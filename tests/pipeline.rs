// Ingest -> resolve -> render, the way a generation step drives the library

#[cfg(test)]
mod tests {
    use pin_resolver::pins::{extract_define_mappings, extract_prompt_mappings, parse_connections};
    use pin_resolver::render::{connection_table, pins_header};
    use pin_resolver::*;

    const GENERATED: &str = r#"{
        "connections": [
            {"component": "L298N", "pins": [
                {"mcu_pin": "GPIO19", "component_pin": "ENA", "type": "PWM"},
                {"mcu_pin": "GPIO21", "component_pin": "IN1", "type": "GPIO"},
                {"mcu_pin": "GPIO21", "component_pin": "IN2", "type": "GPIO"}
            ], "notes": "motor driver"},
            {"component": "Light Sensor", "pins": [
                {"mcu_pin": "A0", "component_pin": "AO", "type": "ADC"}
            ]},
            {"component": "Buzzer", "pins": [
                {"mcu_pin": "BUILTIN", "type": "GPIO"}
            ]}
        ]
    }"#;

    #[test]
    fn test_generated_connections_resolve() {
        let catalog = BoardCatalog::builtin().unwrap();
        let connections = parse_connections(GENERATED).unwrap();
        let (set, ingest_issues) =
            PinAssignmentSet::from_connections(catalog.lookup_or_generic("ESP32 DevKit"), &connections);

        assert_eq!(set.board().key(), "esp32");
        assert_eq!(set.len(), 4);
        assert_eq!(ingest_issues.len(), 1);
        assert_eq!(ingest_issues[0].subject_component, "Buzzer");
        assert_eq!(ingest_issues[0].kind, IssueKind::InvalidPin);
        assert_eq!(ingest_issues[0].severity, Severity::Warning);

        let resolution = resolve(set);
        assert!(resolution.is_ready());
        let pins: Vec<PinId> = resolution.set.bindings().iter().map(|b| b.pin).collect();
        // IN1/IN2 collide on 21 and pin 0 has no ADC, so all three are
        // rescanned from the lowest free pin.
        assert_eq!(pins, vec![19, 2, 3, 32]);

        let header = pins_header(&resolution.set);
        assert!(header.contains("#define L298N_PWM_PIN 19"));
        assert!(header.contains("#define L298N_IN1_GPIO_PIN 2"));
        assert!(header.contains("#define L298N_IN2_GPIO_PIN 3"));
        assert!(header.contains("#define LIGHT_SENSOR_ADC_PIN 32"));

        let table = connection_table(&resolution.set);
        assert!(table.contains("   MCU Pin 3 → L298N IN2 (GPIO)"));
        assert!(table.contains("   Note: motor driver"));
        assert!(table.ends_with("Total: 2 connections"));
    }

    #[test]
    fn test_prompt_mappings_are_checked_and_repaired() {
        let catalog = BoardCatalog::builtin().unwrap();
        let prompt = "Use my nano.\nLED - 13\nButton: 13\nPot = 22\n";
        let connections = extract_prompt_mappings(prompt);
        let (set, issues) = PinAssignmentSet::from_connections(catalog.lookup_or_generic("nano"), &connections);
        assert!(issues.is_empty());
        assert!(set.bindings().iter().all(|b| b.source_note == "from user prompt"));

        let resolution = resolve(set);
        let pins: Vec<PinId> = resolution.set.bindings().iter().map(|b| b.pin).collect();
        assert_eq!(pins, vec![2, 3, 4]);
        assert_eq!(resolution.fixes().count(), 3);
        assert!(resolution.is_ready());
    }

    #[test]
    fn test_define_mappings_feed_diagnostics() {
        let catalog = BoardCatalog::builtin().unwrap();
        let code = "#define LED_PIN 2\n#define SERVO_PIN 6\nconst int MOTOR_PIN = 60;\n";
        let connections = extract_define_mappings(code);
        let (set, _) = PinAssignmentSet::from_connections(catalog.lookup_or_generic("esp32"), &connections);

        let resolution = resolve(set);
        let diagnostics = Diagnostics::from(&resolution);
        assert!(diagnostics.ready);
        assert_eq!(diagnostics.pins["MOTOR_GPIO_PIN"], 3);
        assert_eq!(diagnostics.pins["SERVO_GPIO_PIN"], 6);
        assert!(
            diagnostics
                .issues
                .iter()
                .any(|i| i.kind == IssueKind::ReservedPin && i.subject_component == "SERVO")
        );
        assert!(diagnostics.usage.outstanding_conflicts.is_empty());

        let json: serde_json::Value = serde_json::from_str(&diagnostics.to_json().unwrap()).unwrap();
        assert_eq!(json["board"], "esp32");
        assert_eq!(json["bindings"][2]["source_note"], "from code const MOTOR_PIN");
    }

    #[test]
    fn test_allocated_peripherals_resolve_cleanly() {
        let catalog = BoardCatalog::builtin().unwrap();
        let mut allocator = PinAllocator::new(PinAssignmentSet::new(catalog.lookup_or_generic("stm32")));
        for (name, kind) in [
            ("OLED", PeripheralKind::I2c),
            ("Card", PeripheralKind::Spi),
            ("Fan", PeripheralKind::Servo),
            ("Probe", PeripheralKind::AnalogSensor),
            ("Status", PeripheralKind::Led),
        ] {
            assert!(allocator.allocate(name, kind).is_some(), "{name}");
        }
        let set = allocator.into_set();
        assert!(validate(&set).is_empty());
        let resolution = resolve(set.clone());
        assert_eq!(resolution.set, set);
    }
}
