// End-to-end repair scenarios against the built-in board catalog

#[cfg(test)]
mod tests {
    use pin_resolver::*;

    fn catalog() -> BoardCatalog {
        BoardCatalog::builtin().expect("builtin catalog")
    }

    fn set_on(board: &str, bindings: Vec<ComponentBinding>) -> PinAssignmentSet {
        PinAssignmentSet::with_bindings(catalog().lookup_or_generic(board), bindings)
    }

    fn pins(set: &PinAssignmentSet) -> Vec<PinId> {
        set.bindings().iter().map(|b| b.pin).collect()
    }

    #[test]
    fn test_esp32_duplicate_led_and_servo() {
        let set = set_on(
            "esp32",
            vec![
                ComponentBinding::new("LED", 2, PinRole::Gpio),
                ComponentBinding::new("Servo", 2, PinRole::Pwm),
            ],
        );
        let before = validate(&set);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].kind, IssueKind::DuplicatePin);
        assert_eq!(before[0].bindings, vec![0, 1]);

        let resolution = resolve(set);
        assert_eq!(pins(&resolution.set), vec![2, 4]);
        assert!(resolution.is_ready());
        assert!(
            !resolution
                .issues
                .iter()
                .any(|i| i.kind == IssueKind::DuplicatePin && i.is_critical())
        );
        let warnings: Vec<&ValidationIssue> = resolution.issues.iter().filter(|i| !i.is_critical()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].subject_component, "Servo");
        assert_eq!(warnings[0].suggested_pin, Some(4));
    }

    #[test]
    fn test_uno_thermistor_moves_to_first_adc_pin() {
        let set = set_on("arduino_uno", vec![ComponentBinding::new("Thermistor", 7, PinRole::Adc)]);
        let resolution = resolve(set);
        assert_eq!(pins(&resolution.set), vec![14]);
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].kind, IssueKind::CapabilityMismatch);
        assert_eq!(resolution.issues[0].severity, Severity::Warning);
        assert_eq!(resolution.issues[0].suggested_pin, Some(14));
    }

    #[test]
    fn test_esp32_reserved_pin_only_warns() {
        let set = set_on("esp32", vec![ComponentBinding::new("Flash", 6, PinRole::Gpio)]);
        let resolution = resolve(set.clone());
        assert_eq!(resolution.set, set);
        assert_eq!(resolution.issues.len(), 1);
        assert_eq!(resolution.issues[0].kind, IssueKind::ReservedPin);
        assert_eq!(resolution.issues[0].severity, Severity::Warning);
        assert!(resolution.is_ready());
    }

    #[test]
    fn test_unknown_board_degrades_to_generic() {
        let set = set_on(
            "unknown_board_xyz",
            vec![
                ComponentBinding::new("LED", 13, PinRole::Gpio),
                ComponentBinding::new("Servo", 9, PinRole::Pwm),
                ComponentBinding::new("Pot", 3, PinRole::Adc),
            ],
        );
        assert_eq!(set.board().key(), "generic");
        assert_eq!(set.board().available_pins().len(), 32);

        let resolution = resolve(set);
        assert_eq!(pins(&resolution.set), vec![13, 9, 3]);
        let unresolved: Vec<&ValidationIssue> = resolution.unresolved().collect();
        assert_eq!(unresolved.len(), 2);
        for issue in unresolved {
            assert_eq!(issue.kind, IssueKind::CapabilityMismatch);
            assert_eq!(issue.suggested_pin, None);
        }
    }

    #[test]
    fn test_esp32_pwm_exhaustion_is_reported() {
        let board = catalog().lookup("esp32").unwrap();
        let mut set = PinAssignmentSet::new(board.clone());
        for pin in board.pwm_pins().iter().copied() {
            set.push(ComponentBinding::new(format!("Channel{pin}"), pin, PinRole::Pwm));
        }
        set.push(ComponentBinding::new("Extra", 34, PinRole::Pwm));

        let before = validate(&set);
        assert_eq!(before.len(), 1);

        let resolution = resolve(set.clone());
        assert_eq!(resolution.set, set);
        assert_eq!(resolution.issues, before);
        assert!(!resolution.is_ready());
    }

    #[test]
    fn test_unrepairable_servo_keeps_its_pin_to_itself() {
        let mut bindings: Vec<ComponentBinding> = (2..20)
            .filter(|pin| *pin != 7)
            .map(|pin| ComponentBinding::new(format!("Out{pin}"), pin, PinRole::Gpio))
            .collect();
        bindings.push(ComponentBinding::new("Relay", 99, PinRole::Gpio));
        bindings.push(ComponentBinding::new("Servo", 7, PinRole::Pwm));
        let set = set_on("arduino_uno", bindings);

        let resolution = resolve(set);
        let pins = pins(&resolution.set);
        assert_eq!(&pins[17..], &[0, 7]);
        assert!(validate(&resolution.set).iter().all(|i| i.kind != IssueKind::DuplicatePin));
        assert!(!resolution.is_ready());
        assert_eq!(
            resolution.unresolved().map(|i| i.subject_component.as_str()).collect::<Vec<_>>(),
            vec!["Servo"]
        );
        assert_eq!(
            resolution.fixes().map(|i| (i.subject_component.as_str(), i.suggested_pin)).collect::<Vec<_>>(),
            vec![("Relay", Some(0))]
        );
    }

    #[test]
    fn test_mixed_issues_keep_declaration_order() {
        let set = set_on(
            "arduino_uno",
            vec![
                ComponentBinding::new("Button", 2, PinRole::Gpio),
                ComponentBinding::new("Motor", 4, PinRole::Pwm),
                ComponentBinding::new("Sensor", 25, PinRole::Adc),
                ComponentBinding::new("Buzzer", 2, PinRole::Gpio),
                ComponentBinding::new("Fan", 3, PinRole::Pwm),
            ],
        );
        let resolution = resolve(set);
        // Button and Buzzer share 2: Button keeps it, Buzzer takes the next
        // free pin after everything before it in declaration order.
        assert_eq!(pins(&resolution.set), vec![2, 5, 14, 4, 3]);
        assert!(resolution.is_ready());
        let fixed: Vec<&str> = resolution.fixes().map(|i| i.subject_component.as_str()).collect();
        assert_eq!(fixed, vec!["Motor", "Sensor", "Buzzer"]);
    }

    #[test]
    fn test_second_resolve_is_a_no_op() {
        let set = set_on(
            "arduino_mega",
            vec![
                ComponentBinding::new("A", 2, PinRole::Pwm),
                ComponentBinding::new("B", 2, PinRole::Pwm),
                ComponentBinding::new("C", 100, PinRole::Gpio),
                ComponentBinding::new("D", 20, PinRole::Adc),
            ],
        );
        let first = resolve(set);
        assert!(first.is_ready());
        let second = resolve(first.set.clone());
        assert_eq!(second.set, first.set);
        assert!(second.issues.iter().all(|i| !i.is_critical()));
    }
}
