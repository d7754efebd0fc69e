//! Terminal state: values, equality suppression, acceptability, naming.
mod common;
use common::*;
use labflow::prelude::*;
use labflow::surface::SurfaceEvent;
use labflow::terminal::TerminalState;

fn updates(log: &HookLog) -> usize {
    log.borrow().iter().filter(|h| **h == Hook::Updated).count()
}

#[cfg(test)]
mod terminal_tests {
    use super::*;

    #[test]
    fn test_new_terminal_starts_empty() {
        let mut flowchart = Flowchart::new();
        let (node, _) = HookNode::new(vec![
            TerminalSpec::input("in"),
            TerminalSpec::output("out").multi(),
        ]);
        flowchart.add_node("a", node).unwrap();

        let input = flowchart.find_terminal("a", "in").unwrap();
        let output = flowchart.find_terminal("a", "out").unwrap();
        let t = flowchart.terminal(input).unwrap();
        assert!(t.is_input());
        assert!(!t.is_multi_value());
        assert!(t.value().is_empty());
        assert_eq!(t.acceptability(), Acceptability::Unknown);
        assert!(!t.is_connected());
        assert_eq!(flowchart.status(input).unwrap(), TerminalStatus::Disconnected);

        let out = flowchart.terminal(output).unwrap();
        assert!(out.is_output());
        assert_eq!(out.value().entries().map(|e| e.len()), Some(0));
    }

    #[test]
    fn test_equal_value_does_not_recompute() {
        let mut flowchart = Flowchart::new();
        let (node, log) = HookNode::new(vec![TerminalSpec::input("in")]);
        flowchart.add_node("a", node).unwrap();
        let input = flowchart.find_terminal("a", "in").unwrap();

        flowchart.set_value(input, Value::Number(5.0), true).unwrap();
        flowchart.set_value(input, Value::Number(5.0), true).unwrap();
        assert_eq!(updates(&log), 1);

        flowchart.set_value(input, Value::Number(6.0), true).unwrap();
        assert_eq!(updates(&log), 2);
        assert_eq!(single(&flowchart, input), Some(Value::Number(6.0)));
    }

    #[test]
    fn test_composite_values_compare_structurally() {
        let mut flowchart = Flowchart::new();
        let (node, log) = HookNode::new(vec![TerminalSpec::input("in")]);
        flowchart.add_node("a", node).unwrap();
        let input = flowchart.find_terminal("a", "in").unwrap();

        let trace = || Value::Samples(vec![0.5, f64::NAN, -1.25]);
        flowchart.set_value(input, trace(), true).unwrap();
        flowchart.set_value(input, trace(), true).unwrap();
        assert_eq!(updates(&log), 1);

        let record = || {
            Value::Record(
                [
                    ("gain".to_string(), Value::Number(2.0)),
                    ("label".to_string(), Value::Text("sweep".into())),
                ]
                .into_iter()
                .collect(),
            )
        };
        flowchart.set_value(input, record(), true).unwrap();
        flowchart.set_value(input, record(), true).unwrap();
        assert_eq!(updates(&log), 2);
    }

    #[test]
    fn test_set_value_without_propagate_does_not_update() {
        let mut flowchart = Flowchart::new();
        let (node, log) = HookNode::new(vec![TerminalSpec::input("in")]);
        flowchart.add_node("a", node).unwrap();
        let input = flowchart.find_terminal("a", "in").unwrap();

        flowchart.set_value(input, Value::Bool(true), false).unwrap();
        assert_eq!(updates(&log), 0);
        assert_eq!(single(&flowchart, input), Some(Value::Bool(true)));
    }

    #[test]
    fn test_value_shape_must_match_terminal_kind() {
        let mut flowchart = Flowchart::new();
        let (node, _) = HookNode::new(vec![
            TerminalSpec::input("single"),
            TerminalSpec::input("multi").multi(),
        ]);
        flowchart.add_node("a", node).unwrap();
        let single_in = flowchart.find_terminal("a", "single").unwrap();
        let multi_in = flowchart.find_terminal("a", "multi").unwrap();

        let mapping: ahash::AHashMap<TerminalId, Option<Value>> =
            [(single_in, Some(Value::Number(1.0)))].into_iter().collect();
        let err = flowchart.set_value(single_in, mapping, true).unwrap_err();
        assert!(matches!(err, FlowError::ValueShapeMismatch { .. }));

        let err = flowchart
            .set_value(multi_in, Value::Number(1.0), true)
            .unwrap_err();
        assert!(matches!(err, FlowError::ValueShapeMismatch { .. }));

        // Clearing a multi terminal with a bare "no value" changes nothing.
        flowchart.set_value(multi_in, None::<Value>, true).unwrap();
        assert_eq!(entry_count(&flowchart, multi_in), 0);
    }

    #[test]
    fn test_value_change_resets_acceptability() {
        let mut flowchart = Flowchart::new();
        let (node, _) = HookNode::new(vec![TerminalSpec::input("in")]);
        flowchart.add_node("a", node).unwrap();
        let input = flowchart.find_terminal("a", "in").unwrap();

        flowchart.set_value(input, Value::Number(1.0), false).unwrap();
        flowchart
            .set_value_acceptable(input, Acceptability::Acceptable)
            .unwrap();
        assert_eq!(
            flowchart.terminal(input).unwrap().acceptability(),
            Acceptability::Acceptable
        );

        // Unchanged values keep the verdict.
        flowchart.set_value(input, Value::Number(1.0), false).unwrap();
        assert_eq!(
            flowchart.terminal(input).unwrap().acceptability(),
            Acceptability::Acceptable
        );

        flowchart.set_value(input, Value::Number(2.0), false).unwrap();
        assert_eq!(
            flowchart.terminal(input).unwrap().acceptability(),
            Acceptability::Unknown
        );
    }

    #[test]
    fn test_rename_notifies_node_once_with_old_name() {
        let (mut flowchart, surface) = recorded_flowchart();
        let (node, log) = HookNode::new(vec![TerminalSpec::input("in").renamable()]);
        flowchart.add_node("a", node).unwrap();
        let input = flowchart.find_terminal("a", "in").unwrap();

        flowchart.rename(input, "signal").unwrap();

        let renames: Vec<Hook> = log
            .borrow()
            .iter()
            .filter(|h| matches!(h, Hook::Renamed(..)))
            .cloned()
            .collect();
        assert_eq!(renames, vec![Hook::Renamed(input, "in".to_string())]);
        assert_eq!(flowchart.terminal(input).unwrap().name(), "signal");
        assert_eq!(flowchart.find_terminal("a", "signal").unwrap(), input);
        assert!(flowchart.find_terminal("a", "in").is_err());
        assert!(surface.events().contains(&SurfaceEvent::Renamed {
            terminal: input,
            name: "signal".to_string(),
        }));

        // Same name again is a no-op.
        flowchart.rename(input, "signal").unwrap();
        assert_eq!(
            log.borrow()
                .iter()
                .filter(|h| matches!(h, Hook::Renamed(..)))
                .count(),
            1
        );
    }

    #[test]
    fn test_rename_to_taken_name_is_rejected() {
        let mut flowchart = Flowchart::new();
        let (node, log) = HookNode::new(vec![TerminalSpec::input("a"), TerminalSpec::input("b")]);
        flowchart.add_node("n", node).unwrap();
        let a = flowchart.find_terminal("n", "a").unwrap();

        let err = flowchart.rename(a, "b").unwrap_err();
        assert!(matches!(err, FlowError::DuplicateTerminal { .. }));
        assert_eq!(flowchart.terminal(a).unwrap().name(), "a");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_duplicate_terminal_names_are_rejected() {
        let mut flowchart = Flowchart::new();
        let (node, _) = HookNode::new(vec![TerminalSpec::input("in")]);
        let id = flowchart.add_node("n", node).unwrap();

        let err = flowchart
            .add_terminal(id, TerminalSpec::output("in"))
            .unwrap_err();
        assert_eq!(
            err,
            FlowError::DuplicateTerminal {
                node: "n".to_string(),
                name: "in".to_string(),
            }
        );

        // The same name on another node is fine.
        let (other, _) = HookNode::new(vec![TerminalSpec::input("in")]);
        flowchart.add_node("m", other).unwrap();
        assert_ne!(
            flowchart.find_terminal("n", "in").unwrap(),
            flowchart.find_terminal("m", "in").unwrap()
        );
    }

    #[test]
    fn test_bypass_value_and_saved_state() {
        let mut flowchart = Flowchart::new();
        let (node, _) = HookNode::new(vec![
            TerminalSpec::input("in").optional().bypass(Value::Number(0.0)),
            TerminalSpec::output("out").multi(),
        ]);
        flowchart.add_node("n", node).unwrap();
        let input = flowchart.find_terminal("n", "in").unwrap();
        let output = flowchart.find_terminal("n", "out").unwrap();

        let t = flowchart.terminal(input).unwrap();
        assert_eq!(t.bypass_value(), Some(&Value::Number(0.0)));
        assert_eq!(
            t.save_state(),
            TerminalState {
                io: Direction::Input,
                multi: false,
                optional: true,
            }
        );
        assert!(flowchart.terminal(output).unwrap().save_state().multi);
    }

    #[test]
    fn test_terminal_labels() {
        let mut flowchart = Flowchart::new();
        let (_, out) = add_source(&mut flowchart, "recording");
        assert_eq!(flowchart.label(out), "recording.out");
        assert_eq!(flowchart.describe(out), "<Terminal recording.out>");
    }
}
