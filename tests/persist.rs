//! Saving flowcharts and restoring them through the node library.
mod common;
use common::*;
use labflow::prelude::*;

/// c1 (2) and c2 (5) feed `sum`, whose total is scaled by 3 into a probe.
fn build_lab_flowchart() -> Flowchart {
    let mut flowchart = Flowchart::new();
    let c1 = flowchart
        .add_node("c1", ConstantNode::new(Some(Value::Number(2.0))))
        .unwrap();
    let c2 = flowchart
        .add_node("c2", ConstantNode::new(Some(Value::Number(5.0))))
        .unwrap();
    let sum = flowchart.add_node("sum", SumNode).unwrap();
    flowchart.add_node("scale", ScaleNode::new(3.0)).unwrap();
    flowchart.add_node("probe", ProbeNode::new()).unwrap();
    flowchart
        .add_terminal(sum, TerminalSpec::output("spare").renamable())
        .unwrap();

    let link = |flowchart: &mut Flowchart, from: (&str, &str), to: (&str, &str)| {
        let a = flowchart.find_terminal(from.0, from.1).unwrap();
        let b = flowchart.find_terminal(to.0, to.1).unwrap();
        flowchart.connect(a, b).unwrap();
    };
    link(&mut flowchart, ("c1", "out"), ("sum", "in"));
    link(&mut flowchart, ("c2", "out"), ("sum", "in"));
    link(&mut flowchart, ("sum", "out"), ("scale", "in"));
    link(&mut flowchart, ("scale", "out"), ("probe", "in"));

    flowchart.update(c1).unwrap();
    flowchart.update(c2).unwrap();
    flowchart
}

fn assert_restored(flowchart: &Flowchart) {
    let names: Vec<&str> = flowchart
        .nodes()
        .into_iter()
        .map(|id| flowchart.node(id).unwrap().name())
        .collect();
    assert_eq!(names, vec!["c1", "c2", "sum", "scale", "probe"]);
    assert_eq!(flowchart.connections().len(), 4);

    let sum_in = flowchart.find_terminal("sum", "in").unwrap();
    assert_eq!(entry_count(flowchart, sum_in), 2);
    let scale_out = flowchart.find_terminal("scale", "out").unwrap();
    assert_eq!(single(flowchart, scale_out), Some(Value::Number(21.0)));
    let spare = flowchart.find_terminal("sum", "spare").unwrap();
    assert!(flowchart.terminal(spare).unwrap().is_renamable());
}

/// A source holding a NaN-padded sweep and a record of mixed values, each
/// feeding a scale node.
fn build_sweep_flowchart() -> Flowchart {
    let mut flowchart = Flowchart::new();
    let (_, sweep) = add_source(&mut flowchart, "sweep");
    let (_, meta) = add_source(&mut flowchart, "meta");
    flowchart.add_node("gain", ScaleNode::new(2.0)).unwrap();
    let gain_in = flowchart.find_terminal("gain", "in").unwrap();
    flowchart.connect(sweep, gain_in).unwrap();

    flowchart.set_value(sweep, padded_sweep(), true).unwrap();
    flowchart.set_value(meta, sweep_metadata(), false).unwrap();
    flowchart
}

fn padded_sweep() -> Value {
    Value::Samples(vec![f64::NAN, -0.5, f64::INFINITY, 1.5, f64::NEG_INFINITY])
}

fn sweep_metadata() -> Value {
    let mut record = std::collections::BTreeMap::new();
    record.insert("baseline".to_string(), Value::Number(f64::NAN));
    record.insert("unit".to_string(), Value::from("mV"));
    record.insert(
        "epochs".to_string(),
        Value::List(vec![Value::Number(1.0), Value::Samples(vec![]), Value::Bool(true)]),
    );
    Value::Record(record)
}

fn assert_sweep_restored(flowchart: &Flowchart) {
    let sweep = flowchart.find_terminal("sweep", "out").unwrap();
    assert_eq!(single(flowchart, sweep), Some(padded_sweep()));
    let meta = flowchart.find_terminal("meta", "out").unwrap();
    assert_eq!(single(flowchart, meta), Some(sweep_metadata()));
    let gain_out = flowchart.find_terminal("gain", "out").unwrap();
    assert_eq!(
        single(flowchart, gain_out),
        Some(Value::Samples(vec![f64::NAN, -1.0, f64::INFINITY, 3.0, f64::NEG_INFINITY]))
    );
}

#[cfg(test)]
mod persist_tests {
    use super::*;

    #[test]
    fn test_save_state_lists_structure_and_values() {
        let flowchart = build_lab_flowchart();
        let state = flowchart.save_state();

        assert_eq!(state.nodes.len(), 5);
        assert_eq!(state.nodes[3].type_name, "scale");
        assert_eq!(state.nodes[3].params, r#"{"factor":3.0}"#);
        assert_eq!(state.connections.len(), 4);
        assert_eq!(state.connections[0].source.node, "c1");
        assert_eq!(state.connections[0].target.terminal, "in");
        assert!(state.values.iter().any(|v| v.terminal.node == "scale"
            && v.value == Value::Number(21.0)));
    }

    #[test]
    fn test_json_snapshot_restores_graph() {
        let state = build_lab_flowchart().save_state();
        let json = state.to_json().unwrap();
        let decoded = FlowchartState::from_json(&json).unwrap();
        assert_eq!(decoded, state);

        let mut restored = Flowchart::new();
        restored.load_state(&decoded).unwrap();
        assert_restored(&restored);
    }

    #[test]
    fn test_json_snapshot_keeps_non_finite_and_composite_values() {
        let state = build_sweep_flowchart().save_state();
        let json = state.to_json().unwrap();
        assert!(json.contains(r#""NaN""#));
        assert!(json.contains(r#""-inf""#));
        let decoded = FlowchartState::from_json(&json).unwrap();
        assert_eq!(decoded, state);

        let mut restored = Flowchart::new();
        restored.load_state(&decoded).unwrap();
        assert_sweep_restored(&restored);
    }

    #[test]
    fn test_binary_snapshot_keeps_non_finite_and_composite_values() {
        let state = build_sweep_flowchart().save_state();
        let bytes = state.to_bytes().unwrap();
        let decoded = FlowchartState::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, state);

        let mut restored = Flowchart::new();
        restored.load_state(&decoded).unwrap();
        assert_sweep_restored(&restored);
    }

    #[test]
    fn test_constant_parameters_restore_exact_values() {
        let constants = [
            ("list", Value::List(vec![Value::Number(1.0), Value::Number(2.0)])),
            ("empty", Value::Samples(vec![])),
            ("padded", Value::Samples(vec![1.0, f64::NAN])),
            ("nested", sweep_metadata()),
        ];
        let mut flowchart = Flowchart::new();
        for (name, value) in &constants {
            flowchart
                .add_node(name, ConstantNode::new(Some(value.clone())))
                .unwrap();
        }
        flowchart.add_node("unset", ConstantNode::new(None)).unwrap();
        let json = flowchart.save_state().to_json().unwrap();

        let mut restored = Flowchart::new();
        restored
            .load_state(&FlowchartState::from_json(&json).unwrap())
            .unwrap();
        for (name, value) in &constants {
            let node = restored.node_by_name(name).unwrap();
            restored.update(node).unwrap();
            let out = restored.find_terminal(name, "out").unwrap();
            assert_eq!(single(&restored, out).as_ref(), Some(value), "constant {}", name);
        }
        let unset = restored.node_by_name("unset").unwrap();
        restored.update(unset).unwrap();
        let out = restored.find_terminal("unset", "out").unwrap();
        assert_eq!(single(&restored, out), None);
    }

    #[test]
    fn test_constant_accepts_plain_json_parameters() {
        let library = NodeLibrary::with_defaults();
        let mut flowchart = Flowchart::new();
        for (name, params) in [
            ("n", serde_json::json!({ "value": 2 })),
            ("s", serde_json::json!({ "value": [1, 2] })),
            ("t", serde_json::json!({ "value": "NaN" })),
        ] {
            let behavior = library.create("constant", &params).unwrap();
            let node = flowchart.add_boxed_node(name, behavior).unwrap();
            flowchart.update(node).unwrap();
        }
        let value_of = |name: &str| single(&flowchart, flowchart.find_terminal(name, "out").unwrap());
        assert_eq!(value_of("n"), Some(Value::Number(2.0)));
        assert_eq!(value_of("s"), Some(Value::Samples(vec![1.0, 2.0])));
        assert_eq!(value_of("t"), Some(Value::Text("NaN".into())));
    }

    #[test]
    fn test_binary_snapshot_restores_graph() {
        let state = build_lab_flowchart().save_state();
        let bytes = state.to_bytes().unwrap();
        let decoded = FlowchartState::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, state);

        let mut restored = Flowchart::new();
        restored.load_state(&decoded).unwrap();
        assert_restored(&restored);
    }

    #[test]
    fn test_snapshot_files() {
        let dir = std::env::temp_dir();
        let id = std::process::id();
        for (tag, state) in [
            ("lab", build_lab_flowchart().save_state()),
            ("sweep", build_sweep_flowchart().save_state()),
        ] {
            for ext in ["json", "bin"] {
                let path = dir.join(format!("labflow-{}-{}.{}", id, tag, ext));
                state.save(&path).unwrap();
                let loaded = FlowchartState::from_file(&path).unwrap();
                assert_eq!(loaded, state);
                std::fs::remove_file(&path).unwrap();
            }
        }
    }

    #[test]
    fn test_unknown_node_type_is_reported() {
        let mut flowchart = Flowchart::new();
        flowchart.add_node("inc", IncrementNode).unwrap();
        let state = flowchart.save_state();

        let mut restored = Flowchart::new();
        let err = restored.load_state(&state).unwrap_err();
        assert!(matches!(err, PersistError::UnknownNodeType(ref t) if t == "increment"));
    }

    #[test]
    fn test_custom_library_restores_custom_nodes() {
        let mut flowchart = Flowchart::new();
        let (_, out) = add_source(&mut flowchart, "src");
        let (_, input, _) = add_increment(&mut flowchart, "inc");
        flowchart.connect(out, input).unwrap();
        flowchart.set_value(out, Value::Number(1.0), true).unwrap();
        let state = flowchart.save_state();

        let mut library = NodeLibrary::with_defaults();
        library.register("increment", |_| Ok(Box::new(IncrementNode)));
        let mut restored = Flowchart::builder().with_library(library).build();
        restored.load_state(&state).unwrap();

        let inc_out = restored.find_terminal("inc", "out").unwrap();
        assert_eq!(single(&restored, inc_out), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_renamed_terminal_survives_restore() {
        let mut flowchart = build_lab_flowchart();
        let spare = flowchart.find_terminal("sum", "spare").unwrap();
        flowchart.rename(spare, "overflow").unwrap();
        let state = flowchart.save_state();

        let mut restored = Flowchart::new();
        restored.load_state(&state).unwrap();
        assert!(restored.find_terminal("sum", "overflow").is_ok());
        assert!(restored.find_terminal("sum", "spare").is_err());
    }

    #[test]
    fn test_restoring_twice_collides_on_node_names() {
        let state = build_lab_flowchart().save_state();
        let mut restored = Flowchart::new();
        restored.load_state(&state).unwrap();
        let err = restored.load_state(&state).unwrap_err();
        assert!(matches!(
            err,
            PersistError::Flow(FlowError::DuplicateNode(ref name)) if name == "c1"
        ));
    }
}
