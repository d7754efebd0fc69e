//! Common test utilities: small nodes that record what the flowchart does to them.
#![allow(dead_code)]

use labflow::prelude::*;
use labflow::surface::SurfaceLog;
use std::cell::RefCell;
use std::rc::Rc;

/// A hook call observed by a [`HookNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Hook {
    Connected(TerminalId, TerminalId),
    Disconnected(TerminalId, TerminalId),
    Renamed(TerminalId, String),
    Updated,
}

pub type HookLog = Rc<RefCell<Vec<Hook>>>;

/// A node with caller-chosen terminals that only records its hooks.
pub struct HookNode {
    specs: Vec<TerminalSpec>,
    log: HookLog,
}

impl HookNode {
    pub fn new(specs: Vec<TerminalSpec>) -> (Self, HookLog) {
        let log = HookLog::default();
        (
            Self {
                specs,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl NodeBehavior for HookNode {
    fn type_name(&self) -> &str {
        "hook"
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        self.specs.clone()
    }

    fn update(&mut self, _ctx: &mut NodeContext<'_>) -> std::result::Result<(), ProcessError> {
        self.log.borrow_mut().push(Hook::Updated);
        Ok(())
    }

    fn connected(&mut self, _ctx: &mut NodeContext<'_>, terminal: TerminalId, peer: TerminalId) {
        self.log.borrow_mut().push(Hook::Connected(terminal, peer));
    }

    fn disconnected(&mut self, _ctx: &mut NodeContext<'_>, terminal: TerminalId, peer: TerminalId) {
        self.log.borrow_mut().push(Hook::Disconnected(terminal, peer));
    }

    fn terminal_renamed(&mut self, terminal: TerminalId, old_name: &str) {
        self.log
            .borrow_mut()
            .push(Hook::Renamed(terminal, old_name.to_string()));
    }
}

/// Adds one to the number on `in` and emits it on `out`.
#[derive(Default)]
pub struct IncrementNode;

impl NodeBehavior for IncrementNode {
    fn type_name(&self) -> &str {
        "increment"
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::input("in"), TerminalSpec::output("out")]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> std::result::Result<(), ProcessError> {
        let next = match ctx.input("in")? {
            Some(value) => {
                let n = value.as_number().ok_or_else(|| ProcessError::TypeMismatch {
                    terminal: "in".to_string(),
                    expected: "number".to_string(),
                    found: value.kind().to_string(),
                })?;
                Some(Value::Number(n + 1.0))
            }
            None => None,
        };
        ctx.set_output("out", next)?;
        Ok(())
    }
}

/// A plain source node with a single output `out`.
pub fn add_source(flowchart: &mut Flowchart, name: &str) -> (NodeId, TerminalId) {
    let node = flowchart
        .add_node(name, ConstantNode::new(None))
        .expect("add source node");
    let out = flowchart.find_terminal(name, "out").expect("source has out");
    (node, out)
}

/// Adds an [`IncrementNode`] and returns its id with its `in` and `out` terminals.
pub fn add_increment(flowchart: &mut Flowchart, name: &str) -> (NodeId, TerminalId, TerminalId) {
    let node = flowchart
        .add_node(name, IncrementNode)
        .expect("add increment node");
    let input = flowchart.find_terminal(name, "in").expect("increment has in");
    let output = flowchart.find_terminal(name, "out").expect("increment has out");
    (node, input, output)
}

/// A flowchart whose surface records every proxy call.
pub fn recorded_flowchart() -> (Flowchart, SurfaceLog) {
    let surface = RecordingSurface::new();
    let log = surface.log();
    let flowchart = Flowchart::builder().with_surface(surface).build();
    (flowchart, log)
}

pub fn single(flowchart: &Flowchart, terminal: TerminalId) -> Option<Value> {
    flowchart
        .terminal(terminal)
        .expect("terminal exists")
        .value()
        .single()
        .cloned()
}

pub fn entry_count(flowchart: &Flowchart, terminal: TerminalId) -> usize {
    flowchart
        .terminal(terminal)
        .expect("terminal exists")
        .value()
        .entries()
        .map_or(0, |entries| entries.len())
}
