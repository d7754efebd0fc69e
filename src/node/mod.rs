//! Nodes as seen by the terminal core.
//!
//! A node is a name, a set of terminals and a [`NodeBehavior`] that recomputes
//! outputs from inputs. The flowchart owns the node; terminals only keep its
//! [`NodeId`].

mod builtin;
mod context;
mod library;

pub use builtin::{ConstantNode, FanOutNode, ProbeHistory, ProbeNode, ScaleNode, SumNode};
pub use context::NodeContext;
pub use library::{NodeFactory, NodeLibrary};

use crate::error::ProcessError;
use crate::terminal::{TerminalId, TerminalSpec};
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Computation and notification hooks of a node.
///
/// All hooks run synchronously inside the flowchart call that triggered them
/// and receive a [`NodeContext`] scoped to their own node.
pub trait NodeBehavior {
    /// Registry name used when saving and restoring flowcharts.
    fn type_name(&self) -> &str;

    /// Constructor parameters, saved alongside the node.
    fn params(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Terminals created together with the node.
    fn terminals(&self) -> Vec<TerminalSpec> {
        Vec::new()
    }

    /// Recomputes outputs from the current input values.
    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError>;

    fn connected(&mut self, _ctx: &mut NodeContext<'_>, _terminal: TerminalId, _peer: TerminalId) {}

    fn disconnected(
        &mut self,
        _ctx: &mut NodeContext<'_>,
        _terminal: TerminalId,
        _peer: TerminalId,
    ) {
    }

    fn terminal_renamed(&mut self, _terminal: TerminalId, _old_name: &str) {}
}

pub struct Node {
    id: NodeId,
    name: String,
    type_name: String,
    terminals: AHashMap<String, TerminalId>,
    pub(crate) behavior: Option<Box<dyn NodeBehavior>>,
    pub(crate) last_error: Option<ProcessError>,
    pub(crate) update_count: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: &str, behavior: Box<dyn NodeBehavior>) -> Self {
        Self {
            id,
            name: name.to_string(),
            type_name: behavior.type_name().to_string(),
            terminals: AHashMap::new(),
            behavior: Some(behavior),
            last_error: None,
            update_count: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn terminal(&self, name: &str) -> Option<TerminalId> {
        self.terminals.get(name).copied()
    }

    /// Terminal ids in creation order.
    pub fn terminals(&self) -> Vec<TerminalId> {
        self.terminals.values().copied().sorted().collect()
    }

    /// The error returned by the most recent update, if it failed.
    pub fn last_error(&self) -> Option<&ProcessError> {
        self.last_error.as_ref()
    }

    /// How many times `update` has been invoked on this node.
    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// True while one of the node's hooks is running.
    pub fn is_busy(&self) -> bool {
        self.behavior.is_none()
    }

    pub fn params(&self) -> serde_json::Value {
        self.behavior
            .as_ref()
            .map(|b| b.params())
            .unwrap_or(serde_json::Value::Null)
    }

    pub(crate) fn register_terminal(&mut self, name: &str, terminal: TerminalId) {
        self.terminals.insert(name.to_string(), terminal);
    }

    pub(crate) fn unregister_terminal(&mut self, name: &str) {
        self.terminals.remove(name);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("terminals", &self.terminals)
            .field("last_error", &self.last_error)
            .finish()
    }
}
