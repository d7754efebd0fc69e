//! The arena that owns nodes, terminals and connections.
//!
//! Every operation of the terminal core is a method here, because each one
//! may need to reach a peer terminal or the owning node. Nodes are referenced
//! by [`NodeId`] and never kept alive by their terminals.

mod builder;
mod connect;
mod propagate;

pub use builder::{DEFAULT_MAX_PROPAGATION_DEPTH, FlowchartBuilder};

use crate::connection::{Connection, ConnectionId, ConnectionTarget};
use crate::error::FlowError;
use crate::node::{Node, NodeBehavior, NodeId, NodeLibrary};
use crate::surface::{DisplaySurface, Point};
use crate::terminal::{Terminal, TerminalId, TerminalSpec, TerminalStatus};
use ahash::AHashMap;
use itertools::Itertools;
use tracing::debug;

pub struct Flowchart {
    nodes: AHashMap<NodeId, Node>,
    node_names: AHashMap<String, NodeId>,
    terminals: AHashMap<TerminalId, Terminal>,
    connections: AHashMap<ConnectionId, Connection>,
    surface: Box<dyn DisplaySurface>,
    library: NodeLibrary,
    max_depth: usize,
    depth: usize,
    next_node: usize,
    next_terminal: usize,
    next_connection: u64,
}

impl Default for Flowchart {
    fn default() -> Self {
        Self::new()
    }
}

impl Flowchart {
    /// A headless flowchart with the default node library.
    pub fn new() -> Self {
        FlowchartBuilder::new().build()
    }

    pub fn builder() -> FlowchartBuilder {
        FlowchartBuilder::new()
    }

    pub(crate) fn from_parts(
        surface: Box<dyn DisplaySurface>,
        library: NodeLibrary,
        max_depth: usize,
    ) -> Self {
        Self {
            nodes: AHashMap::new(),
            node_names: AHashMap::new(),
            terminals: AHashMap::new(),
            connections: AHashMap::new(),
            surface,
            library,
            max_depth,
            depth: 0,
            next_node: 0,
            next_terminal: 0,
            next_connection: 0,
        }
    }

    pub fn library(&self) -> &NodeLibrary {
        &self.library
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, FlowError> {
        self.nodes.get(&id).ok_or(FlowError::UnknownNode(id.0))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, FlowError> {
        self.nodes.get_mut(&id).ok_or(FlowError::UnknownNode(id.0))
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_names.get(name).copied()
    }

    /// Node ids in creation order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().sorted().collect()
    }

    pub fn terminal(&self, id: TerminalId) -> Result<&Terminal, FlowError> {
        self.terminals.get(&id).ok_or(FlowError::UnknownTerminal(id.0))
    }

    pub(crate) fn terminal_mut(&mut self, id: TerminalId) -> Result<&mut Terminal, FlowError> {
        self.terminals
            .get_mut(&id)
            .ok_or(FlowError::UnknownTerminal(id.0))
    }

    /// Resolves `node.terminal` names to a terminal id.
    pub fn find_terminal(&self, node: &str, terminal: &str) -> Result<TerminalId, FlowError> {
        let node_id = self
            .node_by_name(node)
            .ok_or_else(|| FlowError::UnknownTerminalName(node.to_string(), terminal.to_string()))?;
        self.node(node_id)?
            .terminal(terminal)
            .ok_or_else(|| FlowError::UnknownTerminalName(node.to_string(), terminal.to_string()))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Connection ids in creation order.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().sorted().collect()
    }

    /// `node.terminal`, or the bare id if the terminal is gone.
    pub fn label(&self, id: TerminalId) -> String {
        match self.terminals.get(&id) {
            Some(t) => match self.nodes.get(&t.node()) {
                Some(node) => format!("{}.{}", node.name(), t.name()),
                None => format!("?.{}", t.name()),
            },
            None => id.to_string(),
        }
    }

    /// Debug form of a terminal: `<Terminal node.terminal>`.
    pub fn describe(&self, id: TerminalId) -> String {
        format!("<Terminal {}>", self.label(id))
    }

    /// Adds a node and creates the terminals its behaviour declares.
    pub fn add_node(
        &mut self,
        name: &str,
        behavior: impl NodeBehavior + 'static,
    ) -> Result<NodeId, FlowError> {
        self.add_boxed_node(name, Box::new(behavior))
    }

    pub fn add_boxed_node(
        &mut self,
        name: &str,
        behavior: Box<dyn NodeBehavior>,
    ) -> Result<NodeId, FlowError> {
        if self.node_names.contains_key(name) {
            return Err(FlowError::DuplicateNode(name.to_string()));
        }
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let specs = behavior.terminals();
        self.nodes.insert(id, Node::new(id, name, behavior));
        self.node_names.insert(name.to_string(), id);
        debug!(node = name, "node added");

        for spec in specs {
            self.add_terminal(id, spec)?;
        }
        Ok(id)
    }

    /// Creates a terminal on `node`. The new terminal starts with no value,
    /// unknown acceptability and no connections.
    pub fn add_terminal(&mut self, node: NodeId, spec: TerminalSpec) -> Result<TerminalId, FlowError> {
        let owner = self.node(node)?;
        if owner.terminal(&spec.name).is_some() {
            return Err(FlowError::DuplicateTerminal {
                node: owner.name().to_string(),
                name: spec.name,
            });
        }

        let id = TerminalId(self.next_terminal);
        self.next_terminal += 1;
        let name = spec.name.clone();
        let anchor = spec.anchor;
        let proxy = self.surface.terminal_proxy(id, &name, spec.direction);
        let mut terminal = Terminal::new(id, node, spec, proxy);
        if let Some(anchor) = anchor {
            terminal.set_anchor(anchor);
        }
        self.terminals.insert(id, terminal);
        self.node_mut(node)?.register_terminal(&name, id);
        self.recolor(id, None, true);
        Ok(id)
    }

    /// Tears down every connection of `terminal` and removes it from its
    /// node and from the surface.
    pub fn remove_terminal(&mut self, terminal: TerminalId) -> Result<(), FlowError> {
        self.close(terminal)?;
        let removed = self
            .terminals
            .remove(&terminal)
            .ok_or(FlowError::UnknownTerminal(terminal.0))?;
        if let Some(node) = self.nodes.get_mut(&removed.node()) {
            node.unregister_terminal(removed.name());
        }
        Ok(())
    }

    /// Removes a node after closing all of its terminals.
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), FlowError> {
        let terminals = self.node(node)?.terminals();
        for terminal in terminals {
            self.remove_terminal(terminal)?;
        }
        if let Some(removed) = self.nodes.remove(&node) {
            self.node_names.remove(removed.name());
            debug!(node = removed.name(), "node removed");
        }
        Ok(())
    }

    /// Renames a terminal, updating the owning node's name registry and
    /// notifying the node once with the old name.
    pub fn rename(&mut self, terminal: TerminalId, name: &str) -> Result<(), FlowError> {
        let t = self.terminal(terminal)?;
        if t.name() == name {
            return Ok(());
        }
        let node_id = t.node();
        let node = self.node(node_id)?;
        if node.terminal(name).is_some() {
            return Err(FlowError::DuplicateTerminal {
                node: node.name().to_string(),
                name: name.to_string(),
            });
        }

        let old = self.terminal_mut(terminal)?.set_name(name.to_string());
        let node = self.node_mut(node_id)?;
        node.unregister_terminal(&old);
        node.register_terminal(name, terminal);
        if let Some(behavior) = node.behavior.as_mut() {
            behavior.terminal_renamed(terminal, &old);
        }
        self.terminal_mut(terminal)?.notify_renamed();
        debug!(from = %old, to = name, "terminal renamed");
        Ok(())
    }

    /// Moves a terminal's connect point and redraws its connections.
    pub fn set_anchor(&mut self, terminal: TerminalId, anchor: Point) -> Result<(), FlowError> {
        self.terminal_mut(terminal)?.set_anchor(anchor);
        let lines: Vec<ConnectionId> = self.terminal(terminal)?.connections().values().copied().collect();
        for line in lines {
            self.refresh_line(line);
        }
        Ok(())
    }

    /// Recomputes a connection's geometry from its endpoint anchors.
    pub(crate) fn refresh_line(&mut self, id: ConnectionId) {
        let Some(connection) = self.connections.get(&id) else {
            return;
        };
        let start = self.terminals.get(&connection.source()).map(Terminal::anchor);
        let end = match connection.target() {
            Some(ConnectionTarget::Terminal(t)) => self.terminals.get(&t).map(Terminal::anchor),
            Some(ConnectionTarget::Point(p)) => Some(p),
            None => None,
        };
        if let (Some(start), Some(connection)) = (start, self.connections.get_mut(&id)) {
            connection.update_line(start, end);
        }
    }

    /// True if any connected peer is an output.
    pub fn has_input(&self, terminal: TerminalId) -> Result<bool, FlowError> {
        Ok(!self.input_terminals(terminal)?.is_empty())
    }

    /// Connected peers that feed this terminal, i.e. the outputs.
    pub fn input_terminals(&self, terminal: TerminalId) -> Result<Vec<TerminalId>, FlowError> {
        Ok(self
            .terminal(terminal)?
            .connections()
            .keys()
            .filter(|peer| self.terminals.get(*peer).is_some_and(Terminal::is_output))
            .copied()
            .sorted()
            .collect())
    }

    /// Nodes that receive input from this terminal.
    pub fn dependent_nodes(&self, terminal: TerminalId) -> Result<Vec<NodeId>, FlowError> {
        Ok(self
            .terminal(terminal)?
            .connections()
            .keys()
            .filter_map(|peer| self.terminals.get(peer))
            .filter(|peer| peer.is_input())
            .map(Terminal::node)
            .sorted()
            .dedup()
            .collect())
    }

    /// Status derived from the terminal's current state.
    pub fn status(&self, terminal: TerminalId) -> Result<TerminalStatus, FlowError> {
        let has_input = self.has_input(terminal)?;
        Ok(TerminalStatus::derive(self.terminal(terminal)?, has_input))
    }
}
