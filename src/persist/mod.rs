//! Saving and restoring flowcharts.
//!
//! Only structure and output values are saved. Connections are restored by
//! replaying [`Flowchart::connect`] in creation order, so node hooks and
//! propagation run exactly as they did when the graph was built.

mod artifact;

use crate::error::PersistError;
use crate::flowchart::Flowchart;
use crate::terminal::{TerminalSpec, TerminalState};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `node.terminal` address of a terminal that survives a save/restore cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalPath {
    pub node: String,
    pub terminal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTerminal {
    pub name: String,
    pub state: TerminalState,
    pub renamable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedNode {
    pub name: String,
    pub type_name: String,
    /// Node parameters as JSON text.
    pub params: String,
    pub terminals: Vec<SavedTerminal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConnection {
    pub source: TerminalPath,
    pub target: TerminalPath,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedValue {
    pub terminal: TerminalPath,
    pub value: Value,
}

/// A complete, serializable picture of a flowchart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowchartState {
    pub nodes: Vec<SavedNode>,
    pub connections: Vec<SavedConnection>,
    /// Values held by single-value outputs, re-applied after reconnecting.
    pub values: Vec<SavedValue>,
}

impl Flowchart {
    fn path_of(&self, terminal: crate::terminal::TerminalId) -> Option<TerminalPath> {
        let t = self.terminal(terminal).ok()?;
        let node = self.node(t.node()).ok()?;
        Some(TerminalPath {
            node: node.name().to_string(),
            terminal: t.name().to_string(),
        })
    }

    pub fn save_state(&self) -> FlowchartState {
        let mut state = FlowchartState::default();
        for node_id in self.nodes() {
            let Ok(node) = self.node(node_id) else {
                continue;
            };
            let mut terminals = Vec::new();
            for terminal_id in node.terminals() {
                let Ok(t) = self.terminal(terminal_id) else {
                    continue;
                };
                terminals.push(SavedTerminal {
                    name: t.name().to_string(),
                    state: t.save_state(),
                    renamable: t.is_renamable(),
                });
                if t.is_output() {
                    if let (Some(value), Some(path)) = (t.value().single(), self.path_of(terminal_id)) {
                        state.values.push(SavedValue {
                            terminal: path,
                            value: value.clone(),
                        });
                    }
                }
            }
            state.nodes.push(SavedNode {
                name: node.name().to_string(),
                type_name: node.type_name().to_string(),
                params: node.params().to_string(),
                terminals,
            });
        }

        for id in self.connections() {
            let Some(connection) = self.connection(id) else {
                continue;
            };
            let source = connection.source();
            let Some(target) = connection.peer_of(source) else {
                continue;
            };
            if let (Some(source), Some(target)) = (self.path_of(source), self.path_of(target)) {
                state.connections.push(SavedConnection { source, target });
            }
        }
        state
    }

    /// Rebuilds the saved nodes, terminals, connections and output values
    /// inside this flowchart, using its node library.
    pub fn load_state(&mut self, state: &FlowchartState) -> Result<(), PersistError> {
        for saved in &state.nodes {
            let params: serde_json::Value = serde_json::from_str(&saved.params)
                .map_err(|e| PersistError::InvalidNode {
                    node: saved.name.clone(),
                    message: format!("bad parameters: {}", e),
                })?;
            let behavior = self.library().create(&saved.type_name, &params)?;
            let node_id = self.add_boxed_node(&saved.name, behavior)?;

            // Drop declared terminals the saved node no longer had (renamed or removed).
            let declared = self.node(node_id)?.terminals();
            for terminal_id in declared {
                let name = self.terminal(terminal_id)?.name().to_string();
                if !saved.terminals.iter().any(|t| t.name == name) {
                    self.remove_terminal(terminal_id)?;
                }
            }
            for terminal in &saved.terminals {
                if self.node(node_id)?.terminal(&terminal.name).is_some() {
                    continue;
                }
                let mut spec = TerminalSpec::from_state(&terminal.name, terminal.state);
                spec.renamable = terminal.renamable;
                self.add_terminal(node_id, spec)?;
            }
        }

        for saved in &state.connections {
            let source = self.find_terminal(&saved.source.node, &saved.source.terminal)?;
            let target = self.find_terminal(&saved.target.node, &saved.target.terminal)?;
            self.connect(source, target)
                .map_err(crate::error::FlowError::from)?;
        }

        for saved in &state.values {
            let terminal = self.find_terminal(&saved.terminal.node, &saved.terminal.terminal)?;
            self.set_value(terminal, saved.value.clone(), true)?;
        }
        debug!(
            nodes = state.nodes.len(),
            connections = state.connections.len(),
            "flowchart state loaded"
        );
        Ok(())
    }
}
