use super::NodeId;
use crate::error::{FlowError, ProcessError};
use crate::flowchart::Flowchart;
use crate::terminal::{Acceptability, Terminal, TerminalId, TerminalValue};
use crate::value::Value;
use itertools::Itertools;

/// Access to the flowchart from inside a node hook, scoped to that node.
pub struct NodeContext<'a> {
    flowchart: &'a mut Flowchart,
    node: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(flowchart: &'a mut Flowchart, node: NodeId) -> Self {
        Self { flowchart, node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn flowchart(&self) -> &Flowchart {
        &*self.flowchart
    }

    /// Looks up one of this node's terminals by name.
    pub fn terminal(&self, name: &str) -> Result<TerminalId, ProcessError> {
        self.flowchart
            .node(self.node)
            .and_then(|node| {
                node.terminal(name)
                    .ok_or_else(|| FlowError::UnknownTerminalName(node.name().to_string(), name.to_string()))
            })
            .map_err(ProcessError::from)
    }

    fn terminal_ref(&self, name: &str) -> Result<&Terminal, ProcessError> {
        let id = self.terminal(name)?;
        Ok(self.flowchart.terminal(id)?)
    }

    /// Full value of one of this node's terminals.
    pub fn value(&self, name: &str) -> Result<&TerminalValue, ProcessError> {
        Ok(self.terminal_ref(name)?.value())
    }

    /// Single value of an input, `None` when it holds no data.
    pub fn input(&self, name: &str) -> Result<Option<&Value>, ProcessError> {
        Ok(self.terminal_ref(name)?.value().single())
    }

    /// Like [`input`](Self::input), but a missing value is an error.
    pub fn require(&self, name: &str) -> Result<&Value, ProcessError> {
        self.input(name)?
            .ok_or_else(|| ProcessError::MissingInput(name.to_string()))
    }

    /// Present values of a multi input, ordered by the peer that sent them.
    pub fn inputs(&self, name: &str) -> Result<Vec<(TerminalId, &Value)>, ProcessError> {
        let terminal = self.terminal_ref(name)?;
        Ok(match terminal.value() {
            TerminalValue::Single(v) => v.iter().map(|v| (terminal.id(), v)).collect(),
            TerminalValue::Multi(map) => map
                .iter()
                .filter_map(|(peer, v)| v.as_ref().map(|v| (*peer, v)))
                .sorted_by_key(|(peer, _)| *peer)
                .collect(),
        })
    }

    /// Terminals connected to one of this node's terminals, in id order.
    pub fn peers(&self, name: &str) -> Result<Vec<TerminalId>, ProcessError> {
        Ok(self
            .terminal_ref(name)?
            .connections()
            .keys()
            .copied()
            .sorted()
            .collect())
    }

    pub fn bypass_value(&self, name: &str) -> Result<Option<&Value>, ProcessError> {
        Ok(self.terminal_ref(name)?.bypass_value())
    }

    /// Sets an output value and lets it propagate downstream.
    pub fn set_output(
        &mut self,
        name: &str,
        value: impl Into<TerminalValue>,
    ) -> Result<(), ProcessError> {
        let id = self.terminal(name)?;
        self.flowchart.set_value(id, value, true)?;
        Ok(())
    }

    /// Marks the value held by one of this node's terminals as checked.
    pub fn set_acceptable(
        &mut self,
        name: &str,
        acceptability: impl Into<Acceptability>,
    ) -> Result<(), ProcessError> {
        let id = self.terminal(name)?;
        self.flowchart
            .set_value_acceptable(id, acceptability.into())?;
        Ok(())
    }
}
