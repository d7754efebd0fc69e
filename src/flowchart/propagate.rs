use super::Flowchart;
use crate::error::{FlowError, ProcessError};
use crate::node::{NodeBehavior, NodeContext, NodeId};
use crate::terminal::{Acceptability, TerminalId, TerminalStatus, TerminalValue};
use ahash::AHashMap;
use itertools::Itertools;
use tracing::{debug, trace, warn};

impl Flowchart {
    /// Stores a new value on a terminal.
    ///
    /// A single-value terminal ignores a value structurally equal to the one
    /// it holds. A multi-value terminal merges the given peer entries into its
    /// mapping and ignores a merge that changes nothing. After a real change
    /// the acceptability goes back to unknown, an input (when `propagate` is
    /// set) recomputes its node, an output feeds its connected inputs, and the
    /// terminal is recolored together with its direct peers.
    pub fn set_value(
        &mut self,
        terminal: TerminalId,
        value: impl Into<TerminalValue>,
        propagate: bool,
    ) -> Result<(), FlowError> {
        let value = value.into();
        let label = self.label(terminal);
        let t = self.terminal_mut(terminal)?;
        let changed = match (t.is_multi_value(), value) {
            (false, TerminalValue::Single(v)) => t.replace_value(v),
            (true, TerminalValue::Multi(entries)) => t.merge_values(entries),
            (true, TerminalValue::Single(None)) => false,
            (multi, _) => {
                return Err(FlowError::ValueShapeMismatch {
                    terminal: label,
                    expected: if multi { "peer mapping" } else { "single" },
                });
            }
        };
        if !changed {
            trace!(terminal = %label, "value unchanged");
            return Ok(());
        }

        t.set_acceptability(Acceptability::Unknown);
        let node = t.node();
        let is_input = t.is_input();
        debug!(terminal = %label, "value changed");

        if propagate {
            if is_input {
                self.run_update(node);
            } else {
                self.propagate_output(terminal);
            }
        }
        self.recolor(terminal, None, true);
        Ok(())
    }

    /// Drives every input connected to an output that just changed.
    fn propagate_output(&mut self, output: TerminalId) {
        let Ok(t) = self.terminal(output) else {
            return;
        };
        let targets: Vec<TerminalId> = t
            .connections()
            .keys()
            .filter(|peer| self.terminals.get(*peer).is_some_and(|p| p.is_input()))
            .copied()
            .sorted()
            .collect();
        for target in targets {
            if let Err(e) = self.input_changed(target, output, true) {
                warn!(terminal = %self.label(target), error = %e, "failed to propagate value");
            }
        }
    }

    /// Pulls the value `peer` provides for `terminal`.
    ///
    /// A multi-value terminal merges it under the peer's id; a single-value
    /// terminal replaces its value outright. Either way it goes through
    /// [`set_value`](Self::set_value).
    pub fn input_changed(
        &mut self,
        terminal: TerminalId,
        peer: TerminalId,
        propagate: bool,
    ) -> Result<(), FlowError> {
        let provided = self.terminal(peer)?.value_for(terminal).cloned();
        if self.terminal(terminal)?.is_multi_value() {
            let entry: AHashMap<TerminalId, _> = AHashMap::from_iter([(peer, provided)]);
            self.set_value(terminal, entry, propagate)
        } else {
            self.set_value(terminal, provided, propagate)
        }
    }

    /// Records the owning node's verdict on a terminal's value and recolors.
    pub fn set_value_acceptable(
        &mut self,
        terminal: TerminalId,
        acceptability: Acceptability,
    ) -> Result<(), FlowError> {
        self.terminal_mut(terminal)?.set_acceptability(acceptability);
        self.recolor(terminal, None, true);
        Ok(())
    }

    /// Paints a terminal's status on its proxy.
    ///
    /// Without an explicit status the status is derived from the terminal's
    /// state. With `recurse`, the same status is also painted on every
    /// directly connected peer, and no further.
    pub fn recolor(&mut self, terminal: TerminalId, status: Option<TerminalStatus>, recurse: bool) {
        let status = match status {
            Some(status) => status,
            None => match self.status(terminal) {
                Ok(status) => status,
                Err(_) => return,
            },
        };
        let Some(t) = self.terminals.get_mut(&terminal) else {
            return;
        };
        t.paint(status);

        if recurse {
            let peers: Vec<TerminalId> = t.connections().keys().copied().sorted().collect();
            for peer in peers {
                self.recolor(peer, Some(status), false);
            }
        }
    }

    /// Runs a node's `update` and returns its outcome, which is also kept
    /// as the node's last error.
    pub fn update(&mut self, node: NodeId) -> Result<(), ProcessError> {
        self.node(node)?;
        self.run_update(node);
        match self.node(node)?.last_error() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Runs a node's `update`, logging instead of returning failures.
    pub(crate) fn run_update(&mut self, node: NodeId) {
        let Ok(name) = self.node(node).map(|n| n.name().to_string()) else {
            return;
        };
        if self.depth >= self.max_depth {
            warn!(node = %name, depth = self.depth, "propagation depth limit reached; skipping update");
            self.record_outcome(node, Err(ProcessError::DepthExceeded(self.max_depth)));
            return;
        }

        self.depth += 1;
        let outcome = self.with_behavior(node, |behavior, ctx| behavior.update(ctx));
        self.depth -= 1;

        match outcome {
            Some(result) => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.update_count += 1;
                }
                if let Err(e) = &result {
                    warn!(node = %name, error = %e, "node update failed");
                }
                self.record_outcome(node, result);
            }
            None => {
                warn!(node = %name, "node is already updating; skipping re-entrant update");
                self.record_outcome(node, Err(ProcessError::Reentrant(name)));
            }
        }
    }

    fn record_outcome(&mut self, node: NodeId, result: Result<(), ProcessError>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.last_error = result.err();
        }
    }

    /// Runs a notification hook, dropping it if the node is busy.
    pub(crate) fn notify_node<F>(&mut self, node: NodeId, hook: F)
    where
        F: FnOnce(&mut dyn NodeBehavior, &mut NodeContext<'_>),
    {
        if self.with_behavior(node, hook).is_none() && self.nodes.contains_key(&node) {
            debug!(node = %node, "hook skipped while node is busy");
        }
    }

    /// Lends a node's behaviour out of its slot for the duration of `f`.
    ///
    /// Returns `None` if the node does not exist or its behaviour is already
    /// lent out, which only happens when propagation loops back into a node
    /// that is still running.
    fn with_behavior<R, F>(&mut self, node: NodeId, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn NodeBehavior, &mut NodeContext<'_>) -> R,
    {
        let mut behavior = self.nodes.get_mut(&node)?.behavior.take()?;
        let result = {
            let mut ctx = NodeContext::new(self, node);
            f(behavior.as_mut(), &mut ctx)
        };
        match self.nodes.get_mut(&node) {
            Some(n) => n.behavior = Some(behavior),
            None => debug!(node = %node, "node removed during its own hook"),
        }
        Some(result)
    }
}
