use super::Flowchart;
use crate::connection::{Connection, ConnectionId, ConnectionTarget, PendingConnection};
use crate::error::{ConnectError, FlowError};
use crate::surface::Point;
use crate::terminal::TerminalId;
use crate::value::Value;
use itertools::Itertools;
use tracing::{debug, warn};

impl Flowchart {
    fn next_connection_id(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// Checks every precondition of `terminal <-> peer` without touching anything.
    fn validate_connection(&self, terminal: TerminalId, peer: TerminalId) -> Result<(), ConnectError> {
        let t = self
            .terminal(terminal)
            .map_err(|_| ConnectError::UnknownTerminal(terminal.0))?;
        let p = self
            .terminal(peer)
            .map_err(|_| ConnectError::UnknownTerminal(peer.0))?;

        if t.connected_to(peer) {
            return Err(ConnectError::AlreadyConnected {
                terminal: self.label(terminal),
                peer: self.label(peer),
            });
        }
        if terminal == peer {
            return Err(ConnectError::SelfConnection(self.label(terminal)));
        }
        if t.node() == p.node() {
            let node = self
                .node(t.node())
                .map(|n| n.name().to_string())
                .unwrap_or_default();
            return Err(ConnectError::SameNode {
                terminal: self.label(terminal),
                peer: self.label(peer),
                node,
            });
        }
        for side in [t, p] {
            if side.is_input() && !side.is_multi_value() && side.is_connected() {
                let existing = side
                    .connections()
                    .keys()
                    .sorted()
                    .map(|c| self.label(*c))
                    .join(", ");
                return Err(ConnectError::SingleConnectionOccupied {
                    terminal: self.label(terminal),
                    peer: self.label(peer),
                    occupied: self.label(side.id()),
                    existing,
                });
            }
        }
        Ok(())
    }

    /// Connects two terminals on different nodes.
    ///
    /// On success both terminals map each other to the returned connection,
    /// `terminal` is recolored with its status painted onto `peer`, and then
    /// each side's connect hook runs: an input fed by an output pulls the
    /// output's current value, and a multi-value output recomputes its node. On error nothing has changed.
    pub fn connect(&mut self, terminal: TerminalId, peer: TerminalId) -> Result<ConnectionId, ConnectError> {
        self.connect_with(terminal, peer, None)
    }

    fn connect_with(
        &mut self,
        terminal: TerminalId,
        peer: TerminalId,
        pending: Option<Connection>,
    ) -> Result<ConnectionId, ConnectError> {
        if let Err(e) = self.validate_connection(terminal, peer) {
            if let Some(mut connection) = pending {
                connection.remove_proxy();
            }
            debug!(error = %e, "connection rejected");
            return Err(e);
        }

        let mut connection = match pending {
            Some(connection) => connection,
            None => {
                let id = self.next_connection_id();
                let proxy = self.surface.connection_proxy();
                Connection::new(id, terminal, proxy)
            }
        };
        connection.set_target(ConnectionTarget::Terminal(peer));
        let id = connection.id();
        self.connections.insert(id, connection);
        self.refresh_line(id);

        if let Some(t) = self.terminals.get_mut(&terminal) {
            t.insert_connection(peer, id);
        }
        if let Some(p) = self.terminals.get_mut(&peer) {
            p.insert_connection(terminal, id);
        }
        debug!(
            terminal = %self.label(terminal),
            peer = %self.label(peer),
            connection = %id,
            "terminals connected"
        );

        self.recolor(terminal, None, true);

        self.terminal_connected(terminal, peer);
        self.terminal_connected(peer, terminal);
        Ok(id)
    }

    /// Hook run on each side after a connection is registered.
    fn terminal_connected(&mut self, terminal: TerminalId, peer: TerminalId) {
        let (Ok(t), Ok(p)) = (self.terminal(terminal), self.terminal(peer)) else {
            return;
        };
        let node = t.node();
        let pulls = t.is_input() && p.is_output();
        let fans_out = t.is_output() && t.is_multi_value();

        if pulls {
            if let Err(e) = self.input_changed(terminal, peer, true) {
                warn!(terminal = %self.label(terminal), error = %e, "failed to pull value on connect");
            }
        }
        if fans_out {
            self.run_update(node);
        }
        self.notify_node(node, |behavior, ctx| behavior.connected(ctx, terminal, peer));
    }

    /// Removes the connection between two terminals. Not being connected is
    /// not an error.
    ///
    /// After the symmetric entries are gone and both sides are recolored, a
    /// multi-value side drops the peer's entry and recomputes its node, and a
    /// single-value input loses its value.
    pub fn disconnect(&mut self, terminal: TerminalId, peer: TerminalId) -> Result<(), FlowError> {
        self.terminal(peer)?;
        if !self.terminal(terminal)?.connected_to(peer) {
            return Ok(());
        }

        let removed = self.terminal_mut(terminal)?.remove_connection(peer);
        self.terminal_mut(peer)?.remove_connection(terminal);
        if let Some(mut connection) = removed.and_then(|id| self.connections.remove(&id)) {
            connection.remove_proxy();
        }
        debug!(
            terminal = %self.label(terminal),
            peer = %self.label(peer),
            "terminals disconnected"
        );

        self.recolor(terminal, None, true);
        self.recolor(peer, None, true);

        self.terminal_disconnected(terminal, peer);
        self.terminal_disconnected(peer, terminal);
        Ok(())
    }

    fn terminal_disconnected(&mut self, terminal: TerminalId, peer: TerminalId) {
        let Some(t) = self.terminals.get_mut(&terminal) else {
            return;
        };
        let node = t.node();
        if t.is_multi_value() && t.purge_peer(peer) {
            self.recolor(terminal, None, true);
            self.run_update(node);
        } else if t.is_input() {
            if let Err(e) = self.set_value(terminal, None::<Value>, true) {
                warn!(terminal = %self.label(terminal), error = %e, "failed to clear value on disconnect");
            }
        }
        self.notify_node(node, |behavior, ctx| behavior.disconnected(ctx, terminal, peer));
    }

    /// Disconnects every peer of `terminal`.
    pub fn disconnect_all(&mut self, terminal: TerminalId) -> Result<(), FlowError> {
        let peers: Vec<TerminalId> = self
            .terminal(terminal)?
            .connections()
            .keys()
            .copied()
            .sorted()
            .collect();
        for peer in peers {
            self.disconnect(terminal, peer)?;
        }
        Ok(())
    }

    /// Removes a connection by id, as when a selected line is deleted.
    pub fn disconnect_connection(&mut self, id: ConnectionId) -> Result<(), FlowError> {
        let Some(connection) = self.connections.get(&id) else {
            return Ok(());
        };
        let source = connection.source();
        match connection.peer_of(source) {
            Some(target) => self.disconnect(source, target),
            None => Ok(()),
        }
    }

    /// Disconnects everything and removes the terminal's proxy from the
    /// surface. The terminal itself stays in the arena until it is removed.
    pub fn close(&mut self, terminal: TerminalId) -> Result<(), FlowError> {
        self.disconnect_all(terminal)?;
        self.terminal_mut(terminal)?.remove_proxy();
        Ok(())
    }

    /// Starts dragging a new connection out of `source`.
    pub fn begin_connection(&mut self, source: TerminalId) -> Result<PendingConnection, FlowError> {
        self.terminal(source)?;
        let id = self.next_connection_id();
        let proxy = self.surface.connection_proxy();
        Ok(PendingConnection {
            connection: Connection::new(id, source, proxy),
        })
    }

    /// Points a pending connection at a free position and redraws it.
    pub fn drag_connection(&self, pending: &mut PendingConnection, point: Point) {
        pending.connection.set_target(ConnectionTarget::Point(point));
        if let Ok(source) = self.terminal(pending.source()) {
            pending.connection.update_line(source.anchor(), Some(point));
        }
    }

    /// Promotes a pending connection to a real one ending at `target`.
    ///
    /// If the connection is refused, the pending line is removed from the
    /// surface and the graph is left as it was; the refusal is returned so
    /// the interaction layer can report it.
    pub fn complete_connection(
        &mut self,
        pending: PendingConnection,
        target: TerminalId,
    ) -> Result<ConnectionId, ConnectError> {
        let source = pending.source();
        self.connect_with(source, target, Some(pending.connection))
    }

    /// Drops a pending connection that never found a target.
    pub fn discard_connection(&mut self, pending: PendingConnection) {
        let mut connection = pending.connection;
        connection.remove_proxy();
    }
}
