use crate::surface::{ConnectionProxy, Point};
use crate::terminal::TerminalId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a connection inside its flowchart. Both endpoint terminals
/// map each other to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub(crate) u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Where the far end of a connection points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionTarget {
    Terminal(TerminalId),
    /// A free point, used while a connection is being dragged out.
    Point(Point),
}

/// An edge between two terminals together with its line proxy.
pub struct Connection {
    id: ConnectionId,
    source: TerminalId,
    target: Option<ConnectionTarget>,
    proxy: Box<dyn ConnectionProxy>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, source: TerminalId, proxy: Box<dyn ConnectionProxy>) -> Self {
        Self {
            id,
            source,
            target: None,
            proxy,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn source(&self) -> TerminalId {
        self.source
    }

    pub fn target(&self) -> Option<ConnectionTarget> {
        self.target
    }

    /// The terminal at the far end from `terminal`, if both ends are terminals.
    pub fn peer_of(&self, terminal: TerminalId) -> Option<TerminalId> {
        match self.target {
            Some(ConnectionTarget::Terminal(target)) if terminal == self.source => Some(target),
            Some(ConnectionTarget::Terminal(target)) if terminal == target => Some(self.source),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self.target, Some(ConnectionTarget::Terminal(_)))
    }

    pub(crate) fn set_target(&mut self, target: ConnectionTarget) {
        self.target = Some(target);
    }

    /// Redraws the line. Without an end point there is nothing to draw yet.
    pub(crate) fn update_line(&mut self, start: Point, end: Option<Point>) {
        if let Some(end) = end {
            self.proxy.update_line(start, end);
        }
    }

    pub(crate) fn remove_proxy(&mut self) {
        self.proxy.remove();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

/// A connection being dragged out of a terminal, not yet part of the graph.
///
/// It must be either completed against a second terminal or discarded; see
/// [`Flowchart::complete_connection`](crate::flowchart::Flowchart::complete_connection).
#[must_use = "a pending connection must be completed or discarded"]
#[derive(Debug)]
pub struct PendingConnection {
    pub(crate) connection: Connection,
}

impl PendingConnection {
    pub fn source(&self) -> TerminalId {
        self.connection.source()
    }

    pub fn target(&self) -> Option<ConnectionTarget> {
        self.connection.target()
    }
}
