use thiserror::Error;

/// Errors raised by a connection attempt. A failed attempt leaves both
/// terminals exactly as they were.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Terminals {terminal} and {peer} are already connected")]
    AlreadyConnected { terminal: String, peer: String },

    #[error("Not connecting terminal {0} to itself")]
    SelfConnection(String),

    #[error("Can't connect {terminal} to {peer}: both terminals belong to node '{node}'")]
    SameNode {
        terminal: String,
        peer: String,
        node: String,
    },

    #[error(
        "Cannot connect {terminal} <-> {peer}: terminal {occupied} is already connected to [{existing}] and does not allow multiple connections"
    )]
    SingleConnectionOccupied {
        terminal: String,
        peer: String,
        occupied: String,
        existing: String,
    },

    #[error("Terminal id {0} does not exist in this flowchart")]
    UnknownTerminal(usize),
}

/// Errors raised by flowchart structure and value operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("Node id {0} does not exist in this flowchart")]
    UnknownNode(usize),

    #[error("Terminal id {0} does not exist in this flowchart")]
    UnknownTerminal(usize),

    #[error("Node '{0}' has no terminal named '{1}'")]
    UnknownTerminalName(String, String),

    #[error("Node '{node}' already has a terminal named '{name}'")]
    DuplicateTerminal { node: String, name: String },

    #[error("A node named '{0}' already exists")]
    DuplicateNode(String),

    #[error("Terminal {terminal} expects a {expected} value")]
    ValueShapeMismatch {
        terminal: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Errors produced by a node while recomputing its outputs.
///
/// The flowchart never propagates these to the caller of `set_value`; they are
/// logged and kept as the node's last error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Required input '{0}' has no value")]
    MissingInput(String),

    #[error("Input '{terminal}' expected {expected}, but found {found}")]
    TypeMismatch {
        terminal: String,
        expected: String,
        found: String,
    },

    #[error("Node '{0}' is already updating; skipped re-entrant update (cycle in the graph?)")]
    Reentrant(String),

    #[error("Propagation depth limit of {0} reached; update skipped")]
    DepthExceeded(usize),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("{0}")]
    Custom(String),
}

/// Errors that can occur while saving or restoring a flowchart snapshot.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to serialize flowchart state: {0}")]
    Serialize(String),

    #[error("Failed to deserialize flowchart state: {0}")]
    Deserialize(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Node type '{0}' is not registered in the node library")]
    UnknownNodeType(String),

    #[error("Saved node '{node}' is invalid: {message}")]
    InvalidNode { node: String, message: String },

    #[error(transparent)]
    Flow(#[from] FlowError),
}
