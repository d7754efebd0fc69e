//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build, drive and persist a flowchart.
//!
//! # Example
//!
//! ```rust,no_run
//! use labflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let state = FlowchartState::from_file("path/to/flowchart.json")?;
//! let mut flowchart = Flowchart::builder()
//!     .with_surface(RecordingSurface::new())
//!     .build();
//! flowchart.load_state(&state)?;
//! # Ok(())
//! # }
//! ```

// Graph
pub use crate::connection::{ConnectionId, PendingConnection};
pub use crate::flowchart::{Flowchart, FlowchartBuilder};
pub use crate::node::{
    ConstantNode, FanOutNode, NodeBehavior, NodeContext, NodeId, NodeLibrary, ProbeNode,
    ScaleNode, SumNode,
};
pub use crate::terminal::{
    Acceptability, Direction, Terminal, TerminalId, TerminalSpec, TerminalStatus, TerminalValue,
};
pub use crate::value::Value;

// Display
pub use crate::surface::{DisplaySurface, NullSurface, Point, RecordingSurface};

// Persistence
pub use crate::persist::FlowchartState;

// Error types
pub use crate::error::{ConnectError, FlowError, PersistError, ProcessError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
