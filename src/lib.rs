//! # Labflow - Terminals, Connections and Value Propagation
//!
//! **Labflow** is the core of a visual dataflow graph for processing lab
//! recordings. Nodes expose named input and output *terminals*; connecting an
//! output to an input makes every value change on the output flow downstream
//! and re-run the receiving node.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Flowchart**: Use [`Flowchart::builder`](flowchart::Flowchart::builder) to pick a display
//!     surface, a node library and a propagation depth limit.
//! 2.  **Add Nodes**: Any type implementing [`NodeBehavior`](node::NodeBehavior) can be added; it declares
//!     its terminals and recomputes outputs in `update`.
//! 3.  **Connect and Set Values**: `connect`, `set_value` and `disconnect` keep both sides of every
//!     connection in sync and drive recomputation through the graph.
//! 4.  **Persist**: [`FlowchartState`](persist::FlowchartState) captures the graph as JSON or bincode and
//!     restores it by replaying the same connections.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labflow::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let mut flowchart = Flowchart::new();
//!
//!     let source = flowchart.add_node("source", ConstantNode::new(Some(Value::Number(2.0))))?;
//!     let scale = flowchart.add_node("scale", ScaleNode::new(10.0))?;
//!
//!     let out = flowchart.find_terminal("source", "out")?;
//!     let input = flowchart.find_terminal("scale", "in")?;
//!     flowchart.connect(out, input)?;
//!
//!     // Emitting the constant re-runs `scale` through the connection.
//!     flowchart.update(source)?;
//!
//!     let result = flowchart.find_terminal("scale", "out")?;
//!     println!("{:?}", flowchart.terminal(result)?.value());
//!     println!("scale ran {} time(s)", flowchart.node(scale)?.update_count());
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod flowchart;
pub mod node;
pub mod persist;
pub mod prelude;
pub mod surface;
pub mod terminal;
pub mod value;
