//! The display layer seen from the dataflow core.
//!
//! The core never draws anything. Each terminal and each connection owns a
//! proxy created by a [`DisplaySurface`]; the core pushes anchors, statuses
//! and line endpoints into those proxies and tells them when to go away.
//! A headless deployment uses [`NullSurface`]; [`RecordingSurface`] keeps a
//! log of everything the core pushed.

mod headless;
mod recording;

pub use headless::NullSurface;
pub use recording::{RecordingSurface, SurfaceEvent, SurfaceLog};

use crate::terminal::{Direction, TerminalId, TerminalStatus};
use serde::{Deserialize, Serialize};

/// A position on the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display-side representation of a single terminal.
pub trait TerminalProxy {
    /// Moves the terminal's connect point.
    fn set_anchor(&mut self, point: Point);
    /// Paints the terminal with the given status.
    fn set_status(&mut self, status: TerminalStatus);
    fn renamed(&mut self, name: &str);
    /// Removes the proxy from its surface.
    fn remove(&mut self);
}

/// Display-side representation of a connection line.
pub trait ConnectionProxy {
    fn update_line(&mut self, start: Point, end: Point);
    /// Removes the line from its surface.
    fn remove(&mut self);
}

/// Factory for proxies. One surface serves a whole flowchart.
pub trait DisplaySurface {
    fn terminal_proxy(
        &mut self,
        terminal: TerminalId,
        name: &str,
        direction: Direction,
    ) -> Box<dyn TerminalProxy>;

    fn connection_proxy(&mut self) -> Box<dyn ConnectionProxy>;
}
