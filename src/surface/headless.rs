use super::{ConnectionProxy, DisplaySurface, Point, TerminalProxy};
use crate::terminal::{Direction, TerminalId, TerminalStatus};

/// A surface that discards everything. Used when no display is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

struct NullProxy;

impl TerminalProxy for NullProxy {
    fn set_anchor(&mut self, _point: Point) {}
    fn set_status(&mut self, _status: TerminalStatus) {}
    fn renamed(&mut self, _name: &str) {}
    fn remove(&mut self) {}
}

impl ConnectionProxy for NullProxy {
    fn update_line(&mut self, _start: Point, _end: Point) {}
    fn remove(&mut self) {}
}

impl DisplaySurface for NullSurface {
    fn terminal_proxy(
        &mut self,
        _terminal: TerminalId,
        _name: &str,
        _direction: Direction,
    ) -> Box<dyn TerminalProxy> {
        Box::new(NullProxy)
    }

    fn connection_proxy(&mut self) -> Box<dyn ConnectionProxy> {
        Box::new(NullProxy)
    }
}
