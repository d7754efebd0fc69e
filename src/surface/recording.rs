use super::{ConnectionProxy, DisplaySurface, Point, TerminalProxy};
use crate::terminal::{Direction, TerminalId, TerminalStatus};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything a [`RecordingSurface`] has been told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    TerminalCreated {
        terminal: TerminalId,
        name: String,
        direction: Direction,
    },
    Anchor {
        terminal: TerminalId,
        point: Point,
    },
    Status {
        terminal: TerminalId,
        status: TerminalStatus,
    },
    Renamed {
        terminal: TerminalId,
        name: String,
    },
    TerminalRemoved {
        terminal: TerminalId,
    },
    Line {
        line: u64,
        start: Point,
        end: Point,
    },
    LineRemoved {
        line: u64,
    },
}

/// Shared handle on the event log of a [`RecordingSurface`].
///
/// Cloning the handle is cheap; every clone sees the same log, so a caller can
/// keep one after handing the surface to a flowchart.
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog {
    events: Rc<RefCell<Vec<SurfaceEvent>>>,
}

impl SurfaceLog {
    fn push(&self, event: SurfaceEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Every status painted on `terminal`, oldest first.
    pub fn statuses(&self, terminal: TerminalId) -> Vec<TerminalStatus> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Status {
                    terminal: t,
                    status,
                } if *t == terminal => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self, terminal: TerminalId) -> Option<TerminalStatus> {
        self.statuses(terminal).last().copied()
    }

    /// Number of line proxies that have been created and not yet removed.
    pub fn live_lines(&self) -> usize {
        let events = self.events.borrow();
        let mut lines: Vec<u64> = Vec::new();
        for event in events.iter() {
            match event {
                SurfaceEvent::Line { line, .. } if !lines.contains(line) => lines.push(*line),
                SurfaceEvent::LineRemoved { line } => lines.retain(|l| l != line),
                _ => {}
            }
        }
        lines.len()
    }
}

/// A surface that records every proxy call into a [`SurfaceLog`].
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: SurfaceLog,
    next_line: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SurfaceLog {
        self.log.clone()
    }
}

struct RecordingTerminal {
    terminal: TerminalId,
    log: SurfaceLog,
}

impl TerminalProxy for RecordingTerminal {
    fn set_anchor(&mut self, point: Point) {
        self.log.push(SurfaceEvent::Anchor {
            terminal: self.terminal,
            point,
        });
    }

    fn set_status(&mut self, status: TerminalStatus) {
        self.log.push(SurfaceEvent::Status {
            terminal: self.terminal,
            status,
        });
    }

    fn renamed(&mut self, name: &str) {
        self.log.push(SurfaceEvent::Renamed {
            terminal: self.terminal,
            name: name.to_string(),
        });
    }

    fn remove(&mut self) {
        self.log.push(SurfaceEvent::TerminalRemoved {
            terminal: self.terminal,
        });
    }
}

struct RecordingLine {
    line: u64,
    log: SurfaceLog,
    drawn: bool,
}

impl ConnectionProxy for RecordingLine {
    fn update_line(&mut self, start: Point, end: Point) {
        self.drawn = true;
        self.log.push(SurfaceEvent::Line {
            line: self.line,
            start,
            end,
        });
    }

    fn remove(&mut self) {
        if self.drawn {
            self.log.push(SurfaceEvent::LineRemoved { line: self.line });
            self.drawn = false;
        }
    }
}

impl DisplaySurface for RecordingSurface {
    fn terminal_proxy(
        &mut self,
        terminal: TerminalId,
        name: &str,
        direction: Direction,
    ) -> Box<dyn TerminalProxy> {
        self.log.push(SurfaceEvent::TerminalCreated {
            terminal,
            name: name.to_string(),
            direction,
        });
        Box::new(RecordingTerminal {
            terminal,
            log: self.log.clone(),
        })
    }

    fn connection_proxy(&mut self) -> Box<dyn ConnectionProxy> {
        let line = self.next_line;
        self.next_line += 1;
        Box::new(RecordingLine {
            line,
            log: self.log.clone(),
            drawn: false,
        })
    }
}
