use super::{Acceptability, Terminal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete health of a terminal, the non-graphical form of its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalStatus {
    Disconnected,
    /// An input terminal with no output-providing connection.
    WaitingForInput,
    /// Connected, but holding no data (possibly after a processing error).
    NoData,
    /// Holding data that the owning node has not validated yet.
    Pending,
    Ok,
    Bad,
}

impl TerminalStatus {
    /// Derives the status from the terminal's own state.
    ///
    /// `has_input` tells whether any connected peer is an output; only the
    /// flowchart can answer that, since it owns the peers.
    pub fn derive(terminal: &Terminal, has_input: bool) -> Self {
        if !terminal.is_connected() {
            TerminalStatus::Disconnected
        } else if terminal.is_input() && !has_input {
            TerminalStatus::WaitingForInput
        } else if terminal.value().is_empty() {
            TerminalStatus::NoData
        } else {
            match terminal.acceptability() {
                Acceptability::Unknown => TerminalStatus::Pending,
                Acceptability::Acceptable => TerminalStatus::Ok,
                Acceptability::Unacceptable => TerminalStatus::Bad,
            }
        }
    }

    /// Default palette for surfaces that draw statuses as colors.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            TerminalStatus::Disconnected => (0, 0, 0),
            TerminalStatus::WaitingForInput | TerminalStatus::Pending => (200, 200, 0),
            TerminalStatus::NoData => (255, 255, 255),
            TerminalStatus::Ok => (0, 200, 0),
            TerminalStatus::Bad => (200, 0, 0),
        }
    }
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TerminalStatus::Disconnected => "disconnected",
            TerminalStatus::WaitingForInput => "waiting for input",
            TerminalStatus::NoData => "no data",
            TerminalStatus::Pending => "pending validation",
            TerminalStatus::Ok => "ok",
            TerminalStatus::Bad => "bad",
        };
        f.write_str(label)
    }
}
