//! Terminals: named, directional connection points on a node.
//!
//! A `Terminal` only holds local state. Everything that needs to look at a
//! peer or at the owning node (connecting, propagation, recoloring) is done by
//! the [`Flowchart`](crate::flowchart::Flowchart) that owns all terminals.

mod status;

pub use status::TerminalStatus;

use crate::connection::ConnectionId;
use crate::node::NodeId;
use crate::surface::{Point, TerminalProxy};
use crate::value::Value;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a terminal inside its flowchart. Terminal identity is this
/// handle, never the name: two nodes may both have a terminal called "in".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerminalId(pub(crate) usize);

impl TerminalId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "in")]
    Input,
    #[serde(rename = "out")]
    Output,
}

/// Validation flag set by the owning node after it has looked at a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Acceptability {
    #[default]
    Unknown,
    Acceptable,
    Unacceptable,
}

impl From<bool> for Acceptability {
    fn from(ok: bool) -> Self {
        if ok {
            Acceptability::Acceptable
        } else {
            Acceptability::Unacceptable
        }
    }
}

/// What a terminal holds.
///
/// Single terminals have one slot. Multi terminals keep one entry per
/// connected peer: for inputs, the value each upstream output contributed;
/// for outputs, the value produced for each downstream connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalValue {
    Single(Option<Value>),
    Multi(AHashMap<TerminalId, Option<Value>>),
}

impl TerminalValue {
    /// True for an empty single slot or a multi mapping with no entries.
    pub fn is_empty(&self) -> bool {
        match self {
            TerminalValue::Single(v) => v.is_none(),
            TerminalValue::Multi(map) => map.is_empty(),
        }
    }

    pub fn single(&self) -> Option<&Value> {
        match self {
            TerminalValue::Single(v) => v.as_ref(),
            TerminalValue::Multi(_) => None,
        }
    }

    pub fn entries(&self) -> Option<&AHashMap<TerminalId, Option<Value>>> {
        match self {
            TerminalValue::Single(_) => None,
            TerminalValue::Multi(map) => Some(map),
        }
    }
}

impl From<Value> for TerminalValue {
    fn from(value: Value) -> Self {
        TerminalValue::Single(Some(value))
    }
}

impl From<Option<Value>> for TerminalValue {
    fn from(value: Option<Value>) -> Self {
        TerminalValue::Single(value)
    }
}

impl From<AHashMap<TerminalId, Option<Value>>> for TerminalValue {
    fn from(entries: AHashMap<TerminalId, Option<Value>>) -> Self {
        TerminalValue::Multi(entries)
    }
}

/// Serializable state of a terminal. Connections are not part of it; they
/// are rebuilt by replaying connects from the saved topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalState {
    pub io: Direction,
    pub multi: bool,
    pub optional: bool,
}

/// Everything needed to create a terminal.
#[derive(Debug, Clone)]
pub struct TerminalSpec {
    pub name: String,
    pub direction: Direction,
    pub optional: bool,
    pub multi: bool,
    pub renamable: bool,
    pub bypass: Option<Value>,
    pub anchor: Option<Point>,
}

impl TerminalSpec {
    pub fn new(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            direction,
            optional: false,
            multi: false,
            renamable: false,
            bypass: None,
            anchor: None,
        }
    }

    pub fn input(name: &str) -> Self {
        Self::new(name, Direction::Input)
    }

    pub fn output(name: &str) -> Self {
        Self::new(name, Direction::Output)
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn renamable(mut self) -> Self {
        self.renamable = true;
        self
    }

    /// Value the owning node passes through when it is bypassed.
    pub fn bypass(mut self, value: Value) -> Self {
        self.bypass = Some(value);
        self
    }

    pub fn at(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn from_state(name: &str, state: TerminalState) -> Self {
        Self {
            optional: state.optional,
            multi: state.multi,
            ..Self::new(name, state.io)
        }
    }
}

pub struct Terminal {
    id: TerminalId,
    node: NodeId,
    name: String,
    direction: Direction,
    optional: bool,
    multi: bool,
    renamable: bool,
    bypass: Option<Value>,
    value: TerminalValue,
    acceptability: Acceptability,
    connections: AHashMap<TerminalId, ConnectionId>,
    anchor: Point,
    displayed: TerminalStatus,
    proxy: Box<dyn TerminalProxy>,
}

impl Terminal {
    pub(crate) fn new(
        id: TerminalId,
        node: NodeId,
        spec: TerminalSpec,
        proxy: Box<dyn TerminalProxy>,
    ) -> Self {
        let value = if spec.multi {
            TerminalValue::Multi(AHashMap::new())
        } else {
            TerminalValue::Single(None)
        };
        Self {
            id,
            node,
            name: spec.name,
            direction: spec.direction,
            optional: spec.optional,
            multi: spec.multi,
            renamable: spec.renamable,
            bypass: spec.bypass,
            value,
            acceptability: Acceptability::Unknown,
            connections: AHashMap::new(),
            anchor: spec.anchor.unwrap_or_default(),
            displayed: TerminalStatus::Disconnected,
            proxy,
        }
    }

    pub fn id(&self) -> TerminalId {
        self.id
    }

    /// The owning node. This is a lookup handle only.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    pub fn is_multi_value(&self) -> bool {
        self.multi
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_renamable(&self) -> bool {
        self.renamable
    }

    /// The full value: the single slot, or the whole peer mapping.
    pub fn value(&self) -> &TerminalValue {
        &self.value
    }

    /// The value this terminal provides for `peer`.
    ///
    /// Multi terminals answer with the peer's own entry (absent if there is
    /// none); single terminals ignore the peer.
    pub fn value_for(&self, peer: TerminalId) -> Option<&Value> {
        match &self.value {
            TerminalValue::Single(v) => v.as_ref(),
            TerminalValue::Multi(map) => map.get(&peer).and_then(Option::as_ref),
        }
    }

    pub fn bypass_value(&self) -> Option<&Value> {
        self.bypass.as_ref()
    }

    pub fn acceptability(&self) -> Acceptability {
        self.acceptability
    }

    pub fn connections(&self) -> &AHashMap<TerminalId, ConnectionId> {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub fn connected_to(&self, peer: TerminalId) -> bool {
        self.connections.contains_key(&peer)
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Status last painted on this terminal's proxy. A neighbour's recolor
    /// may have painted it, so it can differ from the derived status.
    pub fn displayed_status(&self) -> TerminalStatus {
        self.displayed
    }

    pub fn save_state(&self) -> TerminalState {
        TerminalState {
            io: self.direction,
            multi: self.multi,
            optional: self.optional,
        }
    }

    /// Replaces the single slot. Returns whether anything changed.
    pub(crate) fn replace_value(&mut self, value: Option<Value>) -> bool {
        match &mut self.value {
            TerminalValue::Single(current) => {
                if *current == value {
                    return false;
                }
                *current = value;
                true
            }
            TerminalValue::Multi(_) => false,
        }
    }

    /// Merges entries into the peer mapping. Returns whether anything changed.
    pub(crate) fn merge_values(&mut self, entries: AHashMap<TerminalId, Option<Value>>) -> bool {
        let TerminalValue::Multi(map) = &mut self.value else {
            return false;
        };
        let mut changed = false;
        for (peer, value) in entries {
            if map.get(&peer) != Some(&value) {
                map.insert(peer, value);
                changed = true;
            }
        }
        changed
    }

    /// Drops `peer`'s entry from a multi mapping. Returns whether one existed.
    pub(crate) fn purge_peer(&mut self, peer: TerminalId) -> bool {
        match &mut self.value {
            TerminalValue::Multi(map) => map.remove(&peer).is_some(),
            TerminalValue::Single(_) => false,
        }
    }

    pub(crate) fn set_acceptability(&mut self, acceptability: Acceptability) {
        self.acceptability = acceptability;
    }

    pub(crate) fn insert_connection(&mut self, peer: TerminalId, connection: ConnectionId) {
        self.connections.insert(peer, connection);
    }

    pub(crate) fn remove_connection(&mut self, peer: TerminalId) -> Option<ConnectionId> {
        self.connections.remove(&peer)
    }

    pub(crate) fn set_name(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    pub(crate) fn notify_renamed(&mut self) {
        self.proxy.renamed(&self.name);
    }

    pub(crate) fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
        self.proxy.set_anchor(anchor);
    }

    pub(crate) fn paint(&mut self, status: TerminalStatus) {
        self.displayed = status;
        self.proxy.set_status(status);
    }

    pub(crate) fn remove_proxy(&mut self) {
        self.proxy.remove();
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("multi", &self.multi)
            .field("value", &self.value)
            .field("acceptability", &self.acceptability)
            .field("connections", &self.connections)
            .finish()
    }
}
