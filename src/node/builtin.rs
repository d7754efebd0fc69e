use super::{NodeBehavior, NodeContext};
use crate::error::ProcessError;
use crate::terminal::{TerminalId, TerminalSpec};
use crate::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Emits a fixed value on `out`.
#[derive(Debug, Clone, Default)]
pub struct ConstantNode {
    value: Option<Value>,
}

impl ConstantNode {
    pub fn new(value: Option<Value>) -> Self {
        Self { value }
    }
}

impl NodeBehavior for ConstantNode {
    fn type_name(&self) -> &str {
        "constant"
    }

    /// The value is stored in its tagged serde form so it restores exactly.
    fn params(&self) -> serde_json::Value {
        let value = serde_json::to_value(&self.value).unwrap_or_default();
        serde_json::json!({ "value": value })
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::output("out")]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError> {
        ctx.set_output("out", self.value.clone())?;
        if self.value.is_some() {
            ctx.set_acceptable("out", true)?;
        }
        Ok(())
    }
}

/// Adds every value arriving on the multi input `in`.
///
/// Numbers add up; sample arrays add element-wise; a number added to sample
/// arrays offsets every sample.
#[derive(Debug, Clone, Default)]
pub struct SumNode;

impl SumNode {
    fn add(acc: Value, next: &Value, terminal: &str) -> Result<Value, ProcessError> {
        match (acc, next) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Samples(a), Value::Number(b)) => {
                Ok(Value::Samples(a.into_iter().map(|x| x + b).collect()))
            }
            (Value::Number(a), Value::Samples(b)) => {
                Ok(Value::Samples(b.iter().map(|x| x + a).collect()))
            }
            (Value::Samples(a), Value::Samples(b)) if a.len() == b.len() => Ok(Value::Samples(
                a.into_iter().zip(b).map(|(x, y)| x + y).collect(),
            )),
            (acc, next) => Err(ProcessError::TypeMismatch {
                terminal: terminal.to_string(),
                expected: format!("a value addable to {}", acc.kind()),
                found: next.kind().to_string(),
            }),
        }
    }
}

impl NodeBehavior for SumNode {
    fn type_name(&self) -> &str {
        "sum"
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::input("in").multi(), TerminalSpec::output("out")]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError> {
        let values: Vec<Value> = ctx.inputs("in")?.into_iter().map(|(_, v)| v.clone()).collect();
        let mut iter = values.iter();
        let Some(first) = iter.next() else {
            ctx.set_output("out", None::<Value>)?;
            return Ok(());
        };

        let total = iter.try_fold(first.clone(), |acc, next| Self::add(acc, next, "in"));
        match total {
            Ok(total) => {
                ctx.set_acceptable("in", true)?;
                ctx.set_output("out", total)?;
                Ok(())
            }
            Err(e) => {
                ctx.set_acceptable("in", false)?;
                ctx.set_output("out", None::<Value>)?;
                Err(e)
            }
        }
    }
}

/// Multiplies a number or every sample of `in` by a constant factor.
#[derive(Debug, Clone)]
pub struct ScaleNode {
    factor: f64,
}

impl ScaleNode {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }
}

impl NodeBehavior for ScaleNode {
    fn type_name(&self) -> &str {
        "scale"
    }

    fn params(&self) -> serde_json::Value {
        serde_json::json!({ "factor": self.factor })
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::input("in"), TerminalSpec::output("out")]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError> {
        let scaled = match ctx.input("in")? {
            None => None,
            Some(Value::Number(n)) => Some(Value::Number(n * self.factor)),
            Some(Value::Samples(s)) => Some(Value::Samples(s.iter().map(|x| x * self.factor).collect())),
            Some(other) => {
                let found = other.kind().to_string();
                ctx.set_acceptable("in", false)?;
                ctx.set_output("out", None::<Value>)?;
                return Err(ProcessError::TypeMismatch {
                    terminal: "in".to_string(),
                    expected: "number or samples".to_string(),
                    found,
                });
            }
        };
        if scaled.is_some() {
            ctx.set_acceptable("in", true)?;
        }
        ctx.set_output("out", scaled)?;
        Ok(())
    }
}

/// Shared record of every value a [`ProbeNode`] has received.
pub type ProbeHistory = Rc<RefCell<Vec<Option<Value>>>>;

/// A sink that records what arrives on its optional input `in`.
#[derive(Debug, Clone, Default)]
pub struct ProbeNode {
    history: ProbeHistory,
}

impl ProbeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the recorded values; stays valid after the node is boxed.
    pub fn history(&self) -> ProbeHistory {
        Rc::clone(&self.history)
    }
}

impl NodeBehavior for ProbeNode {
    fn type_name(&self) -> &str {
        "probe"
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::input("in").optional()]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError> {
        let value = ctx.input("in")?.cloned();
        if value.is_some() {
            ctx.set_acceptable("in", true)?;
        }
        self.history.borrow_mut().push(value);
        Ok(())
    }
}

/// Copies `in` to every connection of its multi output `out`.
///
/// Each downstream terminal gets its own entry, so disconnecting one leaves
/// the others untouched.
#[derive(Debug, Clone, Default)]
pub struct FanOutNode;

impl NodeBehavior for FanOutNode {
    fn type_name(&self) -> &str {
        "fanout"
    }

    fn terminals(&self) -> Vec<TerminalSpec> {
        vec![TerminalSpec::input("in"), TerminalSpec::output("out").multi()]
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>) -> Result<(), ProcessError> {
        let value = ctx.input("in")?.cloned();
        let entries: AHashMap<TerminalId, Option<Value>> = ctx
            .peers("out")?
            .into_iter()
            .map(|peer| (peer, value.clone()))
            .collect();
        if !entries.is_empty() {
            ctx.set_output("out", entries)?;
        }
        Ok(())
    }
}
