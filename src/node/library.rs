use super::builtin::{ConstantNode, FanOutNode, ProbeNode, ScaleNode, SumNode};
use super::NodeBehavior;
use crate::error::PersistError;
use crate::value::Value;
use ahash::AHashMap;
use itertools::Itertools;

/// Builds a node behaviour from its saved parameters.
pub type NodeFactory = Box<dyn Fn(&serde_json::Value) -> Result<Box<dyn NodeBehavior>, PersistError>>;

/// Registry of node types, keyed by [`NodeBehavior::type_name`].
///
/// Restoring a saved flowchart looks every node type up here.
pub struct NodeLibrary {
    factories: AHashMap<String, NodeFactory>,
}

impl Default for NodeLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl NodeLibrary {
    /// An empty library.
    pub fn new() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// A library holding the built-in node types.
    pub fn with_defaults() -> Self {
        let mut library = Self::new();
        register_default_nodes(&mut library);
        library
    }

    pub fn register<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn NodeBehavior>, PersistError> + 'static,
    {
        self.factories
            .insert(type_name.to_string(), Box::new(factory));
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).sorted().collect()
    }

    pub fn create(
        &self,
        type_name: &str,
        params: &serde_json::Value,
    ) -> Result<Box<dyn NodeBehavior>, PersistError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| PersistError::UnknownNodeType(type_name.to_string()))?;
        factory(params)
    }
}

fn register_default_nodes(library: &mut NodeLibrary) {
    library.register("constant", |params| {
        // Saved parameters use the tagged form; hand-written ones are plain JSON.
        let value = params.get("value").and_then(|json| {
            serde_json::from_value::<Value>(json.clone())
                .ok()
                .or_else(|| Value::from_json(json))
        });
        Ok(Box::new(ConstantNode::new(value)))
    });
    library.register("sum", |_| Ok(Box::new(SumNode)));
    library.register("scale", |params| {
        let factor = params
            .get("factor")
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| PersistError::InvalidNode {
                node: "scale".to_string(),
                message: "missing numeric 'factor' parameter".to_string(),
            })?;
        Ok(Box::new(ScaleNode::new(factor)))
    });
    library.register("probe", |_| Ok(Box::new(ProbeNode::new())));
    library.register("fanout", |_| Ok(Box::new(FanOutNode)));
}
