use super::Flowchart;
use crate::node::NodeLibrary;
use crate::surface::{DisplaySurface, NullSurface};

/// Default cap on nested node updates within one propagation.
pub const DEFAULT_MAX_PROPAGATION_DEPTH: usize = 256;

pub struct FlowchartBuilder {
    surface: Box<dyn DisplaySurface>,
    library: NodeLibrary,
    max_propagation_depth: usize,
}

impl Default for FlowchartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowchartBuilder {
    pub fn new() -> Self {
        Self {
            surface: Box::new(NullSurface),
            library: NodeLibrary::with_defaults(),
            max_propagation_depth: DEFAULT_MAX_PROPAGATION_DEPTH,
        }
    }

    /// Surface that receives terminal and connection proxies.
    pub fn with_surface(mut self, surface: impl DisplaySurface + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    /// Node types available when restoring snapshots.
    pub fn with_library(mut self, library: NodeLibrary) -> Self {
        self.library = library;
        self
    }

    /// Maximum nesting of node updates triggered by one value change.
    /// Deeper updates are skipped and logged.
    pub fn with_max_propagation_depth(mut self, depth: usize) -> Self {
        self.max_propagation_depth = depth.max(1);
        self
    }

    pub fn build(self) -> Flowchart {
        Flowchart::from_parts(self.surface, self.library, self.max_propagation_depth)
    }
}
