//! Engine configuration

/// Tuning knobs for one [`crate::engine::Engine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Relinks a call site may perform before it turns megamorphic
    /// (default: 4). A site caches at most `polymorphism_limit + 1`
    /// guarded targets.
    pub polymorphism_limit: u32,
    /// Whether call sites keep hit and stability counts and the name of
    /// the last callee (default: true). Resolution and relink counts are
    /// always kept.
    pub trace_sites: bool,
    /// Script function calls that may be active at once (default: 200).
    /// Compiled routines run on the host stack, so deeper recursion
    /// raises a script error instead.
    pub max_call_depth: usize,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            polymorphism_limit: 4,
            trace_sites: true,
            max_call_depth: 200,
        }
    }

    pub fn with_polymorphism_limit(mut self, limit: u32) -> Self {
        self.polymorphism_limit = limit;
        self
    }

    pub fn with_trace_sites(mut self, trace: bool) -> Self {
        self.trace_sites = trace;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
