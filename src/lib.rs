use std::sync::Arc;

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod tcp;

/// Process-wide immutable state, built once at startup and cloned into
/// every connection task. Nothing in here is mutated after construction.
#[derive(Clone)]
pub struct AppState {
    pub allowed_dirs: Arc<[String]>,
}

impl AppState {
    pub fn new(allowed_dirs: Vec<String>) -> Self {
        Self {
            allowed_dirs: Arc::from(allowed_dirs),
        }
    }
}
