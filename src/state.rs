use std::sync::Arc;

use crate::config::Settings;
use crate::pipeline::Pipeline;

/// Shared application state: the settings and the pipeline, both built
/// once before the server starts and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<Pipeline>,
}
