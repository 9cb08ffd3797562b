use std::sync::Arc;

use crate::config::Config;
use crate::extraction::ExtractorEngines;
use crate::form::registry::SessionRegistry;
use crate::llm_client::SwotModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    /// Installed in the background at startup; see `ExtractorEngines::load`.
    pub extractors: Arc<ExtractorEngines>,
    /// Pluggable model. Default: the Gemini `LlmClient`.
    pub model: Arc<dyn SwotModel>,
    pub config: Config,
}
