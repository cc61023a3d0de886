pub mod api;
pub mod config;
pub mod error;
pub mod parser;
pub mod report;
pub mod scraper;
pub mod summarizer;

use std::sync::Arc;
use config::Config;
use summarizer::SummaryClient;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub summarizer: Arc<SummaryClient>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let summarizer = SummaryClient::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        );
        AppState {
            config: Arc::new(config),
            summarizer: Arc::new(summarizer),
        }
    }
}
