use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::parser::SummaryRecord;

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub url: String,
    pub summary: SummaryRecord,
    pub scraped_at: DateTime<Utc>,
    pub word_count: usize,
    pub status: String,
}
