use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use std::time::Duration;

use crate::parser::{parse_summary, SummaryRecord};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Page text beyond this length is cut before it goes into the prompt.
pub const MAX_CONTENT_CHARS: usize = 12_000;
const TRUNCATION_MARKER: &str = "... [content truncated]";

const TEMPERATURE: f32 = 0.4;
const TOP_K: u32 = 32;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Client for the generative-language API. The key is injected at
/// construction; `None` means every call degrades into an error record.
pub struct SummaryClient {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl SummaryClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build HTTP client");

        SummaryClient {
            client,
            api_key,
            model: model.into(),
        }
    }

    /// Summarize extracted page text into a three-field record.
    ///
    /// Transport and API failures never propagate past this boundary: the
    /// record comes back with the same error message in all three fields so
    /// a (degraded) report can still be rendered. No retries.
    pub async fn summarize(&self, page_text: &str) -> SummaryRecord {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => {
                return SummaryRecord::from_error_message(
                    "Gemini API key is not configured. Set GEMINI_API_KEY and restart the service.",
                );
            }
        };

        let prompt = build_prompt(page_text);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "summarization request failed");
                return SummaryRecord::from_error_message(&format!(
                    "Summarization request failed: {}",
                    e
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%status, "summarization API returned an error status");
            return SummaryRecord::from_error_message(&format!(
                "Summarization API returned status {}",
                status
            ));
        }

        let json: serde_json::Value = match response.json().await {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "summarization response was not valid JSON");
                return SummaryRecord::from_error_message(&format!(
                    "Summarization response was not valid JSON: {}",
                    e
                ));
            }
        };

        match json["candidates"][0]["content"]["parts"][0]["text"].as_str() {
            Some(text) => parse_summary(text),
            None => {
                tracing::error!("summarization response contained no candidate text");
                SummaryRecord::from_error_message(
                    "Summarization response contained no candidate text.",
                )
            }
        }
    }
}

/// Fixed analytical prompt around the (possibly truncated) page text. The
/// requested bold headers are what the parser's first strategy looks for.
pub fn build_prompt(page_text: &str) -> String {
    let content = truncate_content(page_text);
    let mut prompt = String::with_capacity(content.len() + 600);
    prompt.push_str(
        "You are a competitive intelligence analyst. Analyze the following web page \
         content from a competitor and respond with exactly three sections, each \
         introduced by a bold header on its own line:\n\n\
         **KEY INSIGHTS:** the most important competitor-specific findings.\n\
         **MARKET SITUATION:** the market conditions and trends the page reflects.\n\
         **STRATEGIC SUGGESTIONS:** concrete actions we should consider in response.\n\n\
         Page content:\n\n",
    );
    prompt.push_str(&content);
    prompt
}

fn truncate_content(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_CONTENT_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_is_embedded_untouched() {
        let prompt = build_prompt("a short page");
        assert!(prompt.contains("a short page"));
        assert!(!prompt.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn long_content_is_cut_with_a_marker() {
        let long = "q".repeat(MAX_CONTENT_CHARS + 500);
        let content = truncate_content(&long);
        assert!(content.ends_with(TRUNCATION_MARKER));
        assert_eq!(content.matches('q').count(), MAX_CONTENT_CHARS);

        let prompt = build_prompt(&long);
        assert!(prompt.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn prompt_asks_for_the_three_bold_headers() {
        let prompt = build_prompt("content");
        assert!(prompt.contains("**KEY INSIGHTS:**"));
        assert!(prompt.contains("**MARKET SITUATION:**"));
        assert!(prompt.contains("**STRATEGIC SUGGESTIONS:**"));
    }

    #[tokio::test]
    async fn missing_api_key_yields_an_error_record_without_a_network_call() {
        let client = SummaryClient::new(None, "gemini-1.5-flash");
        let record = client.summarize("some page text").await;
        assert_eq!(record.key_insights, record.market_situation);
        assert_eq!(record.market_situation, record.strategic_suggestions);
        assert!(record.key_insights.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn error_record_repeats_the_message_in_all_fields() {
        let record = SummaryRecord::from_error_message("boom");
        assert_eq!(record.key_insights, "boom");
        assert_eq!(record.market_situation, "boom");
        assert_eq!(record.strategic_suggestions, "boom");
    }
}
