use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// The three-field analysis record. Every field is always populated;
/// extraction failures leave a placeholder, never an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub key_insights: String,
    pub market_situation: String,
    pub strategic_suggestions: String,
}

impl SummaryRecord {
    /// Record with the same message in all three fields, used when the
    /// summarization call itself fails and there is nothing to parse.
    pub fn from_error_message(message: &str) -> Self {
        SummaryRecord {
            key_insights: message.to_string(),
            market_situation: message.to_string(),
            strategic_suggestions: message.to_string(),
        }
    }
}

pub const INSIGHTS_FALLBACK: &str = "Unable to extract key insights from the model response.";
pub const MARKET_FALLBACK: &str = "Unable to extract the market situation from the model response.";
pub const SUGGESTIONS_FALLBACK: &str = "Unable to extract strategic suggestions from the model response.";

const RAW_PREVIEW_CHARS: usize = 100;

const LABEL_INSIGHTS: &str = r"key\s+insights";
const LABEL_MARKET: &str = r"market\s+situation";
const LABEL_SUGGESTIONS: &str = r"strategic\s+suggestions";

const LABELS: [&str; 3] = [LABEL_INSIGHTS, LABEL_MARKET, LABEL_SUGGESTIONS];

fn any_label() -> String {
    format!("(?:{}|{}|{})", LABEL_INSIGHTS, LABEL_MARKET, LABEL_SUGGESTIONS)
}

/// A captured section ends at the next recognized header of any form
/// (bold, numbered, or a plain label line) or at end of input. The regex
/// crate has no lookahead, so the terminator is consumed in a
/// non-capturing group instead; only the content group is used.
fn terminator() -> String {
    let any = any_label();
    format!(
        r"(?:\*\*\s*{any}|^\s*\d+\s*\.\s*{any}|^\s*{any}\s*(?::|$)|\z)",
        any = any,
    )
}

fn bold_pattern(label: &str) -> Regex {
    let pattern = format!(
        r"(?ism)\*\*\s*{label}\s*:?\s*\*\*\s*:?\s*(.*?)\s*{end}",
        label = label,
        end = terminator(),
    );
    Regex::new(&pattern).expect("invalid bold header pattern")
}

fn plain_pattern(label: &str) -> Regex {
    let pattern = format!(
        r"(?ism)^\s*{label}\s*:?\s*(.*?)\s*{end}",
        label = label,
        end = terminator(),
    );
    Regex::new(&pattern).expect("invalid plain header pattern")
}

fn numbered_pattern(number: usize, label: &str) -> Regex {
    let pattern = format!(
        r"(?ism)^\s*{number}\s*\.\s*{label}\s*:?\s*(.*?)\s*{end}",
        number = number,
        label = label,
        end = terminator(),
    );
    Regex::new(&pattern).expect("invalid numbered header pattern")
}

// One regex per field per strategy, compiled once.
static BOLD: Lazy<[Regex; 3]> = Lazy::new(|| LABELS.map(bold_pattern));
static PLAIN: Lazy<[Regex; 3]> = Lazy::new(|| LABELS.map(plain_pattern));
static NUMBERED: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        numbered_pattern(1, LABEL_INSIGHTS),
        numbered_pattern(2, LABEL_MARKET),
        numbered_pattern(3, LABEL_SUGGESTIONS),
    ]
});

/// Parse a free-form model response into the three-field record.
///
/// Total function: tries the bold, plain, and numbered header strategies in
/// order (first match per field wins, a filled field is never overwritten),
/// then a manual line scan for anything still missing, then fixed
/// placeholders. Never returns an empty field.
pub fn parse_summary(raw: &str) -> SummaryRecord {
    let mut fields: [Option<String>; 3] = [None, None, None];

    for strategy in [&*BOLD, &*PLAIN, &*NUMBERED] {
        for (field, pattern) in fields.iter_mut().zip(strategy.iter()) {
            if field.is_some() {
                continue;
            }
            if let Some(captures) = pattern.captures(raw) {
                let content = captures[1].trim();
                if !content.is_empty() {
                    *field = Some(content.to_string());
                }
            }
        }
        if fields.iter().all(Option::is_some) {
            break;
        }
    }

    if fields.iter().any(Option::is_none) {
        let scanned = scan_sections(raw);
        for (field, scanned) in fields.iter_mut().zip(scanned) {
            if field.is_none() && !scanned.is_empty() {
                *field = Some(scanned);
            }
        }
    }

    let [insights, market, suggestions] = fields;
    SummaryRecord {
        key_insights: insights.unwrap_or_else(|| placeholder_with_preview(INSIGHTS_FALLBACK, raw)),
        market_situation: market.unwrap_or_else(|| MARKET_FALLBACK.to_string()),
        strategic_suggestions: suggestions.unwrap_or_else(|| SUGGESTIONS_FALLBACK.to_string()),
    }
}

/// A truncated prefix of the raw text is attached to the key-insights
/// placeholder so a garbled response is still diagnosable from the report.
fn placeholder_with_preview(fallback: &str, raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    let preview: String = trimmed.chars().take(RAW_PREVIEW_CHARS).collect();
    format!("{} Response began: \"{}\"", fallback, preview)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Insights,
    Market,
    Suggestions,
}

fn section_for_line(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    if lower.contains("key insights") || lower.contains("insights:") {
        Some(Section::Insights)
    } else if lower.contains("market situation") || lower.contains("market:") {
        Some(Section::Market)
    } else if lower.contains("strategic") && lower.contains("suggest") {
        Some(Section::Suggestions)
    } else {
        None
    }
}

/// Manual line-scan fallback: a three-state section tracker fed one line at
/// a time. Lines before the first recognized header are discarded; a colon
/// on a header line contributes the text after it as the section's first
/// content line; lines made only of emphasis markers are skipped.
fn scan_sections(raw: &str) -> [String; 3] {
    let mut current = Section::None;
    let mut sections: [Vec<String>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for line in raw.lines() {
        if let Some(section) = section_for_line(line) {
            current = section;
            if let Some(colon) = line.find(':') {
                let rest = line[colon + 1..].trim_matches(|c: char| c == '*' || c.is_whitespace());
                if !rest.is_empty() {
                    push_line(&mut sections, current, rest);
                }
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.chars().all(|c| c == '*') {
            continue;
        }
        push_line(&mut sections, current, trimmed);
    }

    sections.map(|lines| lines.join("\n"))
}

fn push_line(sections: &mut [Vec<String>; 3], current: Section, line: &str) {
    let index = match current {
        Section::None => return,
        Section::Insights => 0,
        Section::Market => 1,
        Section::Suggestions => 2,
    };
    sections[index].push(line.to_string());
}
