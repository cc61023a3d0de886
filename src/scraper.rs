use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use once_cell::sync::Lazy;
use crate::error::Result;

/// Result of extraction: either the page's readable text or a reason
/// nothing could be pulled out. Produced once per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapedContent {
    Text(String),
    Error(String),
}

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to build HTTP client")
});

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

// Likeliest containers for a page's primary readable text, in order.
static MAIN_CONTENT_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        r#"[role="main"]"#,
        ".main-content",
        "#main-content",
        ".post-body",
        ".entry-content",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("Failed to parse main content selector"))
    .collect()
});

static CANDIDATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, p, article, section, div.content, div.post, li")
        .expect("Failed to parse candidate selector")
});

const NON_CONTENT_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "head"];
const VOID_CHILD_TAGS: [&str; 5] = ["br", "hr", "img", "video", "audio"];

// An element with this much direct text is kept even when it has many
// element children.
const DIRECT_TEXT_THRESHOLD: usize = 20;
const MAX_ELEMENT_CHILDREN: usize = 3;

pub async fn fetch_html(url: &str) -> Result<String> {
    let response = CLIENT.get(url).send().await?;
    let html = response.text().await?;
    Ok(html)
}

/// Extract the readable text of a page.
///
/// Picks a main-content container from an ordered selector list (falling
/// back to `<body>`), collects text from candidate tags that pass the
/// visibility test and a heuristic against double-counting nested text,
/// and as a last resort walks every text node under the target.
pub fn extract_content(html: &str) -> ScrapedContent {
    let document = Html::parse_document(html);

    let target = match main_content_element(&document) {
        Some(element) => element,
        None => return ScrapedContent::Error("No <body> tag found in the page.".to_string()),
    };

    let mut extracted = String::new();
    for element in target.select(&CANDIDATE_SELECTOR) {
        if element.id() == target.id() || !is_visible(element) {
            continue;
        }
        if should_take_text(element) {
            let text = collect_text(element);
            let text = text.trim();
            if !text.is_empty() {
                extracted.push_str(text);
                extracted.push_str("\n\n");
            }
        }
    }

    if extracted.trim().is_empty() {
        let mut chunks = Vec::new();
        walk_text_nodes(target, &mut chunks);
        extracted = chunks.join("\n\n");
    }

    let extracted = extracted.trim();
    if extracted.is_empty() {
        ScrapedContent::Error("No meaningful content could be extracted.".to_string())
    } else {
        ScrapedContent::Text(extracted.to_string())
    }
}

fn main_content_element(document: &Html) -> Option<ElementRef<'_>> {
    for selector in MAIN_CONTENT_SELECTORS.iter() {
        if let Some(element) = document.select(selector).find(|e| is_visible(*e)) {
            return Some(element);
        }
    }
    document.select(&BODY_SELECTOR).next()
}

/// Static-markup visibility test: the computed-style and viewport checks a
/// browser would make have no server-side analogue, so this inspects the
/// hidden attribute, aria-hidden, and inline display/visibility styles on
/// the element and its ancestors.
fn is_visible(element: ElementRef<'_>) -> bool {
    if !element_passes_visibility(element) {
        return false;
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .all(element_passes_visibility)
}

fn element_passes_visibility(element: ElementRef<'_>) -> bool {
    let value = element.value();
    let name = value.name();
    if NON_CONTENT_TAGS.contains(&name) {
        return false;
    }
    if value.attr("hidden").is_some() {
        return false;
    }
    if value.attr("aria-hidden") == Some("true") {
        return false;
    }
    if let Some(style) = value.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return false;
        }
    }
    true
}

/// Keep an element's text only if it carries substantial direct text of its
/// own, has few element children, or has no candidate descendants. Anything
/// else is a wrapper whose text will be picked up from its children.
fn should_take_text(element: ElementRef<'_>) -> bool {
    let mut direct_text_len = 0;
    let mut element_children = 0;

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                direct_text_len += text.trim().len();
            }
            Node::Element(child_element) => {
                if !VOID_CHILD_TAGS.contains(&child_element.name()) {
                    element_children += 1;
                }
            }
            _ => {}
        }
    }

    if direct_text_len > DIRECT_TEXT_THRESHOLD || element_children < MAX_ELEMENT_CHILDREN {
        return true;
    }

    element
        .select(&CANDIDATE_SELECTOR)
        .filter(|descendant| descendant.id() != element.id())
        .count()
        == 0
}

fn collect_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("")
}

/// Last-resort extraction: every visible text node under the target, in
/// document order, skipping non-content tags.
fn walk_text_nodes(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    if element_passes_visibility(child_element) {
                        walk_text_nodes(child_element, out);
                    }
                }
            }
            _ => {}
        }
    }
}
