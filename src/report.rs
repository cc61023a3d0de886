use chrono::Local;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex,
};

use crate::error::Result;
use crate::parser::SummaryRecord;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 15.0;
// Space at the bottom of every page reserved for the footer line.
const FOOTER_RESERVE_MM: f32 = 12.0;

const TITLE_SIZE: f32 = 18.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 8.0;

const HEADING_LINE_MM: f32 = 7.0;
const BODY_LINE_MM: f32 = 5.0;
const SECTION_GAP_MM: f32 = 10.0;

// Average glyph advance for Helvetica, close enough for wrapping and
// centering with the builtin (non-measured) fonts.
const PT_TO_MM: f32 = 0.352_778;
const AVG_GLYPH_EM: f32 = 0.5;

pub fn report_filename() -> String {
    format!(
        "competitor_insights_report_{}.pdf",
        Local::now().format("%Y-%m-%d")
    )
}

/// Render the three-field record as a paginated A4 report.
///
/// Single layout pass with page breaks, then a second pass stamping the
/// "Page X of Y" footer once the total page count is known.
pub fn render_report(summary: &SummaryRecord) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Competitor Analysis Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = PageCursor::new(&doc, first_page, first_layer);

    cursor.centered_line("Competitor Analysis Report", TITLE_SIZE, &bold, 12.0);
    let generated = format!("Generated on {}", Local::now().format("%Y-%m-%d"));
    cursor.centered_line(&generated, BODY_SIZE, &regular, 12.0);

    let sections = [
        ("Key Insights", summary.key_insights.as_str()),
        ("Market Situation", summary.market_situation.as_str()),
        ("Strategic Suggestions", summary.strategic_suggestions.as_str()),
    ];

    let usable_width = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    for (heading, body) in sections {
        // Keep a heading from being stranded at the very bottom of a page.
        cursor.ensure_room(HEADING_LINE_MM + 2.0 * BODY_LINE_MM);
        cursor.text_line(heading, HEADING_SIZE, &bold, HEADING_LINE_MM);
        for line in wrap_text(body, BODY_SIZE, usable_width) {
            cursor.text_line(&line, BODY_SIZE, &regular, BODY_LINE_MM);
        }
        cursor.advance(SECTION_GAP_MM);
    }

    let total = cursor.pages.len();
    for (index, (page, layer)) in cursor.pages.iter().enumerate() {
        let footer = format!("Page {} of {}", index + 1, total);
        let x = (PAGE_WIDTH_MM - approx_text_width_mm(&footer, FOOTER_SIZE)) / 2.0;
        doc.get_page(*page)
            .get_layer(*layer)
            .use_text(footer.as_str(), FOOTER_SIZE, Mm(x), Mm(MARGIN_MM / 2.0), &regular);
    }

    drop(cursor);
    Ok(doc.save_to_bytes()?)
}

struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(doc: &'a PdfDocumentReference, page: PdfPageIndex, layer: PdfLayerIndex) -> Self {
        PageCursor {
            doc,
            pages: vec![(page, layer)],
            y: PAGE_HEIGHT_MM - MARGIN_MM,
        }
    }

    fn current_layer(&self) -> PdfLayerReference {
        let (page, layer) = *self.pages.last().expect("at least one page exists");
        self.doc.get_page(page).get_layer(layer)
    }

    fn ensure_room(&mut self, needed_mm: f32) {
        if self.y - needed_mm < MARGIN_MM + FOOTER_RESERVE_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.pages.push((page, layer));
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn text_line(&mut self, text: &str, size: f32, font: &IndirectFontRef, line_height_mm: f32) {
        self.ensure_room(line_height_mm);
        self.current_layer()
            .use_text(text, size, Mm(MARGIN_MM), Mm(self.y), font);
        self.y -= line_height_mm;
    }

    fn centered_line(&mut self, text: &str, size: f32, font: &IndirectFontRef, line_height_mm: f32) {
        self.ensure_room(line_height_mm);
        let x = (PAGE_WIDTH_MM - approx_text_width_mm(text, size)) / 2.0;
        self.current_layer()
            .use_text(text, size, Mm(x.max(MARGIN_MM)), Mm(self.y), font);
        self.y -= line_height_mm;
    }

    fn advance(&mut self, gap_mm: f32) {
        self.y -= gap_mm;
    }
}

fn approx_text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * AVG_GLYPH_EM * PT_TO_MM
}

/// Greedy word wrap against an estimated glyph width. Paragraph breaks in
/// the input are preserved; a single word longer than the line is placed on
/// its own line rather than split.
fn wrap_text(text: &str, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate_len = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            let candidate_width = candidate_len as f32 * size_pt * AVG_GLYPH_EM * PT_TO_MM;
            if candidate_width > max_width_mm && !current.is_empty() {
                lines.push(current);
                current = word.to_string();
            } else if current.is_empty() {
                current = word.to_string();
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> SummaryRecord {
        SummaryRecord {
            key_insights: "Competitor launched a new tier.".to_string(),
            market_situation: "Demand is steady.".to_string(),
            strategic_suggestions: "Revisit pricing.".to_string(),
        }
    }

    #[test]
    fn renders_a_pdf_for_a_normal_record() {
        let bytes = render_report(&sample_record()).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_a_pdf_for_a_degraded_error_record() {
        let record = SummaryRecord::from_error_message("Summarization API returned status 503");
        let bytes = render_report(&record).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_sections_still_render() {
        let record = SummaryRecord {
            key_insights: "insight sentence repeated. ".repeat(400),
            market_situation: "market sentence repeated. ".repeat(400),
            strategic_suggestions: "suggestion sentence repeated. ".repeat(400),
        };
        let bytes = render_report(&record).expect("render should succeed");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrapped_lines_respect_the_width_estimate() {
        let text = "word ".repeat(200);
        let max_width = 60.0;
        let lines = wrap_text(&text, BODY_SIZE, max_width);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(approx_text_width_mm(line, BODY_SIZE) <= max_width);
        }
    }

    #[test]
    fn oversized_words_are_not_split() {
        let word = "a".repeat(300);
        let lines = wrap_text(&word, BODY_SIZE, 60.0);
        assert_eq!(lines, vec![word]);
    }

    #[test]
    fn paragraph_breaks_are_preserved_and_blank_lines_dropped() {
        let lines = wrap_text("first paragraph\n\nsecond paragraph", BODY_SIZE, 180.0);
        assert_eq!(lines, vec!["first paragraph", "second paragraph"]);
    }

    #[test]
    fn report_filename_embeds_the_date() {
        let name = report_filename();
        assert!(name.starts_with("competitor_insights_report_"));
        assert!(name.ends_with(".pdf"));
        let date = Local::now().format("%Y-%m-%d").to_string();
        assert!(name.contains(&date));
    }
}
