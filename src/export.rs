//! Strategy export: pretty JSON (the raw document tab) and a printable PDF
//! report via `printpdf`.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::*;
use thiserror::Error;

use crate::config::APP_NAME;
use crate::dashboard::{automation_cards, build_roadmap, risk_matrix};
use crate::models::StrategyResult;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM: Mm = Mm(20.0);
const LEFT: Mm = Mm(20.0);
const INDENT: Mm = Mm(25.0);
const WRAP_CHARS: usize = 85;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }
}

/// The document exactly as the dashboard's JSON tab shows it.
pub fn to_json_pretty(strategy: &StrategyResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(strategy)?)
}

/// Render `strategy` in `format` and write it into `dir`.
pub fn export_to_dir(
    strategy: &StrategyResult,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = match format {
        ExportFormat::Json => to_json_pretty(strategy)?.into_bytes(),
        ExportFormat::Pdf => generate_strategy_pdf(strategy)?,
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}-strategy.{}", APP_NAME.to_lowercase(), format.extension()));
    std::fs::write(&path, &bytes)?;

    tracing::info!(path = %path.display(), size = bytes.len(), "Strategy exported");
    Ok(path)
}

// ─── PDF ──────────────────────────────────────────────────────────────────────

/// Writes lines top to bottom and starts a new A4 page when one fills up.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page1, layer1) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(format!("font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
            pages: 1,
        })
    }

    fn ensure_room(&mut self, needed: Mm) {
        if self.y - needed < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
    }

    fn title(&mut self, text: &str) {
        self.layer.use_text(text, 16.0, LEFT, self.y, &self.bold);
        self.y -= Mm(10.0);
    }

    fn heading(&mut self, text: &str) {
        // Keep a heading together with at least its first line
        self.ensure_room(Mm(14.0));
        self.y -= Mm(4.0);
        self.layer.use_text(text, 11.0, LEFT, self.y, &self.bold);
        self.y -= Mm(6.0);
    }

    fn paragraph(&mut self, text: &str) {
        for line in wrap_text(text, WRAP_CHARS) {
            self.ensure_room(Mm(4.5));
            self.layer.use_text(&line, 9.0, INDENT, self.y, &self.font);
            self.y -= Mm(4.5);
        }
    }

    fn gap(&mut self, space: Mm) {
        self.y -= space;
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ExportError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ExportError::Pdf(format!("buffer error: {e}")))
    }
}

/// Printable report of the whole strategy. Returns PDF bytes.
pub fn generate_strategy_pdf(strategy: &StrategyResult) -> Result<Vec<u8>, ExportError> {
    let title = format!("{APP_NAME} Strategy Report");
    let mut page = PageWriter::new(&title)?;
    page.title(&title);

    page.heading("OBJECTIVES & KEY RESULTS");
    if strategy.okrs.is_empty() {
        page.paragraph("No objectives identified.");
    }
    for (i, okr) in strategy.okrs.iter().enumerate() {
        page.paragraph(&format!("{}. {}", i + 1, okr.objective));
        for kr in &okr.key_results {
            page.paragraph(&format!("    - {kr}"));
        }
        page.gap(Mm(2.0));
    }

    page.heading("ACTION ITEMS");
    for action in &strategy.action_items {
        let mut details = Vec::new();
        if let Some(owner) = &action.owner {
            details.push(owner.clone());
        }
        if let Some(duration) = &action.duration {
            details.push(duration.clone());
        }
        if let Some(priority) = action.priority {
            details.push(format!("{priority} priority"));
        }
        let line = if details.is_empty() {
            format!("- {}", action.title)
        } else {
            format!("- {} ({})", action.title, details.join(", "))
        };
        page.paragraph(&line);
    }

    page.heading("ROADMAP");
    for phase in build_roadmap(&strategy.timeline).phases {
        page.paragraph(&format!(
            "{}: {} to {}",
            phase.phase, phase.start_date, phase.end_date
        ));
        if !phase.description.is_empty() {
            page.paragraph(&format!("    {}", phase.description));
        }
    }

    page.heading("STAKEHOLDERS");
    for s in &strategy.stakeholders {
        page.paragraph(&format!(
            "- {} ({}): influence {}, interest {}",
            s.name, s.role, s.influence, s.interest
        ));
    }

    page.heading("RISKS");
    for risk in risk_matrix(strategy) {
        page.paragraph(&format!("- [{}] {}", risk.severity, risk.description));
        page.paragraph(&format!("    Mitigation: {}", risk.mitigation));
    }

    page.heading("AUTOMATIONS");
    for card in automation_cards(&strategy.automations) {
        page.paragraph(&format!("- {} [{}] -> {}", card.title, card.kind, card.assignee));
    }

    tracing::debug!(pages = page.pages, "Strategy PDF rendered");
    page.finish()
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    // Leading spaces are indentation and survive the wrap
    let indent: String = text.chars().take_while(|c| *c == ' ').collect();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.trim().is_empty() {
            lines.push(current.clone());
            current = indent.clone();
        }
        if !current.trim().is_empty() {
            current.push(' ');
        } else if current.is_empty() {
            current.push_str(&indent);
        }
        current.push_str(word);
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
