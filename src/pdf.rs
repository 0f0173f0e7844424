//! PDF export: fillable templates and completed CAF documents.
//!
//! Documents are laid out as plain text lines in Helvetica on A4 pages.
//! Long values wrap; lines that overflow a page continue on the next.

use std::{collections::HashMap, fmt};

use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use uuid::Uuid;

use crate::model::{CorrectiveActionForm, Signature};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;
const LEADING: i64 = 16;
const WRAP_COLUMNS: usize = 88;
const BLANK: &str = "______________________________________________";

/// Errors that can occur while rendering a document.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("failed to encode page content: {0}")]
    Encode(String),

    #[error("failed to write document: {0}")]
    Write(String),
}

/// Which variant of the CAF document to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfFormat {
    /// Blank template to fill in by hand.
    Fillable,
    /// Populated with the CAF's current data.
    Completed,
}

impl PdfFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fillable => "fillable",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered document and the filename to save it under.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Display names for staff ids. Ids without a name print as-is.
pub type StaffNames = HashMap<Uuid, String>;

/// Render a CAF document.
pub fn render(
    caf: &CorrectiveActionForm,
    format: PdfFormat,
    names: &StaffNames,
) -> Result<PdfDocument, PdfError> {
    let lines = match format {
        PdfFormat::Fillable => fillable_lines(caf),
        PdfFormat::Completed => completed_lines(caf, names),
    };
    let bytes = write_document(&paginate(lines))?;

    Ok(PdfDocument {
        filename: filename(&caf.caf_number, format),
        bytes,
    })
}

/// `CAF-00012-completed.pdf`, with anything unsafe in a filename replaced.
pub fn filename(caf_number: &str, format: PdfFormat) -> String {
    let stem: String = caf_number
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}-{format}.pdf")
}

// ── Layout ──

#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    font: Font,
    size: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Font {
    Regular,
    Bold,
}

impl Line {
    fn title(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Bold,
            size: 18,
        }
    }

    fn heading(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Bold,
            size: 12,
        }
    }

    fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Regular,
            size: 10,
        }
    }

    fn blank() -> Self {
        Self::body("")
    }
}

fn fillable_lines(caf: &CorrectiveActionForm) -> Vec<Line> {
    let mut lines = vec![
        Line::title("Corrective Action Form"),
        Line::body(format!("CAF number: {}", caf.caf_number)),
        Line::blank(),
        Line::heading("Violation"),
    ];
    for label in [
        "Violation type",
        "Violation codes",
        "Incident",
        "Equipment",
        "Summary",
    ] {
        lines.push(Line::body(format!("{label}: {BLANK}")));
    }
    lines.push(Line::blank());
    lines.push(Line::heading("Corrective action"));
    for label in ["Assigned to", "Due date", "Action taken", "", ""] {
        if label.is_empty() {
            lines.push(Line::body(format!("{BLANK}{BLANK}")));
        } else {
            lines.push(Line::body(format!("{label}: {BLANK}")));
        }
    }
    lines.push(Line::blank());
    lines.push(Line::heading("Sign-off"));
    lines.push(Line::body(
        "Completed by: ____________________  Signature: ____________________  Date: __________",
    ));
    lines.push(Line::body(
        "Approved by:  ____________________  Signature: ____________________  Date: __________",
    ));
    lines
}

fn completed_lines(caf: &CorrectiveActionForm, names: &StaffNames) -> Vec<Line> {
    let name = |id: Uuid| names.get(&id).cloned().unwrap_or_else(|| id.to_string());
    let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let mut lines = vec![
        Line::title("Corrective Action Form"),
        Line::body(format!("CAF number: {}", caf.caf_number)),
        Line::body(format!("Status: {}", caf.status)),
        Line::blank(),
        Line::heading(caf.title.clone()),
        Line::body(format!("Priority: {}", caf.priority.as_str())),
        Line::body(format!("Category: {}", caf.category.as_str())),
        Line::blank(),
        Line::heading("Violation"),
        Line::body(format!("Violation type: {}", caf.violation_type.as_str())),
        Line::body(format!(
            "Violation codes: {}",
            caf.violation_codes
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )),
        Line::body(format!(
            "Incident: {} {}",
            caf.incident.kind.as_str(),
            caf.incident.id
        )),
        Line::body(format!(
            "Equipment: {}",
            or_dash(caf.equipment_id.map(|e| e.to_string()))
        )),
    ];
    push_wrapped(&mut lines, "Summary", caf.violation_summary.as_deref());
    push_wrapped(&mut lines, "Description", caf.description.as_deref());

    lines.push(Line::blank());
    lines.push(Line::heading("Corrective action"));
    lines.push(Line::body(format!(
        "Assigned to: {}",
        name(caf.assigned_staff_id)
    )));
    lines.push(Line::body(format!(
        "Due date: {}",
        or_dash(caf.due_date.map(|d| d.to_string()))
    )));
    lines.push(Line::body(format!(
        "Completed at: {}",
        or_dash(caf.completed_at.map(|t| t.to_string()))
    )));
    push_wrapped(&mut lines, "Completion notes", caf.completion_notes.as_deref());
    lines.push(Line::body(format!(
        "Maintenance issue: {}",
        or_dash(caf.maintenance_issue_id.map(|m| m.to_string()))
    )));

    lines.push(Line::blank());
    lines.push(Line::heading("Signatures"));
    if caf.signatures.is_empty() {
        lines.push(Line::body("None recorded"));
    }
    for signature in &caf.signatures {
        lines.extend(signature_lines(signature, &name(signature.staff_id)));
    }

    lines.push(Line::blank());
    lines.push(Line::heading("Approval"));
    lines.push(Line::body(format!(
        "Approved by: {}",
        or_dash(caf.approved_by.map(name))
    )));
    lines.push(Line::body(format!(
        "Approved at: {}",
        or_dash(caf.approved_at.map(|t| t.to_string()))
    )));
    lines
}

fn signature_lines(signature: &Signature, signer: &str) -> Vec<Line> {
    let fingerprint = signature.fingerprint();
    let mut lines = vec![Line::body(format!(
        "{} by {signer} at {} (sha256 {})",
        signature.signature_type.as_str(),
        signature.signed_at,
        &fingerprint[..16],
    ))];
    if let Some(notes) = &signature.notes {
        lines.extend(wrap(notes).into_iter().map(|l| Line::body(format!("    {l}"))));
    }
    lines
}

fn push_wrapped(lines: &mut Vec<Line>, label: &str, value: Option<&str>) {
    match value {
        Some(text) => {
            lines.push(Line::body(format!("{label}:")));
            lines.extend(wrap(text).into_iter().map(|l| Line::body(format!("    {l}"))));
        }
        None => lines.push(Line::body(format!("{label}: -"))),
    }
}

/// Greedy word wrap. Words longer than a line are split.
fn wrap(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > WRAP_COLUMNS {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let split = word
                    .char_indices()
                    .nth(WRAP_COLUMNS)
                    .map_or(word.len(), |(i, _)| i);
                let rest = word.split_off(split);
                out.push(word);
                word = rest;
            }
            if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > WRAP_COLUMNS
            {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        out.push(current);
    }
    out
}

fn paginate(lines: Vec<Line>) -> Vec<Vec<Line>> {
    let per_page = usize::try_from((PAGE_HEIGHT - 2 * MARGIN) / LEADING).unwrap_or(1);
    let mut pages: Vec<Vec<Line>> = lines.chunks(per_page).map(<[Line]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

// ── Encoding ──

fn write_document(pages: &[Vec<Line>]) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in pages {
        let content = page_content(lines);
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).map_err(|e| PdfError::Encode(e.to_string()))?;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(bytes)
}

fn page_content(lines: &[Line]) -> Content {
    let mut operations = vec![Operation::new("BT", vec![])];
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        let font = match line.font {
            Font::Regular => "F1",
            Font::Bold => "F2",
        };
        operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
        operations.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(MARGIN),
                Object::Integer(y),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(latin_text(&line.text))],
        ));
        y -= LEADING;
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Latin-1 bytes for the WinAnsi fonts; anything else prints as `?`.
///
/// WinAnsi reassigns 0x80..=0x9F, so those code points are replaced too.
fn latin_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(b) if !(0x80..=0x9f).contains(&b) => b,
            _ => b'?',
        })
        .collect()
}
