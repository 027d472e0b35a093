//! Text extraction for the supported upload formats.
//!
//! The loader supplies raw bytes and a [`Format`] derived from the file
//! extension; this module returns plain UTF-8 text. Extraction never panics
//! on malformed input: it returns an [`ExtractError`] and the loader skips
//! the file.

use std::io::Read;
use std::path::Path;

use article_analyzer_core::normalize::normalize_whitespace;
use thiserror::Error;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Elements whose text never reaches the reader.
const HTML_SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Html,
    Txt,
}

impl Format {
    /// Format for a file name, by case-insensitive extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Format::Pdf),
            "docx" => Some(Format::Docx),
            "html" | "htm" => Some(Format::Html),
            "txt" => Some(Format::Txt),
            _ => None,
        }
    }
}

/// Extracts plain text from `bytes` in the given format.
pub fn extract_text(bytes: &[u8], format: Format) -> Result<String, ExtractError> {
    match format {
        Format::Pdf => extract_pdf(bytes),
        Format::Docx => extract_docx(bytes),
        Format::Html => Ok(extract_html(bytes)),
        Format::Txt => Ok(decode_text(bytes)),
    }
}

/// Extracts a PDF page by page. Pages that fail or make the parser panic
/// are skipped; the rest are joined with newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut doc = guarded(|| pdf_extract::Document::load_mem(bytes))?;
    if doc.is_encrypted() {
        doc.decrypt("").map_err(|e| ExtractError::Pdf(e.to_string()))?;
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());
    for &page in &page_numbers {
        match guarded(|| pdf_page_text(&doc, page)) {
            Ok(text) => pages.push(text),
            Err(e) => tracing::warn!(page, "skipping unreadable PDF page: {}", e),
        }
    }
    if pages.is_empty() && !page_numbers.is_empty() {
        return Err(ExtractError::Pdf("no readable pages".to_string()));
    }
    Ok(pages.join("\n"))
}

fn pdf_page_text(doc: &pdf_extract::Document, page: u32) -> Result<String, pdf_extract::OutputError> {
    let mut text = String::new();
    {
        let mut output = pdf_extract::PlainTextOutput::new(&mut text);
        pdf_extract::output_doc_page(doc, &mut output, page)?;
    }
    Ok(text)
}

/// Runs a pdf-extract call, turning both errors and panics into
/// [`ExtractError::Pdf`]. pdf-extract panics on some malformed files.
fn guarded<T, E: std::fmt::Display>(f: impl FnOnce() -> Result<T, E>) -> Result<T, ExtractError> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(|e| ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked".to_string())),
    }
}

/// Best-effort decoding of plain text.
///
/// UTF-8 first (a leading byte-order mark is dropped). Without valid UTF-8,
/// a UTF-16 byte-order mark selects UTF-16; anything else is read as
/// Latin-1, which accepts every byte sequence.
pub fn decode_text(bytes: &[u8]) -> String {
    let utf8 = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(utf8) {
        return s.to_string();
    }

    if let Some(s) = decode_utf16_with_bom(bytes) {
        return s;
    }

    bytes.iter().map(|&b| b as char).collect()
}

fn decode_utf16_with_bom(bytes: &[u8]) -> Option<String> {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return None,
    };
    if body.len() % 2 != 0 {
        return None;
    }
    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// Visible text of an HTML page with whitespace collapsed.
fn extract_html(bytes: &[u8]) -> String {
    let html = decode_text(bytes);
    let document = scraper::Html::parse_document(&html);

    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let scraper::Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| match a.value() {
            scraper::Node::Element(el) => HTML_SKIPPED_ELEMENTS.contains(&el.name()),
            _ => false,
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    normalize_whitespace(&parts.join(" "))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }
    extract_paragraphs(&doc_xml)
}

/// Concatenate `<w:t>` runs, one line per `<w:p>` paragraph.
fn extract_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text => {
                current.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
