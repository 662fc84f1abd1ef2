use super::pdf::{LopdfTextReader, PdfExtractReader};
use super::types::{DocumentKind, PdfTextReader};

/// Raw Decoder: best-effort native text from document bytes.
///
/// Never fails. PDF readers are tried in order; a reader that errors or
/// yields only whitespace hands over to the next one.
pub struct RawDecoder {
    pdf_readers: Vec<Box<dyn PdfTextReader + Send + Sync>>,
}

impl Default for RawDecoder {
    fn default() -> Self {
        Self::with_default_readers()
    }
}

impl RawDecoder {
    pub fn new(pdf_readers: Vec<Box<dyn PdfTextReader + Send + Sync>>) -> Self {
        Self { pdf_readers }
    }

    /// pdf-extract first, lopdf second.
    pub fn with_default_readers() -> Self {
        Self::new(vec![Box::new(PdfExtractReader), Box::new(LopdfTextReader)])
    }

    pub fn decode(&self, bytes: &[u8], kind: DocumentKind) -> String {
        match kind {
            DocumentKind::Pdf => self.decode_pdf(bytes),
            DocumentKind::PlainText | DocumentKind::Other => decode_text(bytes),
        }
    }

    /// Text layer of every page, joined by newlines. Empty when no reader
    /// produces non-whitespace text.
    pub fn decode_pdf(&self, bytes: &[u8]) -> String {
        for reader in &self.pdf_readers {
            match reader.read_pages(bytes) {
                Ok(pages) => {
                    let text = pages.join("\n");
                    if !text.trim().is_empty() {
                        tracing::debug!(
                            reader = reader.name(),
                            pages = pages.len(),
                            text_length = text.len(),
                            "PDF text layer decoded"
                        );
                        return text;
                    }
                    tracing::debug!(reader = reader.name(), "PDF reader found no text layer");
                }
                Err(e) => {
                    tracing::warn!(reader = reader.name(), error = %e, "PDF reader failed");
                }
            }
        }
        String::new()
    }
}

/// UTF-8 when valid, otherwise Latin-1 (every byte maps to one code point).
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
