use std::panic::{catch_unwind, AssertUnwindSafe};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::PdfTextReader;
use super::ExtractionError;

/// Run a reader, turning a panic inside the PDF library into a parse error.
/// Both readers can panic on malformed object streams.
fn guarded<T>(
    reader: &str,
    f: impl FnOnce() -> Result<T, ExtractionError>,
) -> Result<T, ExtractionError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => Err(ExtractionError::PdfParsing(format!("{reader} panicked"))),
    }
}

/// PDF text reader using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers.
pub struct PdfExtractReader;

impl PdfTextReader for PdfExtractReader {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn read_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        guarded(self.name(), || {
            pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
                .map_err(|e| ExtractionError::PdfParsing(e.to_string()))
        })
    }
}

/// Second, independent reader built directly on lopdf's content-stream walk.
pub struct LopdfTextReader;

impl PdfTextReader for LopdfTextReader {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn read_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        guarded(self.name(), || {
            let doc = lopdf::Document::load_mem(pdf_bytes)
                .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
            if doc.is_encrypted() {
                return Err(ExtractionError::PdfEncrypted);
            }

            let mut pages = Vec::new();
            for page_number in doc.get_pages().keys() {
                let text = doc
                    .extract_text(&[*page_number])
                    .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
                pages.push(text);
            }
            Ok(pages)
        })
    }
}

/// Scripted reader for tests. Counts calls so fallback order can be asserted.
#[cfg(test)]
pub struct MockPdfTextReader {
    name: &'static str,
    pages: Option<Vec<String>>,
    calls: AtomicUsize,
}

#[cfg(test)]
impl MockPdfTextReader {
    pub fn returning(name: &'static str, pages: &[&str]) -> Self {
        Self {
            name,
            pages: Some(pages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            pages: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl PdfTextReader for MockPdfTextReader {
    fn name(&self) -> &str {
        self.name
    }

    fn read_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .clone()
            .ok_or_else(|| ExtractionError::PdfParsing(format!("{} scripted failure", self.name)))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Build a one-page PDF with a Helvetica text layer, one `Tj` per line.
    pub fn make_test_pdf(lines: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut content = String::from("BT /F1 12 Tf 14 TL 72 720 Td ");
        for line in lines {
            content.push_str(&format!("({line}) Tj T* "));
        }
        content.push_str("ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        });

        if let Ok(Object::Dictionary(ref mut dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
