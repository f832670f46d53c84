//! Page-count lookup for the split target
//!
//! The lookup is best-effort: callers turn any error into
//! [`PageCount::Unknown`] instead of surfacing it.

use serde::Serialize;

use crate::error::PageCountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "pages", rename_all = "lowercase")]
pub enum PageCount {
    /// Lookup still outstanding
    Pending,
    Known(u32),
    Unknown,
}

impl PageCount {
    pub fn from_result(result: Result<u32, PageCountError>) -> Self {
        match result {
            Ok(pages) => PageCount::Known(pages),
            Err(e) => {
                tracing::debug!("Page count unavailable: {}", e);
                PageCount::Unknown
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            PageCount::Pending => "...".to_string(),
            PageCount::Known(pages) => pages.to_string(),
            PageCount::Unknown => "Unknown".to_string(),
        }
    }
}

/// Anything that can count the pages of a PDF held in memory
pub trait PageCounter {
    fn page_count(&self, bytes: &[u8]) -> Result<u32, PageCountError>;
}

/// Counts pages by parsing the document with lopdf
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfPageCounter;

impl PageCounter for LopdfPageCounter {
    fn page_count(&self, bytes: &[u8]) -> Result<u32, PageCountError> {
        if !bytes.starts_with(b"%PDF-") {
            return Err(PageCountError::ParseError(
                "missing %PDF- header".to_string(),
            ));
        }

        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| PageCountError::ParseError(e.to_string()))?;
        Ok(doc.get_pages().len() as u32)
    }
}
