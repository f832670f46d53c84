//! Single-document target for the split flow

use serde::{Deserialize, Serialize};

use crate::file::CandidateFile;
use crate::page_count::PageCount;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Every page as its own PDF, returned as a ZIP archive
    #[default]
    All,
    /// Comma-separated page numbers, e.g. "1, 3, 5"
    Pages,
    /// Comma-separated ranges, e.g. "1-3, 7-9"
    Ranges,
}

impl SplitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitMode::All => "all",
            SplitMode::Pages => "pages",
            SplitMode::Ranges => "ranges",
        }
    }

    /// Extension of the file the server sends back
    pub fn download_extension(self) -> &'static str {
        match self {
            SplitMode::All => "zip",
            SplitMode::Pages | SplitMode::Ranges => "pdf",
        }
    }
}

impl std::str::FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SplitMode::All),
            "pages" => Ok(SplitMode::Pages),
            "ranges" => Ok(SplitMode::Ranges),
            other => Err(format!("Unknown split mode: {}", other)),
        }
    }
}

/// The file being split plus the user's split options
#[derive(Debug, Clone)]
pub struct SplitTarget<H> {
    file: Option<CandidateFile<H>>,
    page_count: PageCount,
    /// Bumped on every replacement so late page counts can be discarded
    generation: u64,
    pub mode: SplitMode,
    pub pages: String,
    pub ranges: String,
}

impl<H> Default for SplitTarget<H> {
    fn default() -> Self {
        Self {
            file: None,
            page_count: PageCount::Unknown,
            generation: 0,
            mode: SplitMode::All,
            pages: String::new(),
            ranges: String::new(),
        }
    }
}

/// Why the split request cannot be built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitInputError {
    NoFile,
    MissingPages,
    MissingRanges,
}

impl SplitInputError {
    pub fn message(self) -> &'static str {
        match self {
            SplitInputError::NoFile => crate::flow::FlowKind::Split.text().missing_input,
            SplitInputError::MissingPages => "Enter the page numbers to extract.",
            SplitInputError::MissingRanges => "Enter at least one page range.",
        }
    }
}

impl<H> SplitTarget<H> {
    /// Replace the current file. Returns the generation the page-count
    /// lookup must report back with.
    pub fn replace(&mut self, file: CandidateFile<H>) -> u64 {
        self.generation += 1;
        self.file = Some(file);
        self.page_count = PageCount::Pending;
        self.generation
    }

    /// Store a page count if it belongs to the current file
    pub fn resolve_page_count(&mut self, generation: u64, count: PageCount) -> bool {
        if generation != self.generation || self.file.is_none() {
            return false;
        }
        self.page_count = count;
        true
    }

    /// Drop the file and return every option to its default
    pub fn clear(&mut self) {
        self.generation += 1;
        self.file = None;
        self.page_count = PageCount::Unknown;
        self.mode = SplitMode::All;
        self.pages.clear();
        self.ranges.clear();
    }

    pub fn file(&self) -> Option<&CandidateFile<H>> {
        self.file.as_ref()
    }

    pub fn page_count(&self) -> PageCount {
        self.page_count
    }

    /// The text field the current mode sends, or `None` for `All`.
    /// Whitespace-only input counts as missing.
    pub fn selection_text(&self) -> Result<Option<&str>, SplitInputError> {
        if self.file.is_none() {
            return Err(SplitInputError::NoFile);
        }
        match self.mode {
            SplitMode::All => Ok(None),
            SplitMode::Pages if self.pages.trim().is_empty() => Err(SplitInputError::MissingPages),
            SplitMode::Pages => Ok(Some(self.pages.as_str())),
            SplitMode::Ranges if self.ranges.trim().is_empty() => {
                Err(SplitInputError::MissingRanges)
            }
            SplitMode::Ranges => Ok(Some(self.ranges.as_str())),
        }
    }
}
