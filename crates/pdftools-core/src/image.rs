//! Single-image target for preview and compression

use crate::file::CandidateFile;

pub const DEFAULT_QUALITY: u8 = 60;

#[derive(Debug, Clone)]
pub struct ImageTarget<H> {
    file: Option<CandidateFile<H>>,
    quality: u8,
}

impl<H> Default for ImageTarget<H> {
    fn default() -> Self {
        Self {
            file: None,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl<H> ImageTarget<H> {
    pub fn replace(&mut self, file: CandidateFile<H>) {
        self.file = Some(file);
    }

    pub fn clear(&mut self) {
        self.file = None;
        self.quality = DEFAULT_QUALITY;
    }

    pub fn file(&self) -> Option<&CandidateFile<H>> {
        self.file.as_ref()
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// JPEG quality, clamped to 1..=100
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = quality.clamp(1, 100);
    }

    /// Name the server gives the compressed result. Only the extension
    /// counts: `.png` stays PNG, everything else comes back as JPEG.
    pub fn download_name(&self) -> Option<String> {
        self.file.as_ref().map(|file| compressed_name(&file.name))
    }
}

fn compressed_name(original: &str) -> String {
    let safe = secure_filename(original);
    let (stem, ext) = match safe.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (safe.as_str(), ""),
    };
    let ext = if ext.eq_ignore_ascii_case("png") { "png" } else { "jpg" };
    format!("{}_compressed.{}", stem, ext)
}

/// Reduce a client file name to the form the server stores it under:
/// ASCII letters, digits, `_`, `.` and `-`, whitespace and path separators
/// folded to `_`, no leading or trailing `.`/`_`.
pub fn secure_filename(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
