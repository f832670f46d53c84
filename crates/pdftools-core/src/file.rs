//! Candidate files and file-type predicates

use serde::Serialize;

pub const PDF_MIME: &str = "application/pdf";

/// A file offered by the user, before or after it enters a selection.
///
/// `H` is whatever the driver needs to read the bytes later: a browser
/// `File`, a local path, or plain bytes in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFile<H> {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub handle: H,
}

impl<H> CandidateFile<H> {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>, handle: H) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            handle,
        }
    }

    /// Files are considered the same when name and size both match.
    /// Contents are never compared.
    pub fn same_identity<O>(&self, other: &CandidateFile<O>) -> bool {
        self.name == other.name && self.size == other.size
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Row shown in a file list
    pub fn row(&self) -> FileRow {
        FileRow {
            name: self.name.clone(),
            size: self.size,
            size_label: format_file_size(self.size),
        }
    }
}

/// Serialisable summary of a selected file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub name: String,
    pub size: u64,
    pub size_label: String,
}

/// Format bytes as human-readable string
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros dropped: 1.5 KB, 2 MB, 1.23 GB
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Sniff a MIME type from leading bytes, falling back to the file extension.
///
/// Local files carry no MIME type of their own, so the native driver uses
/// this to give them one.
pub fn sniff_mime_type(name: &str, head: &[u8]) -> &'static str {
    if head.starts_with(b"%PDF-") {
        return PDF_MIME;
    }
    if head.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }
    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }
    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return "image/gif";
    }
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp";
    }
    if head.starts_with(b"BM") {
        return "image/bmp";
    }

    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => PDF_MIME,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: u64, mime: &str) -> CandidateFile<()> {
        CandidateFile::new(name, size, mime, ())
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1 MB");
        assert_eq!(format_file_size(2621440), "2.5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_identity_ignores_type_and_handle() {
        let a = CandidateFile::new("a.pdf", 1000, PDF_MIME, 1u8);
        let b = CandidateFile::new("a.pdf", 1000, "application/octet-stream", 2u8);
        let c = CandidateFile::new("a.pdf", 1001, PDF_MIME, 1u8);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_type_predicates() {
        assert!(file("a.pdf", 1, "application/pdf").is_pdf());
        assert!(!file("a.pdf", 1, "application/x-pdf").is_pdf());
        assert!(file("a.jpg", 1, "image/jpeg").is_image());
        assert!(file("a.svg", 1, "image/svg+xml").is_image());
        assert!(!file("a.pdf", 1, "application/pdf").is_image());
    }

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type("x.bin", b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_mime_type("x", b"\x89PNG\r\n\x1a\n...."), "image/png");
        assert_eq!(sniff_mime_type("x", &[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime_type("x", b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
        assert_eq!(sniff_mime_type("scan.TIFF", b"II*\0"), "image/tiff");
        assert_eq!(sniff_mime_type("notes.txt", b"hello"), "application/octet-stream");
    }
}
