//! The four user-facing flows and their fixed wiring: endpoint, form field
//! names, accepted file types and user-visible wording.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    Merge,
    Split,
    ImagesToPdf,
    CompressImage,
}

/// How a flow holds its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Ordered list with a minimum needed to run
    List { min: usize },
    /// Single slot, replaced on every pick
    Single,
}

/// Wording shown by the action control and the status banner
#[derive(Debug, Clone, Copy)]
pub struct FlowText {
    pub idle_label: &'static str,
    pub disabled_label: &'static str,
    pub busy_label: &'static str,
    pub wrong_type: &'static str,
    pub missing_input: &'static str,
    pub success: &'static str,
    pub server_error_prefix: &'static str,
    pub server_error_fallback: &'static str,
    pub network_failure: &'static str,
    pub timeout: &'static str,
    /// Plural noun used in "Too many ..." alerts
    pub count_label: &'static str,
}

impl FlowKind {
    pub const ALL: [FlowKind; 4] = [
        FlowKind::Merge,
        FlowKind::Split,
        FlowKind::ImagesToPdf,
        FlowKind::CompressImage,
    ];

    pub fn endpoint(self) -> &'static str {
        match self {
            FlowKind::Merge => "/merge",
            FlowKind::Split => "/split",
            FlowKind::ImagesToPdf => "/images-to-pdf",
            FlowKind::CompressImage => "/image-compress/process",
        }
    }

    pub fn shape(self) -> InputShape {
        match self {
            FlowKind::Merge => InputShape::List { min: 2 },
            FlowKind::ImagesToPdf => InputShape::List { min: 1 },
            FlowKind::Split | FlowKind::CompressImage => InputShape::Single,
        }
    }

    /// Whether a MIME type is acceptable input for this flow
    pub fn accepts(self, mime_type: &str) -> bool {
        match self {
            FlowKind::Merge | FlowKind::Split => mime_type == crate::file::PDF_MIME,
            FlowKind::ImagesToPdf | FlowKind::CompressImage => mime_type.starts_with("image/"),
        }
    }

    /// `accept` attribute for the native picker
    pub fn picker_accept(self) -> &'static str {
        match self {
            FlowKind::Merge | FlowKind::Split => ".pdf,application/pdf",
            FlowKind::ImagesToPdf | FlowKind::CompressImage => "image/*",
        }
    }

    pub fn text(self) -> FlowText {
        match self {
            FlowKind::Merge => FlowText {
                idle_label: "Merge PDFs",
                disabled_label: "Need at least 2 PDFs",
                busy_label: "Merging...",
                wrong_type: "Only PDF files can be merged.",
                missing_input: "Select at least two PDFs to merge.",
                success: "Your PDFs have been merged.",
                server_error_prefix: "Merge failed",
                server_error_fallback: "Unknown error",
                network_failure: "Something went wrong while merging. Please try again.",
                timeout: "This took too long. Try smaller PDFs.",
                count_label: "PDFs",
            },
            FlowKind::Split => FlowText {
                idle_label: "Split PDF",
                disabled_label: "Split PDF",
                busy_label: "Splitting...",
                wrong_type: "Only PDF files can be split.",
                missing_input: "Upload a PDF first.",
                success: "Your PDF has been split.",
                server_error_prefix: "Error",
                server_error_fallback: "The server did not say what went wrong",
                network_failure: "Something went wrong while splitting. Please try again.",
                timeout: "Splitting took too long. Try a smaller PDF.",
                count_label: "PDFs",
            },
            FlowKind::ImagesToPdf => FlowText {
                idle_label: "Convert to PDF",
                disabled_label: "Need at least 1 image",
                busy_label: "Converting...",
                wrong_type: "Only image files can be converted.",
                missing_input: "Upload some images first.",
                success: "Your images have been converted to a PDF.",
                server_error_prefix: "Error",
                server_error_fallback: "The server did not say what went wrong",
                network_failure: "Something went wrong while converting. Please try again.",
                timeout: "Converting took too long. Try fewer or smaller images.",
                count_label: "images",
            },
            FlowKind::CompressImage => FlowText {
                idle_label: "Compress image",
                disabled_label: "Compress image",
                busy_label: "Compressing...",
                wrong_type: "Only image files can be compressed.",
                missing_input: "Choose an image first.",
                success: "Your image has been compressed.",
                server_error_prefix: "Error",
                server_error_fallback: "The server did not say what went wrong",
                network_failure: "Something went wrong while compressing. Please try again.",
                timeout: "Compressing took too long. Try a smaller image.",
                count_label: "images",
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Merge => "merge",
            FlowKind::Split => "split",
            FlowKind::ImagesToPdf => "images-to-pdf",
            FlowKind::CompressImage => "compress-image",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlowKind::ALL
            .into_iter()
            .find(|flow| flow.as_str() == s)
            .ok_or_else(|| format!("Unknown flow: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        assert_eq!(FlowKind::Merge.endpoint(), "/merge");
        assert_eq!(FlowKind::Split.endpoint(), "/split");
        assert_eq!(FlowKind::ImagesToPdf.endpoint(), "/images-to-pdf");
        assert_eq!(FlowKind::CompressImage.endpoint(), "/image-compress/process");
    }

    #[test]
    fn test_accepts() {
        assert!(FlowKind::Merge.accepts("application/pdf"));
        assert!(!FlowKind::Merge.accepts("image/png"));
        assert!(FlowKind::Split.accepts("application/pdf"));
        assert!(FlowKind::ImagesToPdf.accepts("image/png"));
        assert!(FlowKind::ImagesToPdf.accepts("image/webp"));
        assert!(!FlowKind::ImagesToPdf.accepts("application/pdf"));
        assert!(!FlowKind::CompressImage.accepts(""));
    }

    #[test]
    fn test_minimums() {
        assert_eq!(FlowKind::Merge.shape(), InputShape::List { min: 2 });
        assert_eq!(FlowKind::ImagesToPdf.shape(), InputShape::List { min: 1 });
        assert_eq!(FlowKind::Split.shape(), InputShape::Single);
    }

    #[test]
    fn test_round_trips_through_str() {
        for flow in FlowKind::ALL {
            assert_eq!(flow.as_str().parse::<FlowKind>().unwrap(), flow);
        }
        assert!("rotate".parse::<FlowKind>().is_err());
    }

    #[test]
    fn test_disabled_label_differs_for_list_flows() {
        for flow in [FlowKind::Merge, FlowKind::ImagesToPdf] {
            let text = flow.text();
            assert_ne!(text.idle_label, text.disabled_label);
            assert!(text.disabled_label.contains("at least"));
        }
    }
}
