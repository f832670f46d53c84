//! WASM bindings for the PDF tools front end
//!
//! Each flow on the page gets one `ToolSession`. All flow state lives in
//! Rust; the page's script only renders the view it is handed.
//!
//! ## Architecture
//!
//! - `pdftools-core` decides what happens (validation, progress, naming)
//! - this crate carries it out with browser APIs: `fetch` with `FormData`,
//!   `setTimeout`/`setInterval`, blob downloads and drop-zone listeners
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ToolSession } from './pkg/pdftools_wasm.js';
//!
//! await init();
//!
//! const merge = new ToolSession("merge");
//! merge.setRenderCallback((view) => renderMerge(view));
//! merge.attachDropZone(
//!     document.getElementById('merge-drop-zone'),
//!     document.getElementById('merge-file-input'),
//! );
//! document.getElementById('merge-btn').onclick = () => merge.execute();
//!
//! const split = new ToolSession("split");
//! split.setSplitMode("ranges");
//! split.setRanges("1-3, 7");
//! ```

mod download;
mod dropzone;
mod fetch;
pub mod session;
mod timers;

use wasm_bindgen::prelude::*;

pub use session::ToolSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Format bytes as human-readable string
#[wasm_bindgen]
pub fn format_bytes(bytes: f64) -> String {
    pdftools_core::format_file_size(bytes.max(0.0) as u64)
}

/// Names of all flows a session can be created for
#[wasm_bindgen]
pub fn flow_names() -> Vec<String> {
    pdftools_core::FlowKind::ALL
        .iter()
        .map(|flow| flow.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_get_version() {
        let version = get_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0.0), "0 Bytes");
        assert_eq!(format_bytes(1536.0), "1.5 KB");
        assert_eq!(format_bytes(1048576.0), "1 MB");
        assert_eq!(format_bytes(-5.0), "0 Bytes");
    }

    #[test]
    fn test_flow_names_parse_back() {
        let names = flow_names();
        assert_eq!(names.len(), 4);
        for name in names {
            assert!(name.parse::<pdftools_core::FlowKind>().is_ok());
        }
    }

    proptest! {
        #[test]
        fn format_bytes_always_has_unit(bytes in 0u64..(1u64 << 40)) {
            let label = format_bytes(bytes as f64);
            prop_assert!(
                label.ends_with("Bytes") || label.ends_with("KB")
                    || label.ends_with("MB") || label.ends_with("GB")
            );
        }
    }
}
