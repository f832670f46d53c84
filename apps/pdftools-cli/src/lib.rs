//! Native driver for the PDF tools flows
//!
//! Runs the same flow state machines the browser uses, but against local
//! files: results are written to an output directory instead of being
//! offered as browser downloads.

pub mod backend;
pub mod config;
pub mod local_file;
pub mod runner;

pub use backend::{Backend, BackendError, HttpBackend};
pub use config::Settings;
pub use runner::{RunReport, Runner};
