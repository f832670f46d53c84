//! Client-side flows for the PDF tools front end
//!
//! Selection, validation, simulated progress and result handling for the
//! merge, split, images-to-PDF and image-compression flows. The actual PDF
//! work happens on a remote server.
//!
//! Everything here is toolkit-independent:
//! - [`FlowController`] is a state machine fed with [`Event`]s that answers
//!   with [`Effect`]s for a driver to carry out
//! - [`LopdfPageCounter`] counts pages locally for the split flow

pub mod config;
pub mod controller;
pub mod error;
pub mod file;
pub mod flow;
pub mod image;
pub mod input;
pub mod page_count;
pub mod progress;
pub mod request;
pub mod selection;
pub mod split;
pub mod status;

pub use config::{ClientConfig, DelayConfig, ProgressConfig, TimeoutConfig, MB};
pub use controller::{
    Clock, Effect, Event, FlowController, FlowView, SystemClock, TimerId, TimerKind,
    TransferState,
};
pub use error::{PageCountError, SelectionError, TransferError};
pub use file::{format_file_size, sniff_mime_type, CandidateFile, FileRow, PDF_MIME};
pub use flow::{FlowKind, FlowText, InputShape};
pub use input::{ClickTarget, DropZone, ZoneAction, ZoneEvent, DRAG_ACTIVE_CLASS};
pub use page_count::{LopdfPageCounter, PageCount, PageCounter};
pub use progress::ProgressBar;
pub use request::{FormPart, TransferOutcome, TransferRequest};
pub use split::SplitMode;
pub use status::{ActionButton, StatusBanner, StatusKind};
