//! Per-flow state machine
//!
//! A [`FlowController`] owns everything one flow needs: its selection (or
//! single target), transfer state, simulated progress and status banner. It
//! never performs I/O. Drivers feed it [`Event`]s and carry out the
//! [`Effect`]s it returns, reporting results back as further events.
//!
//! ```text
//!  Idle ──Execute──► InFlight ──TransferFinished──► Succeeded ──Reset timer──► Idle
//!   ▲        │                         │
//!   │   precondition                   └──────────► Failed ──HideProgress timer──┘
//!   └──── fails (status only)
//! ```
//!
//! Every timer carries the generation of the transfer (or banner) that
//! started it, so a timer that outlives its transfer is ignored.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{SelectionError, TransferError};
use crate::file::{CandidateFile, FileRow};
use crate::flow::{FlowKind, InputShape};
use crate::image::ImageTarget;
use crate::input::{DropZone, ZoneAction, ZoneEvent};
use crate::page_count::PageCount;
use crate::progress::{ProgressBar, SimulatedProgress};
use crate::request::{download_filename, TransferOutcome, TransferRequest};
use crate::selection::{check_sizes, SelectionList};
use crate::split::{SplitMode, SplitTarget};
use crate::status::{ActionButton, StatusBanner, StatusKind};

/// Source of the epoch-millisecond stamp in generated download names
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferState {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Repeating simulated-progress step
    ProgressTick,
    /// Hides the finished progress bar
    HideProgress,
    /// Hides a success banner
    HideStatus,
    /// Clears the flow after a successful download
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub kind: TimerKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event<H> {
    /// Files from any input source, already normalised
    FilesChosen(Vec<CandidateFile<H>>),
    /// Raw drop-zone interaction
    Zone(ZoneEvent<CandidateFile<H>>),
    RemoveFile(usize),
    SetSplitMode(SplitMode),
    SetPages(String),
    SetRanges(String),
    SetQuality(u8),
    PageCountResolved { generation: u64, count: PageCount },
    Execute,
    TransferFinished { transfer: u64, outcome: TransferOutcome },
    TimerFired(TimerId),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect<H> {
    /// Blocking, user-facing alert
    Alert(String),
    /// Clear the native picker so the same file can be picked again
    ClearPicker,
    OpenPicker,
    ShowPreview(CandidateFile<H>),
    ResolvePageCount {
        generation: u64,
        file: CandidateFile<H>,
    },
    StartTimer {
        id: TimerId,
        after: Duration,
        repeat: bool,
    },
    CancelTimer(TimerId),
    Send {
        transfer: u64,
        request: TransferRequest<H>,
        timeout: Option<Duration>,
    },
    Download {
        filename: String,
        bytes: Vec<u8>,
    },
}

/// How the result of the in-flight transfer will be named
#[derive(Debug, Clone)]
enum DownloadName {
    Stamped {
        prefix: &'static str,
        ext: &'static str,
    },
    Fixed(String),
}

#[derive(Debug, Clone)]
enum FlowInput<H> {
    List(SelectionList<H>),
    Split(SplitTarget<H>),
    Image(ImageTarget<H>),
}

pub struct FlowController<H> {
    flow: FlowKind,
    config: ClientConfig,
    clock: Box<dyn Clock>,
    input: FlowInput<H>,
    zone: DropZone,
    state: TransferState,
    transfer: u64,
    download: Option<DownloadName>,
    progress: SimulatedProgress,
    status: StatusBanner,
    status_generation: u64,
}

impl<H: Clone> FlowController<H> {
    pub fn new(flow: FlowKind, config: ClientConfig) -> Self {
        let max_size = config.max_file_size_bytes();
        let input = match flow {
            FlowKind::Merge => {
                FlowInput::List(SelectionList::new(flow, config.max_merge_files, max_size))
            }
            FlowKind::ImagesToPdf => {
                FlowInput::List(SelectionList::new(flow, config.max_images, max_size))
            }
            FlowKind::Split => FlowInput::Split(SplitTarget::default()),
            FlowKind::CompressImage => FlowInput::Image(ImageTarget::default()),
        };

        Self {
            flow,
            progress: SimulatedProgress::new(&config.progress),
            config,
            clock: Box::new(SystemClock),
            input,
            zone: DropZone::default(),
            state: TransferState::Idle,
            transfer: 0,
            download: None,
            status: StatusBanner::default(),
            status_generation: 0,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn flow(&self) -> FlowKind {
        self.flow
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == TransferState::InFlight
    }

    /// Apply one event and return what the driver must do next, in order
    pub fn handle(&mut self, event: Event<H>) -> Vec<Effect<H>> {
        let mut effects = Vec::new();
        match event {
            Event::FilesChosen(files) => self.choose_files(files, &mut effects),
            Event::Zone(zone_event) => match self.zone.handle(zone_event) {
                Some(ZoneAction::Forward(files)) => self.choose_files(files, &mut effects),
                Some(ZoneAction::OpenPicker) => effects.push(Effect::OpenPicker),
                None => {}
            },
            Event::RemoveFile(index) => {
                if let FlowInput::List(list) = &mut self.input {
                    if list.remove(index).is_none() {
                        debug!(flow = %self.flow, index, "Ignoring out-of-range removal");
                    }
                }
            }
            Event::SetSplitMode(mode) => {
                if let FlowInput::Split(target) = &mut self.input {
                    target.mode = mode;
                }
            }
            Event::SetPages(pages) => {
                if let FlowInput::Split(target) = &mut self.input {
                    target.pages = pages;
                }
            }
            Event::SetRanges(ranges) => {
                if let FlowInput::Split(target) = &mut self.input {
                    target.ranges = ranges;
                }
            }
            Event::SetQuality(quality) => {
                if let FlowInput::Image(target) = &mut self.input {
                    target.set_quality(quality);
                }
            }
            Event::PageCountResolved { generation, count } => {
                if let FlowInput::Split(target) = &mut self.input {
                    if !target.resolve_page_count(generation, count) {
                        debug!(generation, "Discarding page count for a replaced file");
                    }
                }
            }
            Event::Execute => self.execute(&mut effects),
            Event::TransferFinished { transfer, outcome } => {
                self.finish_transfer(transfer, outcome, &mut effects)
            }
            Event::TimerFired(id) => self.timer_fired(id, &mut effects),
            Event::Reset => {
                if self.is_busy() {
                    debug!(flow = %self.flow, "Ignoring reset while a transfer is running");
                } else {
                    self.reset(&mut effects);
                }
            }
        }
        effects
    }

    fn choose_files(&mut self, files: Vec<CandidateFile<H>>, effects: &mut Vec<Effect<H>>) {
        if let Err(e) = self.accept_files(files, effects) {
            debug!(flow = %self.flow, "Selection rejected: {}", e);
            if e.is_blocking() {
                effects.push(Effect::Alert(e.to_string()));
            } else {
                self.show_status(StatusKind::Error, e.to_string(), effects);
            }
        }
    }

    fn accept_files(
        &mut self,
        files: Vec<CandidateFile<H>>,
        effects: &mut Vec<Effect<H>>,
    ) -> Result<(), SelectionError> {
        let max_size = self.config.max_file_size_bytes();
        let text = self.flow.text();

        match &mut self.input {
            FlowInput::List(list) => {
                let outcome = list.add(files)?;
                debug!(
                    flow = %self.flow,
                    added = outcome.added,
                    skipped = outcome.skipped_duplicates,
                    total = list.len(),
                    "Files added"
                );
                effects.push(Effect::ClearPicker);
            }
            FlowInput::Split(target) => {
                // The picker is single-select; only the first file counts
                let Some(file) = files.into_iter().next() else {
                    return Ok(());
                };
                check_sizes(std::slice::from_ref(&file), max_size)?;
                if !file.is_pdf() {
                    return Err(SelectionError::WrongType(text.wrong_type));
                }
                let generation = target.replace(file.clone());
                effects.push(Effect::ResolvePageCount { generation, file });
            }
            FlowInput::Image(target) => {
                let Some(file) = files.into_iter().next() else {
                    return Ok(());
                };
                check_sizes(std::slice::from_ref(&file), max_size)?;
                if !file.is_image() {
                    return Err(SelectionError::WrongType(text.wrong_type));
                }
                target.replace(file.clone());
                effects.push(Effect::ShowPreview(file));
            }
        }
        Ok(())
    }

    /// Build the request for the current input, or the message explaining
    /// why it cannot be sent yet
    fn build_request(&self) -> Result<(TransferRequest<H>, DownloadName), &'static str> {
        let text = self.flow.text();
        let request = TransferRequest::new(self.flow);

        match &self.input {
            FlowInput::List(list) => {
                let min = match self.flow.shape() {
                    InputShape::List { min } => min,
                    InputShape::Single => 1,
                };
                if list.len() < min {
                    return Err(text.missing_input);
                }
                let (field, prefix) = match self.flow {
                    FlowKind::Merge => ("files[]", "merged_pdf"),
                    _ => ("images[]", "images_to_pdf"),
                };
                let request = list
                    .files()
                    .iter()
                    .cloned()
                    .fold(request, |request, file| request.file(field, file));
                Ok((request, DownloadName::Stamped { prefix, ext: "pdf" }))
            }
            FlowInput::Split(target) => {
                let selection = target.selection_text().map_err(|e| e.message())?;
                let file = target.file().cloned().ok_or(text.missing_input)?;
                let mut request = request.file("file", file).text("mode", target.mode.as_str());
                if let Some(value) = selection {
                    request = request.text(target.mode.as_str(), value);
                }
                Ok((
                    request,
                    DownloadName::Stamped {
                        prefix: "split_pdf",
                        ext: target.mode.download_extension(),
                    },
                ))
            }
            FlowInput::Image(target) => {
                let file = target.file().cloned().ok_or(text.missing_input)?;
                let name = target.download_name().ok_or(text.missing_input)?;
                let request = request
                    .file("image", file)
                    .text("quality", target.quality().to_string());
                Ok((request, DownloadName::Fixed(name)))
            }
        }
    }

    fn execute(&mut self, effects: &mut Vec<Effect<H>>) {
        if self.is_busy() {
            debug!(flow = %self.flow, "Transfer already in flight");
            return;
        }

        let (request, download) = match self.build_request() {
            Ok(built) => built,
            Err(message) => {
                self.show_status(StatusKind::Error, message, effects);
                return;
            }
        };

        self.transfer += 1;
        self.state = TransferState::InFlight;
        self.download = Some(download);
        self.progress.start();

        info!(
            flow = %self.flow,
            transfer = self.transfer,
            parts = request.parts.len(),
            "Starting transfer"
        );

        effects.push(Effect::StartTimer {
            id: self.timer(TimerKind::ProgressTick),
            after: self.config.progress.interval(),
            repeat: true,
        });
        effects.push(Effect::Send {
            transfer: self.transfer,
            request,
            timeout: self.config.request_timeout(self.flow),
        });
    }

    fn finish_transfer(
        &mut self,
        transfer: u64,
        outcome: TransferOutcome,
        effects: &mut Vec<Effect<H>>,
    ) {
        if transfer != self.transfer || !self.is_busy() {
            debug!(flow = %self.flow, transfer, "Ignoring result of a stale transfer");
            return;
        }

        // The ramp must be stopped before the bar is pinned at 100
        effects.push(Effect::CancelTimer(self.timer(TimerKind::ProgressTick)));
        self.progress.finish();

        let text = self.flow.text();
        match outcome.into_result() {
            Ok(bytes) => {
                let filename = match self.download.take() {
                    Some(DownloadName::Fixed(name)) => name,
                    Some(DownloadName::Stamped { prefix, ext }) => {
                        download_filename(prefix, self.clock.now_ms(), ext)
                    }
                    None => download_filename(self.flow.as_str(), self.clock.now_ms(), "bin"),
                };
                info!(flow = %self.flow, %filename, bytes = bytes.len(), "Transfer succeeded");

                self.state = TransferState::Succeeded;
                effects.push(Effect::Download { filename, bytes });
                self.show_status(StatusKind::Success, text.success, effects);
                effects.push(Effect::StartTimer {
                    id: self.timer(TimerKind::Reset),
                    after: Duration::from_millis(self.config.delays.reset_ms),
                    repeat: false,
                });
            }
            Err(error) => {
                warn!(flow = %self.flow, "Transfer failed: {}", error);
                self.state = TransferState::Failed;
                self.download = None;
                let message = match error {
                    TransferError::Server { message, .. } => {
                        let detail = if message.is_empty() {
                            text.server_error_fallback.to_string()
                        } else {
                            message
                        };
                        format!("{}: {}", text.server_error_prefix, detail)
                    }
                    TransferError::Timeout => text.timeout.to_string(),
                    TransferError::Network(_) => text.network_failure.to_string(),
                };
                self.show_status(StatusKind::Error, message, effects);
            }
        }

        effects.push(Effect::StartTimer {
            id: self.timer(TimerKind::HideProgress),
            after: Duration::from_millis(self.config.delays.hide_progress_ms),
            repeat: false,
        });
    }

    fn timer_fired(&mut self, id: TimerId, effects: &mut Vec<Effect<H>>) {
        match id.kind {
            TimerKind::ProgressTick => {
                let current = id.generation == self.transfer && self.is_busy();
                if !current || !self.progress.tick() {
                    effects.push(Effect::CancelTimer(id));
                }
            }
            TimerKind::HideProgress => {
                if id.generation == self.transfer && !self.is_busy() {
                    self.progress.hide();
                    if self.state == TransferState::Failed {
                        self.state = TransferState::Idle;
                    }
                }
            }
            TimerKind::HideStatus => {
                if id.generation == self.status_generation {
                    self.status.hide();
                }
            }
            TimerKind::Reset => {
                if id.generation == self.transfer && self.state == TransferState::Succeeded {
                    info!(flow = %self.flow, "Resetting after successful transfer");
                    self.reset(effects);
                }
            }
        }
    }

    fn reset(&mut self, effects: &mut Vec<Effect<H>>) {
        match &mut self.input {
            FlowInput::List(list) => list.clear(),
            FlowInput::Split(target) => target.clear(),
            FlowInput::Image(target) => target.clear(),
        }
        self.state = TransferState::Idle;
        self.download = None;
        self.status.hide();
        self.status_generation += 1;
        self.progress.hide();
        effects.push(Effect::ClearPicker);
    }

    fn show_status(
        &mut self,
        kind: StatusKind,
        message: impl Into<String>,
        effects: &mut Vec<Effect<H>>,
    ) {
        self.status_generation += 1;
        self.status.show(kind, message);
        if kind == StatusKind::Success {
            effects.push(Effect::StartTimer {
                id: TimerId {
                    kind: TimerKind::HideStatus,
                    generation: self.status_generation,
                },
                after: Duration::from_millis(self.config.delays.hide_success_ms),
                repeat: false,
            });
        }
    }

    fn timer(&self, kind: TimerKind) -> TimerId {
        TimerId {
            kind,
            generation: self.transfer,
        }
    }

    pub fn button(&self) -> ActionButton {
        let text = self.flow.text();
        if self.is_busy() {
            return ActionButton {
                enabled: false,
                busy: true,
                label: text.busy_label,
            };
        }
        let short = match (&self.input, self.flow.shape()) {
            (FlowInput::List(list), InputShape::List { min }) => list.len() < min,
            _ => false,
        };
        if short {
            ActionButton {
                enabled: false,
                busy: false,
                label: text.disabled_label,
            }
        } else {
            ActionButton {
                enabled: true,
                busy: false,
                label: text.idle_label,
            }
        }
    }

    pub fn status(&self) -> &StatusBanner {
        &self.status
    }

    pub fn progress(&self) -> ProgressBar {
        self.progress.bar()
    }

    /// Files currently selected (list flows) or the single target
    pub fn selected(&self) -> Vec<&CandidateFile<H>> {
        match &self.input {
            FlowInput::List(list) => list.files().iter().collect(),
            FlowInput::Split(target) => target.file().into_iter().collect(),
            FlowInput::Image(target) => target.file().into_iter().collect(),
        }
    }

    /// Snapshot for rendering
    pub fn view(&self) -> FlowView {
        let (files, max_files) = match &self.input {
            FlowInput::List(list) => (list.rows(), Some(list.max_files())),
            _ => (Vec::new(), None),
        };
        let split = match &self.input {
            FlowInput::Split(target) => Some(SplitView {
                file: target.file().map(CandidateFile::row),
                page_count: target.page_count(),
                page_count_label: target.page_count().label(),
                mode: target.mode,
                pages: target.pages.clone(),
                ranges: target.ranges.clone(),
            }),
            _ => None,
        };
        let image = match &self.input {
            FlowInput::Image(target) => Some(ImageView {
                file: target.file().map(CandidateFile::row),
                quality: target.quality(),
            }),
            _ => None,
        };

        FlowView {
            flow: self.flow,
            state: self.state,
            files,
            max_files,
            button: self.button(),
            status: self.status.clone(),
            progress: self.progress.bar(),
            split,
            image,
            drag_active: self.zone.drag_active(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowView {
    pub flow: FlowKind,
    pub state: TransferState,
    pub files: Vec<FileRow>,
    pub max_files: Option<usize>,
    pub button: ActionButton,
    pub status: StatusBanner,
    pub progress: ProgressBar,
    pub split: Option<SplitView>,
    pub image: Option<ImageView>,
    pub drag_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitView {
    pub file: Option<FileRow>,
    pub page_count: PageCount,
    pub page_count_label: String,
    pub mode: SplitMode,
    pub pages: String,
    pub ranges: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageView {
    pub file: Option<FileRow>,
    pub quality: u8,
}
