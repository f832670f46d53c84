//! Native event loop around a [`FlowController`]
//!
//! The runner owns the controller on the current task. Timers, HTTP calls
//! and page-count lookups run as spawned tasks that report back through an
//! mpsc queue, so the controller only ever sees one event at a time.

use anyhow::{Context, Result};
use pdftools_core::{
    ClientConfig, Effect, Event, FlowController, FlowKind, FlowView, LopdfPageCounter,
    StatusBanner, TimerId, TimerKind,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::local_file::{candidates_from_paths, resolve_page_count};

type LocalEvent = Event<PathBuf>;

/// What happened during a run, for the caller to print or assert on
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub downloads: Vec<PathBuf>,
    pub alerts: Vec<String>,
    pub requests: usize,
}

pub struct Runner {
    controller: FlowController<PathBuf>,
    backend: Arc<dyn Backend>,
    output_dir: PathBuf,
    tx: mpsc::UnboundedSender<LocalEvent>,
    rx: mpsc::UnboundedReceiver<LocalEvent>,
    timers: HashMap<TimerId, JoinHandle<()>>,
    pending_lookups: usize,
    report: RunReport,
}

impl Runner {
    pub fn new(
        flow: FlowKind,
        config: ClientConfig,
        backend: Arc<dyn Backend>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::with_controller(FlowController::new(flow, config), backend, output_dir)
    }

    pub fn with_controller(
        controller: FlowController<PathBuf>,
        backend: Arc<dyn Backend>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            controller,
            backend,
            output_dir: output_dir.into(),
            tx,
            rx,
            timers: HashMap::new(),
            pending_lookups: 0,
            report: RunReport::default(),
        }
    }

    pub fn view(&self) -> FlowView {
        self.controller.view()
    }

    pub fn status(&self) -> &StatusBanner {
        self.controller.status()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Offer local files to the flow, as if picked in a file dialog
    pub async fn choose(&mut self, paths: &[PathBuf]) -> Result<()> {
        let files = candidates_from_paths(paths).await?;
        self.dispatch(Event::FilesChosen(files)).await
    }

    /// Feed one event to the controller and carry out its effects
    pub async fn dispatch(&mut self, event: LocalEvent) -> Result<()> {
        match &event {
            Event::PageCountResolved { .. } => {
                self.pending_lookups = self.pending_lookups.saturating_sub(1);
            }
            Event::TimerFired(id) if id.kind != TimerKind::ProgressTick => {
                self.timers.remove(id);
            }
            _ => {}
        }

        let effects = self.controller.handle(event);
        for effect in effects {
            self.apply(effect).await?;
        }
        Ok(())
    }

    /// Process queued events until no transfer or page-count lookup is
    /// outstanding. Timers that are still armed keep running.
    pub async fn settle(&mut self) -> Result<()> {
        while self.controller.is_busy() || self.pending_lookups > 0 {
            self.next_event().await?;
        }
        Ok(())
    }

    /// Like [`settle`](Self::settle), then wait for every armed timer
    /// (reset, banner and progress hiding) to fire.
    pub async fn drain(&mut self) -> Result<()> {
        self.settle().await?;
        while !self.timers.is_empty() {
            self.next_event().await?;
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Result<()> {
        let event = self
            .rx
            .recv()
            .await
            .context("Event queue closed unexpectedly")?;
        self.dispatch(event).await
    }

    async fn apply(&mut self, effect: Effect<PathBuf>) -> Result<()> {
        match effect {
            Effect::Alert(message) => {
                warn!("{}", message);
                self.report.alerts.push(message);
            }
            Effect::ClearPicker | Effect::OpenPicker => {}
            Effect::ShowPreview(file) => {
                debug!(name = %file.name, "Preview available");
            }
            Effect::ResolvePageCount { generation, file } => {
                self.pending_lookups += 1;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let count = resolve_page_count(LopdfPageCounter, &file.handle).await;
                    let _ = tx.send(Event::PageCountResolved { generation, count });
                });
            }
            Effect::StartTimer { id, after, repeat } => self.start_timer(id, after, repeat),
            Effect::CancelTimer(id) => {
                if let Some(handle) = self.timers.remove(&id) {
                    handle.abort();
                }
            }
            Effect::Send {
                transfer,
                request,
                timeout,
            } => {
                self.report.requests += 1;
                let backend = Arc::clone(&self.backend);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let outcome = match timeout {
                        Some(limit) => tokio::time::timeout(limit, backend.send(request))
                            .await
                            .unwrap_or(pdftools_core::TransferOutcome::TimedOut),
                        None => backend.send(request).await,
                    };
                    let _ = tx.send(Event::TransferFinished { transfer, outcome });
                });
            }
            Effect::Download { filename, bytes } => {
                let path = self.save(&filename, &bytes).await?;
                info!(path = %path.display(), bytes = bytes.len(), "Saved result");
                self.report.downloads.push(path);
            }
        }
        Ok(())
    }

    fn start_timer(&mut self, id: TimerId, after: Duration, repeat: bool) {
        let tx = self.tx.clone();
        let handle = if repeat {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + after, after);
                loop {
                    interval.tick().await;
                    if tx.send(Event::TimerFired(id)).is_err() {
                        break;
                    }
                }
            })
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = tx.send(Event::TimerFired(id));
            })
        };

        if let Some(previous) = self.timers.insert(id, handle) {
            previous.abort();
        }
    }

    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Cannot create {}", self.output_dir.display()))?;
        let path = self.output_dir.join(safe_file_name(filename));
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Cannot write {}", path.display()))?;
        Ok(path)
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

/// Keep only the final path component of a download name
fn safe_file_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download.bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_safe_file_name_strips_directories() {
        assert_eq!(safe_file_name("merged_pdf_1.pdf"), "merged_pdf_1.pdf");
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name(".."), "download.bin");
    }

    proptest! {
        /// Property: whatever the server-derived name, the result stays
        /// inside the output directory
        #[test]
        fn saved_name_never_escapes(name in "[a-z./_]{0,24}") {
            let safe = safe_file_name(&name);
            prop_assert!(!safe.contains('/'));
            prop_assert!(safe != ".." && !safe.is_empty());
        }
    }
}
