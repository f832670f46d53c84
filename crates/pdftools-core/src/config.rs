//! Client limits and timing
//!
//! Every field has a default matching the hosted service's limits, so an
//! empty TOML table (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::flow::FlowKind;

/// Bytes in one megabyte, as used for the per-file ceiling
pub const MB: u64 = 1024 * 1024;

/// Limits and timing for all flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-file ceiling in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    /// Maximum number of PDFs in one merge
    #[serde(default = "default_max_merge_files")]
    pub max_merge_files: usize,
    /// Maximum number of images in one images-to-pdf conversion
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// Simulated progress behaviour
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Delays used by the presenter and the post-success reset
    #[serde(default)]
    pub delays: DelayConfig,
    /// Client-side request timeouts per flow
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_max_file_size_mb() -> u64 {
    25
}

fn default_max_merge_files() -> usize {
    10
}

fn default_max_images() -> usize {
    15
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_merge_files: default_max_merge_files(),
            max_images: default_max_images(),
            progress: ProgressConfig::default(),
            delays: DelayConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * MB
    }

    /// Client-side timeout for the given flow, if it has one
    pub fn request_timeout(&self, flow: FlowKind) -> Option<Duration> {
        let ms = match flow {
            FlowKind::Merge => self.timeouts.merge_ms,
            FlowKind::Split => self.timeouts.split_ms,
            FlowKind::ImagesToPdf => self.timeouts.images_to_pdf_ms,
            FlowKind::CompressImage => self.timeouts.compress_image_ms,
        };
        ms.map(Duration::from_millis)
    }
}

/// Fake progress ramp: `step` percent every `interval_ms`, stopping at `cap`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_step")]
    pub step: u8,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_cap")]
    pub cap: u8,
}

fn default_step() -> u8 {
    10
}

fn default_interval_ms() -> u64 {
    200
}

fn default_cap() -> u8 {
    90
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            step: default_step(),
            interval_ms: default_interval_ms(),
            cap: default_cap(),
        }
    }
}

impl ProgressConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Time between a successful download and the full flow reset
    #[serde(default = "default_reset_ms")]
    pub reset_ms: u64,
    /// Time the finished progress bar stays visible
    #[serde(default = "default_hide_progress_ms")]
    pub hide_progress_ms: u64,
    /// Time a success banner stays visible
    #[serde(default = "default_hide_success_ms")]
    pub hide_success_ms: u64,
}

fn default_reset_ms() -> u64 {
    3_000
}

fn default_hide_progress_ms() -> u64 {
    1_000
}

fn default_hide_success_ms() -> u64 {
    5_000
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            reset_ms: default_reset_ms(),
            hide_progress_ms: default_hide_progress_ms(),
            hide_success_ms: default_hide_success_ms(),
        }
    }
}

/// Only merge aborts by default. Whether the other flows should as well is
/// still undecided, so they stay unbounded unless configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_merge_timeout_ms")]
    pub merge_ms: Option<u64>,
    #[serde(default)]
    pub split_ms: Option<u64>,
    #[serde(default)]
    pub images_to_pdf_ms: Option<u64>,
    #[serde(default)]
    pub compress_image_ms: Option<u64>,
}

fn default_merge_timeout_ms() -> Option<u64> {
    Some(110_000)
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            merge_ms: default_merge_timeout_ms(),
            split_ms: None,
            images_to_pdf_ms: None,
            compress_image_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_limits() {
        let config = ClientConfig::default();
        assert_eq!(config.max_file_size_bytes(), 25 * 1024 * 1024);
        assert_eq!(config.max_merge_files, 10);
        assert_eq!(config.max_images, 15);
        assert_eq!(config.progress.step, 10);
        assert_eq!(config.progress.interval(), Duration::from_millis(200));
        assert_eq!(config.progress.cap, 90);
    }

    #[test]
    fn test_only_merge_times_out_by_default() {
        let config = ClientConfig::default();
        assert_eq!(
            config.request_timeout(FlowKind::Merge),
            Some(Duration::from_secs(110))
        );
        assert_eq!(config.request_timeout(FlowKind::Split), None);
        assert_eq!(config.request_timeout(FlowKind::ImagesToPdf), None);
        assert_eq!(config.request_timeout(FlowKind::CompressImage), None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"max_images": 5, "timeouts": {"split_ms": 30000}}"#;
        let config: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_images, 5);
        assert_eq!(config.max_merge_files, 10);
        assert_eq!(
            config.request_timeout(FlowKind::Split),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            config.request_timeout(FlowKind::Merge),
            Some(Duration::from_secs(110))
        );
    }
}
