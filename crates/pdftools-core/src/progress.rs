//! Simulated upload progress
//!
//! The percentage is cosmetic. It climbs on a timer while the request is
//! outstanding and is never derived from bytes actually sent.

use serde::Serialize;

use crate::config::ProgressConfig;

/// What the progress bar shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressBar {
    pub visible: bool,
    pub percent: u8,
}

/// Ramp state for one transfer
#[derive(Debug, Clone)]
pub struct SimulatedProgress {
    step: u8,
    cap: u8,
    bar: ProgressBar,
    ramping: bool,
}

impl SimulatedProgress {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            step: config.step.max(1),
            cap: config.cap.min(100),
            bar: ProgressBar::default(),
            ramping: false,
        }
    }

    /// Show the bar at 0% and begin ramping
    pub fn start(&mut self) {
        self.bar = ProgressBar {
            visible: true,
            percent: 0,
        };
        self.ramping = true;
    }

    /// Advance one step. Returns `false` once the ramp has stopped, which
    /// tells the driver to cancel the repeating timer.
    pub fn tick(&mut self) -> bool {
        if !self.ramping {
            return false;
        }
        self.bar.percent = self.bar.percent.saturating_add(self.step).min(self.cap);
        if self.bar.percent >= self.cap {
            self.ramping = false;
        }
        self.ramping
    }

    /// Stop ramping and jump to 100%
    pub fn finish(&mut self) {
        self.ramping = false;
        self.bar.percent = 100;
    }

    pub fn hide(&mut self) {
        self.ramping = false;
        self.bar.visible = false;
    }

    pub fn is_ramping(&self) -> bool {
        self.ramping
    }

    pub fn bar(&self) -> ProgressBar {
        self.bar
    }
}
