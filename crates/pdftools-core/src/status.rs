//! Status banner and action control presentation

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Success,
    Error,
}

/// Inline message shown under a flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBanner {
    pub visible: bool,
    pub kind: Option<StatusKind>,
    pub message: String,
}

impl StatusBanner {
    pub fn show(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.visible = true;
        self.kind = Some(kind);
        self.message = message.into();
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_error(&self) -> bool {
        self.visible && self.kind == Some(StatusKind::Error)
    }

    pub fn is_success(&self) -> bool {
        self.visible && self.kind == Some(StatusKind::Success)
    }
}

/// The flow's main button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub enabled: bool,
    pub busy: bool,
    pub label: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_then_hide_keeps_last_message() {
        let mut banner = StatusBanner::default();
        assert!(!banner.is_error());

        banner.show(StatusKind::Error, "nope");
        assert!(banner.is_error());
        assert_eq!(banner.message, "nope");

        banner.hide();
        assert!(!banner.is_error());
        assert_eq!(banner.message, "nope");
    }
}
