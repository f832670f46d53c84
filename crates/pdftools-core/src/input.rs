//! Drop zone and picker normalisation
//!
//! Drivers translate their native events into [`ZoneEvent`]s; the zone turns
//! them into either a plain, ordered batch of candidate files or a request to
//! open the native picker.

/// Class names of the decorative children inside a drop zone. Clicks on
/// these count as clicks on the zone itself.
pub const DECORATIVE_CLASSES: [&str; 3] = ["upload-icon", "upload-text", "upload-subtext"];

/// CSS class applied while something is dragged over the zone
pub const DRAG_ACTIVE_CLASS: &str = "dragover";

/// What a click landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The zone element itself
    Zone,
    /// Icon or text inside the zone
    Decoration,
    /// A button, link or input inside the zone
    Interactive,
}

impl ClickTarget {
    /// Classify a click given whether it hit the zone and the target's classes
    pub fn classify<'a>(is_zone: bool, classes: impl IntoIterator<Item = &'a str>) -> Self {
        if is_zone {
            return ClickTarget::Zone;
        }
        if classes
            .into_iter()
            .any(|class| DECORATIVE_CLASSES.contains(&class))
        {
            ClickTarget::Decoration
        } else {
            ClickTarget::Interactive
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneEvent<F> {
    DragEnter,
    DragOver,
    DragLeave,
    Drop(Vec<F>),
    PickerChanged(Vec<F>),
    Click(ClickTarget),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZoneAction<F> {
    /// Hand these files to the flow, in order
    Forward(Vec<F>),
    OpenPicker,
}

/// Visual state of one drop zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropZone {
    drag_active: bool,
}

impl DropZone {
    pub fn handle<F>(&mut self, event: ZoneEvent<F>) -> Option<ZoneAction<F>> {
        match event {
            ZoneEvent::DragEnter | ZoneEvent::DragOver => {
                self.drag_active = true;
                None
            }
            ZoneEvent::DragLeave => {
                self.drag_active = false;
                None
            }
            ZoneEvent::Drop(files) => {
                self.drag_active = false;
                Self::forward(files)
            }
            ZoneEvent::PickerChanged(files) => Self::forward(files),
            ZoneEvent::Click(ClickTarget::Zone | ClickTarget::Decoration) => {
                Some(ZoneAction::OpenPicker)
            }
            ZoneEvent::Click(ClickTarget::Interactive) => None,
        }
    }

    fn forward<F>(files: Vec<F>) -> Option<ZoneAction<F>> {
        if files.is_empty() {
            None
        } else {
            Some(ZoneAction::Forward(files))
        }
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_highlight_toggles_and_clears_on_drop() {
        let mut zone = DropZone::default();
        assert!(zone.handle::<u8>(ZoneEvent::DragEnter).is_none());
        assert!(zone.drag_active());

        zone.handle::<u8>(ZoneEvent::DragLeave);
        assert!(!zone.drag_active());

        zone.handle::<u8>(ZoneEvent::DragOver);
        let action = zone.handle(ZoneEvent::Drop(vec![1u8, 2, 3]));
        assert!(!zone.drag_active());
        assert_eq!(action, Some(ZoneAction::Forward(vec![1, 2, 3])));
    }

    #[test]
    fn test_picker_files_are_forwarded_in_order() {
        let mut zone = DropZone::default();
        let action = zone.handle(ZoneEvent::PickerChanged(vec!["b", "a"]));
        assert_eq!(action, Some(ZoneAction::Forward(vec!["b", "a"])));
        assert!(zone.handle::<&str>(ZoneEvent::PickerChanged(vec![])).is_none());
    }

    #[test]
    fn test_only_zone_and_decoration_clicks_open_picker() {
        let mut zone = DropZone::default();
        assert_eq!(
            zone.handle::<u8>(ZoneEvent::Click(ClickTarget::Zone)),
            Some(ZoneAction::OpenPicker)
        );
        assert_eq!(
            zone.handle::<u8>(ZoneEvent::Click(ClickTarget::Decoration)),
            Some(ZoneAction::OpenPicker)
        );
        assert_eq!(zone.handle::<u8>(ZoneEvent::Click(ClickTarget::Interactive)), None);
    }

    #[test]
    fn test_classify_click_target() {
        assert_eq!(ClickTarget::classify(true, std::iter::empty()), ClickTarget::Zone);
        assert_eq!(
            ClickTarget::classify(false, ["big", "upload-text"]),
            ClickTarget::Decoration
        );
        assert_eq!(
            ClickTarget::classify(false, ["remove-btn"]),
            ClickTarget::Interactive
        );
    }
}
