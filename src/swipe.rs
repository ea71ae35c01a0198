//! Swipe-to-reveal row actions.
//!
//! A row slides left to expose a delete button and right to expose a
//! save/unsave button. [`SwipeRow`] holds one row's gesture state and is
//! driven by [`SwipeEvent`]s; it knows nothing about the row's data.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Horizontal travel needed on release to keep a button revealed
    pub threshold: f64,
    /// Width of a revealed action button, and the furthest a row slides
    pub button_width: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            button_width: 70.0,
        }
    }
}

/// Which actions a row offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwipePermissions {
    pub delete: bool,
    pub save: bool,
}

impl SwipePermissions {
    pub fn all() -> Self {
        Self {
            delete: true,
            save: true,
        }
    }

    pub fn delete_only() -> Self {
        Self {
            delete: true,
            save: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwipeAction {
    /// Revealed by swiping left
    Delete,
    /// Revealed by swiping right; toggles saved/unsaved
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SwipeState {
    Idle,
    Dragging { offset: f64 },
    Revealed(SwipeAction),
}

impl SwipeState {
    pub fn offset(&self, config: &SwipeConfig) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Dragging { offset } => *offset,
            Self::Revealed(SwipeAction::Delete) => -config.button_width,
            Self::Revealed(SwipeAction::Save) => config.button_width,
        }
    }
}

/// Cumulative drag translation since the gesture began.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_horizontal(&self) -> bool {
        self.x.abs() > self.y.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SwipeEvent {
    DragChanged(Translation),
    DragEnded(Translation),
    /// The revealed button was tapped
    ButtonTapped,
    /// Close without acting, e.g. another row opened
    Dismiss,
}

/// Offset while dragging from `rest_offset` by `translation`.
///
/// A gesture that is not more horizontal than vertical leaves the offset
/// where it was. Otherwise the offset is clamped to one button width on
/// each permitted side and to 0 on a side whose action is not permitted.
pub fn update_swipe_offset(
    rest_offset: f64,
    translation: Translation,
    permissions: SwipePermissions,
    config: &SwipeConfig,
) -> f64 {
    if !translation.is_horizontal() {
        return rest_offset;
    }
    let lo = if permissions.delete {
        -config.button_width
    } else {
        0.0
    };
    let hi = if permissions.save {
        config.button_width
    } else {
        0.0
    };
    (rest_offset + translation.x).clamp(lo, hi)
}

/// Where a row comes to rest when a horizontal drag ends.
pub fn settle_offset(
    translation_x: f64,
    permissions: SwipePermissions,
    config: &SwipeConfig,
) -> SwipeState {
    if translation_x < -config.threshold && permissions.delete {
        SwipeState::Revealed(SwipeAction::Delete)
    } else if translation_x > config.threshold && permissions.save {
        SwipeState::Revealed(SwipeAction::Save)
    } else {
        SwipeState::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Gesture state for one list row.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeRow {
    state: SwipeState,
    permissions: SwipePermissions,
    config: SwipeConfig,
    /// Offset the current gesture started from
    rest_offset: f64,
    /// Locked on the first non-zero movement of a gesture
    axis: Option<Axis>,
}

impl SwipeRow {
    pub fn new(permissions: SwipePermissions, config: SwipeConfig) -> Self {
        Self {
            state: SwipeState::Idle,
            permissions,
            config,
            rest_offset: 0.0,
            axis: None,
        }
    }

    pub fn state(&self) -> SwipeState {
        self.state
    }

    pub fn offset(&self) -> f64 {
        self.state.offset(&self.config)
    }

    pub fn permissions(&self) -> SwipePermissions {
        self.permissions
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, SwipeState::Revealed(_))
    }

    /// Apply `event`. Returns the action to perform when a revealed button
    /// is tapped.
    ///
    /// Release is decided by the gesture's own translation, not by where the
    /// row sits. A row showing Save at +70 that is dragged by -60 rests at
    /// +10 while dragging, then settles to the revealed Delete button.
    pub fn update(&mut self, event: SwipeEvent) -> Option<SwipeAction> {
        match event {
            SwipeEvent::DragChanged(t) => {
                if self.lock_axis(t) == Some(Axis::Horizontal) {
                    let offset =
                        update_swipe_offset(self.rest_offset, t, self.permissions, &self.config);
                    self.state = SwipeState::Dragging { offset };
                }
                None
            }
            SwipeEvent::DragEnded(t) => {
                if self.lock_axis(t) == Some(Axis::Horizontal) {
                    self.state = settle_offset(t.x, self.permissions, &self.config);
                }
                self.rest_offset = self.offset();
                self.axis = None;
                None
            }
            SwipeEvent::ButtonTapped => match self.state {
                SwipeState::Revealed(action) => {
                    debug!(?action, "swipe action committed");
                    self.reset();
                    Some(action)
                }
                _ => None,
            },
            SwipeEvent::Dismiss => {
                self.reset();
                None
            }
        }
    }

    fn lock_axis(&mut self, t: Translation) -> Option<Axis> {
        if self.axis.is_none() && (t.x != 0.0 || t.y != 0.0) {
            self.axis = Some(if t.is_horizontal() {
                Axis::Horizontal
            } else {
                Axis::Vertical
            });
        }
        self.axis
    }

    fn reset(&mut self) {
        self.state = SwipeState::Idle;
        self.rest_offset = 0.0;
        self.axis = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(row: &mut SwipeRow, x: f64, y: f64) {
        row.update(SwipeEvent::DragChanged(Translation::new(x, y)));
        row.update(SwipeEvent::DragEnded(Translation::new(x, y)));
    }

    fn delete_row() -> SwipeRow {
        SwipeRow::new(SwipePermissions::delete_only(), SwipeConfig::default())
    }

    #[test]
    fn past_threshold_reveals_delete() {
        let mut row = delete_row();
        drag(&mut row, -60.0, 0.0);
        assert_eq!(row.state(), SwipeState::Revealed(SwipeAction::Delete));
        assert_eq!(row.offset(), -70.0);
    }

    #[test]
    fn short_drag_springs_back() {
        let mut row = delete_row();
        row.update(SwipeEvent::DragChanged(Translation::new(-30.0, 0.0)));
        assert_eq!(row.offset(), -30.0);
        row.update(SwipeEvent::DragEnded(Translation::new(-30.0, 0.0)));
        assert_eq!(row.state(), SwipeState::Idle);
        assert_eq!(row.offset(), 0.0);
    }

    #[test]
    fn vertical_drag_never_moves_row() {
        let mut row = delete_row();
        row.update(SwipeEvent::DragChanged(Translation::new(10.0, 80.0)));
        assert_eq!(row.offset(), 0.0);
        // Turning horizontal mid-gesture does not take over a scroll.
        row.update(SwipeEvent::DragChanged(Translation::new(-90.0, 80.0)));
        assert_eq!(row.offset(), 0.0);
        row.update(SwipeEvent::DragEnded(Translation::new(-90.0, 80.0)));
        assert_eq!(row.state(), SwipeState::Idle);
    }

    #[test]
    fn offset_is_clamped_to_button_width() {
        let mut row = SwipeRow::new(SwipePermissions::all(), SwipeConfig::default());
        row.update(SwipeEvent::DragChanged(Translation::new(-200.0, 5.0)));
        assert_eq!(row.offset(), -70.0);
        row.update(SwipeEvent::DragChanged(Translation::new(150.0, 5.0)));
        assert_eq!(row.offset(), 70.0);
    }

    #[test]
    fn disallowed_side_clamps_to_zero() {
        let mut row = delete_row();
        row.update(SwipeEvent::DragChanged(Translation::new(60.0, 0.0)));
        assert_eq!(row.offset(), 0.0);
        row.update(SwipeEvent::DragEnded(Translation::new(60.0, 0.0)));
        assert_eq!(row.state(), SwipeState::Idle);
    }

    #[test]
    fn right_swipe_reveals_save() {
        let mut row = SwipeRow::new(SwipePermissions::all(), SwipeConfig::default());
        drag(&mut row, 55.0, -3.0);
        assert_eq!(row.state(), SwipeState::Revealed(SwipeAction::Save));
        assert_eq!(row.offset(), 70.0);
    }

    #[test]
    fn tapping_revealed_button_commits_and_resets() {
        let mut row = delete_row();
        assert_eq!(row.update(SwipeEvent::ButtonTapped), None);

        drag(&mut row, -80.0, 0.0);
        assert_eq!(row.update(SwipeEvent::ButtonTapped), Some(SwipeAction::Delete));
        assert_eq!(row.state(), SwipeState::Idle);
        assert_eq!(row.offset(), 0.0);
    }

    #[test]
    fn drag_continues_from_revealed_offset() {
        let mut row = delete_row();
        drag(&mut row, -60.0, 0.0);
        row.update(SwipeEvent::DragChanged(Translation::new(20.0, 0.0)));
        assert_eq!(row.offset(), -50.0);
        row.update(SwipeEvent::DragEnded(Translation::new(20.0, 0.0)));
        assert_eq!(row.state(), SwipeState::Idle);
    }

    #[test]
    fn release_follows_translation_not_position() {
        let mut row = SwipeRow::new(SwipePermissions::all(), SwipeConfig::default());
        drag(&mut row, 60.0, 0.0);
        assert_eq!(row.offset(), 70.0);

        row.update(SwipeEvent::DragChanged(Translation::new(-60.0, 0.0)));
        assert_eq!(row.offset(), 10.0);
        row.update(SwipeEvent::DragEnded(Translation::new(-60.0, 0.0)));
        assert_eq!(row.state(), SwipeState::Revealed(SwipeAction::Delete));
        assert_eq!(row.offset(), -70.0);
    }

    #[test]
    fn dismiss_closes_row() {
        let mut row = delete_row();
        drag(&mut row, -60.0, 0.0);
        row.update(SwipeEvent::Dismiss);
        assert_eq!(row.state(), SwipeState::Idle);
    }

    #[test]
    fn pure_reducer_matches_row() {
        let config = SwipeConfig::default();
        let perms = SwipePermissions::delete_only();
        assert_eq!(
            update_swipe_offset(0.0, Translation::new(-60.0, 0.0), perms, &config),
            -60.0
        );
        assert_eq!(
            update_swipe_offset(0.0, Translation::new(10.0, 80.0), perms, &config),
            0.0
        );
        assert_eq!(
            settle_offset(-60.0, perms, &config).offset(&config),
            -70.0
        );
        assert_eq!(settle_offset(-30.0, perms, &config), SwipeState::Idle);
    }
}
