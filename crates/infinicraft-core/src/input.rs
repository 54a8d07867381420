//! Pointer event types for unified mouse/touch handling.

use crate::element::ElementId;
use crate::workspace::InstanceId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

impl PointerSource {
    /// Offset between the grabbed element's top-left corner and the pointer.
    ///
    /// Mouse grabs keep the exact point inside the element's bounding box.
    /// Touch start coordinates are too coarse for that, so touch uses a fixed
    /// offset.
    pub fn grab_offset(self, pointer: Point, bounds: Rect, touch_offset: Vec2) -> Vec2 {
        match self {
            PointerSource::Mouse => pointer - bounds.origin(),
            PointerSource::Touch => touch_offset,
        }
    }
}

/// What was under the pointer when it went down.
///
/// Bounds are in the same client coordinates as the pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PressTarget {
    Catalog { element: ElementId, bounds: Rect },
    Workspace { instance: InstanceId, bounds: Rect },
    Empty,
}

/// Pointer event in client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        source: PointerSource,
        target: PressTarget,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    /// Gesture aborted by the platform (pointer left the window, touch cancel).
    Cancel,
}
