//! Host input events and the events emitted back by the chart

use serde::{Deserialize, Serialize};

use crate::{CanvasSize, VisibleRange};

pub type PointerId = i64;

/// Position in canvas pixels, origin at the top-left corner
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPosition {
    pub x: f64,
    pub y: f64,
}

impl PhysicalPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

/// Input forwarded by the host surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartInputEvent {
    PointerDown {
        id: PointerId,
        position: PhysicalPosition,
    },
    PointerMove {
        id: PointerId,
        position: PhysicalPosition,
    },
    PointerUp {
        id: PointerId,
    },
    PointerCancel {
        id: PointerId,
    },
    /// Negative `delta_y` zooms in.
    Wheel {
        position: PhysicalPosition,
        delta_y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Click {
        position: PhysicalPosition,
    },
    DoubleClick {
        position: PhysicalPosition,
    },
    Resize {
        size: CanvasSize,
    },
}

/// Emitted on a click inside the chart region, in data coordinates
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartClickEvent {
    pub x: f64,
    pub y: f64,
    pub visible_range: VisibleRange,
}

/// Output of the viewport controller
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChartEvent {
    VisibleRangeChanged(VisibleRange),
    Click(ChartClickEvent),
}
