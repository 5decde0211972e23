//! Gesture state and the pure pan/pinch/wheel math.
//!
//! Positions handled here are chart-region relative (`[0,1]²`, y up). The
//! functions take the current state by value and return the next one so the
//! controller never observes a half-updated gesture.

use chart_canvas_config::GestureTuning;
use chart_canvas_shared::{DataRange, Modifiers, PhysicalPosition, PointerId, VisibleRange};
use nalgebra_glm as glm;

/// One tracked pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTrack {
    pub id: PointerId,
    /// Relative position at the start of the current gesture phase.
    pub anchor: glm::DVec2,
    pub current: glm::DVec2,
    /// Visible range captured together with the anchor.
    pub snapshot: VisibleRange,
    /// Canvas position where the pointer went down, for click detection.
    pub down_position: PhysicalPosition,
}

impl PointerTrack {
    pub fn new(
        id: PointerId,
        position: glm::DVec2,
        snapshot: VisibleRange,
        down_position: PhysicalPosition,
    ) -> Self {
        Self {
            id,
            anchor: position,
            current: position,
            snapshot,
            down_position,
        }
    }

    /// Restart the gesture phase from where the pointer is now.
    pub fn rebased(self, snapshot: VisibleRange) -> Self {
        Self {
            anchor: self.current,
            snapshot,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Panning(PointerTrack),
    PinchZooming(PointerTrack, PointerTrack),
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }

    pub fn tracked_ids(&self) -> Vec<PointerId> {
        match self {
            GestureState::Idle => vec![],
            GestureState::Panning(a) => vec![a.id],
            GestureState::PinchZooming(a, b) => vec![a.id, b.id],
        }
    }

    pub fn track(&self, id: PointerId) -> Option<&PointerTrack> {
        match self {
            GestureState::Idle => None,
            GestureState::Panning(a) => (a.id == id).then_some(a),
            GestureState::PinchZooming(a, b) => [a, b].into_iter().find(|t| t.id == id),
        }
    }

    /// A pointer went down. Existing tracks are re-anchored at their current
    /// positions and every track snapshots `visible`. A third pointer is not
    /// tracked.
    pub fn pointer_down(self, new_track: PointerTrack, visible: VisibleRange) -> GestureState {
        match self {
            GestureState::Idle => GestureState::Panning(new_track),
            GestureState::Panning(a) if a.id == new_track.id => GestureState::Panning(new_track),
            GestureState::Panning(a) => {
                GestureState::PinchZooming(a.rebased(visible), new_track)
            }
            GestureState::PinchZooming(a, b) if a.id == new_track.id => {
                GestureState::PinchZooming(new_track, b.rebased(visible))
            }
            GestureState::PinchZooming(a, b) if b.id == new_track.id => {
                GestureState::PinchZooming(a.rebased(visible), new_track)
            }
            state @ GestureState::PinchZooming(..) => {
                log::debug!(
                    "[GestureState] Ignoring pointer {} while two pointers are tracked",
                    new_track.id
                );
                state
            }
        }
    }

    /// Update the current position of a tracked pointer. Returns false for
    /// untracked ids.
    pub fn pointer_moved(&mut self, id: PointerId, position: glm::DVec2) -> bool {
        match self {
            GestureState::Idle => false,
            GestureState::Panning(a) => {
                if a.id == id {
                    a.current = position;
                    true
                } else {
                    false
                }
            }
            GestureState::PinchZooming(a, b) => {
                if a.id == id {
                    a.current = position;
                    true
                } else if b.id == id {
                    b.current = position;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop a pointer. The remaining one, if any, is re-anchored and
    /// re-snapshotted so the gesture continues without a jump.
    pub fn pointer_up(self, id: PointerId, visible: VisibleRange) -> GestureState {
        match self {
            GestureState::Panning(a) if a.id == id => GestureState::Idle,
            GestureState::PinchZooming(a, b) if a.id == id => {
                GestureState::Panning(b.rebased(visible))
            }
            GestureState::PinchZooming(a, b) if b.id == id => {
                GestureState::Panning(a.rebased(visible))
            }
            state => state,
        }
    }

    /// Visible range implied by the tracked pointers, `None` when idle.
    pub fn resolve(
        &self,
        data: &DataRange,
        max_zoom: Option<[f64; 2]>,
        tuning: &GestureTuning,
    ) -> Option<VisibleRange> {
        match self {
            GestureState::Idle => None,
            GestureState::Panning(a) => Some(pan(a, data)),
            GestureState::PinchZooming(a, b) => {
                Some(pinch(a, b, data, max_zoom, tuning.axis_lock_epsilon))
            }
        }
    }
}

fn clip(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Translate the snapshot by the pointer's displacement, keeping the size
/// and clamping the origin into the data range.
pub fn pan(track: &PointerTrack, data: &DataRange) -> VisibleRange {
    let [w, h] = track.snapshot.size();
    let delta = track.anchor - track.current;
    let x1 = clip(delta.x * w + track.snapshot.x1, data.x1, data.x2 - w);
    let y1 = clip(delta.y * h + track.snapshot.y1, data.y1, data.y2 - h);
    VisibleRange::new(x1, y1, x1 + w, y1 + h)
}

struct AxisPinch {
    anchor: (f64, f64),
    current: (f64, f64),
    old_origin: f64,
    old_size: f64,
    data_min: f64,
    data_max: f64,
    floor: f64,
}

impl AxisPinch {
    fn solve(&self, lock_epsilon: f64) -> (f64, f64) {
        let (a1, a2) = self.anchor;
        let (c1, c2) = self.current;
        let locked = (a1 - c1).abs() < lock_epsilon && (a2 - c2).abs() < lock_epsilon;
        let current_span = c2 - c1;

        let anchor_span = a2 - a1;
        let raw = if locked || current_span.abs() < f64::EPSILON || anchor_span.abs() < f64::EPSILON {
            self.old_size
        } else {
            (self.old_size * anchor_span / current_span).abs()
        };
        let data_extent = self.data_max - self.data_min;
        let size = clip(raw, self.floor.min(data_extent), data_extent);

        let origin = (a1 + a2) * 0.5 * self.old_size - (c1 + c2) * 0.5 * size + self.old_origin;
        let origin = clip(origin, self.data_min, self.data_max - size);
        (origin, size)
    }
}

/// Two-pointer zoom. The data point under the pointers' midpoint at the
/// anchor stays under their current midpoint; an axis is held when neither
/// pointer moved along it by more than `lock_epsilon`.
pub fn pinch(
    a: &PointerTrack,
    b: &PointerTrack,
    data: &DataRange,
    max_zoom: Option<[f64; 2]>,
    lock_epsilon: f64,
) -> VisibleRange {
    let snapshot = a.snapshot;
    let [floor_x, floor_y] = max_zoom.unwrap_or([0.0, 0.0]);

    let (x1, w) = AxisPinch {
        anchor: (a.anchor.x, b.anchor.x),
        current: (a.current.x, b.current.x),
        old_origin: snapshot.x1,
        old_size: snapshot.width(),
        data_min: data.x1,
        data_max: data.x2,
        floor: floor_x,
    }
    .solve(lock_epsilon);

    let (y1, h) = AxisPinch {
        anchor: (a.anchor.y, b.anchor.y),
        current: (a.current.y, b.current.y),
        old_origin: snapshot.y1,
        old_size: snapshot.height(),
        data_min: data.y1,
        data_max: data.y2,
        floor: floor_y,
    }
    .solve(lock_epsilon);

    VisibleRange::new(x1, y1, x1 + w, y1 + h)
}

/// Zoom about `anchor` (a data coordinate). Returns `None` for a zero delta.
pub fn wheel_zoom(
    visible: &VisibleRange,
    anchor: glm::DVec2,
    delta_y: f64,
    modifiers: Modifiers,
    data: &DataRange,
    max_zoom: Option<[f64; 2]>,
    tuning: &GestureTuning,
) -> Option<VisibleRange> {
    if delta_y == 0.0 || !delta_y.is_finite() {
        return None;
    }
    let factor = if delta_y < 0.0 {
        tuning.zoom_in_factor
    } else {
        tuning.zoom_out_factor
    };
    let (fx, fy) = if modifiers.ctrl {
        (1.0, factor)
    } else if modifiers.shift {
        (factor, 1.0)
    } else {
        (factor, factor)
    };

    let mut dx = [(visible.x1 - anchor.x) * fx, (visible.x2 - anchor.x) * fx];
    let mut dy = [(visible.y1 - anchor.y) * fy, (visible.y2 - anchor.y) * fy];

    if let Some([floor_x, floor_y]) = max_zoom {
        for (d, floor) in [(&mut dx, floor_x), (&mut dy, floor_y)] {
            let extent = d[1] - d[0];
            if extent > 0.0 && extent < floor {
                let ratio = floor / extent;
                d[0] *= ratio;
                d[1] *= ratio;
            }
        }
    }

    let next = VisibleRange::new(
        clip(anchor.x + dx[0], data.x1, data.x2),
        clip(anchor.y + dy[0], data.y1, data.y2),
        clip(anchor.x + dx[1], data.x1, data.x2),
        clip(anchor.y + dy[1], data.y1, data.y2),
    );
    next.is_valid().then_some(next)
}
