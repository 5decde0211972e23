//! Viewport controller: owns the visible range and turns host input into
//! pan/zoom updates and click events.

use chart_canvas_config::{ChartCanvasConfig, GestureTuning};
use chart_canvas_shared::{
    CanvasSize, ChartClickEvent, ChartEvent, ChartInputEvent, ChartRegion, DataRange, Modifiers,
    PhysicalPosition, PointerId, VisibleRange,
};

use super::gesture::{wheel_zoom, GestureState, PointerTrack};
use crate::transform::{canvas_to_region_relative, ChartTransform};

pub struct ViewportController {
    data_range: DataRange,
    default_visible_range: Option<VisibleRange>,
    chart_region: ChartRegion,
    max_zoom: Option<[f64; 2]>,
    tuning: GestureTuning,
    canvas: CanvasSize,
    visible: VisibleRange,
    state: GestureState,
    /// Largest pointer travel in pixels since the gesture started from idle.
    gesture_travel_px: f64,
}

impl ViewportController {
    pub fn new(config: &ChartCanvasConfig) -> Self {
        Self {
            data_range: config.data_range,
            default_visible_range: config.default_visible_range,
            chart_region: config.chart_region,
            max_zoom: config.max_zoom,
            tuning: config.gestures.clone(),
            canvas: CanvasSize::new(0, 0),
            visible: config.initial_visible_range(),
            state: GestureState::Idle,
            gesture_travel_px: 0.0,
        }
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.visible
    }

    pub fn data_range(&self) -> DataRange {
        self.data_range
    }

    pub fn chart_region(&self) -> ChartRegion {
        self.chart_region
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    pub fn gesture_state(&self) -> &GestureState {
        &self.state
    }

    /// Transform for the current visible range.
    pub fn transform(&self) -> ChartTransform {
        ChartTransform::new(self.visible, self.chart_region, self.canvas)
    }

    /// Only the canvas size changes; active pointer tracks survive a resize.
    pub fn resize(&mut self, size: CanvasSize) {
        if size != self.canvas {
            log::debug!(
                "[ViewportController] Canvas resized to {}x{}",
                size.width,
                size.height
            );
            self.canvas = size;
        }
    }

    /// Set the visible range programmatically, clamped into the data range.
    pub fn set_visible_range(&mut self, range: VisibleRange) -> VisibleRange {
        let d = &self.data_range;
        let clamped = VisibleRange::new(
            range.x1.max(d.x1),
            range.y1.max(d.y1),
            range.x2.min(d.x2),
            range.y2.min(d.y2),
        );
        if clamped.is_valid() {
            self.visible = clamped;
        } else {
            log::warn!(
                "[ViewportController] Ignoring visible range {:?} outside data range {:?}",
                range,
                self.data_range
            );
        }
        self.visible
    }

    pub fn handle_event(&mut self, event: &ChartInputEvent) -> Option<ChartEvent> {
        match *event {
            ChartInputEvent::PointerDown { id, position } => self.on_pointer_down(id, position),
            ChartInputEvent::PointerMove { id, position } => self.on_pointer_move(id, position),
            ChartInputEvent::PointerUp { id } | ChartInputEvent::PointerCancel { id } => {
                self.on_pointer_up(id)
            }
            ChartInputEvent::Wheel {
                position,
                delta_y,
                modifiers,
            } => self.on_wheel(position, delta_y, modifiers),
            ChartInputEvent::Click { position } => self.on_click(position),
            ChartInputEvent::DoubleClick { .. } => self.reset(),
            ChartInputEvent::Resize { size } => {
                self.resize(size);
                None
            }
        }
    }

    fn relative(&self, position: PhysicalPosition) -> Option<nalgebra_glm::DVec2> {
        canvas_to_region_relative(position, &self.chart_region, self.canvas)
    }

    fn on_pointer_down(&mut self, id: PointerId, position: PhysicalPosition) -> Option<ChartEvent> {
        let rel = self.relative(position)?;
        if self.state.is_idle() {
            self.gesture_travel_px = 0.0;
        }
        let track = PointerTrack::new(id, rel, self.visible, position);
        self.state = std::mem::take(&mut self.state).pointer_down(track, self.visible);
        None
    }

    fn on_pointer_move(&mut self, id: PointerId, position: PhysicalPosition) -> Option<ChartEvent> {
        let rel = self.relative(position)?;
        let down = self.state.track(id)?.down_position;
        if !self.state.pointer_moved(id, rel) {
            return None;
        }
        let travel = (position.x - down.x).hypot(position.y - down.y);
        self.gesture_travel_px = self.gesture_travel_px.max(travel);
        self.recompute()
    }

    fn on_pointer_up(&mut self, id: PointerId) -> Option<ChartEvent> {
        if self.state.track(id).is_none() {
            log::debug!("[ViewportController] Pointer {} up without a track", id);
            return None;
        }
        self.state = std::mem::take(&mut self.state).pointer_up(id, self.visible);
        None
    }

    fn recompute(&mut self) -> Option<ChartEvent> {
        let next = self
            .state
            .resolve(&self.data_range, self.max_zoom, &self.tuning)?;
        self.apply(next)
    }

    fn on_wheel(
        &mut self,
        position: PhysicalPosition,
        delta_y: f64,
        modifiers: Modifiers,
    ) -> Option<ChartEvent> {
        let anchor = self.transform().canvas_to_data(position)?;
        let next = wheel_zoom(
            &self.visible,
            anchor,
            delta_y,
            modifiers,
            &self.data_range,
            self.max_zoom,
            &self.tuning,
        )?;
        self.apply(next)
    }

    fn on_click(&mut self, position: PhysicalPosition) -> Option<ChartEvent> {
        if self.gesture_travel_px > self.tuning.click_slop_px {
            log::debug!(
                "[ViewportController] Suppressing click after a {:.1}px drag",
                self.gesture_travel_px
            );
            self.gesture_travel_px = 0.0;
            return None;
        }
        let point = self.transform().canvas_to_data(position)?;
        Some(ChartEvent::Click(ChartClickEvent {
            x: point.x,
            y: point.y,
            visible_range: self.visible,
        }))
    }

    /// Restore the default visible range (or the whole data range).
    pub fn reset(&mut self) -> Option<ChartEvent> {
        let target = self.default_visible_range.unwrap_or(self.data_range);
        self.apply(target)
    }

    fn apply(&mut self, next: VisibleRange) -> Option<ChartEvent> {
        if next == self.visible {
            return None;
        }
        self.visible = next;
        Some(ChartEvent::VisibleRangeChanged(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewportController {
        let config = ChartCanvasConfig::new(DataRange::new(-10.0, -10.0, 10.0, 10.0))
            .with_default_visible_range(VisibleRange::new(-9.0, -9.0, 9.0, 9.0));
        let mut c = ViewportController::new(&config);
        c.resize(CanvasSize::new(600, 600));
        c
    }

    fn pos(x: f64, y: f64) -> PhysicalPosition {
        PhysicalPosition::new(x, y)
    }

    #[test]
    fn test_events_ignored_before_resize() {
        let config = ChartCanvasConfig::new(DataRange::new(0.0, 0.0, 1.0, 1.0));
        let mut c = ViewportController::new(&config);
        let wheel = ChartInputEvent::Wheel {
            position: pos(10.0, 10.0),
            delta_y: -1.0,
            modifiers: Modifiers::default(),
        };
        assert!(c.handle_event(&wheel).is_none());
        assert!(c
            .handle_event(&ChartInputEvent::PointerDown {
                id: 1,
                position: pos(10.0, 10.0)
            })
            .is_none());
        assert!(c.gesture_state().is_idle());
    }

    #[test]
    fn test_single_pointer_pan_clamps() {
        let mut c = controller();
        c.handle_event(&ChartInputEvent::PointerDown {
            id: 1,
            position: pos(300.0, 300.0),
        });
        // 100px right on an 18-unit / 600px window moves the origin by -3.
        let event = c.handle_event(&ChartInputEvent::PointerMove {
            id: 1,
            position: pos(400.0, 300.0),
        });
        let range = c.visible_range();
        assert_eq!(event, Some(ChartEvent::VisibleRangeChanged(range)));
        assert!((range.x1 + 10.0).abs() < 1e-9);
        assert!((range.x2 - 8.0).abs() < 1e-9);
        assert!((range.y1 + 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_untracked_pointer_is_ignored() {
        let mut c = controller();
        let before = c.visible_range();
        assert!(c
            .handle_event(&ChartInputEvent::PointerMove {
                id: 9,
                position: pos(100.0, 100.0)
            })
            .is_none());
        assert!(c.handle_event(&ChartInputEvent::PointerUp { id: 9 }).is_none());
        assert_eq!(c.visible_range(), before);
    }

    #[test]
    fn test_click_emits_data_coordinates() {
        let mut c = controller();
        let event = c.handle_event(&ChartInputEvent::Click {
            position: pos(300.0, 300.0),
        });
        match event {
            Some(ChartEvent::Click(click)) => {
                assert!(click.x.abs() < 1e-9);
                assert!(click.y.abs() < 1e-9);
                assert_eq!(click.visible_range, c.visible_range());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_click_after_drag_is_suppressed() {
        let mut c = controller();
        c.handle_event(&ChartInputEvent::PointerDown {
            id: 1,
            position: pos(300.0, 300.0),
        });
        c.handle_event(&ChartInputEvent::PointerMove {
            id: 1,
            position: pos(340.0, 300.0),
        });
        c.handle_event(&ChartInputEvent::PointerUp { id: 1 });
        assert!(c
            .handle_event(&ChartInputEvent::Click {
                position: pos(340.0, 300.0)
            })
            .is_none());
    }

    #[test]
    fn test_double_click_resets() {
        let mut c = controller();
        c.handle_event(&ChartInputEvent::Wheel {
            position: pos(300.0, 300.0),
            delta_y: -1.0,
            modifiers: Modifiers::default(),
        });
        assert_ne!(c.visible_range(), VisibleRange::new(-9.0, -9.0, 9.0, 9.0));
        c.handle_event(&ChartInputEvent::DoubleClick {
            position: pos(0.0, 0.0),
        });
        assert_eq!(c.visible_range(), VisibleRange::new(-9.0, -9.0, 9.0, 9.0));
    }

    #[test]
    fn test_resize_keeps_tracks() {
        let mut c = controller();
        c.handle_event(&ChartInputEvent::PointerDown {
            id: 1,
            position: pos(300.0, 300.0),
        });
        c.handle_event(&ChartInputEvent::Resize {
            size: CanvasSize::new(1200, 600),
        });
        assert_eq!(c.gesture_state().tracked_ids(), vec![1]);
        assert_eq!(c.canvas_size(), CanvasSize::new(1200, 600));
    }

    #[test]
    fn test_set_visible_range_clamps() {
        let mut c = controller();
        let r = c.set_visible_range(VisibleRange::new(-20.0, -5.0, 5.0, 50.0));
        assert_eq!(r, VisibleRange::new(-10.0, -5.0, 5.0, 10.0));
    }
}
