//! Background grid: one infinite line per tick of the visible range.

use chart_canvas_config::GridStyle;
use chart_canvas_shared::VisibleRange;

use crate::drawables::LineStyle;
use crate::geometry::Line;
use crate::ticks::TickGenerator;

/// Name of the line group a surface keeps its grid in.
pub const GRID_GROUP: &str = "grid";

/// Vertical lines at the x ticks followed by horizontal lines at the y ticks.
pub fn grid_lines(ticks: &dyn TickGenerator, range: &VisibleRange) -> Vec<Line> {
    let vertical = ticks
        .ticks(range.x1, range.x2)
        .into_iter()
        .map(|t| Line::vertical(t.value));
    let horizontal = ticks
        .ticks(range.y1, range.y2)
        .into_iter()
        .map(|t| Line::horizontal(t.value));
    vertical.chain(horizontal).collect()
}

/// Solid line style for a grid.
pub fn grid_line_style(style: &GridStyle) -> LineStyle {
    LineStyle {
        color: style.color,
        width: style.width,
        dash: Vec::new(),
        z_order: style.z_order,
    }
}

/// Recomputes grid lines only when the visible range moves.
pub struct GridState {
    ticks: Box<dyn TickGenerator>,
    drawn_for: Option<VisibleRange>,
}

impl GridState {
    pub fn new(ticks: Box<dyn TickGenerator>) -> Self {
        Self {
            ticks,
            drawn_for: None,
        }
    }

    /// New lines if `range` differs from the one last drawn.
    pub fn update(&mut self, range: VisibleRange) -> Option<Vec<Line>> {
        if self.drawn_for == Some(range) {
            return None;
        }
        self.drawn_for = Some(range);
        Some(grid_lines(self.ticks.as_ref(), &range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticks::DecimalTicks;
    use chart_canvas_shared::Rgba;

    #[test]
    fn test_lines_sit_on_ticks() {
        let range = VisibleRange::new(-10.0, 0.0, 10.0, 1.0);
        let lines = grid_lines(&DecimalTicks, &range);
        assert_eq!(lines.len(), 21 + 11);

        let (vertical, horizontal) = lines.split_at(21);
        assert!(vertical.iter().all(|l| l.dx == 0.0 && l.dy == 1.0));
        assert_eq!(vertical[0].x, -10.0);
        assert_eq!(vertical[20].x, 10.0);
        assert!(horizontal.iter().all(|l| l.dx == 1.0 && l.dy == 0.0));
        assert!((horizontal[5].y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_state_skips_unchanged_range() {
        let mut state = GridState::new(Box::new(DecimalTicks));
        let range = VisibleRange::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(state.update(range).map(|l| l.len()), Some(22));
        assert!(state.update(range).is_none());
        assert!(state.update(VisibleRange::new(0.0, 0.0, 50.0, 100.0)).is_some());
    }

    #[test]
    fn test_style_is_solid() {
        let style = grid_line_style(&GridStyle {
            enabled: true,
            color: Rgba::BLACK,
            width: 2.0,
            z_order: -3.0,
        });
        assert!(style.dash.is_empty());
        assert_eq!(style.width, 2.0);
        assert_eq!(style.z_order, -3.0);
    }
}
