//! GPU renderer for interactive 2D charts
//!
//! A [`ChartSurface`] maps a pannable, zoomable window of data space onto a
//! region of the canvas and draws composable groups of primitives into it:
//! point markers, infinite lines, styled polylines and filled polygons,
//! over an optional grid at the axis ticks.
//! Geometry is built on the CPU once per input change; the visible range is
//! applied entirely in the vertex shaders through one view uniform.

pub mod chart_surface;
pub mod controls;
pub mod drawables;
pub mod geometry;
pub mod gpu_context;
pub mod grid;
pub mod textures;
pub mod ticks;
pub mod transform;

pub use chart_surface::{ChartSurface, SurfaceGroup};
pub use controls::{GestureState, ViewportController};
pub use drawables::{
    AreaFill, ChartRenderable, FillTexture, FilledAreaGroup, FilledAreaStyle, FrameContext,
    LineGroup, LineStyle, PathStyle, PointMarkerGroup, PointMarkerStyle, StyledPathGroup,
};
pub use geometry::{FilledArea, Line, Path, PointSet};
pub use gpu_context::GpuContext;
pub use grid::{grid_lines, GRID_GROUP};
pub use textures::{DashTextureBuilder, MarkerShape, MarkerSpec, TextureCache};
pub use ticks::{DecimalTicks, Tick, TickGenerator};
pub use transform::{ChartTransform, ViewUniform};
