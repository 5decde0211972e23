//! Procedural marker glyphs rasterized into border/fill coverage masks.
//!
//! Each shape is described by a signed distance function in pixels
//! (negative inside). The fill mask is the shape shrunk by the border width,
//! the border mask is the band between the two.

use std::str::FromStr;

use chart_canvas_shared::ChartCanvasError;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Circle,
    Box,
    Diamond,
    Triangle,
    RightTriangle,
    Plus,
    Minus,
    Cross,
    Divide,
    Star,
    Pentagon,
    Hexagon,
    Donut,
    ArrowUp,
    Trapezoid,
    Plaque,
    Heart,
    DialogBalloon,
    Cylinder,
    ArrowLeftUp,
    ArrowUTurn,
    Page,
}

impl MarkerShape {
    pub const ALL: [MarkerShape; 22] = [
        MarkerShape::Circle,
        MarkerShape::Box,
        MarkerShape::Diamond,
        MarkerShape::Triangle,
        MarkerShape::RightTriangle,
        MarkerShape::Plus,
        MarkerShape::Minus,
        MarkerShape::Cross,
        MarkerShape::Divide,
        MarkerShape::Star,
        MarkerShape::Pentagon,
        MarkerShape::Hexagon,
        MarkerShape::Donut,
        MarkerShape::ArrowUp,
        MarkerShape::Trapezoid,
        MarkerShape::Plaque,
        MarkerShape::Heart,
        MarkerShape::DialogBalloon,
        MarkerShape::Cylinder,
        MarkerShape::ArrowLeftUp,
        MarkerShape::ArrowUTurn,
        MarkerShape::Page,
    ];

    /// Canonical name accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            MarkerShape::Circle => "circle",
            MarkerShape::Box => "box",
            MarkerShape::Diamond => "diamond",
            MarkerShape::Triangle => "triangle",
            MarkerShape::RightTriangle => "right_triangle",
            MarkerShape::Plus => "plus",
            MarkerShape::Minus => "minus",
            MarkerShape::Cross => "cross",
            MarkerShape::Divide => "divide",
            MarkerShape::Star => "star",
            MarkerShape::Pentagon => "pentagon",
            MarkerShape::Hexagon => "hexagon",
            MarkerShape::Donut => "donut",
            MarkerShape::ArrowUp => "arrow_up",
            MarkerShape::Trapezoid => "trapezoid",
            MarkerShape::Plaque => "plaque",
            MarkerShape::Heart => "heart",
            MarkerShape::DialogBalloon => "dialog_balloon",
            MarkerShape::Cylinder => "cylinder",
            MarkerShape::ArrowLeftUp => "arrow_left_up",
            MarkerShape::ArrowUTurn => "arrow_u_turn",
            MarkerShape::Page => "page",
        }
    }

    /// Signed distance in unit space, where the glyph fits in `[-1, 1]²`.
    fn distance(self, p: glm::Vec2) -> f32 {
        match self {
            MarkerShape::Circle => p.norm() - 1.0,
            MarkerShape::Box => sd_box(p, glm::vec2(1.0, 1.0)),
            MarkerShape::Diamond => sd_polygon(p, &[(0.0, 1.0), (-1.0, 0.0), (0.0, -1.0), (1.0, 0.0)]),
            MarkerShape::Triangle => sd_polygon(p, &[(0.0, 1.0), (-1.0, -0.8), (1.0, -0.8)]),
            MarkerShape::RightTriangle => sd_polygon(p, &[(-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)]),
            MarkerShape::Plus => sd_box(p, glm::vec2(1.0, 0.3)).min(sd_box(p, glm::vec2(0.3, 1.0))),
            MarkerShape::Minus => sd_box(p, glm::vec2(1.0, 0.3)),
            MarkerShape::Cross => {
                let r = rotate45(p);
                sd_box(r, glm::vec2(1.0, 0.25)).min(sd_box(r, glm::vec2(0.25, 1.0)))
            }
            MarkerShape::Divide => {
                let dot = |cy: f32| (p - glm::vec2(0.0, cy)).norm() - 0.25;
                sd_box(p, glm::vec2(1.0, 0.2)).min(dot(0.65)).min(dot(-0.65))
            }
            MarkerShape::Star => sd_polygon(p, &star_points(5, 1.0, 0.45)),
            MarkerShape::Pentagon => sd_polygon(p, &regular_points(5, 1.0)),
            MarkerShape::Hexagon => sd_polygon(p, &regular_points(6, 1.0)),
            MarkerShape::Donut => (p.norm() - 0.7).abs() - 0.3,
            MarkerShape::ArrowUp => sd_polygon(p, &ARROW_UP),
            MarkerShape::Trapezoid => sd_polygon(p, &[(-0.5, 0.8), (-1.0, -0.8), (1.0, -0.8), (0.5, 0.8)]),
            MarkerShape::Plaque => {
                let corner = glm::vec2(p.x.abs(), p.y.abs()) - glm::vec2(1.0, 1.0);
                sd_box(p, glm::vec2(1.0, 1.0)).max(0.4 - corner.norm())
            }
            MarkerShape::Heart => sd_polygon(p, &heart_points(48)),
            MarkerShape::DialogBalloon => {
                let bubble = sd_box(p - glm::vec2(0.0, 0.25), glm::vec2(0.8, 0.55)) - 0.2;
                let tail = sd_polygon(p, &[(-0.55, -0.3), (-0.05, -0.3), (-0.7, -1.0)]);
                bubble.min(tail)
            }
            MarkerShape::Cylinder => {
                let body = sd_box(p, glm::vec2(0.8, 0.65));
                let cap = |cy: f32| sd_ellipse(p - glm::vec2(0.0, cy), glm::vec2(0.8, 0.3));
                body.min(cap(0.65)).min(cap(-0.65))
            }
            MarkerShape::ArrowLeftUp => {
                // Up arrow turned 45 degrees counter-clockwise.
                let s = std::f32::consts::FRAC_1_SQRT_2;
                let q = glm::vec2((p.x + p.y) * s, (p.y - p.x) * s);
                sd_polygon(q * 1.1, &ARROW_UP) / 1.1
            }
            MarkerShape::ArrowUTurn => {
                let center = glm::vec2(0.0, 0.1);
                let ring = ((p - center).norm() - 0.55).abs() - 0.2;
                let arch = ring.max(center.y - p.y);
                let leg = sd_box(p - glm::vec2(-0.55, -0.35), glm::vec2(0.2, 0.45));
                let head = sd_polygon(p, &[(0.1, 0.1), (1.0, 0.1), (0.55, -0.85)]);
                arch.min(leg).min(head)
            }
            MarkerShape::Page => sd_polygon(
                p,
                &[(-0.75, -1.0), (0.75, -1.0), (0.75, 0.5), (0.25, 1.0), (-0.75, 1.0)],
            ),
        }
    }
}

impl FromStr for MarkerShape {
    type Err = ChartCanvasError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let shape = match name {
            "o" | "circle" => MarkerShape::Circle,
            "box" | "square" => MarkerShape::Box,
            "diamond" => MarkerShape::Diamond,
            "triangle" => MarkerShape::Triangle,
            "right_triangle" => MarkerShape::RightTriangle,
            "+" | "plus" => MarkerShape::Plus,
            "-" | "minus" => MarkerShape::Minus,
            "x" | "cross" => MarkerShape::Cross,
            "divide" => MarkerShape::Divide,
            "star" => MarkerShape::Star,
            "pentagon" => MarkerShape::Pentagon,
            "hexagon" => MarkerShape::Hexagon,
            "donut" => MarkerShape::Donut,
            "arrow_up" => MarkerShape::ArrowUp,
            "trapezoid" => MarkerShape::Trapezoid,
            "plaque" => MarkerShape::Plaque,
            "heart" => MarkerShape::Heart,
            "dialog_balloon" => MarkerShape::DialogBalloon,
            "cylinder" => MarkerShape::Cylinder,
            "arrow_left_up" => MarkerShape::ArrowLeftUp,
            "arrow_u_turn" => MarkerShape::ArrowUTurn,
            "page" => MarkerShape::Page,
            _ => {
                return Err(ChartCanvasError::UnknownMarker {
                    name: name.to_string(),
                })
            }
        };
        Ok(shape)
    }
}

/// What to rasterize: shape, outer size and border width in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub shape: MarkerShape,
    pub size: f32,
    pub border_width: f32,
}

impl MarkerSpec {
    pub fn new(shape: MarkerShape, size: f32, border_width: f32) -> Self {
        Self {
            shape,
            size,
            border_width,
        }
    }

    /// Side length in pixels of the rasterized glyph, one texel of padding
    /// on each side.
    pub fn bitmap_size(&self) -> u32 {
        self.size.max(1.0).ceil() as u32 + 2
    }
}

/// RGBA8 glyph: R = border coverage, G = fill coverage, A = total coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl MarkerBitmap {
    pub fn texel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

pub fn rasterize_marker(spec: &MarkerSpec) -> MarkerBitmap {
    let size = spec.size.max(1.0);
    let dim = spec.bitmap_size();
    let radius = size * 0.5;
    let center = dim as f32 * 0.5;
    let border = spec.border_width.clamp(0.0, radius);

    let mut pixels = vec![0u8; (dim * dim * 4) as usize];
    for y in 0..dim {
        for x in 0..dim {
            // y flipped so unit space points up like the chart
            let p = glm::vec2(x as f32 + 0.5 - center, center - (y as f32 + 0.5)) / radius;
            let d = spec.shape.distance(p) * radius;
            let outer = (0.5 - d).clamp(0.0, 1.0);
            let fill = (0.5 - (d + border)).clamp(0.0, 1.0);
            let edge = (outer - fill).max(0.0);

            let i = ((y * dim + x) * 4) as usize;
            pixels[i] = (edge * 255.0).round() as u8;
            pixels[i + 1] = (fill * 255.0).round() as u8;
            pixels[i + 3] = (outer * 255.0).round() as u8;
        }
    }

    MarkerBitmap {
        width: dim,
        height: dim,
        pixels,
    }
}

const ARROW_UP: [(f32, f32); 7] = [
    (0.0, 1.0),
    (-1.0, 0.0),
    (-0.4, 0.0),
    (-0.4, -1.0),
    (0.4, -1.0),
    (0.4, 0.0),
    (1.0, 0.0),
];

fn rotate45(p: glm::Vec2) -> glm::Vec2 {
    let s = std::f32::consts::FRAC_1_SQRT_2;
    glm::vec2((p.x - p.y) * s, (p.x + p.y) * s)
}

fn sd_box(p: glm::Vec2, half: glm::Vec2) -> f32 {
    let q = glm::vec2(p.x.abs() - half.x, p.y.abs() - half.y);
    let outside = glm::vec2(q.x.max(0.0), q.y.max(0.0)).norm();
    outside + q.x.max(q.y).min(0.0)
}

/// Exact signed distance to a simple polygon (even-odd inside test).
fn sd_polygon(p: glm::Vec2, points: &[(f32, f32)]) -> f32 {
    let n = points.len();
    let v = |i: usize| glm::vec2(points[i].0, points[i].1);
    let mut dist = f32::MAX;
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (v(j), v(i));
        let e = b - a;
        let w = p - a;
        let t = (w.dot(&e) / e.dot(&e)).clamp(0.0, 1.0);
        dist = dist.min((w - e * t).norm());
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    if inside {
        -dist
    } else {
        dist
    }
}

/// Approximate distance to an axis-aligned ellipse; exact on the axes.
fn sd_ellipse(p: glm::Vec2, radii: glm::Vec2) -> f32 {
    let k = glm::vec2(p.x / radii.x, p.y / radii.y).norm();
    (k - 1.0) * radii.x.min(radii.y)
}

/// Classic parametric heart, scaled into the unit square.
fn heart_points(samples: usize) -> Vec<(f32, f32)> {
    (0..samples)
        .map(|i| {
            let t = i as f32 / samples as f32 * std::f32::consts::TAU;
            let x = 16.0 * t.sin().powi(3);
            let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
            (x / 16.5, (y + 2.5) / 15.0)
        })
        .collect()
}

fn regular_points(sides: usize, radius: f32) -> Vec<(f32, f32)> {
    (0..sides)
        .map(|i| {
            let a = std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::TAU / sides as f32;
            (radius * a.cos(), radius * a.sin())
        })
        .collect()
}

fn star_points(tips: usize, outer: f32, inner: f32) -> Vec<(f32, f32)> {
    (0..tips * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let a = std::f32::consts::FRAC_PI_2 + i as f32 * std::f32::consts::PI / tips as f32;
            (r * a.cos(), r * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_names() {
        assert_eq!("o".parse::<MarkerShape>().unwrap(), MarkerShape::Circle);
        assert_eq!("x".parse::<MarkerShape>().unwrap(), MarkerShape::Cross);
        assert_eq!("+".parse::<MarkerShape>().unwrap(), MarkerShape::Plus);
        assert!("heart-ish".parse::<MarkerShape>().is_err());
        for shape in MarkerShape::ALL {
            assert_eq!(shape.name().parse::<MarkerShape>().unwrap(), shape);
        }
    }

    #[test]
    fn test_added_shapes_fill_their_centers() {
        // Each of these covers the glyph center except the U-turn, whose
        // center sits inside the arch.
        for shape in [
            MarkerShape::Heart,
            MarkerShape::DialogBalloon,
            MarkerShape::Cylinder,
            MarkerShape::ArrowLeftUp,
            MarkerShape::Page,
        ] {
            let bitmap = rasterize_marker(&MarkerSpec::new(shape, 32.0, 2.0));
            assert_eq!(bitmap.texel(17, 17)[1], 255, "{:?} center not filled", shape);
        }
        let u_turn = rasterize_marker(&MarkerSpec::new(MarkerShape::ArrowUTurn, 32.0, 2.0));
        assert_eq!(u_turn.texel(17, 17)[3], 0);
    }

    #[test]
    fn test_circle_masks() {
        let bitmap = rasterize_marker(&MarkerSpec::new(MarkerShape::Circle, 20.0, 2.0));
        assert_eq!(bitmap.width, 22);
        let center = bitmap.texel(11, 11);
        assert_eq!(center[1], 255, "center is filled");
        assert_eq!(center[0], 0, "center has no border");

        let rim = bitmap.texel(11, 2);
        assert!(rim[0] > 200, "rim is border: {:?}", rim);
        assert_eq!(rim[1], 0);

        let corner = bitmap.texel(0, 0);
        assert_eq!(corner, [0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_border_is_all_fill() {
        let bitmap = rasterize_marker(&MarkerSpec::new(MarkerShape::Box, 10.0, 0.0));
        for y in 0..bitmap.height {
            for x in 0..bitmap.width {
                let [border, fill, _, alpha] = bitmap.texel(x, y);
                assert!(border <= 1);
                assert!((fill as i32 - alpha as i32).abs() <= 1);
            }
        }
    }

    #[test]
    fn test_every_shape_covers_its_center_region() {
        for shape in MarkerShape::ALL {
            let bitmap = rasterize_marker(&MarkerSpec::new(shape, 24.0, 1.0));
            let covered = bitmap.pixels.chunks(4).filter(|t| t[3] > 0).count();
            assert!(covered > 20, "{:?} covers only {} texels", shape, covered);
        }
    }
}
