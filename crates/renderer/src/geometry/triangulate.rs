//! Polygon fill tessellation backed by lyon.
//!
//! Rings are fed to lyon's sweep-line fill tessellator with the even-odd
//! rule, so holes punch through the contour whatever their winding. lyon
//! works in `f32`; coordinates are shifted to the contour's first point in
//! `f64` first and shifted back afterwards so large data values keep their
//! precision.

use lyon::lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, TessellationError,
    VertexBuffers,
};
use lyon::math::point;
use lyon::path::Path as LyonPath;

type Point = [f64; 2];

/// Triangles over their own vertex list. Vertices shared between rings
/// (touching holes, repeated points) are merged by the tessellator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonMesh {
    pub positions: Vec<Point>,
    pub triangles: Vec<[u32; 3]>,
}

impl PolygonMesh {
    pub fn area(&self) -> f64 {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| self.positions[i as usize]);
                ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs() * 0.5
            })
            .sum()
    }
}

fn add_ring(builder: &mut lyon::path::path::Builder, ring: &[Point], origin: Point) {
    let to_local = |p: &Point| point((p[0] - origin[0]) as f32, (p[1] - origin[1]) as f32);
    let mut points = ring.iter();
    let Some(first) = points.next() else {
        return;
    };
    builder.begin(to_local(first));
    for p in points {
        builder.line_to(to_local(p));
    }
    builder.end(true);
}

/// Tessellate a contour with holes. Orientation of the input rings does not
/// matter.
pub fn triangulate(contour: &[Point], holes: &[Vec<Point>]) -> Result<PolygonMesh, TessellationError> {
    let origin = contour.first().copied().unwrap_or([0.0, 0.0]);

    let mut builder = LyonPath::builder();
    add_ring(&mut builder, contour, origin);
    for hole in holes {
        add_ring(&mut builder, hole, origin);
    }
    let path = builder.build();

    let mut buffers: VertexBuffers<Point, u32> = VertexBuffers::new();
    let options = FillOptions::default().with_fill_rule(FillRule::EvenOdd);
    FillTessellator::new().tessellate_path(
        &path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
            let p = vertex.position();
            [p.x as f64 + origin[0], p.y as f64 + origin[1]]
        }),
    )?;

    let triangles = buffers
        .indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();
    Ok(PolygonMesh {
        positions: buffers.vertices,
        triangles,
    })
}
