//! Benchmarks for CPU geometry and texture generation

use chart_canvas_config::RenderTuning;
use chart_canvas_renderer::geometry::{
    build_area_buffers, build_line_buffers, build_path_buffers, build_point_buffers,
};
use chart_canvas_renderer::textures::build_marker_atlas;
use chart_canvas_renderer::{
    DashTextureBuilder, FilledArea, Line, MarkerShape, MarkerSpec, Path, PointSet,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn sine_path(points: usize, phase: f64) -> Path {
    let x: Vec<f64> = (0..points).map(|i| i as f64 * 0.01).collect();
    let y: Vec<f64> = x.iter().map(|v| (v + phase).sin() * 100.0).collect();
    Path::new(x, y)
}

fn star_contour(spikes: usize, center: [f64; 2]) -> Vec<[f64; 2]> {
    (0..spikes * 2)
        .map(|i| {
            let r = if i % 2 == 0 { 10.0 } else { 4.0 };
            let a = i as f64 * std::f64::consts::PI / spikes as f64;
            [center[0] + r * a.cos(), center[1] + r * a.sin()]
        })
        .collect()
}

fn benchmark_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_buffers");
    let tuning = RenderTuning::default();

    for num_points in [1_000, 10_000, 100_000] {
        let paths: Vec<Path> = (0..4).map(|i| sine_path(num_points / 4, i as f64)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(num_points), &paths, |b, paths| {
            b.iter(|| build_path_buffers(black_box(paths), &tuning));
        });
    }

    group.finish();
}

fn benchmark_points_and_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_and_line_buffers");

    let set = PointSet {
        x: (0..50_000).map(|i| i as f64).collect(),
        y: (0..50_000).map(|i| (i as f64).cos()).collect(),
        ..Default::default()
    };
    group.bench_function("points_50k", |b| {
        b.iter(|| build_point_buffers(black_box(std::slice::from_ref(&set))));
    });

    let lines: Vec<Line> = (0..1_000).map(|i| Line::horizontal(i as f64)).collect();
    group.bench_function("lines_1k", |b| {
        b.iter(|| build_line_buffers(black_box(&lines)));
    });

    group.finish();
}

fn benchmark_triangulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_buffers");

    for spikes in [8, 64, 512] {
        let area = FilledArea {
            contour: star_contour(spikes, [0.0, 0.0]),
            holes: vec![vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]],
            color: None,
        };
        group.bench_with_input(BenchmarkId::from_parameter(spikes), &area, |b, area| {
            b.iter(|| build_area_buffers(black_box(std::slice::from_ref(area))));
        });
    }

    group.finish();
}

fn benchmark_textures(c: &mut Criterion) {
    let mut group = c.benchmark_group("textures");

    let builder = DashTextureBuilder::new()
        .with_pattern("dotted", &[2.0, 4.0])
        .with_pattern("dashed", &[15.0, 10.0])
        .with_pattern("dash_dot", &[12.0, 4.0, 2.0, 4.0]);
    group.bench_function("dash_texture", |b| b.iter(|| black_box(&builder).build()));

    let markers: Vec<(String, MarkerSpec)> = MarkerShape::ALL
        .iter()
        .enumerate()
        .map(|(i, &shape)| (format!("m{}", i), MarkerSpec::new(shape, 12.0 + i as f32, 1.5)))
        .collect();
    group.bench_function("marker_atlas_16", |b| {
        b.iter(|| build_marker_atlas(black_box(&markers)));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_paths,
    benchmark_points_and_lines,
    benchmark_triangulation,
    benchmark_textures
);
criterion_main!(benches);
