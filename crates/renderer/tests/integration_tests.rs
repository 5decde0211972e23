//! Integration tests for the chart renderer's CPU side: viewport gestures,
//! coordinate transforms, geometry builders and texture generation.

use chart_canvas_config::{ChartCanvasConfig, RenderTuning};
use chart_canvas_renderer::geometry::{build_area_buffers, build_path_buffers};
use chart_canvas_renderer::textures::dash_texture::DASH_ROW_HEIGHT;
use chart_canvas_renderer::textures::{request_marker_atlas, AtlasPoll};
use chart_canvas_renderer::{
    drawables, grid_lines, ChartTransform, DashTextureBuilder, DecimalTicks, FilledArea,
    MarkerShape, MarkerSpec, Path, ViewportController,
};
use chart_canvas_shared::{
    depth_from_z_order, CanvasSize, ChartEvent, ChartInputEvent, ChartRegion, DataRange,
    GeometryIssue, Modifiers, PhysicalPosition, VisibleRange,
};
use nalgebra_glm as glm;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn controller(visible: Option<VisibleRange>) -> ViewportController {
    let mut config = ChartCanvasConfig::new(DataRange::new(-10.0, -10.0, 10.0, 10.0));
    if let Some(range) = visible {
        config = config.with_default_visible_range(range);
    }
    let mut c = ViewportController::new(&config);
    c.handle_event(&ChartInputEvent::Resize {
        size: CanvasSize::new(600, 600),
    });
    c
}

fn pos(x: f64, y: f64) -> PhysicalPosition {
    PhysicalPosition::new(x, y)
}

fn assert_range(actual: VisibleRange, expected: [f64; 4]) {
    let a: [f64; 4] = actual.into();
    for i in 0..4 {
        assert!((a[i] - expected[i]).abs() < 1e-9, "{:?} != {:?}", a, expected);
    }
}

#[test]
fn test_transform_round_trip() {
    init_logging();
    let transform = ChartTransform::new(
        VisibleRange::new(100.0, -2.0, 300.0, 2.0),
        ChartRegion::new(0.1, 0.05, 0.95, 0.9),
        CanvasSize::new(800, 400),
    );
    for p in [glm::vec2(100.0, -2.0), glm::vec2(175.5, 0.25), glm::vec2(300.0, 2.0)] {
        let canvas = transform.data_to_canvas(p);
        let back = transform
            .canvas_to_data(canvas)
            .expect("point inside the region");
        assert!((back - p).norm() < 1e-9);

        let clip = transform.data_to_clip(p);
        assert!((transform.clip_to_data(clip) - p).norm() < 1e-9);
    }

    // Top-left corner of the region is the visible range's (x1, y2).
    let corner = transform.data_to_canvas(glm::vec2(100.0, 2.0));
    assert!((corner.x - 80.0).abs() < 1e-9);
    assert!((corner.y - 20.0).abs() < 1e-9);
    assert!(transform.canvas_to_data(pos(10.0, 10.0)).is_none());
}

#[test]
fn test_wheel_zoom_about_center() {
    init_logging();
    let mut c = controller(None);
    let event = c.handle_event(&ChartInputEvent::Wheel {
        position: pos(300.0, 300.0),
        delta_y: -120.0,
        modifiers: Modifiers::default(),
    });
    assert_range(c.visible_range(), [-9.0, -9.0, 9.0, 9.0]);
    assert_eq!(event, Some(ChartEvent::VisibleRangeChanged(c.visible_range())));

    // Zero delta leaves the window alone.
    assert!(c
        .handle_event(&ChartInputEvent::Wheel {
            position: pos(300.0, 300.0),
            delta_y: 0.0,
            modifiers: Modifiers::default(),
        })
        .is_none());
}

#[test]
fn test_drag_pans_and_clamps() {
    init_logging();
    let mut c = controller(Some(VisibleRange::new(-9.0, -9.0, 9.0, 9.0)));
    c.handle_event(&ChartInputEvent::PointerDown {
        id: 1,
        position: pos(300.0, 300.0),
    });
    c.handle_event(&ChartInputEvent::PointerMove {
        id: 1,
        position: pos(400.0, 300.0),
    });
    c.handle_event(&ChartInputEvent::PointerUp { id: 1 });

    assert_range(c.visible_range(), [-10.0, -9.0, 8.0, 9.0]);
    assert!(c.gesture_state().is_idle());
}

#[test]
fn test_horizontal_pinch_holds_vertical_axis() {
    init_logging();
    let mut c = controller(Some(VisibleRange::new(-9.0, -9.0, 9.0, 9.0)));
    c.handle_event(&ChartInputEvent::PointerDown {
        id: 1,
        position: pos(200.0, 300.0),
    });
    c.handle_event(&ChartInputEvent::PointerDown {
        id: 2,
        position: pos(400.0, 300.0),
    });
    c.handle_event(&ChartInputEvent::PointerMove {
        id: 1,
        position: pos(100.0, 300.0),
    });
    c.handle_event(&ChartInputEvent::PointerMove {
        id: 2,
        position: pos(500.0, 300.0),
    });

    assert_range(c.visible_range(), [-4.5, -9.0, 4.5, 9.0]);
    assert_eq!(c.gesture_state().tracked_ids(), vec![1, 2]);
}

#[test]
fn test_dash_texture_for_even_pattern() {
    init_logging();
    let texture = DashTextureBuilder::new()
        .with_pattern("grid", &[5.0, 5.0])
        .build();
    let entry = texture.entry("grid").expect("pattern compiled");
    assert_eq!(entry.pattern_length, 10.0);

    let row = DASH_ROW_HEIGHT / 2;
    let half = texture.width / 2;
    assert_eq!(texture.alpha_at(0, row), 255);
    assert_eq!(texture.alpha_at(half - 1, row), 255);
    assert_eq!(texture.alpha_at(half, row), 0);
    assert_eq!(texture.alpha_at(texture.width - 1, row), 0);
}

#[test]
fn test_area_with_hole_triangle_count() {
    init_logging();
    let area = FilledArea {
        contour: vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
        holes: vec![vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]],
        color: None,
    };
    let buffers = build_area_buffers(&[area]);
    // n + h + 2k - 2 for n contour points, h hole points and k holes.
    assert_eq!(buffers.triangle_count(), 8);
    assert_eq!(buffers.vertices.len(), 8);
    assert!(buffers.issues.is_empty());
}

#[test]
fn test_degenerate_paths_are_reported_and_skipped() {
    init_logging();
    let paths = vec![
        Path::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]),
        Path::new(vec![5.0], vec![5.0]),
        Path::new(vec![0.0, 1.0], vec![0.0, f64::NAN]),
        Path::new(vec![3.0, 4.0], vec![3.0, 4.0]),
    ];
    let buffers = build_path_buffers(&paths, &RenderTuning::default());

    assert_eq!(buffers.path_count, 2);
    assert_eq!(
        buffers.issues,
        vec![
            GeometryIssue::TooFewPoints {
                index: 1,
                len: 1,
                min: 2
            },
            GeometryIssue::NonFiniteCoordinate { index: 2, point: 1 },
        ]
    );
    // Both surviving paths feed the histogram: three points and two points.
    assert_eq!(buffers.vertices.iter().map(|v| v.point_index).max(), Some(4));
}

#[test]
fn test_depth_and_draw_order_follow_z_order() {
    init_logging();
    let z = [1.0, -1.0, 0.0, 5.0];
    let order = drawables::draw_order(&z);
    assert_eq!(order, vec![1, 2, 0, 3]);

    let depths: Vec<f32> = order.iter().map(|&i| depth_from_z_order(z[i])).collect();
    assert!(depths.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_marker_atlas_builds_off_frame() {
    init_logging();
    let markers = vec![
        ("dot".to_string(), MarkerSpec::new(MarkerShape::Circle, 8.0, 1.0)),
        ("star".to_string(), MarkerSpec::new(MarkerShape::Star, 20.0, 2.0)),
    ];
    let (task, mut pending) = request_marker_atlas(markers);
    assert!(matches!(pending.poll(), AtlasPoll::Pending));

    futures::executor::block_on(task);
    let atlas = match pending.poll() {
        AtlasPoll::Ready(atlas) => atlas,
        other => panic!("atlas not ready: {:?}", other),
    };

    let dot = atlas.uv("dot").expect("dot packed");
    let star = atlas.uv("star").expect("star packed");
    assert!(dot.u2 > dot.u1 && dot.v2 > dot.v1);
    let disjoint = dot.u2 <= star.u1 || star.u2 <= dot.u1 || dot.v2 <= star.v1 || star.v2 <= dot.v1;
    assert!(disjoint);
    assert_eq!(atlas.pixels.len(), (atlas.width * atlas.height * 4) as usize);
}

#[test]
fn test_marker_atlas_packs_every_shape() {
    init_logging();
    let markers: Vec<(String, MarkerSpec)> = MarkerShape::ALL
        .iter()
        .map(|&shape| (shape.name().to_string(), MarkerSpec::new(shape, 16.0, 1.5)))
        .collect();
    let (task, mut pending) = request_marker_atlas(markers);
    futures::executor::block_on(task);
    let atlas = match pending.poll() {
        AtlasPoll::Ready(atlas) => atlas,
        other => panic!("atlas not ready: {:?}", other),
    };

    let uvs: Vec<_> = MarkerShape::ALL
        .iter()
        .map(|shape| atlas.uv(shape.name()).expect("every shape packed"))
        .collect();
    assert_eq!(uvs.len(), 22);
    for (i, a) in uvs.iter().enumerate() {
        for b in &uvs[i + 1..] {
            assert!(a.u2 <= b.u1 || b.u2 <= a.u1 || a.v2 <= b.v1 || b.v2 <= a.v1);
        }
    }
}

#[test]
fn test_grid_follows_zoomed_window() {
    init_logging();
    let mut c = controller(None);
    for _ in 0..3 {
        c.handle_event(&ChartInputEvent::Wheel {
            position: pos(150.0, 450.0),
            delta_y: -120.0,
            modifiers: Modifiers::default(),
        });
    }
    let visible = c.visible_range();
    let lines = grid_lines(&DecimalTicks, &visible);
    assert!(!lines.is_empty());
    for line in &lines {
        if line.dy != 0.0 {
            assert!(line.x >= visible.x1 && line.x <= visible.x2);
        } else {
            assert!(line.y >= visible.y1 && line.y <= visible.y2);
        }
    }
}

fn random_event(rng: &mut StdRng, down: &mut Vec<i64>) -> ChartInputEvent {
    // Positions reach past the canvas so gestures also start outside the region.
    let position = pos(rng.gen_range(-50.0..650.0), rng.gen_range(-50.0..650.0));
    match rng.gen_range(0..7) {
        0 => ChartInputEvent::Wheel {
            position,
            delta_y: rng.gen_range(-400.0..400.0),
            modifiers: Modifiers {
                ctrl: rng.gen_bool(0.2),
                shift: rng.gen_bool(0.2),
            },
        },
        1 if down.len() < 3 => {
            let id: i64 = rng.gen_range(1..5);
            if !down.contains(&id) {
                down.push(id);
            }
            ChartInputEvent::PointerDown { id, position }
        }
        2 | 3 if !down.is_empty() => ChartInputEvent::PointerMove {
            id: down[rng.gen_range(0..down.len())],
            position,
        },
        4 if !down.is_empty() => ChartInputEvent::PointerUp {
            id: down.remove(rng.gen_range(0..down.len())),
        },
        5 => ChartInputEvent::Click { position },
        _ => ChartInputEvent::PointerMove {
            id: rng.gen_range(1..5),
            position,
        },
    }
}

#[test]
fn test_visible_range_stays_inside_data_range_for_any_gesture_sequence() {
    init_logging();
    let data = DataRange::new(-10.0, -10.0, 10.0, 10.0);
    for (seed, max_zoom) in [(1u64, None), (7, Some([0.5, 0.5])), (42, Some([3.0, 0.01]))] {
        let mut config = ChartCanvasConfig::new(data);
        if let Some([w, h]) = max_zoom {
            config = config.with_max_zoom(w, h);
        }
        let mut c = ViewportController::new(&config);
        c.handle_event(&ChartInputEvent::Resize {
            size: CanvasSize::new(600, 600),
        });

        let mut rng = StdRng::seed_from_u64(seed);
        let mut down = Vec::new();
        for step in 0..5000 {
            let event = random_event(&mut rng, &mut down);
            c.handle_event(&event);
            let visible = c.visible_range();
            let edges: [f64; 4] = visible.into();
            assert!(edges.iter().all(|v| v.is_finite()), "seed {} step {}: {:?}", seed, step, visible);
            assert!(
                data.contains(&visible),
                "seed {} step {} after {:?}: {:?}",
                seed,
                step,
                event,
                visible
            );
        }
    }
}
