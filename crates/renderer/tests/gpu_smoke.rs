//! Offscreen rendering smoke test. Needs a GPU adapter, so it is ignored by
//! default: `cargo test -p chart-canvas-renderer -- --ignored`.

use chart_canvas_config::ChartCanvasConfig;
use chart_canvas_renderer::{
    ChartSurface, FilledArea, FilledAreaGroup, FilledAreaStyle, GpuContext, Line, LineGroup,
    LineStyle, Path, PathStyle, PointMarkerGroup, PointMarkerStyle, PointSet, StyledPathGroup,
    GRID_GROUP,
};
use chart_canvas_shared::{CanvasSize, ChartInputEvent, DataRange, GeometryIssue};

const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[test]
#[ignore = "requires a GPU adapter"]
fn test_surface_renders_every_group_offscreen() {
    let _ = env_logger::builder().is_test(true).try_init();

    let ctx = match pollster::block_on(GpuContext::headless(FORMAT)) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::warn!("skipping: {}", e);
            return;
        }
    };
    let config = ChartCanvasConfig::new(DataRange::new(0.0, 0.0, 10.0, 10.0));
    let mut surface = ChartSurface::new(ctx.clone(), &config);
    assert_eq!(surface.group_names(), vec![GRID_GROUP]);

    surface.add_group(
        FilledAreaGroup::new(&ctx, "areas", FilledAreaStyle::default()).expect("area group"),
    );
    surface.add_group(
        StyledPathGroup::new(&ctx, "paths", PathStyle::default(), &config.rendering)
            .expect("path group"),
    );
    surface.add_group(
        LineGroup::new(
            &ctx,
            "lines",
            LineStyle::default().with_default_dash(&config.rendering),
        )
        .expect("line group"),
    );
    surface.add_group(
        PointMarkerGroup::new(&ctx, "points", PointMarkerStyle::default()).expect("point group"),
    );

    surface
        .group_mut::<FilledAreaGroup>("areas")
        .expect("areas registered")
        .set_areas(vec![FilledArea {
            contour: vec![[1.0, 1.0], [9.0, 1.0], [5.0, 9.0]],
            ..Default::default()
        }]);
    surface
        .group_mut::<StyledPathGroup>("paths")
        .expect("paths registered")
        .set_paths(vec![
            Path::new(vec![0.0, 5.0, 10.0], vec![0.0, 8.0, 2.0]),
            Path::new(vec![1.0], vec![1.0]),
        ]);
    surface
        .group_mut::<LineGroup>("lines")
        .expect("lines registered")
        .set_lines(vec![Line::horizontal(5.0), Line::vertical(2.5)]);
    surface
        .group_mut::<PointMarkerGroup>("points")
        .expect("points registered")
        .set_points(vec![PointSet {
            x: vec![2.0, 4.0, 6.0],
            y: vec![3.0, 5.0, 7.0],
            ..Default::default()
        }]);
    assert!(surface.group_mut::<LineGroup>("points").is_none());

    surface.handle_event(&ChartInputEvent::Resize {
        size: CanvasSize::new(64, 64),
    });

    let target = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("smoke_target"),
        size: wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    // The marker atlas finishes between the first and second frame.
    for _ in 0..2 {
        surface.render(&view).expect("frame rendered");
    }
    let _ = ctx.device.poll(wgpu::Maintain::Wait);

    let issues = surface.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].0, "paths");
    assert!(matches!(
        issues[0].1,
        [GeometryIssue::TooFewPoints { index: 1, .. }]
    ));
}
