use motion_core::{
    echo_trend, map_trend, render_svg, sample_trend, ChannelSeries, ChartSurface, Point,
};
use telemetry::{normalize, EchoSample, Reading, RollingBuffer};

fn surface() -> ChartSurface {
    ChartSurface::new(320.0, 160.0, 12.0)
}

#[test]
fn single_channel_spans_inner_corners() {
    let chart = map_trend(
        &[0.0, 1000.0],
        &[ChannelSeries::new("magnitude", vec![0.0, 10.0])],
        &surface(),
    )
    .expect("chart");

    assert_eq!(chart.polylines.len(), 1);
    assert_eq!(chart.min_value, 0.0);
    assert_eq!(chart.max_value, 10.0);
    let points = &chart.polylines[0].points;
    assert_eq!(points[0], Point { x: 12.0, y: 148.0 });
    assert_eq!(points[1], Point { x: 308.0, y: 12.0 });
}

#[test]
fn rejects_degenerate_input() {
    let one = ChannelSeries::new("x", vec![1.0]);
    assert!(map_trend(&[0.0], &[one], &surface()).is_none());

    let misaligned = ChannelSeries::new("x", vec![1.0, 2.0, 3.0]);
    assert!(map_trend(&[0.0, 1.0], &[misaligned], &surface()).is_none());

    let values = ChannelSeries::new("x", vec![1.0, 2.0]);
    let flat = ChartSurface::new(24.0, 160.0, 12.0);
    assert!(map_trend(&[0.0, 1.0], &[values.clone()], &flat).is_none());

    let empty = ChartSurface::new(0.0, 0.0, 0.0);
    assert!(map_trend(&[0.0, 1.0], &[values], &empty).is_none());

    let nan = ChannelSeries::new("x", vec![f64::NAN, f64::NAN]);
    assert!(map_trend(&[0.0, 1.0], &[nan], &surface()).is_none());
}

#[test]
fn flat_series_uses_synthetic_range() {
    let chart = map_trend(
        &[0.0, 100.0, 200.0],
        &[ChannelSeries::new("z", vec![9.8, 9.8, 9.8])],
        &surface(),
    )
    .expect("chart");
    // range becomes 9.8, so every vertex sits on the bottom edge.
    for point in &chart.polylines[0].points {
        assert!((point.y - 148.0).abs() < 1e-9);
    }
}

#[test]
fn zero_time_range_does_not_divide_by_zero() {
    let chart = map_trend(
        &[500.0, 500.0],
        &[ChannelSeries::new("x", vec![1.0, 2.0])],
        &surface(),
    )
    .expect("chart");
    let points = &chart.polylines[0].points;
    assert_eq!(points[0].x, 12.0);
    assert_eq!(points[1].x, 12.0);
}

#[test]
fn non_finite_vertices_are_skipped() {
    let chart = map_trend(
        &[0.0, 1.0, 2.0],
        &[ChannelSeries::new("x", vec![0.0, f64::NAN, 4.0])],
        &surface(),
    )
    .expect("chart");
    let points = &chart.polylines[0].points;
    assert_eq!(points.len(), 2);
    assert_eq!(points[0], Point { x: 12.0, y: 148.0 });
    assert_eq!(points[1], Point { x: 308.0, y: 12.0 });
}

#[test]
fn misaligned_channels_are_left_out_of_range() {
    let chart = map_trend(
        &[0.0, 1.0],
        &[
            ChannelSeries::new("x", vec![0.0, 1.0]),
            ChannelSeries::new("y", vec![100.0]),
        ],
        &surface(),
    )
    .expect("chart");
    assert_eq!(chart.polylines.len(), 1);
    assert_eq!(chart.polylines[0].channel, "x");
    assert_eq!(chart.max_value, 1.0);
}

#[test]
fn channel_without_valid_points_contributes_nothing() {
    let chart = map_trend(
        &[0.0, 1.0],
        &[
            ChannelSeries::new("x", vec![0.0, 1.0]),
            ChannelSeries::new("y", vec![f64::INFINITY, f64::NAN]),
        ],
        &surface(),
    )
    .expect("chart");
    assert_eq!(chart.polylines.len(), 1);
}

#[test]
fn svg_path_formats_move_then_lines() {
    let chart = map_trend(
        &[0.0, 500.0, 1000.0],
        &[ChannelSeries::new("x", vec![0.0, 5.0, 10.0])],
        &surface(),
    )
    .expect("chart");
    assert_eq!(
        chart.polylines[0].svg_path(),
        "M 12.00 148.00 L 160.00 80.00 L 308.00 12.00"
    );
}

#[test]
fn sample_trend_draws_three_axes() {
    let mut buffer = RollingBuffer::new(10);
    buffer.append(normalize(&Reading::new(0.0, 1.0, 9.8, 1_000)));
    buffer.append(normalize(&Reading::new(0.5, 1.0, 9.6, 1_100)));
    let chart = sample_trend(&buffer, &surface()).expect("chart");
    let names: Vec<&str> = chart.polylines.iter().map(|p| p.channel.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    assert_eq!(chart.min_value, 0.0);
    assert_eq!(chart.max_value, 9.8);
}

#[test]
fn echo_trend_needs_two_entries() {
    let mut buffer = RollingBuffer::new(5);
    buffer.append(EchoSample {
        timestamp: 1_000.0,
        magnitude: 9.8,
    });
    assert!(echo_trend(&buffer, &surface()).is_none());
    buffer.append(EchoSample {
        timestamp: 1_100.0,
        magnitude: 10.2,
    });
    let chart = echo_trend(&buffer, &surface()).expect("chart");
    assert_eq!(chart.polylines[0].channel, "magnitude");
}

#[test]
fn render_svg_emits_one_path_per_polyline() {
    let chart = map_trend(
        &[0.0, 1000.0],
        &[
            ChannelSeries::new("x", vec![0.0, 10.0]),
            ChannelSeries::new("y", vec![10.0, 0.0]),
        ],
        &surface(),
    )
    .expect("chart");
    let svg = render_svg(&chart, &surface());
    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<path").count(), 2);
    assert!(svg.contains(r#"d="M 12.00 148.00 L 308.00 12.00""#));
    assert!(svg.contains(">10.00</text>"));
    assert!(svg.contains(">0.00</text>"));
}
