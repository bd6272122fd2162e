use crate::trend::{ChartSurface, TrendChart};
use std::fmt::Write as _;

fn stroke_for(channel: &str) -> &'static str {
    match channel {
        "x" => "#ef476f",
        "y" => "#06d6a0",
        "z" => "#118ab2",
        "magnitude" => "#ffd166",
        _ => "#8d99ae",
    }
}

/// Renders a mapped trend as a standalone SVG document: one `<path>` per
/// polyline and the observed max/min as labels in the top/bottom left.
pub fn render_svg(chart: &TrendChart, surface: &ChartSurface) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = surface.width,
        h = surface.height
    );
    for polyline in &chart.polylines {
        let _ = writeln!(
            svg,
            r#"  <path data-channel="{}" d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            polyline.channel,
            polyline.svg_path(),
            stroke_for(&polyline.channel)
        );
    }
    let _ = writeln!(
        svg,
        r#"  <text x="{:.2}" y="{:.2}" font-size="10">{:.2}</text>"#,
        surface.padding,
        surface.padding,
        chart.max_value
    );
    let _ = writeln!(
        svg,
        r#"  <text x="{:.2}" y="{:.2}" font-size="10">{:.2}</text>"#,
        surface.padding,
        surface.height - surface.padding,
        chart.min_value
    );
    svg.push_str("</svg>\n");
    svg
}
