use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use telemetry::{EchoSample, RollingBuffer, Sample};

/// Drawing surface a trend is projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartSurface {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl ChartSurface {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    pub fn inner_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    pub fn inner_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }

    fn is_drawable(&self) -> bool {
        let (w, h) = (self.inner_width(), self.inner_height());
        w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 && self.padding.is_finite()
    }
}

impl Default for ChartSurface {
    fn default() -> Self {
        Self::new(320.0, 160.0, 12.0)
    }
}

/// One named value sequence, aligned index-for-index with the timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl ChannelSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub channel: String,
    pub points: Vec<Point>,
}

impl Polyline {
    /// SVG path data: `M x y L x y ...`.
    pub fn svg_path(&self) -> String {
        let mut path = String::new();
        for (idx, point) in self.points.iter().enumerate() {
            if idx > 0 {
                path.push(' ');
            }
            let command = if idx == 0 { 'M' } else { 'L' };
            let _ = write!(path, "{command} {:.2} {:.2}", point.x, point.y);
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendChart {
    pub polylines: Vec<Polyline>,
    pub min_value: f64,
    pub max_value: f64,
}

/// Projects time-stamped channel values onto `surface`.
///
/// Returns `None` when there are fewer than two timestamps, the padded
/// surface has no area, no channel has exactly one value per timestamp, or
/// no qualifying channel holds a finite value. Larger values plot higher.
/// Vertices with a non-finite coordinate are dropped; the line joins the
/// surrounding vertices.
pub fn map_trend(
    timestamps: &[f64],
    channels: &[ChannelSeries],
    surface: &ChartSurface,
) -> Option<TrendChart> {
    let n = timestamps.len();
    if n < 2 || !surface.is_drawable() {
        return None;
    }
    let qualifying: Vec<&ChannelSeries> = channels
        .iter()
        .filter(|channel| channel.values.len() == n)
        .collect();
    if qualifying.is_empty() {
        return None;
    }

    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;
    for value in qualifying
        .iter()
        .flat_map(|channel| channel.values.iter())
        .filter(|value| value.is_finite())
    {
        min_value = min_value.min(*value);
        max_value = max_value.max(*value);
    }
    if !min_value.is_finite() || !max_value.is_finite() {
        return None;
    }

    let mut range = max_value - min_value;
    if range == 0.0 {
        range = max_value.abs().max(1.0);
    }
    let first = timestamps[0];
    let mut time_range = timestamps[n - 1] - first;
    if time_range == 0.0 {
        time_range = 1.0;
    }

    let inner_width = surface.inner_width();
    let inner_height = surface.inner_height();
    let polylines = qualifying
        .into_iter()
        .filter_map(|channel| {
            let points: Vec<Point> = timestamps
                .iter()
                .zip(&channel.values)
                .map(|(timestamp, value)| Point {
                    x: surface.padding + (timestamp - first) / time_range * inner_width,
                    y: surface.padding + (1.0 - (value - min_value) / range) * inner_height,
                })
                .filter(|point| point.x.is_finite() && point.y.is_finite())
                .collect();
            if points.is_empty() {
                None
            } else {
                Some(Polyline {
                    channel: channel.name.clone(),
                    points,
                })
            }
        })
        .collect();

    Some(TrendChart {
        polylines,
        min_value,
        max_value,
    })
}

/// Per-axis trend of a local sensor history.
pub fn sample_trend(buffer: &RollingBuffer<Sample>, surface: &ChartSurface) -> Option<TrendChart> {
    let timestamps: Vec<f64> = buffer.iter().map(|s| s.timestamp as f64).collect();
    let channels = [
        ChannelSeries::new("x", buffer.iter().map(|s| s.x).collect()),
        ChannelSeries::new("y", buffer.iter().map(|s| s.y).collect()),
        ChannelSeries::new("z", buffer.iter().map(|s| s.z).collect()),
    ];
    map_trend(&timestamps, &channels, surface)
}

/// Magnitude trend of the server-echo history.
pub fn echo_trend(
    buffer: &RollingBuffer<EchoSample>,
    surface: &ChartSurface,
) -> Option<TrendChart> {
    let timestamps: Vec<f64> = buffer.iter().map(|s| s.timestamp).collect();
    let magnitude = ChannelSeries::new("magnitude", buffer.iter().map(|s| s.magnitude).collect());
    map_trend(&timestamps, &[magnitude], surface)
}
