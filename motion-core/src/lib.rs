pub mod settings;
pub mod svg;
pub mod trend;
pub mod validation;

pub use settings::{
    load_settings, normalize_settings, save_settings, settings_to_toml, ChartSettings,
    CollectorSettings, DashboardSettings, SamplingSettings, SettingsError, LOW_POWER_CADENCE_MS,
};
pub use svg::render_svg;
pub use trend::{
    echo_trend, map_trend, sample_trend, ChannelSeries, ChartSurface, Point, Polyline, TrendChart,
};
pub use validation::Validator;
