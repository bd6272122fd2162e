use motion_core::{
    load_settings, normalize_settings, save_settings, DashboardSettings, SettingsError,
};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(&dir.path().join("motion.toml")).expect("load");
    assert_eq!(settings, DashboardSettings::default());
    assert_eq!(settings.sampling.cadence_ms, 100);
    assert_eq!(settings.collector.base_url, "http://localhost:3000");
    assert_eq!(settings.collector.namespace, "/stream");
    assert_eq!(settings.chart.width, 320.0);
}

#[test]
fn save_then_load_preserves_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("motion.toml");
    let mut settings = DashboardSettings::default();
    settings.sampling.cadence_ms = 500;
    settings.collector.socket_endpoint = "http://192.168.1.20:3000/stream".to_string();
    settings.chart.padding = 8.0;

    save_settings(&path, &settings).expect("save");
    let loaded = load_settings(&path).expect("load");
    assert_eq!(loaded, settings);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("motion.toml");
    std::fs::write(
        &path,
        "[collector]\nsocket_endpoint = \"  http://collector:3000  \"\n",
    )
    .expect("write");

    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.collector.socket_endpoint, "http://collector:3000");
    assert_eq!(settings.sampling.cadence_ms, 100);
    assert_eq!(settings.chart.height, 160.0);
}

#[test]
fn normalize_clamps_cadence_and_chart() {
    let mut settings = DashboardSettings::default();
    settings.sampling.cadence_ms = 1;
    settings.chart.width = -5.0;
    settings.chart.padding = f64::NAN;
    settings.collector.namespace = "live/".to_string();
    settings.collector.base_url = "http://collector:3000/".to_string();

    let settings = normalize_settings(settings).expect("normalize");
    assert_eq!(settings.sampling.cadence_ms, 16);
    assert_eq!(settings.chart.width, 0.0);
    assert_eq!(settings.chart.padding, 0.0);
    assert_eq!(settings.collector.namespace, "/live");
    assert_eq!(settings.collector.base_url, "http://collector:3000");

    let mut slow = DashboardSettings::default();
    slow.sampling.cadence_ms = 60_000;
    assert_eq!(normalize_settings(slow).expect("normalize").sampling.cadence_ms, 5_000);
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut settings = DashboardSettings::default();
    settings.collector.base_url = "ftp://collector".to_string();
    assert!(matches!(
        normalize_settings(settings),
        Err(SettingsError::Invalid(_))
    ));
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("motion.toml");
    std::fs::write(&path, "[sampling\ncadence_ms = ").expect("write");
    let err = load_settings(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("motion.toml"));
}
