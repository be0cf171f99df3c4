//! Loading configuration, catalogs and analysis files from disk.

use std::fs;

use ad_format_adapter::analysis::{Device, StaticBackend};
use ad_format_adapter::config::AdapterConfig;
use ad_format_adapter::error::ErrorKind;
use ad_format_adapter::{FormatCatalog, RendererKind};
use tempfile::TempDir;

#[test]
fn config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("adfmt.json");
    fs::write(
        &path,
        r#"{
            "renderer": "generative",
            "max_concurrency": 2,
            "sampler": {"max_colors": 3},
            "overlay": {"bottom_margin": 12, "opacity": 0.5},
            "thresholds": {"very_wide_min": 5.0},
            "device": {"preferred": "cpu", "allow_cpu_fallback": false}
        }"#,
    )
    .unwrap();

    let config = AdapterConfig::from_path(&path).unwrap();
    assert_eq!(config.renderer, RendererKind::Generative);
    assert_eq!(config.max_concurrency, 2);
    assert_eq!(config.sampler.max_colors, 3);
    assert_eq!(config.sampler.canvas_side, 100);
    assert_eq!(config.overlay.bottom_margin, 12);
    assert_eq!(config.overlay.max_font_px, 24);
    assert_eq!(config.thresholds.very_wide_min, 5.0);
    assert_eq!(config.thresholds.near_square_max, 1.5);
    assert_eq!(config.device.preferred, Device::Cpu);
    assert!(config.catalog.is_none());
}

#[test]
fn invalid_config_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"overlay": {"max_width_ratio": 0.0}}"#).unwrap();
    let err = AdapterConfig::from_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("max_width_ratio"));

    fs::write(&path, "{ not json").unwrap();
    assert!(AdapterConfig::from_path(&path).is_err());
}

#[test]
fn missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = AdapterConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn catalog_file_preserves_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"[{"width": 970, "height": 250, "display_name": "Billboard"},
            {"width": 320, "height": 50, "display_name": "Mobile Banner"}]"#,
    )
    .unwrap();

    let catalog = FormatCatalog::from_path(&path).unwrap();
    let names: Vec<&str> = catalog.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, ["Billboard", "Mobile Banner"]);
    assert_eq!(catalog.formats()[1].ratio_label(), "6.40:1");
}

#[test]
fn duplicate_catalog_keys_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    fs::write(
        &path,
        r#"[{"width": 300, "height": 250, "display_name": "A"},
            {"width": 300, "height": 250, "display_name": "B"}]"#,
    )
    .unwrap();
    let err = FormatCatalog::from_path(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn analysis_file_loads_static_backend() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("analysis.json");
    fs::write(
        &path,
        r#"{"objects": [{"label": "stop sign", "score": 0.95,
                         "box": {"xmin": 10, "ymin": 10, "xmax": 90, "ymax": 90}}],
            "classifications": [{"label": "minimal layout", "score": 0.8}]}"#,
    )
    .unwrap();
    assert!(StaticBackend::from_path(&path).is_ok());
    assert!(StaticBackend::from_path(dir.path().join("nope.json")).is_err());
}
