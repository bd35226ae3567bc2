use fireworks_show::firework_engine::config::{RocketConfig, ShowConfig};
use std::io::Write;

fn write_config(dir: &tempfile::TempDir, name: &str, text: &str) -> String {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_load_partial_config_keeps_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp_dir,
        "show.toml",
        r#"
spawn_interval_ms = 1500
evict_cleaned_up = false
seed = 7

[rocket]
explosion_period_ms = 2500
particles_per_explosion = 1000
"#,
    );

    let config = ShowConfig::from_file(&path).unwrap();
    let defaults = ShowConfig::default();

    assert_eq!(config.spawn_interval_ms, 1500);
    assert!(!config.evict_cleaned_up);
    assert_eq!(config.seed, Some(7));
    assert_eq!(config.rocket.explosion_period_ms, 2500);
    assert_eq!(config.rocket.particles_per_explosion, 1000);

    // Champs absents : valeurs par défaut
    assert_eq!(config.gravity, defaults.gravity);
    assert_eq!(config.spawn_direction, defaults.spawn_direction);
    assert_eq!(config.rocket.flight_duration_ms, 2000);
    assert_eq!(config.rocket.light_fade_factor, 1.0);
}

#[test]
fn test_empty_file_gives_default_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(&temp_dir, "empty.toml", "");

    let config = ShowConfig::from_file(&path).unwrap();

    assert_eq!(config.spawn_interval_ms, 3000);
    assert!(config.timer_enabled);
    assert_eq!(config.seed, None);
}

#[test]
fn test_invalid_values_are_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp_dir,
        "bad.toml",
        r#"
[rocket]
trail_slow_fraction = 0.9
trail_cutoff_fraction = 0.5
"#,
    );

    assert!(ShowConfig::from_file(&path).is_err());
}

#[test]
fn test_malformed_toml_is_an_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(&temp_dir, "broken.toml", "spawn_interval_ms = [");

    assert!(ShowConfig::from_file(&path).is_err());
}

#[test]
fn test_missing_file_falls_back_to_default() {
    let result = ShowConfig::from_file("/nonexistent/show.toml");
    assert!(result.is_err());

    let config = result.unwrap_or_default();
    assert_eq!(config.spawn_interval_ms, ShowConfig::default().spawn_interval_ms);
}

#[test]
fn test_shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config/show.toml");
    let config = ShowConfig::from_file(path).unwrap();

    assert!(config.validate().is_ok());
    assert_eq!(
        config.rocket.particles_per_explosion,
        RocketConfig::default().particles_per_explosion
    );
}

#[test]
fn test_negative_or_nan_amplitudes_are_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    for (i, line) in [
        "template_tilt_x = -0.3",
        "template_tilt_y = nan",
        "template_tilt_z = inf",
        "trail_slow_emit_rate = -1.0",
        "explosion_point_size = nan",
    ]
    .iter()
    .enumerate()
    {
        let text = format!("[rocket]\n{}\n", line);
        let path = write_config(&temp_dir, &format!("bad_{}.toml", i), &text);
        assert!(ShowConfig::from_file(&path).is_err(), "accepted: {}", line);
    }
}

#[test]
fn test_zero_tilt_is_accepted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &temp_dir,
        "flat.toml",
        "[rocket]\ntemplate_tilt_x = 0.0\ntemplate_tilt_y = 0.0\ntemplate_tilt_z = 0.0\n",
    );

    let config = ShowConfig::from_file(&path).unwrap();
    assert_eq!(config.rocket.template_tilt_x, 0.0);
}
