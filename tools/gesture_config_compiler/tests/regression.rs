use std::path::PathBuf;

use gesture_config_compiler::{
    generate_from_path, parse_gesture_file, parse_gesture_str, render_generated_config,
    validate_config, ConfigCompilerError,
};

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("missing tools dir")
        .parent()
        .expect("missing repo root")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn repo_config_compiles() {
    let config = repo_root().join("config/gesture.toml");
    let generated = generate_from_path(&config).expect("repo config should compile");
    assert!(generated.contains("pub const DEFAULT_GESTURE_TIMING: GestureTiming"));
}

#[test]
fn default_fixture_renders_every_field() {
    let config = parse_gesture_file(&fixture("valid_default.toml")).expect("fixture should parse");
    validate_config(&config).expect("fixture should validate");
    let rendered = render_generated_config(&config);

    for needle in [
        "pattern_max_period: Duration::from_millis(60000),",
        "swipe_max_interval: Duration::from_millis(200),",
        "swipe_min_period: Duration::from_millis(5000),",
        "swipe_max_period: Duration::from_millis(15000),",
        "target_swipe_count: 4,",
    ] {
        assert!(
            rendered.contains(needle),
            "rendered output missing `{needle}`"
        );
    }
}

#[test]
fn generation_is_deterministic_for_same_input() {
    let config = fixture("valid_quick.toml");
    let first = generate_from_path(&config).expect("first generation failed");
    let second = generate_from_path(&config).expect("second generation failed");
    assert_eq!(first, second);
    assert!(first.contains("target_swipe_count: 2,"));
}

#[test]
fn semantic_validation_rejects_invalid_ranges() {
    let cases = [
        (
            "invalid/interval_zero.toml",
            "swipe.max_interval_ms must be > 0",
        ),
        (
            "invalid/min_le_interval.toml",
            "swipe.min_period_ms must be > swipe.max_interval_ms",
        ),
        (
            "invalid/max_lt_min.toml",
            "swipe.max_period_ms must be >= swipe.min_period_ms",
        ),
        (
            "invalid/zero_target.toml",
            "pattern.target_swipe_count must be >= 1",
        ),
        (
            "invalid/pattern_too_short.toml",
            "pattern.max_period_ms must be >= 35000",
        ),
    ];

    for (fixture_name, expected_msg) in cases {
        let path = fixture(fixture_name);
        let err = generate_from_path(&path).expect_err("fixture should fail validation");
        match err {
            ConfigCompilerError::Validation(msg) => {
                assert!(
                    msg.contains(expected_msg),
                    "expected validation message containing `{expected_msg}`, got `{msg}`"
                );
            }
            other => panic!("expected validation error, got {other}"),
        }
    }
}

#[test]
fn parse_errors_are_reported_for_schema_mismatches() {
    for fixture_name in ["invalid/missing_swipe.toml", "invalid/unknown_field.toml"] {
        let err = generate_from_path(&fixture(fixture_name))
            .expect_err("fixture should fail parsing");
        match err {
            ConfigCompilerError::Parse(msg) => {
                assert!(
                    msg.contains(fixture_name),
                    "parse error should name the file, got `{msg}`"
                );
            }
            other => panic!("expected parse error, got {other}"),
        }
    }
}

#[test]
fn target_count_out_of_range_is_a_parse_error() {
    let raw = "[pattern]\nmax_period_ms = 60000\ntarget_swipe_count = 300\n\n\
               [swipe]\nmax_interval_ms = 200\nmin_period_ms = 5000\nmax_period_ms = 15000\n";
    let err = parse_gesture_str(raw).expect_err("count above u8 should not parse");
    assert!(matches!(err, ConfigCompilerError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = generate_from_path(&fixture("does_not_exist.toml")).expect_err("missing file");
    assert!(matches!(err, ConfigCompilerError::Io(_)));
}
