use sandbox_forecast::forecast::{build_cone, horizon_forecast};
use sandbox_forecast::model::{Direction, Horizon};

fn assert_monotone(levels: [f64; 5]) {
    for pair in levels.windows(2) {
        assert!(pair[0] >= pair[1], "levels not ordered: {levels:?}");
    }
}

#[test]
fn reference_cone_values() {
    let cone = build_cone(500.0, 0.01, 0.02 * 0.02, Horizon::H1);
    assert!((cone.expected_price - 505.025).abs() < 0.01);
    assert!((cone.median - cone.expected_price).abs() < f64::EPSILON);
    // 500·e^(0.01 ± 1.28·0.02)
    assert!((cone.upper80 - 518.12).abs() < 0.01);
    assert!((cone.lower20 - 492.26).abs() < 0.01);
    assert!((cone.upper60 - 500.0 * (0.01f64 + 0.84 * 0.02).exp()).abs() < 1e-9);
    assert!((cone.lower40 - 500.0 * (0.01f64 - 0.84 * 0.02).exp()).abs() < 1e-9);
    assert!((cone.directional_score - 0.5).abs() < 1e-12);
    assert_monotone(cone.levels());
}

#[test]
fn zero_variance_gives_degenerate_cone() {
    let cone = build_cone(500.0, 0.0, 0.0, Horizon::M5);
    assert!(cone.is_degenerate());
    assert_eq!(cone.directional_score, 0.0);
    for level in cone.levels() {
        assert_eq!(level, 500.0);
    }

    let drifted = build_cone(500.0, 0.01, 0.0, Horizon::M5);
    assert_eq!(drifted.directional_score, 0.0);
    assert!(drifted.levels().iter().all(|l| *l == drifted.expected_price));
}

#[test]
fn levels_are_monotone_over_a_grid() {
    for mean in [-0.05, -0.01, 0.0, 0.003, 0.05] {
        for variance in [0.0, 1e-12, 1e-6, 4e-4, 0.01, f64::NAN] {
            assert_monotone(build_cone(432.1, mean, variance, Horizon::D1).levels());
        }
    }
}

#[test]
fn direction_and_targets_follow_score_sign() {
    let bull = horizon_forecast(build_cone(500.0, 0.01, 4e-4, Horizon::H1), 0.1);
    assert_eq!(bull.direction, Direction::Bullish);
    assert_eq!(bull.target, bull.cone.upper60);
    assert_eq!(bull.stop_loss, bull.cone.lower40);
    assert!(bull.risk_reward > 1.0);

    let bear = horizon_forecast(build_cone(500.0, -0.01, 4e-4, Horizon::H1), 0.1);
    assert_eq!(bear.direction, Direction::Bearish);
    assert_eq!(bear.target, bear.cone.lower40);
    assert_eq!(bear.stop_loss, bear.cone.upper60);

    let flat = horizon_forecast(build_cone(500.0, 0.001, 4e-4, Horizon::H1), 0.1);
    assert_eq!(flat.direction, Direction::Neutral);
}

#[test]
fn band_percentile_spans_outer_band() {
    let cone = build_cone(500.0, 0.0, 4e-4, Horizon::H1);
    assert!((cone.band_percentile(cone.lower20)).abs() < 1e-12);
    assert!((cone.band_percentile(cone.upper80) - 1.0).abs() < 1e-12);
    assert!(cone.band_percentile(cone.upper80 + 10.0) > 1.0);
}
