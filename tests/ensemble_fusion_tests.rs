use sandbox_forecast::config::EnsembleConfig;
use sandbox_forecast::ensemble::{breakout_probability, EnsembleFusion, Member, MemberContext};
use sandbox_forecast::features::{Feature, FeatureSet};
use sandbox_forecast::model::{Horizon, Regime, RegimeBelief};

fn ctx<'a>(
    features: &'a FeatureSet,
    belief: &'a RegimeBelief,
    horizon: Horizon,
) -> MemberContext<'a> {
    MemberContext {
        features,
        belief,
        horizon,
        bar_minutes: 5.0,
        min_sigma: 1e-4,
    }
}

fn busy_features() -> FeatureSet {
    FeatureSet::from_pairs([
        (Feature::RealizedVol, 0.002),
        (Feature::VwapDistance, 0.004),
        (Feature::Momentum, 0.0005),
        (Feature::TrendStrength, 0.7),
        (Feature::VolumeSurge, 2.0),
        (Feature::Skew, 0.04),
        (Feature::DarkPoolRatio, -0.3),
        (Feature::Gex, -1e9),
    ])
}

#[test]
fn skill_update_matches_documented_ema() {
    let mut fusion = EnsembleFusion::new(EnsembleConfig::default());
    assert!((fusion.skill(Member::Range, Horizon::H1) - 0.5).abs() < f64::EPSILON);
    let next = fusion.update_skill(Member::Range, Horizon::H1, 0.9);
    assert!((next - 0.62).abs() < 1e-12);
    assert!((fusion.skill(Member::Range, Horizon::H1) - 0.62).abs() < 1e-12);
    // other keys untouched
    assert!((fusion.skill(Member::Range, Horizon::H4) - 0.5).abs() < f64::EPSILON);
}

#[test]
fn skill_stays_in_unit_interval() {
    let mut fusion = EnsembleFusion::new(EnsembleConfig::default());
    for _ in 0..50 {
        let s = fusion.update_skill(Member::Breakout, Horizon::M5, 7.0);
        assert!((0.0..=1.0).contains(&s));
    }
    for _ in 0..50 {
        let s = fusion.update_skill(Member::Breakout, Horizon::M5, -3.0);
        assert!((0.0..=1.0).contains(&s));
    }
}

#[test]
fn weights_sum_to_one_and_variance_is_not_below_min_member() {
    let fusion = EnsembleFusion::new(EnsembleConfig::default());
    let features = busy_features();
    let beliefs = [
        RegimeBelief::uniform(),
        RegimeBelief::from_weights([0.9, 0.05, 0.03, 0.02]).unwrap(),
        RegimeBelief::from_weights([0.0, 0.0, 0.0, 1.0]).unwrap(),
    ];
    for belief in &beliefs {
        for h in Horizon::ALL {
            let fused = fusion.fuse(&ctx(&features, belief, h));
            let total: f64 = fused.weights.iter().map(|w| w.weight).sum();
            assert!((total - 1.0).abs() < 1e-12);
            let min_var = fused
                .members
                .iter()
                .map(|m| m.variance)
                .fold(f64::INFINITY, f64::min);
            assert!(fused.variance >= min_var - 1e-18);
            assert!((0.0..=1.0).contains(&fused.confidence));
        }
    }
}

#[test]
fn zero_skills_fall_back_to_uniform_weights() {
    let mut fusion = EnsembleFusion::new(EnsembleConfig {
        initial_skill: 0.0,
        ..EnsembleConfig::default()
    });
    fusion.update_skill(Member::Range, Horizon::M5, 0.0);
    let features = busy_features();
    let belief = RegimeBelief::uniform();
    let fused = fusion.fuse(&ctx(&features, &belief, Horizon::M5));
    for w in &fused.weights {
        assert!((w.weight - 0.25).abs() < 1e-12);
    }
}

#[test]
fn regime_belief_boosts_the_matching_member() {
    let fusion = EnsembleFusion::new(EnsembleConfig::default());
    let features = busy_features();
    let trend = RegimeBelief::from_weights([1.0, 0.0, 0.0, 0.0]).unwrap();
    let fused = fusion.fuse(&ctx(&features, &trend, Horizon::H1));
    let cont = fused.weight_of(Member::Continuation);
    // (0.25 + 1.0) / (0.25 * 3 + 1.25)
    assert!((cont - 0.625).abs() < 1e-12);
    for m in [Member::Range, Member::Breakout, Member::DarkPoolBias] {
        assert!(fused.weight_of(m) > 0.0);
        assert!(fused.weight_of(m) < cont);
    }
    assert_eq!(Member::Continuation.target_regime(), Regime::Trend);
}

#[test]
fn disagreement_widens_fused_variance() {
    let fusion = EnsembleFusion::new(EnsembleConfig::default());
    let belief = RegimeBelief::uniform();
    let calm = FeatureSet::from_pairs([(Feature::RealizedVol, 0.002)]);
    let split = FeatureSet::from_pairs([
        (Feature::RealizedVol, 0.002),
        (Feature::VwapDistance, 0.05),
        (Feature::Momentum, 0.002),
        (Feature::TrendStrength, 1.0),
    ]);
    let a = fusion.fuse(&ctx(&calm, &belief, Horizon::H1));
    let b = fusion.fuse(&ctx(&split, &belief, Horizon::H1));
    let own_a: f64 = a.members.iter().zip(&a.weights).map(|(m, w)| w.weight * m.variance).sum();
    let own_b: f64 = b.members.iter().zip(&b.weights).map(|(m, w)| w.weight * m.variance).sum();
    assert!((a.variance - own_a).abs() < 1e-15);
    assert!(b.variance > own_b);
}

#[test]
fn range_member_reverts_toward_vwap_and_tightens_under_long_gamma() {
    let belief = RegimeBelief::from_weights([0.0, 1.0, 0.0, 0.0]).unwrap();
    let short_gamma = FeatureSet::from_pairs([
        (Feature::RealizedVol, 0.002),
        (Feature::VwapDistance, 0.01),
        (Feature::Gex, -1.0),
    ]);
    let long_gamma = short_gamma.with(Feature::Gex, 1.0);
    let a = Member::Range.predict(&ctx(&short_gamma, &belief, Horizon::H1));
    let b = Member::Range.predict(&ctx(&long_gamma, &belief, Horizon::H1));
    assert!(a.mean < 0.0);
    assert!((b.variance - 0.7 * a.variance).abs() < 1e-18);
    assert!((a.confidence - 0.9).abs() < 1e-12);
}

#[test]
fn continuation_amplifies_under_short_gamma() {
    let belief = RegimeBelief::from_weights([1.0, 0.0, 0.0, 0.0]).unwrap();
    let flat = FeatureSet::from_pairs([
        (Feature::RealizedVol, 0.002),
        (Feature::Momentum, 0.001),
        (Feature::TrendStrength, 0.5),
    ]);
    let short_gamma = flat.with(Feature::Gex, -1.0);
    let a = Member::Continuation.predict(&ctx(&flat, &belief, Horizon::H1));
    let b = Member::Continuation.predict(&ctx(&short_gamma, &belief, Horizon::H1));
    // 0.001 per bar * 12 bars * 0.5 trend * P(Trend) = 1
    assert!((a.mean - 0.006).abs() < 1e-12);
    assert!((b.mean - 1.5 * a.mean).abs() < 1e-12);
    assert!((b.variance - 1.2 * a.variance).abs() < 1e-18);
}

#[test]
fn breakout_mean_is_asymmetric() {
    let belief = RegimeBelief::uniform();
    let up = FeatureSet::from_pairs([
        (Feature::RealizedVol, 0.002),
        (Feature::VolumeSurge, 3.0),
        (Feature::Momentum, 0.001),
    ]);
    let down = up.with(Feature::Momentum, -0.001);
    let p = breakout_probability(&up);
    assert!(p > 0.8);
    let a = Member::Breakout.predict(&ctx(&up, &belief, Horizon::M15));
    let b = Member::Breakout.predict(&ctx(&down, &belief, Horizon::M15));
    assert!(a.mean > 0.0 && b.mean < 0.0);
    assert!((a.mean / -b.mean - 1.2 / 0.9).abs() < 1e-12);
    assert!((a.confidence - p).abs() < 1e-12);
}

#[test]
fn dark_pool_member_confidence_tracks_ratio_magnitude() {
    let belief = RegimeBelief::uniform();
    let f = FeatureSet::from_pairs([(Feature::RealizedVol, 0.002), (Feature::DarkPoolRatio, -0.4)]);
    let est = Member::DarkPoolBias.predict(&ctx(&f, &belief, Horizon::M5));
    assert!(est.mean < 0.0);
    assert!((est.confidence - 0.4).abs() < 1e-12);
}
