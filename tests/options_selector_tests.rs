use sandbox_forecast::config::SelectorConfig;
use sandbox_forecast::features::{Feature, FeatureSet};
use sandbox_forecast::forecast::build_cone;
use sandbox_forecast::model::{
    ForecastCone, Horizon, NoTradeReason, OptionSide, RegimeBelief, NO_EDGE,
};
use sandbox_forecast::options::{
    OptionsTradeSelector, PremiumModel, PremiumQuote, SelectionInputs,
};

fn cone(mean: f64) -> ForecastCone {
    build_cone(500.0, mean, 4e-4, Horizon::H1)
}

fn features(gex: f64, dark_pool: f64) -> FeatureSet {
    FeatureSet::from_pairs([
        (Feature::Gex, gex),
        (Feature::DarkPoolRatio, dark_pool),
        (Feature::ImpliedVol, 0.2),
        (Feature::MinutesSinceEvent, -1.0),
    ])
}

fn inputs<'a>(
    primary: &'a ForecastCone,
    scores: &'a [f64],
    breakout: f64,
    belief: &'a RegimeBelief,
    features: &'a FeatureSet,
) -> SelectionInputs<'a> {
    SelectionInputs {
        primary,
        scores,
        fused_confidence: 0.8,
        breakout_probability: breakout,
        belief,
        features,
    }
}

#[test]
fn sign_disagreement_never_trades() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(-1e9, 0.5);
    let strong = RegimeBelief::from_weights([0.5, 0.0, 0.5, 0.0]).unwrap();
    for breakout in [0.0, 0.6, 0.7, 1.0] {
        let rec = selector.select(&inputs(&primary, &[0.5, -0.5], breakout, &strong, &f));
        assert_eq!(rec.side, None);
        assert_eq!(rec.no_trade_reason, Some(NoTradeReason::DirectionConflict));
    }
}

#[test]
fn conviction_threshold_is_inclusive() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(-1e9, 0.0);
    let belief = RegimeBelief::uniform();
    let scores = [0.5, 0.3];

    let at = selector.select(&inputs(&primary, &scores, 0.6, &belief, &f));
    assert_eq!(at.side, Some(OptionSide::Call));

    let below = selector.select(&inputs(&primary, &scores, 0.6 - 1e-9, &belief, &f));
    assert_eq!(below.side, None);
    assert_eq!(below.no_trade_reason, Some(NoTradeReason::LowConviction));
}

#[test]
fn trend_plus_expansion_belief_can_carry_conviction() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(-0.01);
    let f = features(-1e9, 0.0);
    let belief = RegimeBelief::from_weights([0.4, 0.3, 0.3, 0.0]).unwrap();
    let rec = selector.select(&inputs(&primary, &[-0.5, -0.2], 0.1, &belief, &f));
    assert_eq!(rec.side, Some(OptionSide::Put));
}

#[test]
fn positive_gamma_needs_stronger_breakout() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(2e9, 0.0);
    let belief = RegimeBelief::uniform();
    let scores = [0.5, 0.3];

    let at = selector.select(&inputs(&primary, &scores, 0.7, &belief, &f));
    assert_eq!(at.side, Some(OptionSide::Call));

    let below = selector.select(&inputs(&primary, &scores, 0.69, &belief, &f));
    assert_eq!(below.no_trade_reason, Some(NoTradeReason::PositiveGammaDampening));

    let flat_gamma = features(0.0, 0.0);
    let ok = selector.select(&inputs(&primary, &scores, 0.65, &belief, &flat_gamma));
    assert!(ok.is_trade());
}

#[test]
fn needs_two_non_zero_horizons() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(-1e9, 0.0);
    let belief = RegimeBelief::uniform();

    let single = selector.select(&inputs(&primary, &[0.5], 0.9, &belief, &f));
    assert_eq!(single.no_trade_reason, Some(NoTradeReason::InsufficientHorizons));

    let flat = selector.select(&inputs(&primary, &[0.5, 0.0], 0.9, &belief, &f));
    assert_eq!(flat.no_trade_reason, Some(NoTradeReason::NoDirectionalEdge));
}

#[test]
fn no_trade_record_is_zeroed() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(-1e9, 0.0);
    let belief = RegimeBelief::uniform();
    let rec = selector.select(&inputs(&primary, &[0.5, -0.1], 0.9, &belief, &f));
    assert!(!rec.is_trade());
    assert_eq!(rec.strike, 0.0);
    assert_eq!(rec.entry_price, 0.0);
    assert_eq!(rec.target_exit, 0.0);
    assert_eq!(rec.stop_loss, 0.0);
    assert_eq!(rec.kelly_fraction, 0.0);
    assert!(rec.rationale.is_no_edge());
    assert_eq!(rec.rationale.direction, NO_EDGE);
}

#[test]
fn call_contract_fields() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(0.01);
    let f = features(-1e9, 0.3);
    let belief = RegimeBelief::uniform();
    let rec = selector.select(&inputs(&primary, &[0.5, 0.4], 0.8, &belief, &f));

    assert_eq!(rec.side, Some(OptionSide::Call));
    assert_eq!(rec.expiry_days, 5);
    assert_eq!(rec.strike, primary.upper60.round());
    assert!(rec.entry_price > 0.0);
    assert!(rec.target_exit > rec.entry_price);
    assert!((rec.stop_loss - 0.5 * rec.entry_price).abs() < 1e-12);
    assert!(rec.target_delta > 0.0 && rec.target_delta < 1.0);
    // 0.8 * (0.5 + 0.5 * 0.8), dark pool aligned
    assert!((rec.confidence - 0.72 * 1.1).abs() < 1e-12);
    assert!(rec.kelly_fraction >= 0.0 && rec.kelly_fraction <= 0.125);
    assert!(rec.no_trade_reason.is_none());
    assert!(!rec.rationale.is_no_edge());
    assert!(rec.rationale.timing.contains("5-day"));
}

#[test]
fn put_contract_fields() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let primary = cone(-0.01);
    let f = features(-1e9, 0.3);
    let belief = RegimeBelief::uniform();
    let rec = selector.select(&inputs(&primary, &[-0.5, -0.4], 0.8, &belief, &f));

    assert_eq!(rec.side, Some(OptionSide::Put));
    assert_eq!(rec.strike, primary.lower40.round());
    assert!(rec.target_delta < 0.0 && rec.target_delta > -1.0);
    assert!(rec.target_exit > rec.entry_price);
    // dark pool against the put
    assert!((rec.confidence - 0.72 * 0.9).abs() < 1e-12);
}

#[test]
fn strong_score_or_recent_event_picks_zero_dte() {
    let selector = OptionsTradeSelector::new(SelectorConfig::default());
    let belief = RegimeBelief::uniform();

    let strong = cone(0.04);
    assert!(strong.directional_score >= 1.5);
    // quarter-day expiry needs a high vol to price a strike this far out
    let f = features(-1e9, 0.0).with(Feature::ImpliedVol, 1.0);
    let rec = selector.select(&inputs(&strong, &[2.0, 1.0], 0.8, &belief, &f));
    assert_eq!(rec.expiry_days, 0);

    let mild = cone(0.01);
    let post_event = f.with(Feature::MinutesSinceEvent, 45.0);
    let rec = selector.select(&inputs(&mild, &[0.5, 0.4], 0.8, &belief, &post_event));
    assert_eq!(rec.expiry_days, 0);
    assert!(rec.rationale.timing.contains("event"));

    let stale_event = f.with(Feature::MinutesSinceEvent, 121.0);
    let rec = selector.select(&inputs(&mild, &[0.5, 0.4], 0.8, &belief, &stale_event));
    assert_eq!(rec.expiry_days, 5);
}

#[derive(Debug, Clone, Copy)]
struct FlatPremium;

impl PremiumModel for FlatPremium {
    fn premium(&self, quote: &PremiumQuote) -> f64 {
        2.0 + (quote.spot - quote.strike).max(0.0)
    }

    fn delta(&self, _quote: &PremiumQuote) -> f64 {
        0.5
    }
}

#[test]
fn premium_model_is_swappable() {
    let selector = OptionsTradeSelector::with_model(SelectorConfig::default(), FlatPremium);
    let primary = cone(0.01);
    let f = features(-1e9, 0.0);
    let belief = RegimeBelief::uniform();
    let rec = selector.select(&inputs(&primary, &[0.5, 0.4], 0.8, &belief, &f));
    assert_eq!(rec.entry_price, 2.0);
    assert_eq!(rec.stop_loss, 1.0);
    assert_eq!(rec.target_delta, 0.5);
    assert!((rec.target_exit - (2.0 + primary.upper80 - rec.strike)).abs() < 1e-9);
}
