use sandbox_forecast::indicator::{log_returns, realized_volatility, Ema, Rsi, Sma, RSI_NEUTRAL};

#[test]
fn sma_ring_buffer_wraps_correctly() {
    let mut sma = Sma::new(3);
    assert_eq!(sma.push(10.0), None);
    assert_eq!(sma.push(20.0), None);
    assert_eq!(sma.value(), None);
    assert!((sma.partial_mean().unwrap() - 15.0).abs() < f64::EPSILON);

    let v = sma.push(30.0).unwrap();
    assert!((v - 20.0).abs() < f64::EPSILON);
    let v = sma.push(40.0).unwrap();
    assert!((v - 30.0).abs() < f64::EPSILON);
}

#[test]
fn sma_zero_period_is_clamped() {
    let mut sma = Sma::new(0);
    assert_eq!(sma.period(), 1);
    assert!((sma.push(7.0).unwrap() - 7.0).abs() < f64::EPSILON);
}

#[test]
fn ema_seeds_with_sma_then_smooths() {
    let mut ema = Ema::new(3);
    assert_eq!(ema.push(2.0), None);
    assert_eq!(ema.push(5.0), None);
    assert!((ema.value_or_partial().unwrap() - 3.5).abs() < f64::EPSILON);

    let v = ema.push(8.0).unwrap();
    assert!((v - 5.0).abs() < f64::EPSILON);
    let v = ema.push(11.0).unwrap();
    assert!((v - 8.0).abs() < f64::EPSILON);
}

#[test]
fn rsi_is_neutral_on_flat_series_and_full_on_rally() {
    let mut flat = Rsi::new(5);
    for _ in 0..10 {
        flat.push(100.0);
    }
    assert!((flat.value_or_neutral() - RSI_NEUTRAL).abs() < f64::EPSILON);

    let mut rally = Rsi::new(5);
    for i in 0..10 {
        rally.push(100.0 + i as f64);
    }
    assert!((rally.value().unwrap() - 100.0).abs() < f64::EPSILON);
}

#[test]
fn realized_vol_of_geometric_series_is_zero() {
    let prices: Vec<f64> = (0..30).map(|i| 100.0 * 1.001f64.powi(i)).collect();
    let r = log_returns(&prices);
    assert_eq!(r.len(), 29);
    assert!(realized_volatility(&r, 20) < 1e-12);
}
