/// Log returns between consecutive positive prices.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter_map(|w| {
            let (prev, cur) = (w[0], w[1]);
            (prev > f64::EPSILON && cur > f64::EPSILON).then(|| (cur / prev).ln())
        })
        .collect()
}

/// Sample standard deviation of the last `window` returns. Zero with fewer
/// than two returns.
pub fn realized_volatility(returns: &[f64], window: usize) -> f64 {
    let start = returns.len().saturating_sub(window.max(2));
    let tail = &returns[start..];
    if tail.len() < 2 {
        return 0.0;
    }
    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    let var = tail
        .iter()
        .map(|r| {
            let d = r - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    var.max(0.0).sqrt()
}

/// Mean of the last `window` returns.
pub fn mean_return(returns: &[f64], window: usize) -> f64 {
    let start = returns.len().saturating_sub(window.max(1));
    let tail = &returns[start..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}
