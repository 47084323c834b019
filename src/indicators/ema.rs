/// Exponential moving average without bias adjustment.
///
/// The first observation seeds the average, after which
/// `ema = alpha * price + (1 - alpha) * ema`.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn with_alpha(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Span-based smoothing, alpha = 2 / (span + 1).
    pub fn with_span(span: usize) -> Self {
        Self::with_alpha(2.0 / (span as f64 + 1.0))
    }

    /// Wilder smoothing, alpha = 1 / period.
    pub fn wilder(period: usize) -> Self {
        Self::with_alpha(1.0 / period as f64)
    }

    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            Some(prev) => self.alpha * price + (1.0 - self.alpha) * prev,
            None => price,
        };
        self.value = Some(next);
        next
    }
}
