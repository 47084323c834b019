use super::ema::Ema;

const EPSILON: f64 = 1e-10;

/// Relative Strength Index with Wilder smoothing of gains and losses.
///
/// The first bar has no price change and contributes zero gain and zero loss,
/// so a value is produced from the very first update.
#[derive(Debug, Clone)]
pub struct Rsi {
    prev_price: Option<f64>,
    avg_gain: Ema,
    avg_loss: Ema,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            prev_price: None,
            avg_gain: Ema::wilder(period),
            avg_loss: Ema::wilder(period),
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        let change = self.prev_price.map(|prev| price - prev).unwrap_or(0.0);
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        let avg_gain = self.avg_gain.update(gain);
        let avg_loss = self.avg_loss.update(loss);

        let rs = avg_gain / (avg_loss + EPSILON);
        let rsi = 100.0 - 100.0 / (1.0 + rs);

        self.prev_price = Some(price);
        rsi
    }
}
