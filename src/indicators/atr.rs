use super::ema::Ema;

/// Average True Range using Wilder smoothing of the true range.
#[derive(Debug, Clone)]
pub struct Atr {
    prev_close: Option<f64>,
    smoothed: Ema,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            smoothed: Ema::wilder(period),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> f64 {
        let tr = self.true_range(high, low);
        self.prev_close = Some(close);
        self.smoothed.update(tr)
    }

    fn true_range(&self, high: f64, low: f64) -> f64 {
        let hl = high - low;

        match self.prev_close {
            Some(prev_close) => {
                let hc = (high - prev_close).abs();
                let lc = (low - prev_close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }
}
