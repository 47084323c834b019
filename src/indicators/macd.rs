use super::ema::Ema;

#[derive(Debug, Clone)]
pub struct Macd {
    fast_ema: Ema,
    slow_ema: Ema,
    signal_ema: Ema,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_ema: Ema::with_span(fast_period),
            slow_ema: Ema::with_span(slow_period),
            signal_ema: Ema::with_span(signal_period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn update(&mut self, price: f64) -> MacdOutput {
        let fast = self.fast_ema.update(price);
        let slow = self.slow_ema.update(price);
        let macd_line = fast - slow;
        let signal_line = self.signal_ema.update(macd_line);

        MacdOutput {
            macd_line,
            signal_line,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MacdOutput {
    pub macd_line: f64,
    pub signal_line: f64,
}
