pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod atr;

pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use atr::*;

use std::collections::VecDeque;

/// Fixed-size window over possibly-undefined observations.
///
/// Statistics are only produced once the window is full and every value in it
/// is defined, mirroring `rolling(window)` with `min_periods == window`.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<Option<f64>>,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn push(&mut self, value: Option<f64>) {
        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    fn complete(&self) -> Option<Vec<f64>> {
        if self.values.len() < self.period {
            return None;
        }
        self.values.iter().copied().collect()
    }

    pub fn mean(&self) -> Option<f64> {
        let values = self.complete()?;
        mean(&values)
    }

    /// Sample standard deviation (ddof = 1).
    pub fn std(&self) -> Option<f64> {
        let values = self.complete()?;
        sample_std(&values)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;

    Some(variance.max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window_needs_full_defined_window() {
        let mut window = RollingWindow::new(3);
        window.push(None);
        window.push(Some(1.0));
        window.push(Some(2.0));
        assert!(window.mean().is_none());

        window.push(Some(3.0));
        assert_eq!(window.mean(), Some(2.0));
        assert!((window.std().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_uses_ddof_one() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138_089_935).abs() < 1e-6);
    }
}
