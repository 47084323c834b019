use super::RollingWindow;

#[derive(Debug, Clone)]
pub struct BollingerBands {
    window: RollingWindow,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            window: RollingWindow::new(period),
            std_dev_multiplier,
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 2.0)
    }

    /// `None` until the window is full.
    pub fn update(&mut self, price: f64) -> Option<BollingerOutput> {
        self.window.push(Some(price));

        let middle = self.window.mean()?;
        let deviation = self.window.std()? * self.std_dev_multiplier;

        Some(BollingerOutput {
            upper: middle + deviation,
            lower: middle - deviation,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BollingerOutput {
    pub upper: f64,
    pub lower: f64,
}

impl BollingerOutput {
    /// Absolute spread between the bands.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}
