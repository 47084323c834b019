use serde::{Deserialize, Serialize};
use std::fmt;

pub const HIGH_CONFIDENCE_R2: f64 = 0.7;
pub const MEDIUM_CONFIDENCE_R2: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Thresholds are strict: an R² of exactly 0.7 is still medium.
    pub fn from_r2(r2: f64) -> Self {
        if r2 > HIGH_CONFIDENCE_R2 {
            ConfidenceTier::High
        } else if r2 > MEDIUM_CONFIDENCE_R2 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Next-day volatility forecast put in context of today's realized volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityContext {
    pub predicted: f64,
    pub current: f64,
    pub change_pct: f64,
    #[serde(rename = "confidence")]
    pub confidence_tier: ConfidenceTier,
    #[serde(rename = "r2_score")]
    pub r2: f64,
    pub mae: f64,
}

impl VolatilityContext {
    pub fn new(predicted: f64, current: f64, r2: f64, mae: f64) -> Self {
        let change_pct = if current != 0.0 {
            round_to((predicted - current) / current * 100.0, 1)
        } else {
            0.0
        };

        Self {
            predicted,
            current,
            change_pct,
            confidence_tier: ConfidenceTier::from_r2(r2),
            r2: round_to(r2, 3),
            mae: round_to(mae, 6),
        }
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
