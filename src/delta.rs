use crate::error::TrackerError;
use crate::history::HistoryStore;

/// Percent change between the newest sample and the sample one window back.
///
/// The lag is clamped to the history currently available, so the window grows
/// tick by tick after startup and stays fixed once enough samples exist.
#[derive(Debug, Clone, Copy)]
pub struct DeltaCalculator {
    window_ticks: usize,
}

impl DeltaCalculator {
    pub fn new(window_ticks: usize) -> Self {
        Self { window_ticks }
    }

    pub fn window_ticks(&self) -> usize {
        self.window_ticks
    }

    /// Index of the past sample used for `len` available samples.
    pub fn lag_for(&self, len: usize) -> usize {
        len.saturating_sub(1)
            .min(self.window_ticks.saturating_sub(1))
    }

    pub fn compute(&self, history: &HistoryStore, asset: &str) -> Result<f64, TrackerError> {
        let newest = history.sample_at(asset, 0)?;
        let past = history.sample_at(asset, self.lag_for(history.len(asset)))?;
        percent_change(newest, past).ok_or_else(|| TrackerError::DegenerateDelta {
            asset: asset.to_string(),
        })
    }
}

/// `(newest - past) / newest * 100`, rounded to two decimals. `None` when `newest` is zero.
pub fn percent_change(newest: f64, past: f64) -> Option<f64> {
    if newest == 0.0 {
        return None;
    }
    Some(round2((newest - past) / newest * 100.0))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
