use std::collections::{HashMap, VecDeque};

use crate::error::TrackerError;

/// Per-asset bounded price history, newest sample first.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    depth: usize,
    buffers: HashMap<String, VecDeque<f64>>,
}

impl HistoryStore {
    pub fn new<S: AsRef<str>>(assets: &[S], depth: usize) -> Self {
        assert!(depth > 0, "history depth must be > 0");
        let buffers = assets
            .iter()
            .map(|a| (a.as_ref().to_string(), VecDeque::with_capacity(depth)))
            .collect();
        Self { depth, buffers }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Push a sample to the front of the asset's buffer, evicting the oldest at capacity.
    pub fn append(&mut self, asset: &str, sample: f64) -> Result<(), TrackerError> {
        let depth = self.depth;
        let buf = self.buffer_mut(asset)?;
        if buf.len() == depth {
            buf.pop_back();
        }
        buf.push_front(sample);
        Ok(())
    }

    pub fn latest(&self, asset: &str) -> Result<f64, TrackerError> {
        self.sample_at(asset, 0)
    }

    /// Sample `ticks_ago` ticks back. Lags past the oldest sample clamp to the oldest.
    pub fn sample_at(&self, asset: &str, ticks_ago: usize) -> Result<f64, TrackerError> {
        let buf = self.buffer(asset)?;
        if buf.is_empty() {
            return Err(TrackerError::EmptyHistory {
                asset: asset.to_string(),
            });
        }
        let idx = ticks_ago.min(buf.len() - 1);
        Ok(buf[idx])
    }

    pub fn len(&self, asset: &str) -> usize {
        self.buffers.get(asset).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self, asset: &str) -> bool {
        self.len(asset) == 0
    }

    pub fn samples(&self, asset: &str) -> impl Iterator<Item = f64> + '_ {
        self.buffers
            .get(asset)
            .into_iter()
            .flat_map(|buf| buf.iter().copied())
    }

    fn buffer(&self, asset: &str) -> Result<&VecDeque<f64>, TrackerError> {
        self.buffers
            .get(asset)
            .ok_or_else(|| TrackerError::UnknownAsset {
                asset: asset.to_string(),
            })
    }

    fn buffer_mut(&mut self, asset: &str) -> Result<&mut VecDeque<f64>, TrackerError> {
        self.buffers
            .get_mut(asset)
            .ok_or_else(|| TrackerError::UnknownAsset {
                asset: asset.to_string(),
            })
    }
}
