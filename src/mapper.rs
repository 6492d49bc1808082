use anyhow::{bail, Result};

use crate::model::band::Band;

pub const DEFAULT_UP_THRESHOLDS: [f64; 4] = [0.10, 0.55, 0.90, 1.00];
pub const DEFAULT_DOWN_THRESHOLDS: [f64; 4] = [-0.10, -0.55, -0.90, -1.00];

/// Ordered (threshold, band) pairs for both sides of level, loosest first.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLadder {
    up: Vec<(f64, Band)>,
    down: Vec<(f64, Band)>,
}

impl ThresholdLadder {
    /// `up` must be positive and strictly increasing, `down` negative and strictly decreasing.
    pub fn new(up: [f64; 4], down: [f64; 4]) -> Result<Self> {
        if up.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            bail!("up thresholds must be finite and > 0: {:?}", up);
        }
        if down.iter().any(|t| !t.is_finite() || *t >= 0.0) {
            bail!("down thresholds must be finite and < 0: {:?}", down);
        }
        if up.windows(2).any(|w| w[0] >= w[1]) {
            bail!("up thresholds must be strictly increasing: {:?}", up);
        }
        if down.windows(2).any(|w| w[0] <= w[1]) {
            bail!("down thresholds must be strictly decreasing: {:?}", down);
        }
        Ok(Self {
            up: up.into_iter().zip(Band::UP).collect(),
            down: down.into_iter().zip(Band::DOWN).collect(),
        })
    }

    /// Most extreme band whose inclusive threshold `change` reaches; `Level` otherwise.
    pub fn band_for(&self, change: f64) -> Band {
        let falling = self
            .down
            .iter()
            .filter(|(t, _)| change <= *t)
            .last()
            .map(|(_, b)| *b);
        if let Some(band) = falling {
            return band;
        }
        self.up
            .iter()
            .filter(|(t, _)| change >= *t)
            .last()
            .map(|(_, b)| *b)
            .unwrap_or(Band::Level)
    }
}

impl Default for ThresholdLadder {
    fn default() -> Self {
        Self {
            up: DEFAULT_UP_THRESHOLDS.into_iter().zip(Band::UP).collect(),
            down: DEFAULT_DOWN_THRESHOLDS.into_iter().zip(Band::DOWN).collect(),
        }
    }
}

/// Servo pulse width (microseconds) for every band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoPositions {
    pub level: u32,
    pub up: [u32; 4],
    pub down: [u32; 4],
}

impl ServoPositions {
    pub fn new(level: u32, up: [u32; 4], down: [u32; 4]) -> Result<Self> {
        let positions = Self { level, up, down };
        let ordered: Vec<u32> = Band::ALL.iter().map(|b| positions.pulse(*b)).collect();
        if ordered.windows(2).any(|w| w[0] > w[1]) {
            bail!(
                "servo positions must not decrease from down90 to up90: {:?}",
                ordered
            );
        }
        Ok(positions)
    }

    pub fn pulse(&self, band: Band) -> u32 {
        match band {
            Band::Down90 => self.down[3],
            Band::Down67 => self.down[2],
            Band::Down45 => self.down[1],
            Band::Down22 => self.down[0],
            Band::Level => self.level,
            Band::Up22 => self.up[0],
            Band::Up45 => self.up[1],
            Band::Up67 => self.up[2],
            Band::Up90 => self.up[3],
        }
    }

    pub fn min(&self) -> u32 {
        self.down[3]
    }

    pub fn max(&self) -> u32 {
        self.up[3]
    }
}

impl Default for ServoPositions {
    fn default() -> Self {
        Self {
            level: 1350,
            up: [1510, 1770, 2040, 2300],
            down: [1160, 960, 760, 570],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PositionMapper {
    ladder: ThresholdLadder,
    servo: ServoPositions,
}

impl PositionMapper {
    pub fn new(ladder: ThresholdLadder, servo: ServoPositions) -> Self {
        Self { ladder, servo }
    }

    pub fn map(&self, change: f64) -> Band {
        self.ladder.band_for(change)
    }

    pub fn pulse(&self, band: Band) -> u32 {
        self.servo.pulse(band)
    }

    pub fn pulse_for(&self, change: f64) -> u32 {
        self.pulse(self.map(change))
    }

    pub fn level_pulse(&self) -> u32 {
        self.servo.level
    }

    pub fn servo(&self) -> &ServoPositions {
        &self.servo
    }
}
