use std::fmt;

/// Discrete actuator position, ordered from the deepest drop to the highest climb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    Down90,
    Down67,
    Down45,
    Down22,
    Level,
    Up22,
    Up45,
    Up67,
    Up90,
}

impl Band {
    pub const ALL: [Band; 9] = [
        Band::Down90,
        Band::Down67,
        Band::Down45,
        Band::Down22,
        Band::Level,
        Band::Up22,
        Band::Up45,
        Band::Up67,
        Band::Up90,
    ];

    /// Bands on the rising side, loosest to tightest.
    pub const UP: [Band; 4] = [Band::Up22, Band::Up45, Band::Up67, Band::Up90];

    /// Bands on the falling side, loosest to tightest.
    pub const DOWN: [Band; 4] = [Band::Down22, Band::Down45, Band::Down67, Band::Down90];

    pub fn label(self) -> &'static str {
        match self {
            Band::Down90 => "DOWN 90",
            Band::Down67 => "DOWN 67",
            Band::Down45 => "DOWN 45",
            Band::Down22 => "DOWN 22",
            Band::Level => "LEVEL",
            Band::Up22 => "UP 22",
            Band::Up45 => "UP 45",
            Band::Up67 => "UP 67",
            Band::Up90 => "UP 90",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
