//! Zero-crossing detection on event indicators.
//!
//! Indicator values from the previous check (or event) are kept as a
//! baseline. A completed integrator step compares the fresh values against
//! the baseline and then replaces it.

/// Direction of a sign transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// First indicator found to change sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub index: usize,
    pub direction: Direction,
}

/// Classify the transition from `previous` to `current`.
///
/// Rising: `previous < 0 <= current` or `previous == 0 < current`.
/// Falling: `previous > 0 >= current` or `previous == 0 > current`.
pub fn classify(previous: f64, current: f64) -> Option<Direction> {
    let rising = (previous < 0.0 && current >= 0.0) || (previous == 0.0 && current > 0.0);
    let falling = (previous > 0.0 && current <= 0.0) || (previous == 0.0 && current < 0.0);
    if rising {
        Some(Direction::Rising)
    } else if falling {
        Some(Direction::Falling)
    } else {
        None
    }
}

/// Stored indicator baseline ("old ZC").
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetector {
    previous: Vec<f64>,
}

impl EventDetector {
    pub fn new(len: usize) -> Self {
        Self {
            previous: vec![0.0; len],
        }
    }

    /// Report the first crossing between the baseline and `current`, then
    /// take `current` as the new baseline.
    pub fn check(&mut self, current: &[f64]) -> Option<Crossing> {
        let crossing = self
            .previous
            .iter()
            .zip(current)
            .enumerate()
            .find_map(|(index, (&prev, &cur))| {
                classify(prev, cur).map(|direction| Crossing { index, direction })
            });
        self.snapshot(current);
        crossing
    }

    /// Take `current` as the new baseline.
    pub fn snapshot(&mut self, current: &[f64]) {
        for (prev, &cur) in self.previous.iter_mut().zip(current) {
            *prev = cur;
        }
    }

    /// Zero the baseline.
    pub fn reset(&mut self) {
        self.previous.iter_mut().for_each(|p| *p = 0.0);
    }

    pub fn baseline(&self) -> &[f64] {
        &self.previous
    }
}
