//! Technical indicators and the crossover signal derived from a fast/slow pair.

pub mod ema;

pub use ema::ema;

/// Direction of a fast line crossing a slow line between two consecutive points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    /// Fast was at or below slow, now strictly above.
    Up,
    /// Fast was at or above slow, now strictly below.
    Down,
}

impl Crossover {
    /// Compare the (fast, slow) pair at `i - 1` against the pair at `i`.
    ///
    /// Equality on the previous point counts for either direction; the
    /// current point must be a strict inequality, so the two cases never
    /// overlap.
    pub fn detect(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Option<Crossover> {
        if prev_fast <= prev_slow && fast > slow {
            Some(Crossover::Up)
        } else if prev_fast >= prev_slow && fast < slow {
            Some(Crossover::Down)
        } else {
            None
        }
    }
}
