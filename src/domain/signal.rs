//! Directional signals and the accuracy-controlled signal simulator.
//!
//! The simulator stands in for a forecasting model: it knows the next day's
//! close-to-close move and reports it correctly with probability `accuracy`,
//! otherwise it reports the opposite direction. It is seeded, so a given
//! (bars, accuracy, seed) triple always yields the same labels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::FxtraderError;
use super::ohlcv::Bar;
use super::position::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Short,
    Flat,
    Long,
}

impl Signal {
    /// Parse a `{-1, 0, +1}` label.
    pub fn from_label(label: i8) -> Option<Signal> {
        match label {
            -1 => Some(Signal::Short),
            0 => Some(Signal::Flat),
            1 => Some(Signal::Long),
            _ => None,
        }
    }

    pub fn label(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Flat => 0,
            Signal::Long => 1,
        }
    }

    /// Direction of the position this signal opens, `None` for a flat day.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Signal::Long => Some(Direction::Long),
            Signal::Short => Some(Direction::Short),
            Signal::Flat => None,
        }
    }

    pub fn opposite(self) -> Signal {
        match self {
            Signal::Long => Signal::Short,
            Signal::Short => Signal::Long,
            Signal::Flat => Signal::Flat,
        }
    }

    fn from_move(delta: f64) -> Signal {
        if delta > 0.0 {
            Signal::Long
        } else if delta < 0.0 {
            Signal::Short
        } else {
            Signal::Flat
        }
    }
}

/// Output of [`simulate_signals`]: one label per bar plus hit statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedSignals {
    pub signals: Vec<Signal>,
    pub hits: usize,
}

impl SimulatedSignals {
    pub fn long_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Long).count()
    }

    pub fn short_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Short).count()
    }

    /// Fraction of directional labels that matched the realized move.
    pub fn empirical_accuracy(&self) -> f64 {
        let directional = self.long_count() + self.short_count();
        if directional == 0 {
            0.0
        } else {
            self.hits as f64 / directional as f64
        }
    }
}

pub fn simulate_signals(
    bars: &[Bar],
    accuracy: f64,
    seed: u64,
) -> Result<SimulatedSignals, FxtraderError> {
    validate_accuracy(accuracy)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut signals = Vec::with_capacity(bars.len());
    let mut hits = 0usize;

    for (t, bar) in bars.iter().enumerate() {
        let truth = match bars.get(t + 1) {
            Some(next) => Signal::from_move(next.close - bar.close),
            None => Signal::Flat,
        };
        if truth == Signal::Flat {
            signals.push(Signal::Flat);
            continue;
        }

        if rng.gen_bool(accuracy) {
            hits += 1;
            signals.push(truth);
        } else {
            signals.push(truth.opposite());
        }
    }

    Ok(SimulatedSignals { signals, hits })
}

pub fn validate_accuracy(accuracy: f64) -> Result<(), FxtraderError> {
    if !(0.0..=1.0).contains(&accuracy) {
        return Err(FxtraderError::invalid(
            "signal",
            "accuracy",
            "accuracy must be between 0 and 1",
        ));
    }
    Ok(())
}
