use serde::{Deserialize, Serialize};

use crate::fix;
use crate::types::Fix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

/// Single pole IIR filter in fixed point.
///
/// The low-pass state is always tracked; in [`FilterMode::HighPass`] the
/// output is the input minus that state.
#[derive(Debug, Clone)]
pub struct FirstOrderFilter {
    mode: FilterMode,
    tc: Fix,
    lpf: Fix,
    out: Fix,
}

impl FirstOrderFilter {
    /// `cutoff_hz` must stay well below the Nyquist frequency of `period_ms`,
    /// otherwise the time constant reaches 1 and the filter stops filtering.
    pub fn new(mode: FilterMode, cutoff_hz: f32, period_ms: u16, initial: Fix) -> Self {
        let tc = fix::time_constant_from_cutoff(cutoff_hz, period_ms);

        debug!(
            "First order filter: cutoff {} Hz, period {} ms, tc {}",
            cutoff_hz,
            period_ms,
            fix::to_f32(tc)
        );

        Self::with_time_constant(mode, tc, initial)
    }

    pub fn with_time_constant(mode: FilterMode, tc: Fix, initial: Fix) -> Self {
        Self {
            mode,
            tc,
            lpf: initial,
            out: Fix::ZERO,
        }
    }

    pub fn step(&mut self, input: Fix) -> Fix {
        // wraps like the raw 32-bit arithmetic it models
        let error = input.wrapping_sub(self.lpf);
        self.lpf = self.lpf.wrapping_add(fix::mul(error, self.tc));

        self.out = match self.mode {
            FilterMode::LowPass => self.lpf,
            FilterMode::HighPass => input.wrapping_sub(self.lpf),
        };

        self.out
    }

    pub fn output(&self) -> Fix {
        self.out
    }

    pub fn lowpass(&self) -> Fix {
        self.lpf
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn time_constant(&self) -> Fix {
        self.tc
    }

    pub fn cutoff_hz(&self, period_ms: u16) -> f32 {
        fix::cutoff_from_time_constant(self.tc, period_ms)
    }

    pub fn reset(&mut self, value: Fix) {
        self.lpf = value;
        self.out = Fix::ZERO;
    }
}
