use crate::types::Fix;

/// Arithmetic mean over the last `N` samples.
///
/// The running sum is kept exact in 64 bits and updated incrementally, so a
/// step costs the same for any window size.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<const N: usize> {
    ring: [Fix; N],
    cursor: usize,
    sum: i64,
    out: Fix,
}

impl<const N: usize> MovingAverageFilter<N> {
    const NON_EMPTY: () = assert!(N > 0, "moving average window must hold at least one sample");

    /// Fills the whole window with `initial`.
    pub fn new(initial: Fix) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;

        debug!("Moving average filter: window {}", N as u32);

        Self {
            ring: [initial; N],
            cursor: 0,
            sum: i64::from(initial.to_bits()) * N as i64,
            out: initial,
        }
    }

    pub fn step(&mut self, sample: Fix) -> Fix {
        let slot = &mut self.ring[self.cursor];
        self.sum -= i64::from(slot.to_bits());
        self.sum += i64::from(sample.to_bits());
        *slot = sample;

        self.cursor = (self.cursor + 1) % N;

        // i64 division truncates towards zero
        self.out = Fix::from_bits((self.sum / N as i64) as i32);
        self.out
    }

    pub fn output(&self) -> Fix {
        self.out
    }

    pub fn window(&self) -> usize {
        N
    }

    /// Raw bit sum of the buffered samples.
    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn reset(&mut self, value: Fix) {
        *self = Self::new(value);
    }
}

impl<const N: usize> Default for MovingAverageFilter<N> {
    fn default() -> Self {
        Self::new(Fix::ZERO)
    }
}
