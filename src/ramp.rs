use fixed::traits::ToFixed;

use crate::fix;
use crate::types::{Fix, Rate};

/// Moves a present value towards a target at a bounded rate.
///
/// Rates are magnitudes per second. `increase` applies while heading away
/// from zero, `decrease` while heading back towards it (and always when the
/// target is zero). [`update`](Self::update) must be called once every
/// `tick_ms`; the ramp has no clock of its own.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    present: Fix,
    target: Fix,
    increase: Rate,
    decrease: Rate,
    tick: Fix,
    tick_ms: u16,
}

impl LinearRamp {
    /// `tick_ms` must be below 32768.
    pub fn new(tick_ms: u16, increase: f32, decrease: f32) -> Self {
        let tick = tick_ms.to_fixed::<Fix>().unwrapped_div_int(1000);

        debug!(
            "Linear ramp: tick {} ms, increase {}/s, decrease {}/s",
            tick_ms, increase, decrease
        );

        Self {
            present: Fix::ZERO,
            target: Fix::ZERO,
            increase: fix::from_f32(increase),
            decrease: fix::from_f32(decrease),
            tick,
            tick_ms,
        }
    }

    /// Rate in effect for the current present/target pair, zero once
    /// converged.
    pub fn delta(&self) -> Rate {
        let (present, target) = (self.present, self.target);

        if present == target {
            Fix::ZERO
        } else if target == Fix::ZERO {
            self.decrease
        } else if target > Fix::ZERO {
            if present < target {
                self.increase
            } else {
                self.decrease
            }
        } else if present > target {
            self.increase
        } else {
            self.decrease
        }
    }

    /// Advances one tick and returns the new present value. Never steps past
    /// the target.
    pub fn update(&mut self) -> Fix {
        let step = fix::mul(self.delta(), self.tick);

        if self.present < self.target {
            self.present = self.present.saturating_add(step).min(self.target);
        } else if self.present > self.target {
            self.present = self.present.saturating_sub(step).max(self.target);
        }

        self.present
    }

    /// Keeps the present value, so an in-flight ramp bends towards the new
    /// target without a jump.
    pub fn set_target(&mut self, target: Fix) {
        self.target = target;
    }

    pub fn set_target_f32(&mut self, target: f32) {
        self.set_target(fix::from_f32(target));
    }

    pub fn target(&self) -> Fix {
        self.target
    }

    pub fn present(&self) -> Fix {
        self.present
    }

    pub fn set_present(&mut self, present: Fix) {
        self.present = present;
    }

    pub fn is_converged(&self) -> bool {
        self.present == self.target
    }

    pub fn set_increase(&mut self, increase: f32) {
        self.increase = fix::from_f32(increase);
    }

    pub fn increase(&self) -> Rate {
        self.increase
    }

    pub fn set_decrease(&mut self, decrease: f32) {
        self.decrease = fix::from_f32(decrease);
    }

    pub fn decrease(&self) -> Rate {
        self.decrease
    }

    pub fn tick_ms(&self) -> u16 {
        self.tick_ms
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn ticks_until_converged(ramp: &mut LinearRamp) -> usize {
        let mut ticks = 0;
        while !ramp.is_converged() {
            ramp.update();
            ticks += 1;
            assert!(ticks < 100_000, "ramp never converged");
        }
        ticks
    }

    #[test]
    fn decrease_is_slower_than_increase() {
        let mut ramp = LinearRamp::new(10, 90.0, 45.0);

        ramp.set_target(Fix::from_num(90));
        let up = ticks_until_converged(&mut ramp);

        ramp.set_target(Fix::ZERO);
        let down = ticks_until_converged(&mut ramp);

        assert_eq!(up, 101);
        assert_eq!(down, 201);
        assert!(up < down);
    }

    #[rstest]
    #[case(0.0, 0.0, 0)]
    #[case(0.0, 10.0, 1)]
    #[case(20.0, 10.0, 2)]
    #[case(5.0, 0.0, 2)]
    #[case(-5.0, 0.0, 2)]
    #[case(0.0, -10.0, 1)]
    #[case(-20.0, -10.0, 2)]
    #[case(10.0, -10.0, 1)]
    #[case(-10.0, 10.0, 1)]
    fn picks_rate_by_direction(#[case] present: f32, #[case] target: f32, #[case] expected: u8) {
        let mut ramp = LinearRamp::new(10, 3.0, 7.0);
        ramp.set_present(fix::from_f32(present));
        ramp.set_target_f32(target);

        let expected = match expected {
            0 => Fix::ZERO,
            1 => ramp.increase(),
            _ => ramp.decrease(),
        };
        assert_eq!(ramp.delta(), expected);
    }

    #[test]
    fn never_overshoots() {
        let mut ramp = LinearRamp::new(100, 10_000.0, 10_000.0);

        ramp.set_target(Fix::from_num(3.3));
        assert_eq!(ramp.update(), Fix::from_num(3.3));

        ramp.set_target(Fix::from_num(-7.1));
        assert_eq!(ramp.update(), Fix::from_num(-7.1));

        let mut slow = LinearRamp::new(10, 1.0, 1.0);
        slow.set_target(Fix::from_num(0.05));
        let mut last = Fix::ZERO;
        while !slow.is_converged() {
            let present = slow.update();
            assert!(present > last);
            assert!(present <= slow.target());
            last = present;
        }
    }

    #[test]
    fn idle_once_converged() {
        let mut ramp = LinearRamp::new(10, 50.0, 50.0);
        ramp.set_target(Fix::from_num(1.5));
        ticks_until_converged(&mut ramp);

        for _ in 0..10 {
            assert_eq!(ramp.update(), Fix::from_num(1.5));
            assert_eq!(ramp.delta(), Fix::ZERO);
        }
    }

    #[test]
    fn retarget_continues_from_present() {
        let mut ramp = LinearRamp::new(10, 100.0, 100.0);
        ramp.set_target(Fix::from_num(50));
        for _ in 0..10 {
            ramp.update();
        }
        let midway = ramp.present();
        assert!(midway > Fix::ZERO && midway < Fix::from_num(50));

        ramp.set_target(Fix::from_num(-50));
        let next = ramp.update();
        assert!(next < midway);
        assert!(midway - next <= fix::mul(ramp.increase(), Fix::from_num(0.01)));
    }

    #[test]
    fn tick_period_is_truncated_milliseconds() {
        let ramp = LinearRamp::new(10, 1.0, 1.0);
        assert_eq!(ramp.tick_ms(), 10);
        assert_eq!(ramp.tick.to_bits(), 655);
    }

    #[test]
    fn rates_can_be_changed() {
        let mut ramp = LinearRamp::new(10, 1.0, 2.0);
        ramp.set_increase(4.0);
        ramp.set_decrease(8.0);
        assert_eq!(ramp.increase(), Fix::from_num(4));
        assert_eq!(ramp.decrease(), Fix::from_num(8));
    }
}
