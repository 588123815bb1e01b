use embedded_hal::Pwm;
use fixed::types::I48F16;

use crate::config::ServoConfig;
use crate::ramp::LinearRamp;
use crate::telemetry::Telemetry;
use crate::timer::CyclicTimer;
use crate::types::{Degrees, Fix, Millis};

pub const MIN_ANGLE: Degrees = Fix::from_bits(-90 << 16);
pub const MAX_ANGLE: Degrees = Fix::from_bits(90 << 16);

/// 50 Hz frame.
const FRAME_US: i64 = 20_000;
const PULSE_MIN_US: Fix = Fix::from_bits(500 << 16);
/// Pulse width added across the full 180 degree travel.
const PULSE_SPAN_US: i32 = 1_900;

pub fn clamp_angle(angle: Degrees) -> Degrees {
    angle.clamp(MIN_ANGLE, MAX_ANGLE)
}

/// Duty value for `angle` with a 0.5 ms to 2.4 ms pulse in a 20 ms frame.
pub fn angle_to_duty(angle: Degrees, max_duty: u16) -> u16 {
    let travel = (clamp_angle(angle) - MIN_ANGLE).unwrapped_div_int(180);
    let pulse_us = PULSE_MIN_US + travel.unwrapped_mul_int(PULSE_SPAN_US);

    let duty = pulse_us.to_num::<I48F16>() * i64::from(max_duty) / FRAME_US;
    duty.round().saturating_to_num()
}

/// RC servo whose commanded angle follows a rate limited ramp.
pub struct Servo<PWM: Pwm> {
    pwm: PWM,
    channel: PWM::Channel,
    duty: u16,
    ramp: LinearRamp,
    timer: CyclicTimer,
}

impl<PWM> Servo<PWM>
where
    PWM: Pwm<Duty = u16>,
    PWM::Channel: Copy,
{
    pub fn new(mut pwm: PWM, channel: PWM::Channel, config: &ServoConfig) -> Self {
        pwm.enable(channel);
        pwm.set_duty(channel, 0);

        let ramp = LinearRamp::new(
            config.tick_ms,
            config.angular_velocity,
            config.angular_velocity,
        );
        let timer = CyclicTimer::new(Millis::from(config.tick_ms));

        Self {
            pwm,
            channel,
            duty: 0,
            ramp,
            timer,
        }
    }

    /// Drives the output straight to `angle`, bypassing the ramp.
    pub fn set_angle(&mut self, angle: Degrees) -> u16 {
        let duty = angle_to_duty(angle, self.pwm.get_max_duty());
        self.pwm.set_duty(self.channel, duty);
        self.duty = duty;

        trace!("Servo angle {} -> duty {}", angle.to_num::<f32>(), duty);

        duty
    }

    pub fn set_target_angle(&mut self, angle: Degrees) {
        self.ramp.set_target(clamp_angle(angle));
    }

    /// A zero `angular_velocity` keeps the current one.
    pub fn set_target_angle_with_velocity(&mut self, angle: Degrees, angular_velocity: f32) {
        if angular_velocity != 0.0 {
            self.set_angular_velocity(angular_velocity);
        }
        self.set_target_angle(angle);
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f32) {
        self.ramp.set_increase(angular_velocity);
        self.ramp.set_decrease(angular_velocity);
    }

    pub fn target_angle(&self) -> Degrees {
        self.ramp.target()
    }

    pub fn present_angle(&self) -> Degrees {
        self.ramp.present()
    }

    pub fn is_target_reached(&self) -> bool {
        self.ramp.is_converged()
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }

    /// Call from the main loop as often as possible. Returns whether the
    /// output moved.
    pub fn poll(&mut self, now: Millis) -> bool {
        if !self.timer.is_due(now) || self.ramp.is_converged() {
            return false;
        }

        let present = self.ramp.update();
        // whole degrees only
        self.set_angle(present.round_to_zero());

        true
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry::Servo {
            target: self.target_angle(),
            present: self.present_angle(),
            reached: self.is_target_reached(),
        }
    }

    /// Stops the pulse train and hands the PWM back.
    pub fn release(mut self) -> PWM {
        self.pwm.disable(self.channel);
        self.pwm
    }
}
