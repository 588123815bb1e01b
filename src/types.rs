use fixed::types::I16F16;

/// 32-bit signed value with 16 fractional bits.
pub type Fix = I16F16;

pub type Millis = u32;

pub type Degrees = Fix;
pub type Rate = Fix;
