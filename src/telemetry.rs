use serde::{Deserialize, Serialize};

use crate::types::{Degrees, Fix};

pub type Error = postcard::Error;

/// Status records published by the device, COBS framed so a zero byte ends
/// every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Telemetry {
    Servo {
        target: Degrees,
        present: Degrees,
        reached: bool,
    },
    Filter {
        input: Fix,
        output: Fix,
    },
}

pub fn encode<'b>(msg: &Telemetry, buffer: &'b mut [u8]) -> Result<&'b mut [u8], Error> {
    postcard::to_slice_cobs(msg, buffer)
}

pub fn decode(data: &mut [u8]) -> Result<Telemetry, Error> {
    postcard::from_bytes_cobs(data)
}
