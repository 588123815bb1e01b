//! Start-up configuration of the device drivers.
//!
//! Everything is `serde` so firmware can keep it in flash or receive it over
//! the wire; the defaults match the stock hardware.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::types::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Ramp update period.
    pub tick_ms: u16,
    /// Degrees per second, both when opening up and when returning.
    pub angular_velocity: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            angular_velocity: 90.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String<32>,
    pub password: String<64>,
    /// Give up on one association attempt after this long.
    pub connect_timeout_ms: u16,
    pub poll_interval_ms: u16,
    pub max_attempts: u8,
}

impl WifiConfig {
    /// `None` when a credential does not fit.
    pub fn with_credentials(ssid: &str, password: &str) -> Option<Self> {
        Some(Self {
            ssid: String::try_from(ssid).ok()?,
            password: String::try_from(password).ok()?,
            ..Default::default()
        })
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            connect_timeout_ms: 5000,
            poll_interval_ms: 500,
            max_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Minimum spacing between reconnect attempts.
    pub reconnect_interval_ms: Millis,
    pub client_id_prefix: String<32>,
    /// Fixed header bytes the transport adds in front of topic and payload.
    pub max_header_size: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 5000,
            client_id_prefix: String::try_from("ctlkit").unwrap_or_default(),
            max_header_size: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let servo = ServoConfig::default();
        assert_eq!(servo.tick_ms, 10);
        assert_eq!(servo.angular_velocity, 90.0);

        let mqtt = MqttConfig::default();
        assert_eq!(mqtt.client_id_prefix.as_str(), "ctlkit");
        assert_eq!(mqtt.reconnect_interval_ms, 5000);
    }

    #[test]
    fn credentials_must_fit() {
        let wifi = WifiConfig::with_credentials("lab", "hunter22").unwrap();
        assert_eq!(wifi.ssid.as_str(), "lab");
        assert_eq!(wifi.max_attempts, 2);

        let long_ssid = "x".repeat(33);
        assert!(WifiConfig::with_credentials(&long_ssid, "pw").is_none());
    }

    #[test]
    fn survives_postcard() {
        let config = WifiConfig::with_credentials("lab", "pw").unwrap();
        let mut buf = [0u8; 128];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();
        let back: WifiConfig = postcard::from_bytes(bytes).unwrap();
        assert_eq!(back, config);
    }
}
