use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::WifiConfig;

pub mod traits {
    use core::fmt::Debug;

    /// Station side of the platform WiFi stack.
    pub trait WifiRadio {
        type Error: Debug;

        /// Starts associating; completion is observed through
        /// [`is_connected`](Self::is_connected).
        fn connect(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

        fn disconnect(&mut self);

        fn is_connected(&self) -> bool;
    }
}

use self::traits::WifiRadio;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum WifiError<E: Debug> {
    #[cfg_attr(feature = "std", error("radio error: {0:?}"))]
    Radio(E),
    #[cfg_attr(feature = "std", error("no link after {0} ms"))]
    Timeout(u16),
    #[cfg_attr(feature = "std", error("gave up after {0} attempts"))]
    RetriesExhausted(u8),
}

/// Keeps a station link up with a bounded number of blocking attempts.
pub struct WifiStation<R, D> {
    radio: R,
    delay: D,
    config: WifiConfig,
}

impl<R, D> WifiStation<R, D>
where
    R: WifiRadio,
    D: DelayMs<u16>,
{
    pub fn new(radio: R, delay: D, config: WifiConfig) -> Self {
        Self {
            radio,
            delay,
            config,
        }
    }

    /// Tries up to `max_attempts` times, dropping the link between attempts.
    pub fn begin(&mut self) -> Result<(), WifiError<R::Error>> {
        for attempt in 1..=self.config.max_attempts {
            match self.connect() {
                Ok(()) => return Ok(()),
                Err(_) => {
                    error!("WiFi attempt {} failed", attempt);
                    self.disconnect();
                }
            }
        }

        Err(WifiError::RetriesExhausted(self.config.max_attempts))
    }

    /// One association attempt, polling the link every `poll_interval_ms`
    /// (at least every millisecond).
    pub fn connect(&mut self) -> Result<(), WifiError<R::Error>> {
        info!("WiFi connecting to {}", self.config.ssid.as_str());

        self.radio
            .connect(&self.config.ssid, &self.config.password)
            .map_err(WifiError::Radio)?;

        let interval = self.config.poll_interval_ms.max(1);
        let mut waited: u16 = 0;
        loop {
            if waited >= self.config.connect_timeout_ms {
                return Err(WifiError::Timeout(waited));
            }

            self.delay.delay_ms(interval);
            waited = waited.saturating_add(interval);

            if self.radio.is_connected() {
                info!("WiFi connected after {} ms", waited);
                return Ok(());
            }
        }
    }

    pub fn disconnect(&mut self) {
        self.radio.disconnect();
        info!("WiFi disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.radio.is_connected()
    }

    /// Makes one reconnect attempt when the link is down. Returns whether
    /// the link is up afterwards.
    pub fn health_check(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }

        self.disconnect();
        if self.connect().is_err() {
            error!("WiFi reconnect failed");
        }

        self.is_connected()
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }
}
