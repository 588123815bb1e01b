use core::fmt::{Debug, Write};

use heapless::{String, Vec};

use crate::config::MqttConfig;
use crate::telemetry::{self, Telemetry};
use crate::types::Millis;

pub const MAX_TOPICS: usize = 8;
pub const MAX_TOPIC_LEN: usize = 64;
pub const MAX_HANDLERS: usize = 4;

pub type Topic = String<MAX_TOPIC_LEN>;
pub type ClientId = String<40>;

/// Receives every inbound message as `(topic, payload)`.
pub type MessageHandler = fn(&str, &[u8]);

pub mod traits {
    use core::fmt::Debug;

    /// Thin view of a platform MQTT client.
    pub trait MqttTransport {
        type Error: Debug;

        fn connect(&mut self, client_id: &str) -> Result<(), Self::Error>;

        fn is_connected(&self) -> bool;

        /// Services keep-alives and hands each inbound message to
        /// `on_message`.
        fn poll(&mut self, on_message: &mut dyn FnMut(&str, &[u8])) -> Result<(), Self::Error>;

        fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

        fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

        /// Publishes without staging the whole frame in the client buffer.
        fn publish_streamed(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

        /// Largest frame [`publish`](Self::publish) can stage.
        fn buffer_size(&self) -> usize;
    }
}

use self::traits::MqttTransport;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum MqttError<E: Debug> {
    #[cfg_attr(feature = "std", error("transport error: {0:?}"))]
    Transport(E),
    #[cfg_attr(feature = "std", error("topic longer than 64 bytes"))]
    TopicTooLong,
    #[cfg_attr(feature = "std", error("more than 8 subscriptions"))]
    TooManyTopics,
    #[cfg_attr(feature = "std", error("more than 4 message handlers"))]
    TooManyHandlers,
    #[cfg_attr(feature = "std", error("telemetry encoding failed"))]
    Encode(telemetry::Error),
}

/// Reconnecting MQTT session that restores its subscriptions.
pub struct MqttSession<T> {
    transport: T,
    config: MqttConfig,
    client_id: ClientId,
    topics: Vec<Topic, MAX_TOPICS>,
    handlers: Vec<MessageHandler, MAX_HANDLERS>,
    last_attempt: Option<Millis>,
}

impl<T> MqttSession<T>
where
    T: MqttTransport,
{
    /// `seed` picks the hex suffix of the client id, so that several devices
    /// sharing a prefix do not kick each other off the broker.
    pub fn new(transport: T, config: MqttConfig, seed: u16) -> Self {
        let client_id = client_id(&config.client_id_prefix, seed);
        info!("MQTT client id {}", client_id.as_str());

        Self {
            transport,
            config,
            client_id,
            topics: Vec::new(),
            handlers: Vec::new(),
            last_attempt: None,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|topic| topic.as_str())
    }

    /// Call from the main loop. Services the connection while it is up,
    /// delivering inbound messages to the registered handlers, and otherwise
    /// reconnects at most once per `reconnect_interval_ms`.
    /// Returns whether the session is connected.
    pub fn health_check(&mut self, now: Millis) -> Result<bool, MqttError<T::Error>> {
        if self.transport.is_connected() {
            let handlers = &self.handlers;
            self.transport
                .poll(&mut |topic, payload| dispatch(handlers, topic, payload))
                .map_err(MqttError::Transport)?;
            return Ok(true);
        }

        if let Some(last) = self.last_attempt {
            if now.wrapping_sub(last) <= self.config.reconnect_interval_ms {
                return Ok(false);
            }
        }
        self.last_attempt = Some(now);

        match self.reconnect() {
            Ok(()) => {
                self.last_attempt = None;
                info!("MQTT reconnected");
                Ok(true)
            }
            Err(_) => {
                error!("MQTT reconnect failed, next try in {} ms", self.config.reconnect_interval_ms);
                Ok(false)
            }
        }
    }

    /// Only a failed `connect` fails the reconnect. A refused resubscribe is
    /// logged and the remaining topics are still tried.
    fn reconnect(&mut self) -> Result<(), T::Error> {
        self.transport.connect(&self.client_id)?;

        for topic in &self.topics {
            if self.transport.subscribe(topic).is_err() {
                error!("MQTT resubscribe to {} failed", topic.as_str());
            }
        }

        Ok(())
    }

    /// Remembers `topic` so it is restored after every reconnect, then
    /// subscribes. The topic stays remembered when the transport refuses,
    /// e.g. while offline.
    pub fn subscribe(&mut self, topic: &str) -> Result<(), MqttError<T::Error>> {
        debug!("MQTT subscribe {}", topic);

        if !self.topics.iter().any(|known| known.as_str() == topic) {
            let owned = Topic::try_from(topic).map_err(|_| MqttError::TopicTooLong)?;
            self.topics
                .push(owned)
                .map_err(|_| MqttError::TooManyTopics)?;
            info!("MQTT added topic {}", topic);
        }

        self.transport
            .subscribe(topic)
            .map_err(MqttError::Transport)
    }

    /// Registers a handler for inbound messages. Every handler sees every
    /// message, in registration order.
    pub fn on_message(&mut self, handler: MessageHandler) -> Result<(), MqttError<T::Error>> {
        self.handlers
            .push(handler)
            .map_err(|_| MqttError::TooManyHandlers)
    }

    /// Fans a message out to the registered handlers. For transports that
    /// deliver messages outside [`health_check`](Self::health_check).
    pub fn dispatch(&self, topic: &str, payload: &[u8]) {
        dispatch(&self.handlers, topic, payload);
    }

    /// Falls back to a streamed publish when the frame does not fit the
    /// transport buffer.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MqttError<T::Error>> {
        let frame_len = self.config.max_header_size + 2 + topic.len() + payload.len();
        let buffer_len = self.transport.buffer_size();

        let result = if frame_len > buffer_len {
            warn!(
                "MQTT message too long. buffer: {}, frame: {}",
                buffer_len as u32,
                frame_len as u32
            );
            self.transport.publish_streamed(topic, payload)
        } else {
            self.transport.publish(topic, payload)
        };

        result.map_err(MqttError::Transport)
    }

    /// Encodes `msg` into `buffer` and publishes the frame.
    pub fn publish_telemetry(
        &mut self,
        topic: &str,
        msg: &Telemetry,
        buffer: &mut [u8],
    ) -> Result<(), MqttError<T::Error>> {
        let frame = telemetry::encode(msg, buffer).map_err(MqttError::Encode)?;
        self.publish(topic, frame)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

fn dispatch(handlers: &[MessageHandler], topic: &str, payload: &[u8]) {
    trace!("MQTT message on {}, {} bytes", topic, payload.len() as u32);

    for handler in handlers {
        handler(topic, payload);
    }
}

fn client_id(prefix: &str, seed: u16) -> ClientId {
    let mut id = ClientId::new();
    // a 32 byte prefix plus "-ffff" always fits
    let _ = write!(id, "{prefix}-{seed:x}");
    id
}
