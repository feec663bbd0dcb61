// Push channel: client subscriptions and update fan-out

mod client;
pub mod protocol;
mod push;
#[cfg(test)]
mod tests;

pub use client::{
    ClientConnection, Delivery, DeliveryError, DeliveryMode, UpdateCallback, WILDCARD,
};
pub use protocol::{AckMessage, ClientMessage, ErrorMessage, ViewUpdateMessage};
pub use push::{BroadcastHandle, ChannelSummary, PushChannel, DEFAULT_QUEUE_CAPACITY};
