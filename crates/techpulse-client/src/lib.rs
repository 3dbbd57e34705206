//! Client-side half of the TechPulse chat pipeline: typed wire contract,
//! HTTP API client, conversation controller and webhook relay access.

pub mod api;
pub mod controller;
pub mod error;
pub mod webhook;
pub mod wire;

pub use api::{ChatApi, HttpChatApi};
pub use controller::{ChatController, FlightToken, LocalMessage, SingleFlight};
pub use error::ClientError;
pub use webhook::{extract_reply, WebhookRelayClient};
pub use wire::{
    AckReply, ErrorReply, MessagesReply, SendMessagePayload, SendMessageReply, SendMetadata,
    ThreadsReply,
};
