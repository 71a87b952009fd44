//! Core request types shared by the transport and the enricher.

pub mod message;

pub use message::{ChatRequest, Message, MessageRole};
