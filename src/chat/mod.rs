pub mod client;
pub mod db;
pub mod error;
pub mod feed;
pub mod geo;
pub mod rating;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ChitChatClient, ClientConfig};
pub use error::{ChatError, ChatResult};
