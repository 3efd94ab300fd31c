//! Test doubles for the provider layer: a lightweight HTTP server that
//! mimics vendor endpoints, and an in-process [`Prompt`](crate::api::Prompt)
//! that replays scripted replies.

mod scripted;
mod server;

pub use scripted::*;
pub use server::*;
