//! Integration test utilities for the chat relay
//!
//! Spawns the gateway on an ephemeral port with a scripted chat source, and
//! provides a fake Twitch IRC endpoint for end-to-end runs.

pub mod fake_irc;
pub mod helpers;

pub use fake_irc::FakeIrcServer;
pub use helpers::*;
