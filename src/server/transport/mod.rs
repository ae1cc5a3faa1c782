//! Transport adapters carrying JSON-RPC envelopes to and from the dispatcher.

pub mod http;
pub mod stdio;
