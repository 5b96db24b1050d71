//! Cloned-voice storage: a JSON-indexed flat file store.

pub mod store;

pub use store::{Voice, VoiceStore};
