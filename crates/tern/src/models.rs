//! The conversation objects passed between the client, the relay, and the
//! stores. Wire-level shapes (the relay request and the upstream payload)
//! live in `api` and `providers::openai`; these are the richer client-side
//! records the stores persist.
pub mod conversation;
pub mod message;
