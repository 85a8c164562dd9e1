//! Byte-level plumbing shared by the relay and the client: incremental
//! UTF-8 decoding of network chunks and classification of stream lines.

pub mod decode;
pub mod frame;
