//! relay-core
//!
//! Delivery and coordination core of a feedback-collection SDK:
//! - **queue**: durable retrying request queue (FIFO single-flight delivery,
//!   jittered backoff, snapshot persistence, subscriber fan-out)
//! - **session**: the state machine that owns one feedback-prompt flow and
//!   reacts to the queue's results
//! - **domain**: request/result/failure types and the prompt vocabulary
//! - **ports**: the external collaborators (transport, presenter, snapshot
//!   store) this core calls but does not implement
//! - **codec** / **fanout**: shared decode and broadcast helpers

pub mod codec;
pub mod domain;
pub mod error;
pub mod fanout;
pub mod ports;
pub mod queue;
pub mod session;

pub use error::RelayError;
