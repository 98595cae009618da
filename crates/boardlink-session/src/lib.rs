//! Client session management for Boardlink.
//!
//! This crate is everything a client keeps between two messages:
//!
//! 1. **Session state**: board mirror, history, color, pending selection
//!    ([`SessionManager`])
//! 2. **Persistence**: what survives a reload ([`SessionStore`] trait,
//!    with [`MemoryStore`] and [`JsonFileStore`])
//! 3. **Provisioning**: where a session id comes from ([`Provisioner`],
//!    with [`FixedProvisioner`] and [`HttpProvisioner`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client runtime (above)  ← feeds socket bytes and input events in
//!     ↕
//! Session Layer (this crate)  ← decides what each message means
//!     ↕
//! Game Layer (below)  ← Board, Selection
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod manager;
mod provision;
mod store;

pub use error::{SessionError, StoreError};
pub use manager::{SessionEvent, SessionManager};
pub use provision::{FixedProvisioner, HttpProvisioner, Provisioner};
pub use store::{JsonFileStore, MemoryStore, SessionStore};
