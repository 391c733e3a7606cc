//! wol-attach Core Library
//!
//! Attaches a terminal display to a socket carrying a remote shell session:
//! - Attachment bridge with pluggable inbound extractor and outbound wrapper
//! - Socket readiness guard and binary input codec
//! - Disposable listener handles and a single-threaded event emitter
//! - Session-routing envelope, configuration, and tracing setup

pub mod attach;
pub mod binary;
pub mod config;
pub mod disposable;
pub mod envelope;
pub mod error;
pub mod event;
pub mod guard;
pub mod socket;
pub mod terminal;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod tracing_init;

pub use attach::{AttachBridge, AttachOptions};
pub use config::Config;
pub use disposable::{Subscription, SubscriptionSet};
pub use envelope::SessionEnvelope;
pub use error::{Error, Result};
pub use event::{Emitter, Listener};
pub use socket::{CloseEvent, ErrorEvent, Frame, ReadyState, Socket};
pub use terminal::Terminal;
