//! Session-routing envelope for terminal traffic.
//!
//! When a machine's shell shares its socket with control traffic, terminal
//! bytes travel inside a small JSON envelope tagged with the session they
//! belong to:
//!
//! ```text
//! {"type":"data","session_id":3,"data":"ls\r"}
//! {"type":"control","session_id":3,"control":"ping"}
//! ```
//!
//! [`SessionEnvelope`] provides the wrapper/extractor pair that plugs this
//! framing into an [`AttachBridge`](crate::attach::AttachBridge).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attach::AttachOptions;

/// A message on an enveloped terminal channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvelopeMessage {
    /// Terminal payload for one session.
    Data { session_id: u32, data: String },
    /// Protocol control traffic, never displayed.
    Control { session_id: u32, control: String },
}

/// Identifies one terminal session on one machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub machine_name: String,
    pub session_id: u32,
}

impl SessionEnvelope {
    pub fn new(machine_name: impl Into<String>, session_id: u32) -> Self {
        Self {
            machine_name: machine_name.into(),
            session_id,
        }
    }

    /// Embed terminal input in a `data` envelope.
    pub fn wrap(&self, data: &str) -> String {
        let message = EnvelopeMessage::Data {
            session_id: self.session_id,
            data: data.to_string(),
        };
        match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode envelope, sending raw input");
                data.to_string()
            }
        }
    }

    /// Pull this session's terminal payload out of an inbound text frame.
    ///
    /// Control messages and data addressed to other sessions yield `None`.
    /// Text that is not an envelope passes through unchanged.
    pub fn extract(&self, received: &str) -> Option<String> {
        let Ok(message) = serde_json::from_str::<EnvelopeMessage>(received) else {
            return Some(received.to_string());
        };
        match message {
            EnvelopeMessage::Data { session_id, data } if session_id == self.session_id => {
                Some(data)
            }
            EnvelopeMessage::Data { session_id, .. } => {
                debug!(
                    machine = %self.machine_name,
                    session_id,
                    "Ignoring data for another session"
                );
                None
            }
            EnvelopeMessage::Control {
                session_id,
                control,
            } => {
                debug!(
                    machine = %self.machine_name,
                    session_id,
                    control = %control,
                    "Consumed control message"
                );
                None
            }
        }
    }

    /// Bridge options that route traffic through this envelope.
    ///
    /// The extracted payload is displayed rather than the raw envelope.
    pub fn attach_options(&self) -> AttachOptions {
        let wrapper = self.clone();
        let extractor = self.clone();
        AttachOptions::default()
            .with_message_wrapper(move |data| wrapper.wrap(data))
            .with_data_extractor(move |received| extractor.extract(received))
            .with_display_extracted(true)
    }
}
