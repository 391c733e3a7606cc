//! Attachment bridge between a terminal widget and a socket.
//!
//! Socket `message` events are written to the terminal; terminal `data` and
//! `binary` input events are sent on the socket (when bidirectional). Every
//! listener registration is tracked so teardown is complete and idempotent,
//! whether it is triggered by [`AttachBridge::dispose`] or by the socket
//! closing or failing.
//!
//! The bridge does not own the socket or the terminal and never reconnects:
//! once disposed it stays inert.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::binary::binary_string_to_bytes;
use crate::disposable::{Subscription, SubscriptionSet};
use crate::error::Result;
use crate::guard;
use crate::socket::{CloseEvent, ErrorEvent, Frame, Socket};
use crate::terminal::Terminal;

/// Inspects an inbound text frame. `None` keeps the frame off the display.
pub type DataExtractor = Rc<dyn Fn(&str) -> Option<String>>;

/// Transforms outbound text before it is sent.
pub type MessageWrapper = Rc<dyn Fn(&str) -> String>;

/// Bridge options, fixed for the bridge's lifetime.
#[derive(Clone)]
pub struct AttachOptions {
    /// Forward terminal input to the socket.
    pub bidirectional: bool,
    pub data_extractor: DataExtractor,
    pub message_wrapper: MessageWrapper,
    /// Write the extractor's output instead of the original frame.
    pub display_extracted: bool,
}

impl Default for AttachOptions {
    fn default() -> Self {
        Self {
            bidirectional: true,
            data_extractor: Rc::new(|data: &str| Some(data.to_string())),
            message_wrapper: Rc::new(|data: &str| data.to_string()),
            display_extracted: false,
        }
    }
}

impl AttachOptions {
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn with_data_extractor(
        mut self,
        extractor: impl Fn(&str) -> Option<String> + 'static,
    ) -> Self {
        self.data_extractor = Rc::new(extractor);
        self
    }

    pub fn with_message_wrapper(mut self, wrapper: impl Fn(&str) -> String + 'static) -> Self {
        self.message_wrapper = Rc::new(wrapper);
        self
    }

    pub fn with_display_extracted(mut self, display_extracted: bool) -> Self {
        self.display_extracted = display_extracted;
        self
    }
}

impl fmt::Debug for AttachOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachOptions")
            .field("bidirectional", &self.bidirectional)
            .field("display_extracted", &self.display_extracted)
            .finish_non_exhaustive()
    }
}

/// Binds one socket to one terminal for the socket's lifetime.
pub struct AttachBridge<S: Socket + 'static> {
    inner: Rc<BridgeInner<S>>,
}

struct BridgeInner<S> {
    socket: Rc<S>,
    options: AttachOptions,
    subscriptions: RefCell<SubscriptionSet>,
    active: Cell<bool>,
}

impl<S: Socket + 'static> AttachBridge<S> {
    pub fn new(socket: Rc<S>, options: AttachOptions) -> Self {
        Self {
            inner: Rc::new(BridgeInner {
                socket,
                options,
                subscriptions: RefCell::new(SubscriptionSet::new()),
                active: Cell::new(false),
            }),
        }
    }

    /// Attach `terminal` and start forwarding.
    ///
    /// Registers, in order: socket `message`, terminal `data` and `binary`
    /// (bidirectional only), socket `close`, socket `error`. Does nothing on
    /// a bridge that is already active or has been disposed.
    pub fn activate<T: Terminal + 'static>(&self, terminal: Rc<T>) {
        let inner = &self.inner;
        if inner.is_disposed() {
            warn!("Ignoring activate on a disposed attach bridge");
            return;
        }
        if inner.active.get() {
            warn!("Attach bridge is already bound to a terminal");
            return;
        }
        inner.active.set(true);

        let weak = Rc::downgrade(inner);

        let on_message = {
            let weak = Weak::clone(&weak);
            let terminal = Rc::clone(&terminal);
            inner.socket.on_message(Box::new(move |frame: &Frame| {
                if let Some(inner) = weak.upgrade() {
                    inner.write_frame(terminal.as_ref(), frame);
                }
                Ok(())
            }))
        };
        inner.track(on_message);

        if inner.options.bidirectional {
            let on_data = {
                let weak = Weak::clone(&weak);
                terminal.on_data(Box::new(move |data: &String| match weak.upgrade() {
                    Some(inner) => inner.send_data(data),
                    None => Ok(()),
                }))
            };
            inner.track(on_data);

            let on_binary = {
                let weak = Weak::clone(&weak);
                terminal.on_binary(Box::new(move |data: &String| match weak.upgrade() {
                    Some(inner) => inner.send_binary(data),
                    None => Ok(()),
                }))
            };
            inner.track(on_binary);
        }

        let on_close = {
            let weak = Weak::clone(&weak);
            inner.socket.on_close(Box::new(move |event: &CloseEvent| {
                debug!(code = ?event.code, reason = %event.reason, "Socket closed");
                if let Some(inner) = weak.upgrade() {
                    inner.dispose();
                }
                Ok(())
            }))
        };
        inner.track(on_close);

        let on_error = inner.socket.on_error(Box::new(move |event: &ErrorEvent| {
            warn!(error = %event.message, "Socket error");
            if let Some(inner) = weak.upgrade() {
                inner.dispose();
            }
            Ok(())
        }));
        inner.track(on_error);

        debug!(
            bidirectional = inner.options.bidirectional,
            subscriptions = self.subscription_count(),
            "Attach bridge activated"
        );
    }

    /// Unregister every listener. Safe to call any number of times.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Send terminal text through the wrapper and readiness guard.
    pub fn send_data(&self, data: &str) -> Result<()> {
        self.inner.send_data(data)
    }

    /// Send widget binary input (one byte per char) through the readiness guard.
    pub fn send_binary(&self, data: &str) -> Result<()> {
        self.inner.send_binary(data)
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Number of live listener registrations.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    pub fn options(&self) -> &AttachOptions {
        &self.inner.options
    }

    pub fn socket(&self) -> &Rc<S> {
        &self.inner.socket
    }
}

impl<S: Socket + 'static> fmt::Debug for AttachBridge<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachBridge")
            .field("options", &self.inner.options)
            .field("active", &self.inner.active.get())
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

impl<S: Socket> BridgeInner<S> {
    fn track(&self, handle: Subscription) {
        self.subscriptions.borrow_mut().push(handle);
    }

    fn is_disposed(&self) -> bool {
        self.subscriptions.borrow().is_disposed()
    }

    fn dispose(&self) {
        // Release outside the borrow: a handle's release may re-enter dispose.
        let handles = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            if subscriptions.is_disposed() {
                return;
            }
            subscriptions.drain()
        };
        let released = handles.len();
        for mut handle in handles {
            handle.dispose();
        }
        self.active.set(false);
        debug!(released, "Attach bridge disposed");
    }

    fn write_frame<T: Terminal + ?Sized>(&self, terminal: &T, frame: &Frame) {
        match frame {
            Frame::Binary(bytes) => terminal.write_bytes(bytes),
            Frame::Text(text) => match (self.options.data_extractor)(text) {
                Some(extracted) if self.options.display_extracted => {
                    terminal.write_str(&extracted);
                }
                Some(_) => terminal.write_str(text),
                None => trace!(len = text.len(), "Text frame suppressed by extractor"),
            },
        }
    }

    fn send_data(&self, data: &str) -> Result<()> {
        if self.is_disposed() {
            trace!("Dropping text input on disposed attach bridge");
            return Ok(());
        }
        if !guard::check_open(self.socket.ready_state())? {
            return Ok(());
        }
        let wrapped = (self.options.message_wrapper)(data);
        self.socket.send(Frame::Text(wrapped))
    }

    fn send_binary(&self, data: &str) -> Result<()> {
        if self.is_disposed() {
            trace!("Dropping binary input on disposed attach bridge");
            return Ok(());
        }
        if !guard::check_open(self.socket.ready_state())? {
            return Ok(());
        }
        self.socket.send(Frame::Binary(binary_string_to_bytes(data)))
    }
}
