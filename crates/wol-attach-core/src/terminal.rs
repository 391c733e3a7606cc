//! Display-widget abstraction.

use crate::disposable::Subscription;
use crate::event::Listener;

/// A terminal display that renders output and reports user input.
///
/// `on_binary` listeners receive a string whose chars each encode one byte
/// (code points 0..=255), mirroring how terminal widgets surface raw input
/// such as mouse reports.
pub trait Terminal {
    fn write_str(&self, data: &str);

    fn write_bytes(&self, data: &[u8]);

    fn on_data(&self, listener: Listener<String>) -> Subscription;

    fn on_binary(&self, listener: Listener<String>) -> Subscription;
}
