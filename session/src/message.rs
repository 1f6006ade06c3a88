//! One-shot server → client message slot.
//!
//! The server side leaves at most one message per render in the
//! `serverMessage` cookie. The client consumes it once after start-up and
//! clears the slot.

use crate::cookie::{CookieStore, read_json, write_json};
use pantry_core::environment::{MessageKind, MessageSink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cookie holding the pending message.
pub const MESSAGE_COOKIE: &str = "serverMessage";

/// A message handed from the server phase to the client phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Message kind
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Message text or message key
    pub message: String,
}

impl ServerMessage {
    /// Create a message.
    pub fn new(kind: MessageKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Reader and writer of the message slot.
#[derive(Debug, Clone)]
pub struct ServerMessages<C> {
    cookies: C,
    written: Arc<AtomicBool>,
}

impl<C: CookieStore> ServerMessages<C> {
    /// Slot backed by `cookies`.
    pub fn new(cookies: C) -> Self {
        Self {
            cookies,
            written: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start a new render; the slot may be written once more.
    pub fn begin_render(&self) {
        self.written.store(false, Ordering::Release);
    }

    /// Leave a message for the client.
    ///
    /// Returns `false` when a message was already written during this render;
    /// the later message is dropped.
    pub fn write_message(&self, kind: MessageKind, message: &str) -> bool {
        if self
            .written
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(%kind, text = message, "Server message already set for this render, ignoring");
            return false;
        }

        match write_json(&self.cookies, MESSAGE_COOKIE, &ServerMessage::new(kind, message)) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Server message not written");
                self.written.store(false, Ordering::Release);
                false
            },
        }
    }

    /// Pending message, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<ServerMessage> {
        read_json(&self.cookies, MESSAGE_COOKIE).ok().flatten()
    }

    /// Take the pending message and clear the slot.
    ///
    /// A malformed slot is cleared and yields `None`.
    pub fn take_message(&self) -> Option<ServerMessage> {
        let message = read_json::<ServerMessage>(&self.cookies, MESSAGE_COOKIE)
            .inspect_err(|e| tracing::warn!(error = %e, "Discarding malformed server message"))
            .ok()
            .flatten();

        if self.cookies.get(MESSAGE_COOKIE).is_some() {
            self.cookies.remove(MESSAGE_COOKIE);
        }
        message
    }

    /// Run `handler` on the pending message, if any, then clear the slot.
    ///
    /// Returns `true` if the handler ran.
    pub fn consume_message<F>(&self, handler: F) -> bool
    where
        F: FnOnce(&ServerMessage),
    {
        match self.take_message() {
            Some(message) => {
                handler(&message);
                true
            },
            None => false,
        }
    }
}

impl<C: CookieStore> MessageSink for ServerMessages<C> {
    fn set_message(&self, kind: MessageKind, message: &str) {
        self.write_message(kind, message);
    }
}

/// Client start-up hook: hand any message left by the server to `handler`.
///
/// Returns `true` if a message was delivered.
pub fn consume_on_client_start<C, F>(messages: &ServerMessages<C>, handler: F) -> bool
where
    C: CookieStore,
    F: FnOnce(&ServerMessage),
{
    messages.consume_message(|message| {
        tracing::info!(kind = %message.kind, text = %message.message, "Consumed server message");
        handler(message);
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic
mod tests {
    use super::*;
    use crate::cookie::MemoryCookieJar;

    #[test]
    fn test_consume_exactly_once() {
        let messages = ServerMessages::new(MemoryCookieJar::new());
        assert!(messages.write_message(MessageKind::Error, "X"));

        let mut seen = Vec::new();
        assert!(messages.consume_message(|m| seen.push(m.clone())));
        assert!(!messages.consume_message(|m| seen.push(m.clone())));
        assert_eq!(seen, vec![ServerMessage::new(MessageKind::Error, "X")]);
    }

    #[test]
    fn test_written_at_most_once_per_render() {
        let messages = ServerMessages::new(MemoryCookieJar::new());
        assert!(messages.write_message(MessageKind::Error, "first"));
        assert!(!messages.write_message(MessageKind::Info, "second"));
        assert_eq!(messages.peek().unwrap().message, "first");

        messages.begin_render();
        assert!(messages.write_message(MessageKind::Info, "next render"));
        assert_eq!(
            messages.take_message(),
            Some(ServerMessage::new(MessageKind::Info, "next render"))
        );
    }

    #[test]
    fn test_cookie_shape() {
        let jar = MemoryCookieJar::new();
        ServerMessages::new(jar.clone()).set_message(MessageKind::Info, "hello");

        let value: serde_json::Value = read_json(&jar, MESSAGE_COOKIE).unwrap().unwrap();
        assert_eq!(value, serde_json::json!({ "type": "info", "message": "hello" }));
    }

    #[test]
    fn test_malformed_slot_is_cleared() {
        let jar = MemoryCookieJar::new();
        jar.set(MESSAGE_COOKIE, "garbage".to_string());

        let messages = ServerMessages::new(jar.clone());
        assert!(!messages.consume_message(|_| panic!("handler must not run")));
        assert!(jar.get(MESSAGE_COOKIE).is_none());
    }

    #[test]
    fn test_client_start_hook() {
        let jar = MemoryCookieJar::new();
        ServerMessages::new(jar.clone()).write_message(MessageKind::Error, "error.permission-denied");

        let client = ServerMessages::new(jar);
        let mut delivered = None;
        assert!(consume_on_client_start(&client, |m| delivered = Some(m.message.clone())));
        assert_eq!(delivered.as_deref(), Some("error.permission-denied"));
    }
}
