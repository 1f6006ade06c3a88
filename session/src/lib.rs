//! # Pantry Session
//!
//! Per-session state shared by every request of a session:
//!
//! - [`TokenState`]: the bearer token, read from the `token` cookie and
//!   mirrored in memory. Implements [`CredentialSource`].
//! - [`ServerMessages`]: the one-shot message slot a server render leaves for
//!   the client. Implements [`MessageSink`].
//!
//! Both sit on a [`CookieStore`]; [`MemoryCookieJar`] is the in-process one.
//!
//! ## Example
//!
//! ```
//! use pantry_core::environment::MessageKind;
//! use pantry_session::{MemoryCookieJar, ServerMessages, consume_on_client_start};
//!
//! let jar = MemoryCookieJar::new();
//!
//! // Server render
//! ServerMessages::new(jar.clone()).write_message(MessageKind::Error, "error.permission-denied");
//!
//! // Client start-up
//! let client = ServerMessages::new(jar);
//! assert!(consume_on_client_start(&client, |m| assert_eq!(m.message, "error.permission-denied")));
//! assert!(!client.consume_message(|_| {}));
//! ```
//!
//! [`CredentialSource`]: pantry_core::environment::CredentialSource
//! [`MessageSink`]: pantry_core::environment::MessageSink

pub mod cookie;
pub mod error;
pub mod message;
pub mod token;

pub use cookie::{CookieStore, MemoryCookieJar, read_json, write_json};
pub use error::{Result, SessionError};
pub use message::{MESSAGE_COOKIE, ServerMessage, ServerMessages, consume_on_client_start};
pub use token::{TOKEN_COOKIE, TokenState};
