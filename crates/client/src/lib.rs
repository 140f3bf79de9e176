//! 123pan API client.
//!
//! Holds the account session and the current-directory cursor, and wraps
//! every JSON endpoint behind typed async methods. HTTP goes through the
//! [`Transport`] trait so the engines built on top stay testable without a
//! network.

pub mod api;
pub mod client;
pub mod error;
pub mod listing;
pub mod nav;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{DEFAULT_SHARE_EXPIRATION, LoginState, ShareLink};
pub use client::Client;
pub use error::ApiError;
pub use listing::Listing;
pub use nav::DirectoryView;
pub use session::{AuthState, DeviceProfile, Platform, Session, SessionConfig};
pub use transport::{ApiRequest, BoxFuture, ByteStream, Download, HttpTransport, Method, Probe, Transport};
