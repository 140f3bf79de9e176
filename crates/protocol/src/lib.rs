//! Wire types for the 123pan web API.
//!
//! Every JSON endpoint answers with an [`Envelope`]; payloads are decoded
//! from its `data` field into the typed structs in [`messages`].

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod outcome;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::Envelope;
pub use outcome::{Outcome, Report};
pub use types::{DuplicatePolicy, EntryKind, ExistingFilePolicy, RemoteEntry, UserInfo};
