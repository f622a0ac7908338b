//! Auth-domain models: the persisted credential triple, redacted secrets, and the
//! authorization-code session handshake.

pub mod credential;
pub mod secret;
pub mod session;

pub use credential::*;
pub use secret::*;
pub use session::*;
