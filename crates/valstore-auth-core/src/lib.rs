//! Valstore Auth Core - cookie login and session business logic
//!
//! Re-authenticates captured browser cookies against the upstream identity
//! provider, signs the result into an expiring session token, and replays the
//! session's credentials against the storefront.

pub mod config;
pub mod cookies;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod redirect;
pub mod service;
pub mod session;
pub mod storefront;
pub mod transport;
pub mod version;

pub use config::*;
pub use cookies::{CookieSet, ESSENTIAL_COOKIES};
pub use error::*;
pub use identity::{IdentityClient, IdentityResult, LoginStage};
pub use service::*;
pub use session::{IssuedSession, SessionClaims, SessionIssuer};
pub use storefront::{StorefrontClient, StorefrontRequest};
pub use version::{ClientVersion, VersionError};
