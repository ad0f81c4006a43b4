//! Authentication and session management
//!
//! The counterpart's auth scheme is cookie-and-token based: a set of Google
//! account cookies is mandatory, while the CSRF token and session id are
//! optional and self-healing (they are scraped back out of a page fetch
//! whenever they go stale). This module owns the session data model, the
//! on-disk profile store, the token-refresh scraping, and the seam to the
//! black-box browser login flow.

pub mod login;
pub mod profile;
pub mod recovery;
pub mod session;

pub use login::{ExternalLoginCommand, LoginFlow};
pub use profile::{Profile, ProfileStore};
pub use session::{CookieRecord, Cookies, Session};
