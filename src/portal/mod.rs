//! Client for the account portal.
//!
//! A run is one login followed by one page fetch:
//!
//! 1. [`LoginSequencer::attempt_login`] GETs the login page, copies the
//!    hidden fields of its first form and POSTs them back with the
//!    credentials.
//! 2. [`ProgressExtractor::fetch`] GETs the account page with the cookies
//!    from step 1 and reads the `data-progress-value` attribute of the
//!    usage progress bar.

mod login;
mod progress;
mod session;

pub use login::{LoginCheck, LoginForm, LoginSequencer, MarkerCheck, IDENT_FIELD, PASSWORD_FIELD};
pub use progress::{ProgressExtractor, PROGRESS_ATTR};
pub use session::{Page, PortalSession};

/// Failures talking to the portal.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Network failure or non-success HTTP status.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("invalid user agent: {0}")]
    InvalidUserAgent(#[from] reqwest::header::InvalidHeaderValue),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}
