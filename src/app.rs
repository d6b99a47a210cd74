//! The usage check pipeline: login, fetch, report.

use std::io::{self, Write};

use tracing::info;

use crate::config::ResolvedConfig;
use crate::credentials::Credentials;
use crate::portal::{LoginSequencer, MarkerCheck, PortalError, PortalSession, ProgressExtractor};
use crate::report::{ReportError, UsageReport};

/// Process exit status after a printed report.
pub const EXIT_OK: u8 = 0;
/// Process exit status for every failure.
pub const EXIT_FAILURE: u8 = 1;

/// Why a usage check did not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Invalid portal settings: {0}")]
    Setup(#[source] PortalError),

    #[error("Connection error: {0}")]
    Connection(#[source] PortalError),

    #[error("Login failed. Please check your credentials.")]
    LoginRejected,

    #[error("Error fetching account page: {0}")]
    AccountPage(#[source] PortalError),

    #[error("Could not find progress value on the page.")]
    ProgressNotFound,

    #[error(transparent)]
    InvalidProgress(#[from] ReportError),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Log in, read the progress value and build the report.
///
/// Progress lines are written to `out` as each step starts or succeeds.
pub async fn check_usage<W: Write>(
    config: &ResolvedConfig,
    credentials: &Credentials,
    out: &mut W,
) -> Result<UsageReport, CheckError> {
    let session = PortalSession::new(&config.user_agent).map_err(CheckError::Setup)?;
    let extractor =
        ProgressExtractor::new(config.progress_selectors.as_slice()).map_err(CheckError::Setup)?;
    let sequencer = LoginSequencer::with_check(
        config.login_url.clone(),
        MarkerCheck::new(config.login_markers.clone()),
    );

    writeln!(out, "\nLogging in...")?;
    let logged_in = sequencer
        .attempt_login(&session, credentials)
        .await
        .map_err(CheckError::Connection)?;
    if !logged_in {
        return Err(CheckError::LoginRejected);
    }
    writeln!(out, "Login successful!")?;

    writeln!(out, "\nFetching progress value...")?;
    let raw = extractor
        .fetch(&session, &config.account_url)
        .await
        .map_err(CheckError::AccountPage)?
        .ok_or(CheckError::ProgressNotFound)?;
    info!(value = raw.as_str(), "Progress value");

    Ok(UsageReport::from_progress(&raw, config.total_capacity_gb)?)
}

/// Print the final report line, plus a hint when no allowance is configured.
pub fn print_report<W: Write>(report: &UsageReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "\nData usage: {report}")?;
    if report.usage.is_none() {
        writeln!(out, "(Set ILIAD_DATA_GB in .env to see usage in GB)")?;
    }
    Ok(())
}

/// Print the outcome of [`check_usage`] and return the process exit status.
pub fn report_outcome<W: Write>(
    outcome: Result<UsageReport, CheckError>,
    out: &mut W,
) -> io::Result<u8> {
    match outcome {
        Ok(report) => {
            print_report(&report, out)?;
            Ok(EXIT_OK)
        }
        Err(CheckError::ProgressNotFound) => {
            writeln!(out, "\n{}", CheckError::ProgressNotFound)?;
            Ok(EXIT_FAILURE)
        }
        Err(err) => {
            writeln!(out, "{err}")?;
            Ok(EXIT_FAILURE)
        }
    }
}
