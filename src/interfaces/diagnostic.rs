use crate::error::BookingError;
use miette::{MietteDiagnostic, Report};

const RETRY_INPUT: &str = "Fix the input and try again.";
const RETRY_LATER: &str = "This may be temporary. Please try again.";
const LOG_IN_AGAIN: &str = "Log in with `transit-booking login` and try again.";

/// Turns a client error into a diagnostic for the terminal, with a hint on
/// what the user can do next.
pub fn report(error: BookingError) -> Report {
    let help = match &error {
        BookingError::ValidationError(_) => Some(RETRY_INPUT),
        BookingError::Unauthenticated | BookingError::Unauthorized(_) => Some(LOG_IN_AGAIN),
        e if e.is_retryable() => Some(RETRY_LATER),
        _ => None,
    };

    let diagnostic = MietteDiagnostic::new(error.to_string());
    match help {
        Some(help) => Report::new(diagnostic.with_help(help)),
        None => Report::new(diagnostic),
    }
}
