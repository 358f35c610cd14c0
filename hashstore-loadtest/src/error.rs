//! Errors of individual checks.

use reqwest::StatusCode;

/// Reasons a single check can fail.
///
/// None of these are fatal, they are recorded as failures and the virtual user carries on.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The service answered with a status other than the one expected for this identifier.
    #[error("Expected {} but got {}", .expected.as_u16(), .actual.as_u16())]
    StatusMismatch {
        /// The status code configured for the case and operation.
        expected: StatusCode,
        /// The status code the service returned.
        actual: StatusCode,
    },
    /// Any error emitted from the underlying [`reqwest`] client, such as refused connections.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_both_codes() {
        let error = CheckError::StatusMismatch {
            expected: StatusCode::OK,
            actual: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(error.to_string(), "Expected 200 but got 500");
    }
}
