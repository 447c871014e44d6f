use thiserror::Error;

/// Everything that can go wrong in the register/verify/login flow.
///
/// All variants are recovered at the handler boundary as a flash message
/// plus a redirect; only `Internal` surfaces as a 500. `InvalidCredentials`
/// deliberately covers unknown email, unverified account and wrong password
/// alike so a response never leaks which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("All fields are required")]
    Validation,
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("No verification in progress")]
    NoPendingSession,
    #[error("Invalid OTP")]
    InvalidOtp,
    #[error("Invalid Credentials or OTP not verified")]
    InvalidCredentials,
    #[error("Please log in")]
    Unauthenticated,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// The prior step the client is sent back to.
    pub fn redirect_target(&self) -> &'static str {
        match self {
            AuthError::Validation | AuthError::DuplicateEmail => "/register",
            AuthError::InvalidOtp => "/verify-otp",
            AuthError::NoPendingSession
            | AuthError::InvalidCredentials
            | AuthError::Unauthenticated
            | AuthError::Internal(_) => "/login",
        }
    }
}
