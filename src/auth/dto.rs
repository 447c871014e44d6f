use serde::Deserialize;

/// Form body for the registration step.
///
/// Fields default to empty strings so a missing field reads as blank and
/// fails presence validation instead of a 422 from the extractor.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Form body for OTP submission.
#[derive(Debug, Deserialize)]
pub struct OtpForm {
    #[serde(default)]
    pub otp: String,
}

/// Form body for login.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
