use rand::Rng;

/// Generate a random 6-digit numeric one-time code.
pub fn generate() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Exact string equality against the stored code.
///
/// Isolated behind a name so a constant-time comparison can be substituted
/// here without touching callers.
pub fn otp_matches(submitted: &str, stored: &str) -> bool {
    submitted == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn match_is_exact() {
        assert!(otp_matches("123456", "123456"));
        assert!(!otp_matches("123457", "123456"));
        assert!(!otp_matches("", "123456"));
        assert!(!otp_matches("123456 ", "123456"));
        assert!(!otp_matches("0123456", "123456"));
    }
}
