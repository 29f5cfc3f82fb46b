/// One-time code generation and matching
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Codes expire ten minutes after issuance
pub const OTP_TTL_MINUTES: i64 = 10;

/// A freshly generated one-time code with its expiry
#[derive(Debug, Clone)]
pub struct OneTimeCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a 6-digit numeric code (100000..=999999)
pub fn generate() -> OneTimeCode {
    let code = rand::thread_rng().gen_range(100_000..=999_999);

    OneTimeCode {
        code: code.to_string(),
        expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
    }
}

/// A submitted code is valid only when one is stored, it matches exactly,
/// and its expiry is still in the future.
pub fn matches(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    submitted: &str,
) -> bool {
    match (stored, expires_at) {
        (Some(code), Some(expiry)) => code == submitted && expiry > Utc::now(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_six_digit_codes() {
        for _ in 0..100 {
            let otp = generate();
            assert_eq!(otp.code.len(), 6);
            let value: u32 = otp.code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let otp = generate();
        let ttl = otp.expires_at - Utc::now();
        assert!(ttl <= Duration::minutes(OTP_TTL_MINUTES));
        assert!(ttl > Duration::minutes(OTP_TTL_MINUTES - 1));
    }

    #[test]
    fn matching_rules() {
        let future = Utc::now() + Duration::minutes(5);
        let past = Utc::now() - Duration::seconds(1);

        assert!(matches(Some("123456"), Some(future), "123456"));
        assert!(!matches(Some("123456"), Some(future), "654321"));
        assert!(!matches(Some("123456"), Some(past), "123456"));
        assert!(!matches(None, Some(future), "123456"));
        assert!(!matches(Some("123456"), None, "123456"));
    }
}
