//! Utility functions for the ladder service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique record ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Lower-cased ASCII alphanumeric projection of a display name, used for URL paths
pub fn slugify(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Round half up to the nearest integer, `floor(x + 0.5)`
///
/// Values outside the `i32` range saturate at `i32::MIN` / `i32::MAX` and
/// NaN maps to 0. Ratings stay far inside that range for any validated
/// K-factor, so saturation only shows up with absurd inputs.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_id();
        let id2 = generate_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Mew2King"), "mew2king");
        assert_eq!(slugify("Dr. Peppers!"), "drpeppers");
        assert_eq!(slugify("カズヤ"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(1016.0), 1016);
        assert_eq!(round_half_up(1015.5), 1016);
        assert_eq!(round_half_up(1015.49), 1015);
        assert_eq!(round_half_up(-0.5), 0);
        assert_eq!(round_half_up(-1.5), -1);
    }

    #[test]
    fn test_round_half_up_saturates() {
        assert_eq!(round_half_up(1e12), i32::MAX);
        assert_eq!(round_half_up(-1e12), i32::MIN);
        assert_eq!(round_half_up(f64::NAN), 0);
    }
}
