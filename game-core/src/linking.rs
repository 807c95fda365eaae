use chrono::{DateTime, Duration, Utc};
use game_types::{LinkPin, PIN_VALIDITY_SECONDS};
use rand::Rng;

/// Upper bound on draws before PIN generation gives up
pub const MAX_PIN_DRAWS: usize = 100;

pub const DEFAULT_SECONDARY_PREFIX: &str = "amzn1.ask.account.";

pub struct PinPolicy {
    pub validity: Duration,
    pub max_draws: usize,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            validity: Duration::seconds(PIN_VALIDITY_SECONDS),
            max_draws: MAX_PIN_DRAWS,
        }
    }
}

impl PinPolicy {
    /// Four digits, never starting with zero so it reads back unambiguously
    pub fn draw_code(&self, rng: &mut impl Rng) -> String {
        rng.random_range(1000..=9999u32).to_string()
    }

    pub fn is_expired(&self, pin: &LinkPin, now: DateTime<Utc>) -> bool {
        now - pin.created_at > self.validity
    }

    pub fn expires_at(&self, pin: &LinkPin) -> DateTime<Utc> {
        pin.created_at + self.validity
    }

    /// Creation times strictly before this are expired
    pub fn expiry_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.validity
    }

    /// Draw codes until `is_taken` accepts one, or give up after `max_draws`.
    pub fn generate_code(
        &self,
        rng: &mut impl Rng,
        mut is_taken: impl FnMut(&str) -> bool,
    ) -> Option<String> {
        (0..self.max_draws)
            .map(|_| self.draw_code(&mut *rng))
            .find(|code| !is_taken(code.as_str()))
    }
}

/// Identifiers issued by the voice assistant carry a fixed prefix
pub fn has_secondary_prefix(identity: &str, prefix: &str) -> bool {
    !prefix.is_empty() && identity.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin_created(seconds_ago: i64, now: DateTime<Utc>) -> LinkPin {
        LinkPin {
            code: "1234".to_string(),
            owner_identity: "web-user".to_string(),
            created_at: now - Duration::seconds(seconds_ago),
        }
    }

    #[test]
    fn test_pin_policy_defaults() {
        let policy = PinPolicy::default();
        assert_eq!(policy.validity, Duration::seconds(300));
        assert_eq!(policy.max_draws, MAX_PIN_DRAWS);
    }

    #[test]
    fn test_codes_are_four_digits() {
        let policy = PinPolicy::default();
        let mut rng = rand::rng();

        for _ in 0..200 {
            let code = policy.draw_code(&mut rng);
            assert_eq!(code.len(), 4);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_expiry_window() {
        let policy = PinPolicy::default();
        let now = Utc::now();

        assert!(!policy.is_expired(&pin_created(0, now), now));
        assert!(!policy.is_expired(&pin_created(300, now), now));
        assert!(policy.is_expired(&pin_created(301, now), now));

        let pin = pin_created(0, now);
        assert_eq!(policy.expires_at(&pin), now + Duration::seconds(300));
        assert_eq!(policy.expiry_cutoff(now), now - Duration::seconds(300));
    }

    #[test]
    fn test_generate_code_skips_taken_codes() {
        let policy = PinPolicy::default();
        let mut rng = rand::rng();
        let mut rejected = 0;

        let code = policy
            .generate_code(&mut rng, |_| {
                rejected += 1;
                rejected <= 3
            })
            .unwrap();

        assert_eq!(code.len(), 4);
        assert_eq!(rejected, 4);
    }

    #[test]
    fn test_generate_code_gives_up() {
        let policy = PinPolicy {
            max_draws: 5,
            ..PinPolicy::default()
        };
        let mut draws = 0;

        let code = policy.generate_code(&mut rand::rng(), |_| {
            draws += 1;
            true
        });

        assert!(code.is_none());
        assert_eq!(draws, 5);
    }

    #[test]
    fn test_secondary_prefix() {
        assert!(has_secondary_prefix("amzn1.ask.account.ABC", DEFAULT_SECONDARY_PREFIX));
        assert!(!has_secondary_prefix("firebase-uid-123", DEFAULT_SECONDARY_PREFIX));
        assert!(!has_secondary_prefix("anything", ""));
    }
}
