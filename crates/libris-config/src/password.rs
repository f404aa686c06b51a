use std::env;

use crate::{ConfigError, parse_or};

/// bcrypt's own bounds.
const COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Clone, Debug)]
pub struct PasswordConfig {
    pub bcrypt_cost: u32,
}

impl PasswordConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", 12)?;
        if !COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                reason: format!("must be within {:?}", COST_RANGE),
            });
        }
        Ok(Self { bcrypt_cost })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup_from;

    #[test]
    fn test_default_cost() {
        assert_eq!(PasswordConfig::from_vars(lookup_from(&[])).unwrap().bcrypt_cost, 12);
    }

    #[test]
    fn test_out_of_range_cost() {
        let err = PasswordConfig::from_vars(lookup_from(&[("BCRYPT_COST", "40")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BCRYPT_COST", .. }));
    }
}
