//! Runtime configuration, read from the process environment.

use thiserror::Error;

/// Used when `JWT_SECRET` is unset. Fine for a laptop, never for a deployment.
pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Longest accepted token lifetime: 30 days.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// bcrypt only accepts costs in `4..=31`.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmsConfig {
    /// `WMS_BIND_ADDR`
    pub bind_addr: String,
    /// `JWT_SECRET`
    pub jwt_secret: String,
    /// `WMS_TOKEN_TTL_MINUTES`
    pub token_ttl_minutes: i64,
    /// `WMS_ALLOW_OVER_RECEIPT`: receiving more than ordered on a line.
    pub allow_over_receipt: bool,
    /// `WMS_SHIP_REQUIRES_PACKED`: refuse to ship orders that were not packed.
    pub ship_requires_packed: bool,
    /// `WMS_COMMIT_RETRIES`: attempts after a lost compare-and-swap.
    pub commit_retries: u32,
    /// `WMS_SEED_DEMO`
    pub seed_demo: bool,
    /// `WMS_BCRYPT_COST`
    pub bcrypt_cost: u32,
}

impl Default for WmsConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_minutes: 480,
            allow_over_receipt: true,
            ship_requires_packed: false,
            commit_retries: 3,
            seed_demo: true,
            bcrypt_cost: 12,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value for {key}: '{value}' ({reason})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl WmsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        Ok(Self {
            bind_addr: lookup("WMS_BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret,
            token_ttl_minutes: parse_at_most(
                &lookup,
                "WMS_TOKEN_TTL_MINUTES",
                defaults.token_ttl_minutes,
                MAX_TOKEN_TTL_MINUTES,
                "at most 43200 minutes (30 days)",
            )?,
            allow_over_receipt: parse_flag(&lookup, "WMS_ALLOW_OVER_RECEIPT", defaults.allow_over_receipt)?,
            ship_requires_packed: parse_flag(&lookup, "WMS_SHIP_REQUIRES_PACKED", defaults.ship_requires_packed)?,
            commit_retries: parse_num(&lookup, "WMS_COMMIT_RETRIES", defaults.commit_retries)?,
            seed_demo: parse_flag(&lookup, "WMS_SEED_DEMO", defaults.seed_demo)?,
            bcrypt_cost: parse_bcrypt_cost(&lookup, defaults.bcrypt_cost)?,
        })
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            key,
            value: raw,
            reason: "expected true/false",
        }),
    }
}

fn parse_num<T: std::str::FromStr + PartialOrd + Default>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        Ok(_) => Err(ConfigError {
            key,
            value: raw,
            reason: "must be positive",
        }),
        Err(_) => Err(ConfigError {
            key,
            value: raw,
            reason: "not a number",
        }),
    }
}

fn parse_at_most<T: std::str::FromStr + PartialOrd + Default>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    max: T,
    reason: &'static str,
) -> Result<T, ConfigError> {
    let value = parse_num(lookup, key, default)?;
    if value > max {
        return Err(ConfigError {
            key,
            value: lookup(key).unwrap_or_default(),
            reason,
        });
    }
    Ok(value)
}

fn parse_bcrypt_cost(
    lookup: &impl Fn(&str) -> Option<String>,
    default: u32,
) -> Result<u32, ConfigError> {
    const KEY: &str = "WMS_BCRYPT_COST";
    let cost = parse_num(lookup, KEY, default)?;
    if !BCRYPT_COST_RANGE.contains(&cost) {
        return Err(ConfigError {
            key: KEY,
            value: lookup(KEY).unwrap_or_default(),
            reason: "must be between 4 and 31",
        });
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_keep_permissive_workflow() {
        let cfg = WmsConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, WmsConfig::default());
        assert!(cfg.allow_over_receipt);
        assert!(!cfg.ship_requires_packed);
        assert_eq!(cfg.token_ttl_minutes, 480);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = WmsConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "s3cret"),
            ("WMS_SHIP_REQUIRES_PACKED", "TRUE"),
            ("WMS_ALLOW_OVER_RECEIPT", "0"),
            ("WMS_COMMIT_RETRIES", "5"),
            ("WMS_BIND_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();

        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(cfg.ship_requires_packed);
        assert!(!cfg.allow_over_receipt);
        assert_eq!(cfg.commit_retries, 5);
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn garbage_is_reported_with_its_key() {
        let err = WmsConfig::from_lookup(lookup(&[("WMS_SEED_DEMO", "maybe")])).unwrap_err();
        assert_eq!(err.key, "WMS_SEED_DEMO");

        let err = WmsConfig::from_lookup(lookup(&[("WMS_TOKEN_TTL_MINUTES", "-5")])).unwrap_err();
        assert_eq!(err.reason, "must be positive");
    }

    #[test]
    fn token_ttl_and_bcrypt_cost_are_bounded() {
        let err = WmsConfig::from_lookup(lookup(&[(
            "WMS_TOKEN_TTL_MINUTES",
            "9223372036854775807",
        )]))
        .unwrap_err();
        assert_eq!(err.key, "WMS_TOKEN_TTL_MINUTES");
        assert_eq!(err.value, "9223372036854775807");

        let cfg = WmsConfig::from_lookup(lookup(&[("WMS_TOKEN_TTL_MINUTES", "43200")])).unwrap();
        assert_eq!(cfg.token_ttl_minutes, MAX_TOKEN_TTL_MINUTES);

        let err = WmsConfig::from_lookup(lookup(&[("WMS_BCRYPT_COST", "3")])).unwrap_err();
        assert_eq!(err.key, "WMS_BCRYPT_COST");
        let err = WmsConfig::from_lookup(lookup(&[("WMS_BCRYPT_COST", "32")])).unwrap_err();
        assert_eq!(err.reason, "must be between 4 and 31");
    }
}
