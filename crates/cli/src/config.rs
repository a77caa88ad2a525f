use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub template_dir: PathBuf,
    pub cache_ttl: Duration,
    pub default_zoom: f64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            template_dir: PathBuf::from(try_load::<String>("TRENDZO_TEMPLATE_DIR", "templates")),
            cache_ttl: Duration::from_secs(try_load("TRENDZO_CACHE_TTL_SECS", "300")),
            default_zoom: load_zoom(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn try_load<T>(key: &str, default: &str) -> T
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        parse_default(default)
    })
}

fn parse_default<T: FromStr>(default: &str) -> T
where
    T::Err: Display,
{
    match default.parse() {
        Ok(value) => value,
        // Defaults are literals in this file.
        Err(e) => unreachable!("default {default:?} does not parse: {e}"),
    }
}

fn load_zoom() -> f64 {
    let zoom: f64 = try_load("TRENDZO_DEFAULT_ZOOM", "1.0");
    if template::validate_zoom(zoom).is_err() {
        warn!("TRENDZO_DEFAULT_ZOOM must be positive, got {zoom}, using 1.0");
        return 1.0;
    }
    zoom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let ttl: u64 = try_load("TRENDZO_TEST_UNSET_TTL_VAR", "300");
        assert_eq!(ttl, 300);

        env::set_var("TRENDZO_TEST_BAD_TTL_VAR", "soon");
        let ttl: u64 = try_load("TRENDZO_TEST_BAD_TTL_VAR", "300");
        assert_eq!(ttl, 300);

        env::set_var("TRENDZO_TEST_GOOD_TTL_VAR", "42");
        let ttl: u64 = try_load("TRENDZO_TEST_GOOD_TTL_VAR", "300");
        assert_eq!(ttl, 42);
    }
}
