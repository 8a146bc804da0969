//! Logger setup for the binary, driven by the `log` section of the config.

use std::str::FromStr;

use log::LevelFilter;

use super::config::LogConfig;

pub fn initialize(config: &LogConfig) {
    let level = parse_level(&config.level).unwrap_or_else(|| {
        eprintln!(
            "Warning: unknown log level {:?}, using info",
            config.level
        );
        LevelFilter::Info
    });
    engine_logging::initialize(&config.destination(), level);
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(raw.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
        assert_eq!(parse_level(" off "), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }
}
