// src/config.rs
//! Process configuration, read once at boot from the environment (with
//! `.env` support in dev). Credentials are optional on purpose: a provider
//! with no credentials reports "not configured" at fetch time instead of
//! keeping the whole service from starting.

use std::str::FromStr;

use crate::fetch::providers::{DEFAULT_NAVER_API_BASE, DEFAULT_YOUTUBE_API_BASE};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct NaverConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub naver: NaverConfig,
    pub youtube: YoutubeConfig,
    pub cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            naver: NaverConfig {
                base_url: env_or("NAVER_API_BASE", DEFAULT_NAVER_API_BASE),
                client_id: env_opt("NAVER_CLIENT_ID"),
                client_secret: env_opt("NAVER_CLIENT_SECRET"),
            },
            youtube: YoutubeConfig {
                base_url: env_or("YOUTUBE_API_BASE", DEFAULT_YOUTUBE_API_BASE),
                api_key: env_opt("YOUTUBE_API_KEY"),
            },
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", crate::cache::DEFAULT_TTL_SECS),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
            port: env_parse("PORT", DEFAULT_PORT),
        }
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    env_opt(name)
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn defaults_apply_without_env() {
        for k in [
            "NAVER_API_BASE",
            "NAVER_CLIENT_ID",
            "NAVER_CLIENT_SECRET",
            "YOUTUBE_API_BASE",
            "YOUTUBE_API_KEY",
            "CACHE_TTL_SECS",
            "HTTP_TIMEOUT_SECS",
            "PORT",
        ] {
            std::env::remove_var(k);
        }
        let cfg = AppConfig::from_env();
        assert_eq!(cfg.naver.base_url, DEFAULT_NAVER_API_BASE);
        assert!(cfg.naver.client_id.is_none());
        assert_eq!(cfg.cache_ttl_secs, crate::cache::DEFAULT_TTL_SECS);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[serial_test::serial]
    #[test]
    fn blank_credentials_read_as_unset_and_bad_numbers_fall_back() {
        std::env::set_var("NAVER_CLIENT_ID", "   ");
        std::env::set_var("CACHE_TTL_SECS", "not-a-number");
        let cfg = AppConfig::from_env();
        assert!(cfg.naver.client_id.is_none());
        assert_eq!(cfg.cache_ttl_secs, crate::cache::DEFAULT_TTL_SECS);
        std::env::remove_var("NAVER_CLIENT_ID");
        std::env::remove_var("CACHE_TTL_SECS");
    }
}
