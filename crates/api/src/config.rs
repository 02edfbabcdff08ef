use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{Context, Result};
use shadow_lookup::{DEFAULT_SEARCH_URL, DEFAULT_TRANSLATE_URL};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct ShadowConfig {
    pub host: IpAddr,
    pub port: u16,
    pub translate_url: Url,
    pub search_url: Url,
    /// `None` leaves the HTTP client's own default in place.
    pub lookup_timeout: Option<Duration>,
    /// Empty means any origin may call the API.
    pub allowed_origins: Vec<String>,
    /// Key the rate limiter on `x-forwarded-for` instead of the peer
    /// address. Only safe behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl ShadowConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read("PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("PORT must be a valid port number, got {value:?}"))?,
            None => DEFAULT_PORT,
        };
        let host = match read("SHADOW_HOST") {
            Some(value) => value
                .parse::<IpAddr>()
                .with_context(|| format!("SHADOW_HOST must be an IP address, got {value:?}"))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let translate_url = parse_url(
            "SHADOW_TRANSLATE_URL",
            read("SHADOW_TRANSLATE_URL").as_deref().unwrap_or(DEFAULT_TRANSLATE_URL),
        )?;
        let search_url = parse_url(
            "SHADOW_SEARCH_URL",
            read("SHADOW_SEARCH_URL").as_deref().unwrap_or(DEFAULT_SEARCH_URL),
        )?;
        let lookup_timeout = read("SHADOW_LOOKUP_TIMEOUT_SECONDS")
            .map(|value| {
                value.parse::<u64>().with_context(|| {
                    format!("SHADOW_LOOKUP_TIMEOUT_SECONDS must be whole seconds, got {value:?}")
                })
            })
            .transpose()?
            .map(Duration::from_secs);
        let allowed_origins = read("SHADOW_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let trust_forwarded_for = match read("SHADOW_TRUST_FORWARDED_FOR") {
            Some(value) => parse_flag(&value).with_context(|| {
                format!("SHADOW_TRUST_FORWARDED_FOR must be true or false, got {value:?}")
            })?,
            None => false,
        };

        Ok(Self {
            host,
            port,
            translate_url,
            search_url,
            lookup_timeout,
            allowed_origins,
            trust_forwarded_for,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("{key} must be an absolute URL, got {value:?}"))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
