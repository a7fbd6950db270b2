use std::env;

use crate::engine::transitions::TransitionPolicy;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub transition_policy: TransitionPolicy,
    pub max_save_retries: u32,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5001,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            event_buffer_size: 1024,
            transition_policy: TransitionPolicy::Strict,
            max_save_retries: 3,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let log_format = match env::var("LOG_FORMAT") {
            Ok(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            Ok(raw) if raw.eq_ignore_ascii_case("compact") => LogFormat::Compact,
            Ok(raw) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {raw}, expected compact/json"
                )));
            }
            Err(_) => defaults.log_format,
        };

        let strict = parse_or_default("STRICT_TRANSITIONS", true)?;
        let transition_policy = if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        };

        let event_buffer_size: usize =
            parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?;
        if event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            event_buffer_size,
            transition_policy,
            max_save_retries: parse_or_default("MAX_SAVE_RETRIES", defaults.max_save_retries)?,
            cors_origin: env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
