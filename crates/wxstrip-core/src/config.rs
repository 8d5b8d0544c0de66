use crate::app_config::{ClientConfig, NotFoundPolicy};
use crate::ConfigError;

/// Load client configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_client_config() -> Result<ClientConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_client_config_from_env()
}

/// Load client configuration from environment variables already in the process.
///
/// Unlike [`load_client_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is set to an invalid value.
pub fn load_client_config_from_env() -> Result<ClientConfig, ConfigError> {
    build_client_config(|key| std::env::var(key))
}

/// Build client configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables fall back to
/// [`ClientConfig::default`].
fn build_client_config<F>(lookup: F) -> Result<ClientConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = ClientConfig::default();

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_policy = |var: &str, default: NotFoundPolicy| -> Result<NotFoundPolicy, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.parse::<NotFoundPolicy>().map_err(|reason| invalid(var, reason)),
            Err(_) => Ok(default),
        }
    };

    let api_base_url = or_default("WXSTRIP_API_BASE_URL", &defaults.api_base_url);
    if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
        return Err(invalid(
            "WXSTRIP_API_BASE_URL",
            format!("\"{api_base_url}\" is not an http(s) URL"),
        ));
    }

    let proxy_prefix = or_default("WXSTRIP_PROXY_PREFIX", &defaults.proxy_prefix);
    let mirror_prefixes = match lookup("WXSTRIP_MIRROR_PREFIXES") {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Err(_) => defaults.mirror_prefixes.clone(),
    };
    let gfa_image_base_url = or_default("WXSTRIP_GFA_IMAGE_BASE_URL", &defaults.gfa_image_base_url);
    let frame_image_base_url =
        or_default("WXSTRIP_FRAME_IMAGE_BASE_URL", &defaults.frame_image_base_url);

    let request_timeout_ms = parse_u64("WXSTRIP_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?;
    let probe_timeout_ms = parse_u64("WXSTRIP_PROBE_TIMEOUT_MS", defaults.probe_timeout_ms)?;
    if request_timeout_ms == 0 || probe_timeout_ms == 0 {
        return Err(invalid(
            if request_timeout_ms == 0 {
                "WXSTRIP_REQUEST_TIMEOUT_MS"
            } else {
                "WXSTRIP_PROBE_TIMEOUT_MS"
            },
            "timeout must be greater than zero".to_owned(),
        ));
    }

    let max_retries = parse_u32("WXSTRIP_MAX_RETRIES", defaults.max_retries)?;
    let retry_initial_delay_ms =
        parse_u64("WXSTRIP_RETRY_INITIAL_DELAY_MS", defaults.retry_initial_delay_ms)?;

    let retry_jitter = match lookup("WXSTRIP_RETRY_JITTER") {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid("WXSTRIP_RETRY_JITTER", e.to_string()))?;
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(
                    "WXSTRIP_RETRY_JITTER",
                    format!("{value} is outside [0, 1)"),
                ));
            }
            value
        }
        Err(_) => defaults.retry_jitter,
    };

    let alpha_not_found = parse_policy("WXSTRIP_ALPHA_NOT_FOUND", defaults.alpha_not_found)?;
    let image_not_found = parse_policy("WXSTRIP_IMAGE_NOT_FOUND", defaults.image_not_found)?;

    let user_agent = or_default("WXSTRIP_USER_AGENT", &defaults.user_agent);
    let log_level = or_default("WXSTRIP_LOG_LEVEL", &defaults.log_level);

    Ok(ClientConfig {
        api_base_url,
        proxy_prefix,
        mirror_prefixes,
        gfa_image_base_url,
        frame_image_base_url,
        request_timeout_ms,
        probe_timeout_ms,
        max_retries,
        retry_initial_delay_ms,
        retry_jitter,
        alpha_not_found,
        image_not_found,
        user_agent,
        log_level,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
