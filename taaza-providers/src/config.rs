use anyhow::bail;

use taaza_logic::{ServiceRegistry, prelude::*};

const fn config_host() -> &'static str {
    if let Some(host) = option_env!("TAAZA_CONFIG_HOST") {
        host
    } else {
        "localhost"
    }
}

const fn config_port() -> u16 {
    if let Some(port) = option_env!("TAAZA_CONFIG_PORT") {
        const_str::parse!(port, u16)
    } else {
        8743
    }
}

const fn config_secure() -> bool {
    if let Some(secure) = option_env!("TAAZA_CONFIG_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        false
    }
}

const fn config_http_proto() -> &'static str {
    if config_secure() { "https" } else { "http" }
}

const CONFIG_HOST: &str = config_host();
const CONFIG_PORT: u16 = config_port();
const CONFIG_HTTP_PROTO: &str = config_http_proto();

const CONFIG_SOCKET: &str = const_str::concat!(CONFIG_HOST, ":", CONFIG_PORT);

const CONFIG_HTTP_URL: &str = const_str::concat!(CONFIG_HTTP_PROTO, "://", CONFIG_SOCKET);

/// Fetch the current serviceable-city configuration from the platform config
/// service. Callers fall back to [ServiceRegistry::default] when this fails.
pub async fn fetch_service_registry() -> Result<ServiceRegistry> {
    let url = format!("{CONFIG_HTTP_URL}/serviceability/registry");
    let registry = reqwest::get(url)
        .await
        .context("Failed to make request")?
        .error_for_status()
        .context("Server returned error")?
        .json::<ServiceRegistry>()
        .await
        .context("Failed to decode registry")?;

    if registry.areas.is_empty() {
        bail!("Config service returned an empty registry");
    }

    Ok(registry)
}
