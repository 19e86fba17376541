use std::env;

use log::*;
use oja_common::Secret;
use oja_engine::matching::MatchConfig;
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, Rng};

const DEFAULT_OJA_HOST: &str = "127.0.0.1";
const DEFAULT_OJA_PORT: u16 = 4444;
const DEFAULT_ASSIGN_SWEEP_SECONDS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The key used to verify `x-paystack-signature` headers on webhook deliveries. Shared with
    /// the outbound API configuration; when it is unset a random key is used so that nothing
    /// verifies by accident.
    pub webhook_secret: Secret<String>,
    /// The admin API key for the manual status-transition route. `None` means the route is
    /// fail-closed: every request is rejected.
    pub api_key: Option<Secret<String>>,
    pub paystack: PaystackConfig,
    pub relay: RelayConfig,
    pub matching: MatchConfig,
    /// Period of the assignment sweep, in seconds. 0 disables the worker.
    pub assign_sweep_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OJA_HOST.to_string(),
            port: DEFAULT_OJA_PORT,
            database_url: String::default(),
            webhook_secret: Secret::new(String::default()),
            api_key: None,
            paystack: PaystackConfig::default(),
            relay: RelayConfig::default(),
            matching: MatchConfig::default(),
            assign_sweep_seconds: DEFAULT_ASSIGN_SWEEP_SECONDS,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OJA_HOST").ok().unwrap_or_else(|| DEFAULT_OJA_HOST.into());
        let port = env::var("OJA_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OJA_PORT. {e} Using the default, {DEFAULT_OJA_PORT}, instead."
                    );
                    DEFAULT_OJA_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OJA_PORT);
        let database_url = env::var("OJA_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ OJA_DATABASE_URL is not set. Please set it to the URL for the oja database.");
            String::default()
        });
        let webhook_secret = env::var("OJA_PAYSTACK_SECRET_KEY").map(Secret::new).unwrap_or_else(|_| {
            warn!(
                "🚨️🚨️🚨️ OJA_PAYSTACK_SECRET_KEY has not been set. I'm using a random value for this session, so \
                 every webhook delivery will be rejected. Do not operate on production like this. 🚨️🚨️🚨️"
            );
            Secret::new(random_key())
        });
        let api_key = match env::var("OJA_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Secret::new(key)),
            _ => {
                warn!("🪛️ OJA_API_KEY is not set. Admin routes are fail-closed and will reject every request.");
                None
            },
        };
        let assign_sweep_seconds = env::var("OJA_ASSIGN_SWEEP_SECONDS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    warn!(
                        "🪛️ {s} is not a valid value for OJA_ASSIGN_SWEEP_SECONDS. {e}. Using the default, \
                         {DEFAULT_ASSIGN_SWEEP_SECONDS}, instead."
                    );
                    DEFAULT_ASSIGN_SWEEP_SECONDS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ASSIGN_SWEEP_SECONDS);
        Self {
            host,
            port,
            database_url,
            webhook_secret,
            api_key,
            paystack: PaystackConfig::new_from_env_or_default(),
            relay: RelayConfig::from_env_or_default(),
            matching: MatchConfig::from_env_or_default(),
            assign_sweep_seconds,
        }
    }
}

fn random_key() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}

//-------------------------------------------------  RelayConfig  -----------------------------------------------------
/// Where customer notifications are POSTed to. The relay (a WhatsApp/SMS bridge) is a separate
/// deployment; when no URL is configured, notifications are silently disabled.
#[derive(Clone, Debug, Default)]
pub struct RelayConfig {
    pub url: Option<String>,
    pub token: Secret<String>,
}

impl RelayConfig {
    pub fn from_env_or_default() -> Self {
        let url = env::var("OJA_RELAY_URL").ok().filter(|s| !s.is_empty());
        if url.is_none() {
            info!("🪛️ OJA_RELAY_URL is not set. Customer notifications are disabled.");
        }
        let token = Secret::new(env::var("OJA_RELAY_TOKEN").unwrap_or_default());
        Self { url, token }
    }
}
