use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use edsetu_core::{AppError, OrganizationId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone)]
pub enum NotifierProviderConfig {
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub bootstrap_organization_id: Option<OrganizationId>,
    pub notifier_provider: NotifierProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = optional_non_empty_env("DATABASE_URL");
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_non_empty_env("AUTH_BOOTSTRAP_TOKEN")?;

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let bootstrap_organization_id = optional_non_empty_env("BOOTSTRAP_ORGANIZATION_ID")
            .map(|value| {
                uuid::Uuid::parse_str(value.as_str())
                    .map(OrganizationId::from_uuid)
                    .map_err(|error| {
                        AppError::Validation(format!("invalid BOOTSTRAP_ORGANIZATION_ID: {error}"))
                    })
            })
            .transpose()?;

        let notifier_provider = match env::var("NOTIFIER_PROVIDER")
            .unwrap_or_else(|_| "console".to_owned())
            .as_str()
        {
            "console" => NotifierProviderConfig::Console,
            "smtp" => {
                let port = required_non_empty_env("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                NotifierProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: required_non_empty_env("SMTP_HOST")?,
                    port,
                    username: required_non_empty_env("SMTP_USERNAME")?,
                    password: required_non_empty_env("SMTP_PASSWORD")?,
                    from_address: required_non_empty_env("SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "NOTIFIER_PROVIDER must be either 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            bootstrap_organization_id,
            notifier_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
