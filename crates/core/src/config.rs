use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub owner: OwnerConfig,
    pub guard: GuardConfig,
    pub pacing: PacingConfig,
    pub remote: RemoteConfig,
    pub email: EmailConfig,
    pub sheets: SheetsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerConfig {
    pub name: String,
    pub email: String,
    pub role: String,
    pub company: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    pub max_message_length: usize,
    pub max_messages_per_session: u32,
    pub rate_limit_ms: u64,
    pub max_lead_submissions_per_session: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub guard_delay_ms: u64,
    pub offer_delay_ms: u64,
    pub capture_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub enabled: bool,
    pub api_url: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: SecretString,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub webhook_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub session_idle_secs: u64,
    pub max_sessions: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub log_level: Option<String>,
    pub remote_endpoint: Option<String>,
    pub email_enabled: Option<bool>,
    pub sheets_webhook_url: Option<String>,
    pub server_port: Option<u16>,
    pub pacing_disabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            owner: OwnerConfig {
                name: "Ilyas".to_string(),
                email: "hello@example.com".to_string(),
                role: "Data Scientist & AI Engineer".to_string(),
                company: "Bio-Techne".to_string(),
            },
            guard: GuardConfig {
                max_message_length: 500,
                max_messages_per_session: 50,
                rate_limit_ms: 1_000,
                max_lead_submissions_per_session: 2,
            },
            pacing: PacingConfig::default(),
            remote: RemoteConfig { endpoint: None, timeout_secs: 20 },
            email: EmailConfig {
                enabled: false,
                api_url: DEFAULT_EMAIL_API_URL.to_string(),
                service_id: String::new(),
                template_id: String::new(),
                public_key: String::new().into(),
            },
            sheets: SheetsConfig { webhook_url: None },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                session_idle_secs: 1_800,
                max_sessions: 1_000,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 800,
            max_delay_ms: 1_500,
            guard_delay_ms: 800,
            offer_delay_ms: 500,
            capture_delay_ms: 400,
        }
    }
}

impl PacingConfig {
    /// Zero delays everywhere; used by tests and non-interactive runs.
    pub fn instant() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            guard_delay_ms: 0,
            offer_delay_ms: 0,
            capture_delay_ms: 0,
        }
    }
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        self.endpoint.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false)
    }
}

impl SheetsConfig {
    pub fn is_configured(&self) -> bool {
        self.webhook_url.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false)
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("folio.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(owner) = patch.owner {
            if let Some(name) = owner.name {
                self.owner.name = name;
            }
            if let Some(email) = owner.email {
                self.owner.email = email;
            }
            if let Some(role) = owner.role {
                self.owner.role = role;
            }
            if let Some(company) = owner.company {
                self.owner.company = company;
            }
        }

        if let Some(guard) = patch.guard {
            if let Some(max_message_length) = guard.max_message_length {
                self.guard.max_message_length = max_message_length;
            }
            if let Some(max_messages_per_session) = guard.max_messages_per_session {
                self.guard.max_messages_per_session = max_messages_per_session;
            }
            if let Some(rate_limit_ms) = guard.rate_limit_ms {
                self.guard.rate_limit_ms = rate_limit_ms;
            }
            if let Some(max_leads) = guard.max_lead_submissions_per_session {
                self.guard.max_lead_submissions_per_session = max_leads;
            }
        }

        if let Some(pacing) = patch.pacing {
            if let Some(min_delay_ms) = pacing.min_delay_ms {
                self.pacing.min_delay_ms = min_delay_ms;
            }
            if let Some(max_delay_ms) = pacing.max_delay_ms {
                self.pacing.max_delay_ms = max_delay_ms;
            }
            if let Some(guard_delay_ms) = pacing.guard_delay_ms {
                self.pacing.guard_delay_ms = guard_delay_ms;
            }
            if let Some(offer_delay_ms) = pacing.offer_delay_ms {
                self.pacing.offer_delay_ms = offer_delay_ms;
            }
            if let Some(capture_delay_ms) = pacing.capture_delay_ms {
                self.pacing.capture_delay_ms = capture_delay_ms;
            }
        }

        if let Some(remote) = patch.remote {
            if let Some(endpoint) = remote.endpoint {
                self.remote.endpoint = Some(endpoint);
            }
            if let Some(timeout_secs) = remote.timeout_secs {
                self.remote.timeout_secs = timeout_secs;
            }
        }

        if let Some(email) = patch.email {
            if let Some(enabled) = email.enabled {
                self.email.enabled = enabled;
            }
            if let Some(api_url) = email.api_url {
                self.email.api_url = api_url;
            }
            if let Some(service_id) = email.service_id {
                self.email.service_id = service_id;
            }
            if let Some(template_id) = email.template_id {
                self.email.template_id = template_id;
            }
            if let Some(public_key) = email.public_key {
                self.email.public_key = secret_value(public_key);
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(webhook_url) = sheets.webhook_url {
                self.sheets.webhook_url = Some(webhook_url);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(session_idle_secs) = server.session_idle_secs {
                self.server.session_idle_secs = session_idle_secs;
            }
            if let Some(max_sessions) = server.max_sessions {
                self.server.max_sessions = max_sessions;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FOLIO_OWNER_NAME") {
            self.owner.name = value;
        }
        if let Some(value) = read_env("FOLIO_OWNER_EMAIL") {
            self.owner.email = value;
        }
        if let Some(value) = read_env("FOLIO_OWNER_ROLE") {
            self.owner.role = value;
        }
        if let Some(value) = read_env("FOLIO_OWNER_COMPANY") {
            self.owner.company = value;
        }

        if let Some(value) = read_env("FOLIO_GUARD_MAX_MESSAGE_LENGTH") {
            self.guard.max_message_length = parse_usize("FOLIO_GUARD_MAX_MESSAGE_LENGTH", &value)?;
        }
        if let Some(value) = read_env("FOLIO_GUARD_MAX_MESSAGES_PER_SESSION") {
            self.guard.max_messages_per_session =
                parse_u32("FOLIO_GUARD_MAX_MESSAGES_PER_SESSION", &value)?;
        }
        if let Some(value) = read_env("FOLIO_GUARD_RATE_LIMIT_MS") {
            self.guard.rate_limit_ms = parse_u64("FOLIO_GUARD_RATE_LIMIT_MS", &value)?;
        }
        if let Some(value) = read_env("FOLIO_GUARD_MAX_LEAD_SUBMISSIONS_PER_SESSION") {
            self.guard.max_lead_submissions_per_session =
                parse_u32("FOLIO_GUARD_MAX_LEAD_SUBMISSIONS_PER_SESSION", &value)?;
        }

        if let Some(value) = read_env("FOLIO_PACING_MIN_DELAY_MS") {
            self.pacing.min_delay_ms = parse_u64("FOLIO_PACING_MIN_DELAY_MS", &value)?;
        }
        if let Some(value) = read_env("FOLIO_PACING_MAX_DELAY_MS") {
            self.pacing.max_delay_ms = parse_u64("FOLIO_PACING_MAX_DELAY_MS", &value)?;
        }

        if let Some(value) = read_env("FOLIO_REMOTE_ENDPOINT") {
            self.remote.endpoint = Some(value);
        }
        if let Some(value) = read_env("FOLIO_REMOTE_TIMEOUT_SECS") {
            self.remote.timeout_secs = parse_u64("FOLIO_REMOTE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOLIO_EMAIL_ENABLED") {
            self.email.enabled = parse_bool("FOLIO_EMAIL_ENABLED", &value)?;
        }
        if let Some(value) = read_env("FOLIO_EMAIL_API_URL") {
            self.email.api_url = value;
        }
        if let Some(value) = read_env("FOLIO_EMAIL_SERVICE_ID") {
            self.email.service_id = value;
        }
        if let Some(value) = read_env("FOLIO_EMAIL_TEMPLATE_ID") {
            self.email.template_id = value;
        }
        if let Some(value) = read_env("FOLIO_EMAIL_PUBLIC_KEY") {
            self.email.public_key = secret_value(value);
        }

        if let Some(value) = read_env("FOLIO_SHEETS_WEBHOOK_URL") {
            self.sheets.webhook_url = Some(value);
        }

        if let Some(value) = read_env("FOLIO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FOLIO_SERVER_PORT") {
            self.server.port = parse_u16("FOLIO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FOLIO_SERVER_SESSION_IDLE_SECS") {
            self.server.session_idle_secs = parse_u64("FOLIO_SERVER_SESSION_IDLE_SECS", &value)?;
        }
        if let Some(value) = read_env("FOLIO_SERVER_MAX_SESSIONS") {
            self.server.max_sessions = parse_usize("FOLIO_SERVER_MAX_SESSIONS", &value)?;
        }

        let log_level = read_env("FOLIO_LOGGING_LEVEL").or_else(|| read_env("FOLIO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("FOLIO_LOGGING_FORMAT").or_else(|| read_env("FOLIO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(owner_name) = overrides.owner_name {
            self.owner.name = owner_name;
        }
        if let Some(owner_email) = overrides.owner_email {
            self.owner.email = owner_email;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(remote_endpoint) = overrides.remote_endpoint {
            self.remote.endpoint = Some(remote_endpoint);
        }
        if let Some(email_enabled) = overrides.email_enabled {
            self.email.enabled = email_enabled;
        }
        if let Some(webhook_url) = overrides.sheets_webhook_url {
            self.sheets.webhook_url = Some(webhook_url);
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if overrides.pacing_disabled {
            self.pacing = PacingConfig::instant();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_owner(&self.owner)?;
        validate_guard(&self.guard)?;
        validate_pacing(&self.pacing)?;
        validate_remote(&self.remote)?;
        validate_email(&self.email)?;
        validate_sheets(&self.sheets)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("folio.toml"), PathBuf::from("config/folio.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_owner(owner: &OwnerConfig) -> Result<(), ConfigError> {
    if owner.name.trim().is_empty() {
        return Err(ConfigError::Validation("owner.name is required".to_string()));
    }
    if !owner.email.contains('@') {
        return Err(ConfigError::Validation(
            "owner.email must be an e-mail address; lead notifications are sent to it".to_string(),
        ));
    }
    Ok(())
}

fn validate_guard(guard: &GuardConfig) -> Result<(), ConfigError> {
    if guard.max_message_length == 0 {
        return Err(ConfigError::Validation(
            "guard.max_message_length must be greater than zero".to_string(),
        ));
    }
    if guard.max_messages_per_session == 0 {
        return Err(ConfigError::Validation(
            "guard.max_messages_per_session must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_pacing(pacing: &PacingConfig) -> Result<(), ConfigError> {
    if pacing.min_delay_ms > pacing.max_delay_ms {
        return Err(ConfigError::Validation(
            "pacing.min_delay_ms must not exceed pacing.max_delay_ms".to_string(),
        ));
    }
    if pacing.max_delay_ms > 10_000 {
        return Err(ConfigError::Validation(
            "pacing.max_delay_ms must be at most 10000".to_string(),
        ));
    }
    Ok(())
}

fn validate_remote(remote: &RemoteConfig) -> Result<(), ConfigError> {
    if remote.timeout_secs == 0 || remote.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "remote.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if let Some(endpoint) = &remote.endpoint {
        if !endpoint.trim().is_empty() && !is_http_url(endpoint) {
            return Err(ConfigError::Validation(
                "remote.endpoint must start with http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_email(email: &EmailConfig) -> Result<(), ConfigError> {
    if !email.enabled {
        return Ok(());
    }

    if !is_http_url(&email.api_url) {
        return Err(ConfigError::Validation(
            "email.api_url must start with http:// or https://".to_string(),
        ));
    }
    if email.service_id.trim().is_empty() || email.template_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.enabled is true but email.service_id or email.template_id is missing"
                .to_string(),
        ));
    }
    if email.public_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "email.enabled is true but email.public_key is missing".to_string(),
        ));
    }
    Ok(())
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if let Some(webhook_url) = &sheets.webhook_url {
        if !webhook_url.trim().is_empty() && !is_http_url(webhook_url) {
            return Err(ConfigError::Validation(
                "sheets.webhook_url must start with http:// or https://".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.session_idle_secs == 0 {
        return Err(ConfigError::Validation(
            "server.session_idle_secs must be greater than zero".to_string(),
        ));
    }
    if server.max_sessions == 0 {
        return Err(ConfigError::Validation(
            "server.max_sessions must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    owner: Option<OwnerPatch>,
    guard: Option<GuardPatch>,
    pacing: Option<PacingPatch>,
    remote: Option<RemotePatch>,
    email: Option<EmailPatch>,
    sheets: Option<SheetsPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OwnerPatch {
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GuardPatch {
    max_message_length: Option<usize>,
    max_messages_per_session: Option<u32>,
    rate_limit_ms: Option<u64>,
    max_lead_submissions_per_session: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PacingPatch {
    min_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    guard_delay_ms: Option<u64>,
    offer_delay_ms: Option<u64>,
    capture_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RemotePatch {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmailPatch {
    enabled: Option<bool>,
    api_url: Option<String>,
    service_id: Option<String>,
    template_id: Option<String>,
    public_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    webhook_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    session_idle_secs: Option<u64>,
    max_sessions: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
