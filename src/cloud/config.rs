pub const DEFAULT_BASE_URL: &str = "https://cloud.gurobi.com/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoint for one client. Immutable once built.
#[derive(Clone)]
pub struct Config {
    pub access_id: String,
    pub secret_key: String,
    pub base_url: url::Url,
    pub timeout_secs: u64,
}

impl Config {
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key: secret_key.into(),
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: url::Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

// Keep the secret key out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub(crate) fn default_base_url() -> url::Url {
    url::Url::parse(DEFAULT_BASE_URL).expect("default base url is valid")
}
