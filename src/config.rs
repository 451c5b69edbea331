use crate::common::{secret_file_or_string, ConfigSnafu, Result};

/// Environment variables are read as `IC_<FIELD>`, e.g. `IC_ACCESS_ID`.
pub const ENV_PREFIX: &str = "IC";

/// Settings gathered from the command line and the environment.
///
/// Values set on the struct take precedence over the environment.
#[derive(Clone, Default, serde::Deserialize)]
pub struct Config {
    pub access_id: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn with_credentials(access_id: Option<String>, secret_key: Option<String>) -> Self {
        Self {
            access_id,
            secret_key,
            ..Default::default()
        }
    }

    pub fn populate_from_env(self) -> Result<Self> {
        self.populate_from(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn populate_from(self, env: config::Environment) -> Result<Self> {
        config::Config::builder()
            .add_source(env)
            .set_override_option("access_id", self.access_id)
            .and_then(|b| b.set_override_option("secret_key", self.secret_key))
            .and_then(|b| b.set_override_option("base_url", self.base_url))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .map_err(|err| {
                ConfigSnafu {
                    message: err.to_string(),
                    prefix: "environment",
                }
                .build()
            })
    }

    /// Validates the settings into a client configuration.
    pub fn into_client_config(self) -> Result<crate::cloud::Config> {
        let access_id = self.access_id.filter(|v| !v.is_empty()).ok_or_else(|| {
            ConfigSnafu {
                message: format!(
                    "Could not find access id. Set the access id with --id or by setting the environment variable {ENV_PREFIX}_ACCESS_ID"
                ),
                prefix: "access_id",
            }
            .build()
        })?;
        let secret_key = self.secret_key.filter(|v| !v.is_empty()).ok_or_else(|| {
            ConfigSnafu {
                message: format!(
                    "Could not find secret key. Set the secret key with --key or by setting the environment variable {ENV_PREFIX}_SECRET_KEY"
                ),
                prefix: "secret_key",
            }
            .build()
        })?;
        let secret_key = secret_file_or_string(secret_key, "secret_key")?;

        let mut config = crate::cloud::Config::new(access_id, secret_key);
        if let Some(base_url) = self.base_url {
            let base_url = url::Url::parse(&base_url).map_err(|err| {
                ConfigSnafu {
                    message: format!("Invalid URL {base_url}: {err}"),
                    prefix: "base_url",
                }
                .build()
            })?;
            config = config.with_base_url(base_url);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout_secs(timeout_secs);
        }
        Ok(config)
    }
}
