use super::{ConfigSnafu, Result};

/// If the value begins with an '@', read the secret from the file path
/// that follows it, otherwise returns the value.
///
/// prefix is used to provide context in case of an error.
pub(crate) fn secret_file_or_string(value: String, prefix: &str) -> Result<String> {
    Ok(match value.strip_prefix('@') {
        Some(secret_file) => std::fs::read_to_string(secret_file)
            .map_err(|err| {
                ConfigSnafu {
                    message: format!("Failed to read secret from {secret_file}: {err}"),
                    prefix,
                }
                .build()
            })?
            .trim()
            .into(),
        None => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_value_is_returned_unchanged() {
        let value = secret_file_or_string("hunter2".into(), "secret_key").unwrap();
        assert_eq!(value, "hunter2");
    }

    #[test]
    fn at_prefixed_value_reads_trimmed_file() {
        let path = std::env::temp_dir().join(format!("ic-secret-{}", std::process::id()));
        std::fs::write(&path, "from-file\n").unwrap();

        let value =
            secret_file_or_string(format!("@{}", path.display()), "secret_key").unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(value, "from-file");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = secret_file_or_string("@/nonexistent/ic-secret".into(), "secret_key")
            .unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigError { .. }));
        assert!(err.to_string().starts_with("secret_key: "));
    }
}
