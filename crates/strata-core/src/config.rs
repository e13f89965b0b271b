//! Configuration module
//!
//! Storage configuration is read from the process environment (after loading a
//! `.env` file when present). `from_vars` takes an explicit lookup so callers
//! and tests can supply values without touching the environment.

use std::env;

use crate::constants::{DEFAULT_ENVIRONMENT, DEFAULT_URI_SCHEME};
use crate::storage_types::StorageBackend;

/// Storage configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub uri_scheme: String,
    pub environment: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            uri_scheme: DEFAULT_URI_SCHEME.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Memory,
        };

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let config = StorageConfig {
            backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            uri_scheme: non_empty("STORAGE_URI_SCHEME")
                .unwrap_or_else(|| DEFAULT_URI_SCHEME.to_string()),
            environment,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !is_valid_scheme(&self.uri_scheme) {
            return Err(anyhow::anyhow!(
                "STORAGE_URI_SCHEME '{}' is not a valid URI scheme",
                self.uri_scheme
            ));
        }

        match self.backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    /// Region for the S3 backend, `S3_REGION` taking precedence over `AWS_REGION`.
    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn uri_scheme(&self) -> &str {
        &self.uri_scheme
    }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_memory_backend() {
        let config = StorageConfig::from_vars(lookup(&[])).unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.uri_scheme(), DEFAULT_URI_SCHEME);
        assert_eq!(config.environment, DEFAULT_ENVIRONMENT);
        assert!(!config.is_production());
    }

    #[test]
    fn test_s3_requires_bucket_and_region() {
        let missing_bucket = StorageConfig::from_vars(lookup(&[("STORAGE_BACKEND", "s3")]));
        assert!(missing_bucket.is_err());

        let missing_region = StorageConfig::from_vars(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "files"),
        ]));
        assert!(missing_region.is_err());

        let config = StorageConfig::from_vars(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "files"),
            ("AWS_REGION", "eu-west-1"),
            ("S3_ENDPOINT", "http://localhost:9000"),
        ]))
        .unwrap();
        assert_eq!(config.s3_bucket(), Some("files"));
        assert_eq!(config.s3_region(), Some("eu-west-1"));
        assert_eq!(config.s3_endpoint(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_s3_region_takes_precedence_over_aws_region() {
        let config = StorageConfig::from_vars(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "files"),
            ("S3_REGION", "us-east-2"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.s3_region(), Some("us-east-2"));
    }

    #[test]
    fn test_rejects_invalid_scheme_and_backend() {
        assert!(StorageConfig::from_vars(lookup(&[("STORAGE_URI_SCHEME", "1abc")])).is_err());
        assert!(StorageConfig::from_vars(lookup(&[("STORAGE_URI_SCHEME", "a b")])).is_err());
        assert!(StorageConfig::from_vars(lookup(&[("STORAGE_BACKEND", "nfs")])).is_err());

        let config =
            StorageConfig::from_vars(lookup(&[("STORAGE_URI_SCHEME", "files+v2")])).unwrap();
        assert_eq!(config.uri_scheme(), "files+v2");
    }

    #[test]
    fn test_production_environment() {
        let config = StorageConfig::from_vars(lookup(&[("APP_ENV", "Prod")])).unwrap();
        assert!(config.is_production());
    }
}
