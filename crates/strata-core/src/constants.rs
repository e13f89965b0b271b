//! Constants shared across Strata crates.

/// Scheme used for caller-visible URIs when none is configured.
pub const DEFAULT_URI_SCHEME: &str = "strata";

/// Path separator of logical paths and object keys.
pub const SEPARATOR: char = '/';

/// Content type written on directory marker objects.
pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

/// Environment name used when neither `ENVIRONMENT` nor `APP_ENV` is set.
pub const DEFAULT_ENVIRONMENT: &str = "development";
