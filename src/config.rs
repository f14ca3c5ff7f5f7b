//! Deployment configuration.

/// Deployment mode flags consumed by the pipeline.
///
/// Development mode enables two things, both diagnostic:
/// - the documentation stage (`/docs`, `/docs/api.json`), mounted outside
///   the gates so it needs no auth signals,
/// - the `detail` field of the error-boundary 500 body, which carries the
///   fault's message instead of an empty string.
///
/// Production mode exposes neither.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    development: bool,
}

impl Config {
    /// Development mode: docs endpoints on, error detail exposed.
    pub fn development() -> Self {
        Self { development: true }
    }

    /// Production mode: no docs endpoints, error detail suppressed.
    pub fn production() -> Self {
        Self { development: false }
    }

    /// Reads the mode from the `APP_ENV` environment variable.
    ///
    /// `APP_ENV=development` selects development mode; anything else,
    /// including an unset variable, is production. Production is the safe
    /// default: a missing variable must never leak error detail.
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV") {
            Ok(v) if v == "development" => Self::development(),
            _ => Self::production(),
        }
    }

    pub fn is_development(self) -> bool {
        self.development
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::production()
    }
}
