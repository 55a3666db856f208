use thiserror::Error;

#[derive(Error, Debug)]
pub enum EchoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {origin}: {error}")]
    LoadFailed {
        origin: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {reason}")]
    Json { reason: String },
}

pub type Result<T> = std::result::Result<T, EchoError>;

impl From<serde_json::Error> for EchoError {
    fn from(err: serde_json::Error) -> Self {
        EchoError::Serialization(SerializationError::Json {
            reason: err.to_string(),
        })
    }
}

impl EchoError {
    /// Startup errors a process supervisor should not bother restarting for.
    pub fn is_fatal(&self) -> bool {
        match self {
            EchoError::Config(_) => true,
            EchoError::Serialization(_) => true,
            EchoError::Io(err) => !matches!(
                err.kind(),
                std::io::ErrorKind::AddrInUse | std::io::ErrorKind::Interrupted
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        let err = EchoError::Config(ConfigError::ValidationFailed {
            reason: "port must be non-zero".to_string(),
        });
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Configuration error: Configuration validation failed: port must be non-zero"
        );
    }

    #[test]
    fn test_addr_in_use_is_not_fatal() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy");
        assert!(!EchoError::from(io).is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(EchoError::from(io).is_fatal());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u16>("\"not a number\"").unwrap_err();
        let err = EchoError::from(json_err);
        assert!(matches!(
            err,
            EchoError::Serialization(SerializationError::Json { .. })
        ));
        assert!(err.is_fatal());
    }
}
