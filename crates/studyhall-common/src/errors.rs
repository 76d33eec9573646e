use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("a live subscription already exists for {0}")]
    DuplicateTarget(String),

    #[error("collection name must not be empty")]
    EmptyCollection,

    #[error("channel name must not be empty")]
    EmptyChannel,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),

    #[error("store request failed: {0}")]
    Request(String),

    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StudyhallError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Live(#[from] LiveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("realtime error: {0}")]
    Realtime(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("heartbeat_interval is 0".into());
        assert_eq!(
            err.to_string(),
            "config validation error: heartbeat_interval is 0"
        );
    }

    #[test]
    fn live_error_display() {
        let err = LiveError::DuplicateTarget("feed:orders[user_id=eq.u1]".into());
        assert_eq!(
            err.to_string(),
            "a live subscription already exists for feed:orders[user_id=eq.u1]"
        );

        let err = LiveError::EmptyCollection;
        assert_eq!(err.to_string(), "collection name must not be empty");
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Request("HTTP 403: permission denied".into());
        assert_eq!(
            err.to_string(),
            "store request failed: HTTP 403: permission denied"
        );
    }

    #[test]
    fn studyhall_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: StudyhallError = config_err.into();
        assert!(matches!(err, StudyhallError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn studyhall_error_from_live() {
        let live_err = LiveError::EmptyCollection;
        let err: StudyhallError = live_err.into();
        assert!(matches!(err, StudyhallError::Live(_)));
    }

    #[test]
    fn studyhall_error_from_store() {
        let store_err = StoreError::Network("timeout".into());
        let err: StudyhallError = store_err.into();
        assert!(matches!(err, StudyhallError::Store(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn studyhall_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StudyhallError = io_err.into();
        assert!(matches!(err, StudyhallError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn studyhall_error_string_variants() {
        let err = StudyhallError::Realtime("socket closed".into());
        assert_eq!(err.to_string(), "realtime error: socket closed");

        let err = StudyhallError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
