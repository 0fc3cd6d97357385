//! Additional error handling unit tests

#[cfg(test)]
mod tests {
    use crate::errors::HybridChatError;
    use crate::errors::Result;

    #[test]
    fn test_error_variants() {
        let errors = vec![
            HybridChatError::Custom("custom".to_string()),
            HybridChatError::ConfigError("config".to_string()),
            HybridChatError::EmbeddingError("embedding".to_string()),
            HybridChatError::VectorSearchError("vector".to_string()),
            HybridChatError::GraphError("graph".to_string()),
            HybridChatError::LlmError("llm".to_string()),
            HybridChatError::CacheError("cache".to_string()),
        ];

        for error in &errors {
            let display = format!("{error}");
            assert!(!display.is_empty());
        }
        assert_eq!(
            HybridChatError::GraphError("timeout".to_string()).to_string(),
            "Graph error: timeout"
        );
    }

    #[test]
    fn test_collaborator_failure_classification() {
        assert!(HybridChatError::HttpError("reset".to_string()).is_collaborator_failure());
        assert!(HybridChatError::GraphError("down".to_string()).is_collaborator_failure());
        assert!(HybridChatError::LlmError("429".to_string()).is_collaborator_failure());
        assert!(!HybridChatError::ConfigError("bad".to_string()).is_collaborator_failure());
        assert!(!HybridChatError::Custom("x".to_string()).is_collaborator_failure());
    }

    #[test]
    fn test_result_combinators() {
        let ok_result: Result<i32> = Ok(42);
        assert_eq!(ok_result.map(|v| v * 2).unwrap(), 84);

        let err_result: Result<i32> = Err(HybridChatError::Custom("fail".to_string()));
        let recovered = err_result.or_else(|_| Ok::<i32, HybridChatError>(100));
        assert_eq!(recovered.unwrap(), 100);
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: HybridChatError = io_err.into();

        match err {
            HybridChatError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: HybridChatError = json_err.into();

        assert!(matches!(err, HybridChatError::Serialization(_)));
        assert!(!err.is_collaborator_failure());
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: HybridChatError = toml_err.into();

        assert!(matches!(err, HybridChatError::TomlParsing(_)));
    }

    #[test]
    fn test_error_chain_preservation() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file.txt");
        let err: HybridChatError = io_err.into();

        let msg = format!("{err}");
        assert!(msg.contains("file.txt"));
    }
}
