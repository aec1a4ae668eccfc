use tutorbot_core::EmbeddingError;
use tutorbot_embeddings::EmbeddingProviderError;

#[test]
fn embedding_provider_error_maps_to_embedding_error() {
    let invalid_response: EmbeddingError =
        EmbeddingProviderError::InvalidResponse("bad payload".to_string()).into();
    assert!(matches!(
        &invalid_response,
        EmbeddingError::InvalidResponse(message) if message == "bad payload"
    ));
    assert_eq!(
        format!("{invalid_response}"),
        "Embedding invalid response: bad payload"
    );

    let transport: EmbeddingError =
        EmbeddingProviderError::Transport("connection reset".to_string()).into();
    assert_eq!(
        format!("{transport}"),
        "Embedding provider error: transport error: connection reset"
    );
}

#[test]
fn http_errors_keep_status_and_map_429_to_rate_limited() {
    let err: EmbeddingError = EmbeddingProviderError::Http {
        status: 403,
        message: "API key not valid".to_string(),
    }
    .into();
    assert!(matches!(
        &err,
        EmbeddingError::Provider(message) if message == "HTTP 403: API key not valid"
    ));

    let err: EmbeddingError = EmbeddingProviderError::Http {
        status: 429,
        message: "quota".to_string(),
    }
    .into();
    assert!(matches!(err, EmbeddingError::RateLimited { retry_after: None }));
}
