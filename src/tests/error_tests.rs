#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;
    use serde_json::Value;

    use crate::auth::AuthError;
    use crate::error::{AppError, OptionExt};
    use crate::model::{FieldError, MySqlContract};

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::RateLimited { retry_after_seconds: 5 }.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::Database("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::unprocessable("UNSUPPORTED_METRIC", "nope").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_error_classes() {
        assert_eq!(AppError::Internal(anyhow::anyhow!("boom")).class(), "INTERNAL_ERROR");
        assert_eq!(AppError::unprocessable("UNSUPPORTED_METRIC", "nope").class(), "UNSUPPORTED_METRIC");
        assert_eq!(
            AppError::ValidationError { field: "f".into(), message: "m".into() }.class(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_auth_errors_map_to_statuses() {
        let err: AppError = AuthError::MissingHeader.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Unauthorized: The authorization header is missing");

        let err: AppError = AuthError::Backend("ldap down".into()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: AppError = AuthError::Token("bad key".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        match missing.ok_or_not_found("host srv1") {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "host srv1 not found"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Some(1u8).ok_or_not_found("x").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (status, body) = body_of(AppError::ValidationError { field: "hostname".into(), message: "empty".into() }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "hostname");
        assert_eq!(body["error"]["details"]["message"], "empty");
    }

    #[tokio::test]
    async fn test_model_field_errors_become_validation_errors() {
        let contract = MySqlContract { contract_id: String::new(), r#type: "HOST".into(), ..Default::default() };
        let err = contract.validate().unwrap_err();
        assert_eq!(err, FieldError::new("contractID", "contractID cannot be empty"));
        assert_eq!(err.to_string(), "contractID: contractID cannot be empty");

        let (status, body) = body_of(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["field"], "contractID");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, body) = body_of(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal server error occurred");
        assert!(body["error"]["details"]["error_id"].as_str().is_some());
        assert!(!body.to_string().contains("secret detail"));
    }

    #[tokio::test]
    async fn test_rate_limited_body() {
        let (status, body) = body_of(AppError::RateLimited { retry_after_seconds: 7 }).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["details"]["retry_after_seconds"], 7);
    }
}
