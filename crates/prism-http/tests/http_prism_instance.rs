//! End-to-end mocking through `create_instance` against YAML fixtures.

use assert_json_diff::assert_json_eq;
use prism_core::DiagnosticSeverity;
use prism_http::errors::{
    NOT_ACCEPTABLE, NOT_FOUND, NO_PATH_MATCHED_ERROR, NO_SERVER_MATCHED_ERROR,
    UNAUTHORIZED, UNPROCESSABLE_ENTITY,
};
use prism_http::{
    create_instance, load_operations, HttpConfig, HttpMockOptions, HttpOperation, HttpPrism,
    HttpRequest,
};
use serde_json::json;
use std::path::PathBuf;

fn fixture(name: &str) -> Vec<HttpOperation> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_operations(path).unwrap()
}

fn static_prism() -> HttpPrism {
    create_instance(HttpConfig::mocking(HttpMockOptions::default()))
}

mod server_validation {
    use super::*;

    #[tokio::test]
    async fn test_base_url_not_set_skips_server_validation() {
        let result = static_prism()
            .process(HttpRequest::get("/pet"), &fixture("server-validation.yaml"), None)
            .await
            .unwrap();

        let output = result.output.unwrap();
        assert_eq!(output.status_code, 200);
        assert_eq!(output.body, Some(json!({"name": "doggie"})));
    }

    #[tokio::test]
    async fn test_valid_base_url() {
        let operations = fixture("server-validation.yaml");
        for base_url in [
            "http://example.com/api",
            "https://example.com/api/",
            "http://stoplight.io/api/v1",
        ] {
            let request = HttpRequest::get("/pet").with_base_url(base_url);
            let result = static_prism().process(request, &operations, None).await;
            assert_eq!(
                result.unwrap().output.unwrap().status_code,
                200,
                "{base_url} should match"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_host_or_base_path() {
        let operations = fixture("server-validation.yaml");
        for base_url in [
            "http://acme.com/api",
            "http://example.com/v1",
            "http://stoplight.io/api/v3",
        ] {
            let request = HttpRequest::get("/pet").with_base_url(base_url);
            let error = static_prism()
                .process(request, &operations, None)
                .await
                .unwrap_err();
            assert!(error.is(&NO_SERVER_MATCHED_ERROR), "{base_url}: {error:?}");
            assert_eq!(error.status, 404);
        }
    }
}

mod petstore {
    use super::*;

    #[tokio::test]
    async fn test_unknown_path() {
        let error = static_prism()
            .process(HttpRequest::get("/unknown-path"), &fixture("petstore.yaml"), None)
            .await
            .unwrap_err();
        assert!(error.is(&NO_PATH_MATCHED_ERROR));
        assert_eq!(
            error.detail,
            "The route GET /unknown-path hasn't been found in the specification file"
        );
    }

    #[tokio::test]
    async fn test_find_by_status_generates_body() {
        let request = HttpRequest::get("/pet/findByStatus")
            .with_query("status", vec!["available", "pending"]);
        let result = static_prism()
            .process(request, &fixture("petstore.yaml"), None)
            .await
            .unwrap();

        assert!(result.validations.is_empty());
        let output = result.output.unwrap();
        assert_eq!(output.status_code, 200);
        assert_eq!(output.content_type(), Some("application/json"));
        assert_json_eq!(
            output.body.unwrap(),
            json!([{
                "id": 0,
                "name": "doggie",
                "photoUrls": ["string"],
                "status": "available"
            }])
        );
    }

    #[tokio::test]
    async fn test_comma_separated_query_value() {
        let request = HttpRequest::get("/pet/findByStatus").with_query("status", "available,sold");
        let result = static_prism()
            .process(request, &fixture("petstore.yaml"), None)
            .await
            .unwrap();
        assert!(result.validations.input.is_empty());
    }

    #[tokio::test]
    async fn test_missing_required_query_rejects() {
        let error = static_prism()
            .process(HttpRequest::get("/pet/findByStatus"), &fixture("petstore.yaml"), None)
            .await
            .unwrap_err();

        assert!(error.is(&UNPROCESSABLE_ENTITY));
        assert_eq!(error.status, 422);
        let validation = error.validation();
        assert_eq!(validation.len(), 1);
        assert_eq!(validation[0].location, vec!["query", "status"]);
        assert_eq!(validation[0].severity, "Error");
    }

    #[tokio::test]
    async fn test_enum_violation_rejects() {
        let request = HttpRequest::get("/pet/findByStatus").with_query("status", vec!["lost"]);
        let error = static_prism()
            .process(request, &fixture("petstore.yaml"), None)
            .await
            .unwrap_err();
        assert!(error.is(&UNPROCESSABLE_ENTITY));
        assert_eq!(error.validation()[0].location, vec!["query", "status", "0"]);
    }

    #[tokio::test]
    async fn test_undeclared_body_is_ignored() {
        let request = HttpRequest::get("/pet/findByStatus")
            .with_query("status", vec!["available"])
            .with_body(json!({"id": 1, "status": "placed", "complete": true}));
        let result = static_prism()
            .process(request, &fixture("petstore.yaml"), None)
            .await
            .unwrap();
        assert_json_eq!(
            serde_json::to_value(&result.validations).unwrap(),
            json!({"input": [], "output": []})
        );
    }

    #[tokio::test]
    async fn test_header_lookup_ignores_case() {
        let request = HttpRequest::get("/pet/login").with_header("aPi_keY", "hello");
        let result = static_prism()
            .process(request, &fixture("petstore.yaml"), None)
            .await
            .unwrap();

        let output = result.output.unwrap();
        assert_eq!(output.status_code, 200);
        assert_eq!(output.content_type(), Some("text/plain"));
        assert_eq!(output.body, Some(json!("logged in")));
    }

    #[tokio::test]
    async fn test_missing_header_rejects() {
        let error = static_prism()
            .process(HttpRequest::get("/pet/login"), &fixture("petstore.yaml"), None)
            .await
            .unwrap_err();
        assert!(error.is(&UNPROCESSABLE_ENTITY));
        assert_eq!(error.validation()[0].location, vec!["header", "api_key"]);
    }

    #[tokio::test]
    async fn test_invalid_path_param_uses_declared_400() {
        let result = static_prism()
            .process(HttpRequest::get("/pet/abc"), &fixture("petstore.yaml"), None)
            .await
            .unwrap();

        let output = result.output.unwrap();
        assert_eq!(output.status_code, 400);
        assert_eq!(output.body, Some(json!({"message": "Invalid ID supplied"})));

        let input = &result.validations.input;
        assert_eq!(input.len(), 1);
        assert_eq!(input[0].severity, DiagnosticSeverity::Error);
        assert_eq!(input[0].path, vec!["path", "petId"]);
    }

    #[tokio::test]
    async fn test_deprecated_operation_is_negotiated_as_invalid() {
        let mut operations = fixture("server-validation.yaml");
        operations[0].deprecated = true;

        let error = static_prism()
            .process(HttpRequest::get("/pet"), &operations, None)
            .await
            .unwrap_err();
        assert!(error.is(&UNPROCESSABLE_ENTITY));
        assert_eq!(error.validation().len(), 1);
        assert_eq!(error.validation()[0].severity, "Warning");
        assert_eq!(error.validation()[0].message, "Operation GET /pet is deprecated");
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let result = static_prism()
            .process(HttpRequest::get("/pet/1"), &fixture("petstore.yaml"), None)
            .await
            .unwrap();

        assert_json_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "input": {"method": "get", "url": {"path": "/pet/1"}},
                "output": {
                    "statusCode": 200,
                    "headers": {"Content-Type": "application/json"},
                    "body": {"id": 1, "name": "kitty"}
                },
                "validations": {"input": [], "output": []}
            })
        );
    }

    #[tokio::test]
    async fn test_accept_header_negotiation() {
        let operations = fixture("petstore.yaml");

        let request = HttpRequest::get("/pet/1").with_header("Accept", "application/xml");
        let output = static_prism()
            .process(request, &operations, None)
            .await
            .unwrap()
            .output
            .unwrap();
        assert_eq!(output.content_type(), Some("application/xml"));
        assert_eq!(output.body, Some(json!("<pet><id>1</id></pet>")));

        let request = HttpRequest::get("/pet/1").with_header("Accept", "text/html");
        let error = static_prism()
            .process(request, &operations, None)
            .await
            .unwrap_err();
        assert!(error.is(&NOT_ACCEPTABLE));
        assert_eq!(error.status, 406);
    }

    #[tokio::test]
    async fn test_example_key() {
        let operations = fixture("petstore.yaml");
        let config = |key: &str| {
            HttpConfig::mocking(HttpMockOptions {
                example_key: Some(key.to_string()),
                ..Default::default()
            })
        };

        let output = static_prism()
            .process(HttpRequest::get("/pet/2"), &operations, Some(config("dog")))
            .await
            .unwrap()
            .output
            .unwrap();
        assert_eq!(output.body, Some(json!({"id": 2, "name": "doggie"})));

        let error = static_prism()
            .process(HttpRequest::get("/pet/2"), &operations, Some(config("bird")))
            .await
            .unwrap_err();
        assert!(error.is(&NOT_FOUND));
    }

    #[tokio::test]
    async fn test_requested_status_code() {
        let config = HttpConfig::mocking(HttpMockOptions {
            code: Some(404),
            ..Default::default()
        });
        let output = static_prism()
            .process(HttpRequest::get("/pet/1"), &fixture("petstore.yaml"), Some(config))
            .await
            .unwrap()
            .output
            .unwrap();
        assert_eq!(output.status_code, 404);
        assert_eq!(output.content_type(), Some("text/plain"));
        assert_eq!(output.body, None);
    }

    #[tokio::test]
    async fn test_post_body_validation() {
        let operations = fixture("petstore.yaml");

        let request = HttpRequest::new("post", "/pet")
            .with_header("Content-Type", "application/json")
            .with_body(json!({"name": "rex"}));
        let output = static_prism()
            .process(request, &operations, None)
            .await
            .unwrap()
            .output
            .unwrap();
        assert_eq!(output.status_code, 201);
        assert_eq!(output.headers.get_str("location"), Some("/pet/10"));
        assert_eq!(output.body, Some(json!({"id": 10, "name": "doggie"})));

        let result = static_prism()
            .process(HttpRequest::new("post", "/pet"), &operations, None)
            .await
            .unwrap();
        assert_eq!(result.validations.input[0].path, vec!["body"]);
        let output = result.output.unwrap();
        assert_eq!(output.status_code, 422);
        assert_eq!(output.body, Some(json!({"message": "Validation failed"})));
    }

    #[tokio::test]
    async fn test_security() {
        let operations = fixture("petstore.yaml");

        let error = static_prism()
            .process(HttpRequest::get("/store/inventory"), &operations, None)
            .await
            .unwrap_err();
        assert!(error.is(&UNAUTHORIZED));
        assert_eq!(
            error.headers().get("WWW-Authenticate").map(String::as_str),
            Some("api_key")
        );

        let request = HttpRequest::get("/store/inventory").with_header("api_key", "secret");
        let output = static_prism()
            .process(request, &operations, None)
            .await
            .unwrap()
            .output
            .unwrap();
        assert_eq!(output.body, Some(json!({"available": 3})));

        let config = HttpConfig {
            security: false,
            ..HttpConfig::default()
        };
        let result = static_prism()
            .process(HttpRequest::get("/store/inventory"), &operations, Some(config))
            .await
            .unwrap();
        assert_eq!(result.output.unwrap().status_code, 200);
    }

    #[tokio::test]
    async fn test_dynamic_mode_conforms_to_schema() {
        let config = HttpConfig::mocking(HttpMockOptions {
            dynamic: true,
            ..Default::default()
        });
        let request = HttpRequest::get("/pet/1");
        let output = static_prism()
            .process(request, &fixture("petstore.yaml"), Some(config))
            .await
            .unwrap()
            .output
            .unwrap();

        let body = output.body.unwrap();
        assert!(body["id"].is_i64());
        assert!(body["name"].is_string());
    }
}

mod static_examples {
    use super::*;

    #[tokio::test]
    async fn test_returns_static_example() {
        let prism = create_instance(HttpConfig::default());
        let result = prism
            .process(HttpRequest::get("/todos"), &fixture("static-examples.yaml"), None)
            .await
            .unwrap();

        let body = result.output.unwrap().body.unwrap();
        assert!(body.is_array());
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_static_mode_is_idempotent() {
        let operations = fixture("petstore.yaml");
        let request = HttpRequest::get("/pet/findByStatus").with_query("status", vec!["sold"]);

        let first = static_prism()
            .process(request.clone(), &operations, None)
            .await
            .unwrap();
        let second = static_prism().process(request, &operations, None).await.unwrap();
        assert_eq!(first.output, second.output);
    }
}
