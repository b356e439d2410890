use ingredient_normalizer::{IngredientPipeline, LineOutcome, NormalizerConfig, ParserConfig};
use mockito::{Matcher, Server};
use serde_json::json;

fn remote_config(base_url: String) -> NormalizerConfig {
    NormalizerConfig {
        parser: ParserConfig {
            kind: "remote".to_string(),
            base_url: Some(base_url),
            request_timeout_ms: 2000,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_remote_parser_through_pipeline() {
    let mut server = Server::new_async().await;
    let flour = server
        .mock("POST", "/parse")
        .match_body(Matcher::Json(json!({"sentence": "1 1/2 cups flour, sifted"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "name": [{"text": "all-purpose flour", "confidence": 0.96}],
                "amount": [{"quantity": 1.5, "unit": "cups"}],
                "preparation": {"text": "sifted"}
            }"#,
        )
        .create_async()
        .await;
    let eggplant = server
        .mock("POST", "/parse")
        .match_body(Matcher::Json(json!({"sentence": "2 medium eggplant"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "name": [{"text": "eggs", "confidence": 0.91}],
                "amount": [{"quantity": "2", "unit": null}]
            }"#,
        )
        .create_async()
        .await;

    let pipeline = IngredientPipeline::builder()
        .config(&remote_config(server.url()))
        .build()
        .unwrap();
    assert_eq!(pipeline.parser_name(), "remote");

    let result = pipeline.process(&["1½ cups flour, sifted", "2 medium eggplant"]).await;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].raw_ingredient, "all-purpose flour");
    assert_eq!(result[0].quantity.as_deref(), Some("1 ½"));
    assert_eq!(result[0].unit.as_deref(), Some("cups"));
    assert_eq!(result[0].descriptors, vec!["sifted"]);
    assert_eq!(result[0].original_text, "1½ cups flour, sifted");

    assert!(result[1].used_fallback);
    assert_eq!(result[1].raw_ingredient, "2 medium eggplant");
    assert_eq!(result[1].confidence, 0.91);

    flour.assert_async().await;
    eggplant.assert_async().await;
}

#[tokio::test]
async fn test_remote_server_error_falls_back() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/parse")
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let pipeline = IngredientPipeline::builder()
        .config(&remote_config(server.url()))
        .build()
        .unwrap();

    let outcome = pipeline.parse_line("3 cloves garlic").await;
    let LineOutcome::Fallback { ingredient, reason } = outcome else {
        panic!("expected a fallback");
    };
    assert_eq!(ingredient.raw_ingredient, "3 cloves garlic");
    assert_eq!(ingredient.confidence, 0.0);
    assert!(reason.to_string().contains("503"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_parser_requires_base_url() {
    let config = NormalizerConfig {
        parser: ParserConfig {
            kind: "remote".to_string(),
            base_url: None,
            ..Default::default()
        },
        ..Default::default()
    };

    // INGREDIENT_PARSER_URL may be set in the environment running the tests
    if std::env::var("INGREDIENT_PARSER_URL").is_err() {
        assert!(IngredientPipeline::builder().config(&config).build().is_err());
    }
}
