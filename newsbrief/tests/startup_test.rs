use common::{Config, LlmConfig, NewsConfig};
use mockito::Matcher;
use newsbrief::app::build_driver;
use newsbrief::repl::LoopOutcome;
use newsbrief::BriefError;

fn config_for(news_url: String, llm_url: String) -> Config {
    Config {
        news: NewsConfig {
            base_url: Some(news_url),
            ..Default::default()
        },
        llm: LlmConfig {
            api_url: Some(llm_url),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_missing_credential_makes_no_provider_calls() {
    let mut news_server = mockito::Server::new_async().await;
    let mut llm_server = mockito::Server::new_async().await;

    let news_mock = news_server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let llm_mock = llm_server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let config = config_for(news_server.url(), llm_server.url());
    let result = build_driver(&config, None, |_| None);

    match result {
        Err(BriefError::MissingCredential { var }) => assert_eq!(var, "GOOGLE_API_KEY"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("driver built without a credential"),
    }

    news_mock.assert_async().await;
    llm_mock.assert_async().await;
}

#[tokio::test]
async fn test_configured_pipeline_runs_against_mock_providers() {
    let mut news_server = mockito::Server::new_async().await;
    let mut llm_server = mockito::Server::new_async().await;

    let _token = news_server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"vqd="4-42""#)
        .create_async()
        .await;
    let _news = news_server
        .mock("GET", "/news.js")
        .match_query(Matcher::UrlEncoded("df".into(), "d".into()))
        .with_status(200)
        .with_body(
            r#"{"results": [
                {"date": 1714564800, "title": "A", "excerpt": "a", "url": "https://a.example/1", "source": "SA"},
                {"date": 1714564900, "title": "B", "excerpt": "b", "url": "https://b.example/2", "source": "SB"}
            ]}"#,
        )
        .create_async()
        .await;
    let llm = llm_server
        .mock("POST", "/")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJsonString(r#"{"model": "gemini-2.5-flash", "temperature": 0.2}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"- A happened\n\nSources:\n- https://a.example/1\n- https://b.example/2"}}]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let config = config_for(news_server.url(), llm_server.url());
    let driver = build_driver(&config, Some(2), |var| {
        (var == "GOOGLE_API_KEY").then(|| "test-key".to_string())
    })
    .expect("driver");

    let mut out: Vec<u8> = Vec::new();
    let summary = driver.run("rust\nexit\n".as_bytes(), &mut out).await.expect("loop");
    let out = String::from_utf8(out).unwrap();

    assert_eq!(summary.outcome, LoopOutcome::Exited);
    assert!(out.contains("https://a.example/1"));
    assert!(out.contains("https://b.example/2"));
    llm.assert_async().await;
}
