use mockito::{Matcher, Server};

use pubmed_pairs::config::EutilsConfig;
use pubmed_pairs::search::{EutilsClient, FetchError, LiteratureIndex};

fn client_for(server: &Server) -> EutilsClient {
    let config = EutilsConfig {
        base_url: server.url(),
        requests_per_second: 100,
        ..EutilsConfig::default()
    };
    EutilsClient::new(config).unwrap()
}

#[tokio::test]
async fn test_esearch_sends_history_query_and_parses_count() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("term".into(), "imatinib ABL1".into()),
            Matcher::UrlEncoded("db".into(), "pubmed".into()),
            Matcher::UrlEncoded("usehistory".into(), "y".into()),
            Matcher::UrlEncoded("retmode".into(), "json".into()),
            Matcher::UrlEncoded("email".into(), "kslowikowski@gmail.com".into()),
            Matcher::UrlEncoded("tool".into(), "pubmed-pairs".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"header":{},"esearchresult":{"count":"1234","retmax":"20","idlist":["1","2"],"webenv":"MCID_1","querykey":"1"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let response = client.esearch("imatinib ABL1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.count(), Ok(1234));
    assert_eq!(response.esearchresult.idlist, vec!["1", "2"]);
    assert_eq!(response.esearchresult.webenv.as_deref(), Some("MCID_1"));
}

#[tokio::test]
async fn test_efetch_requests_abstract_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/efetch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), "11,22".into()),
            Matcher::UrlEncoded("WebEnv".into(), "MCID_1".into()),
            Matcher::UrlEncoded("rettype".into(), "abstract".into()),
            Matcher::UrlEncoded("retmode".into(), "text".into()),
        ]))
        .with_status(200)
        .with_body("1. J. 2001.\n\nT.\n\nA.\n\nI.\n\nAbs.\n\nPMID: 11")
        .create_async()
        .await;

    let client = client_for(&server);
    let ids = vec!["11".to_string(), "22".to_string()];
    let text = client.efetch_abstracts(Some("MCID_1"), &ids).await.unwrap();

    mock.assert_async().await;
    assert!(text.ends_with("PMID: 11"));
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let err = client_for(&server).esearch("a b").await.unwrap_err();
    assert_eq!(err, FetchError::Status { status: 503 });
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_json_is_not_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = client_for(&server).esearch("a b").await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse(_)));
    assert!(!err.is_transient());
}
