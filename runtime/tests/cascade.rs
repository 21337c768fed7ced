//! End-to-end runs of the cascade against local HTTP servers.

use pagetype_runtime::acquisition::http_client::{Fetcher, HttpClient};
use pagetype_runtime::acquisition::sitemap::DirectoryFilter;
use pagetype_runtime::acquisition::url_source::{self, UrlSource};
use pagetype_runtime::cartography::page_classifier::{PageClassifier, Signal};
use pagetype_runtime::cartography::rules::RuleSet;
use pagetype_runtime::cli::export;
use pagetype_runtime::config::RunConfig;
use pagetype_runtime::intelligence::oracle::{DisabledOracle, OpenAiOracle, Oracle};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAIN: &str = "<html><head><title>Seite</title></head><body><p>Nur Text.</p></body></html>";
const PRODUCT_LD: &str = r#"<html><head>
<script type="application/ld+json">{"@context":"https://schema.org","@type":"Product","name":"Widget"}</script>
</head><body><h1>Widget</h1></body></html>"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/xml")
        .set_body_string(body)
}

fn oracle_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
}

fn fetcher() -> Arc<dyn Fetcher> {
    Arc::new(HttpClient::new(Duration::from_secs(5), "pagetype-test").unwrap())
}

fn classifier(fetcher: Arc<dyn Fetcher>, oracle: Arc<dyn Oracle>) -> PageClassifier {
    PageClassifier::new(
        fetcher,
        oracle,
        Arc::new(RuleSet::load("de").unwrap()),
        &RunConfig::default(),
    )
}

#[tokio::test]
async fn sitemap_to_records() {
    let server = MockServer::start().await;
    let base = server.uri();

    // The index lists the same child twice and itself once.
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            r#"<?xml version="1.0"?>
            <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
              <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
              <sitemap><loc>{base}/sitemap.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(xml(format!(
            r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
              <url><loc>{base}/</loc></url>
              <url><loc>{base}/produkt/widget-123</loc></url>
              <url><loc>{base}/angebot/77</loc></url>
              <url><loc>{base}/misc/page</loc></url>
              <url><loc>{base}/missing</loc></url>
              <url><loc>{base}/intern/admin</loc></url>
              <url><loc>{base}/produkt/widget-123</loc></url>
            </urlset>"#
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET")).and(path("/")).respond_with(html(PLAIN)).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/produkt/widget-123"))
        .respond_with(html(PLAIN))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/angebot/77"))
        .respond_with(html(PRODUCT_LD))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/misc/page"))
        .respond_with(html(PLAIN))
        .mount(&server)
        .await;

    // Only the undecided page reaches the oracle.
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("/misc/page"))
        .respond_with(oracle_reply("Kontaktseite"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let source = UrlSource::Sitemap {
        root: format!("{base}/sitemap.xml"),
        filter: DirectoryFilter::new(vec![], vec!["/intern/".into()]),
    };
    let resolved = url_source::resolve(&source, fetcher.as_ref()).await.unwrap();
    assert!(resolved.discovery_errors.is_empty());
    let urls: Vec<&str> = resolved.candidates.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{base}/"),
            format!("{base}/produkt/widget-123"),
            format!("{base}/angebot/77"),
            format!("{base}/misc/page"),
            format!("{base}/missing"),
        ]
    );

    let oracle = Arc::new(OpenAiOracle::new("sk-test", "gpt-4o").with_base_url(format!("{base}/v1")));
    let records = classifier(fetcher, oracle)
        .classify_all(&resolved.candidates, |_| {})
        .await
        .unwrap();

    assert_eq!(records.len(), resolved.candidates.len());
    for (record, candidate) in records.iter().zip(&resolved.candidates) {
        assert_eq!(record.url, candidate.url);
    }

    assert_eq!(records[0].category, "Startseite");
    assert_eq!(records[0].signal, Some(Signal::Pattern));

    assert_eq!(records[1].category, "Produktdetailseite");
    assert_eq!(records[1].subtype, "PLC-Produktseite");

    assert_eq!(records[2].category, "Produktdetailseite");
    assert_eq!(records[2].signal, Some(Signal::Markup));

    assert_eq!(records[3].category, "Kontaktseite");
    assert_eq!(records[3].subtype, "");
    assert_eq!(records[3].signal, Some(Signal::Oracle));

    assert!(records[4].is_error());
    assert!(records[4].category.starts_with("Fehler: "));
    assert!(records[4].category.contains("404"));
    assert_eq!(records[4].subtype, "");

    // Subtypes only appear on content-relevant categories.
    let rules = RuleSet::default_rules();
    for record in &records {
        assert_eq!(
            !record.subtype.is_empty(),
            !record.is_error() && rules.is_content_relevant(&record.category),
            "{record:?}"
        );
    }
}

#[tokio::test]
async fn unreachable_child_sitemap_is_reported() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!(
            r#"<sitemapindex>
              <sitemap><loc>{base}/gone.xml</loc></sitemap>
              <sitemap><loc>{base}/broken.xml</loc></sitemap>
              <sitemap><loc>{base}/ok.xml</loc></sitemap>
            </sitemapindex>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(xml("<urlset><url><loc>x</url></urlset>".to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok.xml"))
        .respond_with(xml(format!("<urlset><url><loc>{base}/blog/a</loc></url></urlset>")))
        .mount(&server)
        .await;

    let fetcher = fetcher();
    let source = UrlSource::Sitemap {
        root: format!("{base}/sitemap.xml"),
        filter: DirectoryFilter::default(),
    };
    let resolved = url_source::resolve(&source, fetcher.as_ref()).await.unwrap();
    assert_eq!(resolved.candidates.len(), 1);
    assert_eq!(resolved.candidates[0].url, format!("{base}/blog/a"));
    assert_eq!(resolved.discovery_errors.len(), 2);
}

#[tokio::test]
async fn filtered_to_nothing_is_an_error() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(format!("<urlset><url><loc>{base}/a/x</loc></url></urlset>")))
        .mount(&server)
        .await;

    let source = UrlSource::Sitemap {
        root: format!("{base}/sitemap.xml"),
        filter: DirectoryFilter::new(vec!["/b/".into()], vec![]),
    };
    let fetcher = fetcher();
    assert!(url_source::resolve(&source, fetcher.as_ref()).await.is_err());
}

#[tokio::test]
async fn offline_run_writes_csv() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/kontakt"))
        .respond_with(html(PLAIN))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/misc/page"))
        .respond_with(html(PLAIN))
        .mount(&server)
        .await;

    let block = format!("{base}/kontakt\n\n  {base}/misc/page  \n{base}/kontakt\n");
    let fetcher = fetcher();
    let resolved = url_source::resolve(&UrlSource::Explicit(block), fetcher.as_ref())
        .await
        .unwrap();
    assert_eq!(resolved.candidates.len(), 2);

    let records = classifier(fetcher, Arc::new(DisabledOracle))
        .classify_all(&resolved.candidates, |_| {})
        .await
        .unwrap();
    assert_eq!(records[0].category, "Kontaktseite");
    assert!(records[1].is_error());

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("seitentyp-analyse.csv");
    export::write_csv_file(&out, &records, true).unwrap();
    let csv = std::fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("URL,Seitentyp,Subtyp"));
    assert_eq!(lines.next(), Some(format!("{base}/kontakt,Kontaktseite,").as_str()));
    assert!(lines.next().unwrap().contains("oracle disabled"));
}
