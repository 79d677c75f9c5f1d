//! Integration tests for the crawler
//!
//! The crawl loop is driven end-to-end with an in-memory fetcher, and the
//! HTTP collaborators (page fetcher, selector oracle) are tested against
//! wiremock servers.

use docs_to_markdown::config::{FetcherConfig, OracleConfig};
use docs_to_markdown::crawler::{
    CrawlOptions, Crawler, FetchError, FetchedPage, Frontier, HttpFetcher, Pacer, PageFetcher,
};
use docs_to_markdown::output::{compile, ArtifactWriter, CrawlStats, SiteLayout};
use docs_to_markdown::selector::{
    OpenAiOracle, OracleError, OracleRequest, PromptBudget, RetryPolicy, SelectorOracle,
    SelectorResolver,
};
use scraper::Html;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory site that records every fetch
struct FakeSite {
    pages: HashMap<String, (u16, String)>,
    fetched: RefCell<Vec<String>>,
}

impl FakeSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            fetched: RefCell::new(Vec::new()),
        }
    }

    fn page(mut self, url: &str, status: u16, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), (status, html.to_string()));
        self
    }

    fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetched.borrow_mut().push(url.to_string());

        let (status, html) = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Unreachable {
                url: url.to_string(),
            })?;

        Ok(FetchedPage {
            final_url: url.clone(),
            status_code: status,
            title: docs_to_markdown::crawler::extract_title(&Html::parse_document(&html)),
            html,
        })
    }
}

/// Oracle that must never be consulted
struct NoOracle;

impl SelectorOracle for NoOracle {
    async fn suggest_selector(
        &self,
        _request: &OracleRequest,
    ) -> Result<Option<String>, OracleError> {
        panic!("the oracle should not be called when a built-in selector matches");
    }
}

fn test_crawler<F: PageFetcher>(site: F, output: &TempDir) -> Crawler<F, NoOracle> {
    Crawler::new(
        site,
        SelectorResolver::new(NoOracle, RetryPolicy::single_attempt(), PromptBudget::default()),
        ArtifactWriter::new(output.path()),
        Pacer::disabled(),
        CrawlOptions::default(),
    )
}

fn docs_site() -> FakeSite {
    FakeSite::new()
        .page(
            "https://example.com/docs",
            200,
            r#"<html><head><title>Docs</title></head><body>
                <nav><a href="/blog/news">Blog</a></nav>
                <main>
                    <h1>Documentation</h1>
                    <a href="/docs/a">Page A</a>
                    <a href="/docs/b#install">Page B</a>
                    <a href="https://external.com/docs/page">Elsewhere</a>
                </main>
            </body></html>"#,
        )
        .page(
            "https://example.com/docs/a",
            200,
            r#"<html><head><title>A</title></head><body>
                <main><h1>Page A</h1><a href="/docs">Back</a><a href="/docs/b">B</a></main>
            </body></html>"#,
        )
        .page(
            "https://example.com/docs/b",
            200,
            r#"<html><head><title>B</title></head><body>
                <article><h1>Page B</h1><a href="/docs/a">A</a></article>
            </body></html>"#,
        )
}

#[tokio::test]
async fn test_full_crawl_stays_in_scope() {
    let output = TempDir::new().unwrap();
    let mut crawler = test_crawler(docs_site(), &output);
    let root = Url::parse("https://example.com/docs").unwrap();

    let mut frontier = Frontier::new(root.clone());
    let mut stats = CrawlStats::new();
    crawler
        .drain(&mut frontier, &root, &mut stats)
        .await
        .expect("crawl should succeed");

    assert!(frontier.is_empty());
    assert_eq!(
        crawler.fetcher().fetched(),
        vec![
            "https://example.com/docs",
            "https://example.com/docs/a",
            "https://example.com/docs/b",
        ]
    );
    assert_eq!(stats.pages_written, 3);

    let writer = crawler.writer();
    for url in [
        "https://example.com/docs",
        "https://example.com/docs/a",
        "https://example.com/docs/b",
    ] {
        assert!(writer.path_for(url).exists(), "missing artifact for {}", url);
    }
    assert!(!output.path().join("external.com").exists());

    let page_a = std::fs::read_to_string(writer.path_for("https://example.com/docs/a")).unwrap();
    assert!(page_a.contains("# Page A"), "got: {}", page_a);
    assert!(page_a.contains("https://example.com/docs/b"), "got: {}", page_a);
}

#[tokio::test]
async fn test_compile_after_crawl() {
    let output = TempDir::new().unwrap();
    let mut crawler = test_crawler(docs_site(), &output);
    let root = Url::parse("https://example.com/docs").unwrap();

    crawler.run(&root).await.unwrap();

    let layout = SiteLayout::for_root(output.path(), root.as_str());
    let report = compile(&layout.base_dir, &layout.compiled_path).unwrap();

    assert_eq!(report.artifacts.len(), 3);
    let compiled = std::fs::read_to_string(&layout.compiled_path).unwrap();
    assert!(compiled.contains("# Documentation"));
    assert!(compiled.contains("# Page A"));
    assert!(compiled.contains("# Page B"));
    assert!(compiled.ends_with("\n\n"));

    // The root's own artifact is left untouched by the compile step
    let root_artifact = crawler.writer().path_for(root.as_str());
    assert_ne!(root_artifact, layout.compiled_path);
    assert!(!std::fs::read_to_string(root_artifact)
        .unwrap()
        .contains("# Page A"));
}

#[tokio::test]
async fn test_page_named_like_compiled_document_is_compiled() {
    let output = TempDir::new().unwrap();
    let site = FakeSite::new()
        .page(
            "https://example.com/docs",
            200,
            r#"<html><body><main>Root <a href="/docs/release.compiled">Release</a></main></body></html>"#,
        )
        .page(
            "https://example.com/docs/release.compiled",
            200,
            "<html><body><main>Release notes page</main></body></html>",
        );
    let mut crawler = test_crawler(site, &output);
    let root = Url::parse("https://example.com/docs").unwrap();

    let stats = crawler.run(&root).await.unwrap();
    assert_eq!(stats.pages_written, 2);

    let layout = SiteLayout::for_root(output.path(), root.as_str());
    let report = compile(&layout.base_dir, &layout.compiled_path).unwrap();

    assert_eq!(report.artifacts.len(), 2);
    let compiled = std::fs::read_to_string(&layout.compiled_path).unwrap();
    assert!(compiled.contains("Release notes page"), "got: {}", compiled);
}

#[tokio::test]
async fn test_not_found_page_is_skipped() {
    let output = TempDir::new().unwrap();
    let site = FakeSite::new()
        .page(
            "https://example.com/docs",
            200,
            r#"<html><body><main>Root <a href="/docs/gone">Gone</a> <a href="/docs/soft">Soft</a></main></body></html>"#,
        )
        .page(
            "https://example.com/docs/gone",
            404,
            "<html><body><main>Nothing here <a href=\"/docs/hidden\">x</a></main></body></html>",
        )
        .page(
            "https://example.com/docs/soft",
            200,
            "<html><head><title>404 Not Found</title></head><body><main>Missing</main></body></html>",
        );
    let mut crawler = test_crawler(site, &output);
    let root = Url::parse("https://example.com/docs").unwrap();

    let stats = crawler.run(&root).await.unwrap();

    assert_eq!(stats.not_found, 2);
    assert_eq!(stats.pages_written, 1);
    assert!(!crawler.writer().path_for("https://example.com/docs/gone").exists());
    assert!(!crawler.writer().path_for("https://example.com/docs/soft").exists());
    // Links on a not-found page are not followed
    assert!(!crawler
        .fetcher()
        .fetched()
        .contains(&"https://example.com/docs/hidden".to_string()));
}

#[tokio::test]
async fn test_http_crawl_against_mock_server() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><head><title>Docs</title></head><body><main>
                        <h1>Root</h1>
                        <a href="/docs/guide">Guide</a>
                        <a href="/about">About</a>
                    </main></body></html>"#,
                    "text/html; charset=utf-8",
                ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/guide"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<html><body><article><h2>Guide</h2><a href="/docs">Home</a></article></body></html>"#,
                    "text/html",
                ),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let output = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
    let mut crawler = test_crawler(fetcher, &output);
    let root = Url::parse(&format!("{}/docs", base_url)).unwrap();

    let stats = crawler.run(&root).await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.pages_written, 2);
    let guide = crawler
        .writer()
        .path_for(&format!("{}/docs/guide", base_url));
    let content = std::fs::read_to_string(guide).unwrap();
    assert!(content.contains("## Guide"), "got: {}", content);
}

#[tokio::test]
async fn test_unreachable_root_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let output = TempDir::new().unwrap();
    let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
    let mut crawler = test_crawler(fetcher, &output);
    let root = Url::parse(&format!("{}/docs", mock_server.uri())).unwrap();

    let result = crawler.run(&root).await;
    assert!(matches!(
        result,
        Err(docs_to_markdown::DocsError::StartUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_http_fetcher_reports_status_and_title() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "<html><head><title> Getting Started </title></head><body></body></html>",
                    "text/html",
                ),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_raw("<html><head><title>Not Found</title></head></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&FetcherConfig::default()).unwrap();
    let base = mock_server.uri();

    let page = fetcher
        .fetch(&Url::parse(&format!("{}/page", base)).unwrap())
        .await
        .unwrap();
    assert_eq!(page.status_code, 200);
    assert_eq!(page.title.as_deref(), Some("Getting Started"));
    assert!(!page.is_not_found());

    let missing = fetcher
        .fetch(&Url::parse(&format!("{}/missing", base)).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status_code, 404);
    assert!(missing.is_not_found());

    let pdf = fetcher
        .fetch(&Url::parse(&format!("{}/file.pdf", base)).unwrap())
        .await;
    assert!(matches!(pdf, Err(FetchError::ContentMismatch { .. })));
}

fn oracle_config(base_url: &str) -> OracleConfig {
    OracleConfig {
        base_url: base_url.to_string(),
        api_key: Some("test-key".to_string()),
        ..OracleConfig::default()
    }
}

#[tokio::test]
async fn test_openai_oracle_parses_selector() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "```css\ndiv.docs-body\n```" } }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let oracle = OpenAiOracle::new(&oracle_config(&mock_server.uri())).unwrap();
    let request = OracleRequest::new(
        "https://example.com/docs",
        "<html><body><div class=\"docs-body\">x</div></body></html>",
        &PromptBudget::default(),
    );

    let selector = oracle.suggest_selector(&request).await.unwrap();
    assert_eq!(selector.as_deref(), Some("div.docs-body"));
}

#[tokio::test]
async fn test_openai_oracle_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&mock_server)
        .await;

    let oracle = OpenAiOracle::new(&oracle_config(&mock_server.uri())).unwrap();
    let request = OracleRequest::new("https://example.com/docs", "<html></html>", &PromptBudget::default());

    let err = oracle.suggest_selector(&request).await.unwrap_err();
    assert!(matches!(err, OracleError::Status { status: 500, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_openai_oracle_without_key_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = OracleConfig {
        base_url: mock_server.uri(),
        ..OracleConfig::default()
    };
    let oracle = OpenAiOracle::new(&config).unwrap();
    let request = OracleRequest::new("https://example.com/docs", "<html></html>", &PromptBudget::default());

    let err = oracle.suggest_selector(&request).await.unwrap_err();
    assert!(matches!(err, OracleError::MissingApiKey));
}

#[tokio::test]
async fn test_resolver_gives_up_after_five_failed_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&mock_server)
        .await;

    let oracle = OpenAiOracle::new(&oracle_config(&mock_server.uri())).unwrap();
    let policy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(10),
        decay_factor: 0.5,
    };
    let resolver = SelectorResolver::new(oracle, policy, PromptBudget::default());

    let document = Html::parse_document("<html><body><div class=\"x\">Content</div></body></html>");
    let url = Url::parse("https://example.com/docs").unwrap();

    assert_eq!(resolver.oracle_resolve(&url, &document).await, None);
}
