//! Google Scholar research source implementation.
//!
//! Google Scholar has no public API. Result pages are fetched as HTML and
//! walked as a stream, ten entries per page, until enough records have been
//! collected or the pages run out. Scholar answers automated traffic with a
//! captcha page; that is reported as [`SourceError::Blocked`] and not retried.

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::config::Config;
use crate::models::{Authors, ResultRecord, SearchQuery, Year, NO_URL, UNKNOWN};
use crate::sources::{Source, SourceError};
use crate::utils::{HttpClient, Sleeper, TokioSleeper};

const GOOGLE_SCHOLAR_URL: &str = "https://scholar.google.com";

/// Entries per result page
const PAGE_SIZE: usize = 10;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Leading `[PDF]`, `[HTML]`, `[CITATION]` markers in a result title
fn citation_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\[[A-Z]+\]\s*)+").expect("citation marker regex is valid"))
}

fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})\b").expect("year regex is valid"))
}

/// Google Scholar research source
#[derive(Debug, Clone)]
pub struct GoogleScholarSource {
    client: HttpClient,
    base_url: String,
    page_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl GoogleScholarSource {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: GOOGLE_SCHOLAR_URL.to_string(),
            page_delay: Duration::from_secs(1),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn from_config(client: HttpClient, config: &Config) -> Self {
        Self::new(client)
            .base_url(config.endpoints.google_scholar.clone())
            .page_delay(Duration::from_millis(config.google_scholar.page_delay_ms))
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pause between consecutive result pages
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    async fn fetch_page(&self, query: &str, start: usize) -> Result<String, SourceError> {
        let url = format!(
            "{}/scholar?hl=en&q={}&start={}",
            self.base_url,
            urlencoding::encode(query),
            start
        );

        tracing::debug!(url = %url, "Fetching Google Scholar page");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to search Google Scholar: {}", e)))?;

        if !response.status().is_success() {
            return Err(SourceError::from_status(response.status()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SourceError::Parse(format!("Failed to read response: {}", e)))?;

        if is_captcha_page(&html) {
            return Err(SourceError::Blocked(
                "Google Scholar returned a captcha page".to_string(),
            ));
        }

        Ok(html)
    }
}

#[async_trait]
impl Source for GoogleScholarSource {
    fn id(&self) -> &str {
        "google_scholar"
    }

    fn name(&self) -> &str {
        "Google Scholar"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<ResultRecord>, SourceError> {
        let mut records = Vec::new();
        let mut start = 0;

        while records.len() < query.max_results {
            if start > 0 {
                self.sleeper.sleep(self.page_delay).await;
            }

            let html = self.fetch_page(&query.query, start).await?;
            let page = parse_results_page(&html)?;
            let last_page = page.records.is_empty() || !page.has_next;

            let remaining = query.max_results - records.len();
            records.extend(page.records.into_iter().take(remaining));

            if last_page {
                break;
            }
            start += PAGE_SIZE;
        }

        tracing::debug!(count = records.len(), "Google Scholar results parsed");
        Ok(records)
    }
}

fn is_captcha_page(html: &str) -> bool {
    html.contains("gs_captcha_f")
        || html.contains("g-recaptcha")
        || html.contains("unusual traffic from your computer")
}

/// One parsed Google Scholar result page
#[derive(Debug)]
struct ResultsPage {
    records: Vec<ResultRecord>,
    /// Whether the pager at the bottom links to a following page
    has_next: bool,
}

/// Parse one Google Scholar result page into records.
///
/// Extracted as a separate function for testability with mock HTML.
fn parse_results_page(html: &str) -> Result<ResultsPage, SourceError> {
    let document = Html::parse_document(html);

    let result_sel = selector("div.gs_ri")?;
    let title_sel = selector("h3.gs_rt")?;
    let link_sel = selector("a[href]")?;
    let byline_sel = selector("div.gs_a")?;
    let pager_sel = selector("#gs_n a[href]")?;
    let next_icon_sel = selector(".gs_ico_nav_next")?;

    let records: Vec<ResultRecord> = document
        .select(&result_sel)
        .map(|entry| parse_entry(entry, &title_sel, &link_sel, &byline_sel))
        .collect();

    let has_next = document.select(&pager_sel).any(|a| {
        a.select(&next_icon_sel).next().is_some() || element_text(&a).contains("Next")
    });

    Ok(ResultsPage { records, has_next })
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn parse_entry(
    entry: ElementRef<'_>,
    title_sel: &Selector,
    link_sel: &Selector,
    byline_sel: &Selector,
) -> ResultRecord {
    let heading = entry.select(title_sel).next();

    let title = heading
        .map(|h| element_text(&h))
        .map(|t| citation_marker().replace(&t, "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    let link = heading
        .and_then(|h| h.select(link_sel).next())
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .unwrap_or(NO_URL)
        .to_string();

    let byline = entry
        .select(byline_sel)
        .next()
        .map(|b| element_text(&b))
        .unwrap_or_default();
    let (authors, year) = parse_byline(&byline);

    ResultRecord::new(title).authors(authors).year(year).link(link)
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a byline such as `"A Smith, B Jones… - Journal of X, 2021 - example.org"`
/// into its author list and publication year.
fn parse_byline(byline: &str) -> (Authors, Year) {
    let mut parts = byline.split(" - ");

    let names: Vec<String> = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|name| name.trim().trim_end_matches('…').trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    let authors = if names.is_empty() {
        Authors::Unknown
    } else {
        Authors::Names(names)
    };

    // Venue titles can carry years of their own ("Proc. 1999 Workshop, 2021");
    // the publication year comes last.
    let year = parts
        .next()
        .and_then(|venue| year_pattern().find_iter(venue).last())
        .map(|m| Year::Text(m.as_str().to_string()))
        .unwrap_or(Year::Unknown);

    (authors, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::RecordingSleeper;

    const MOCK_SCHOLAR_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="gs_res_ccl_mid">
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><span class="gs_ctc"><span class="gs_ct1">[PDF]</span><span class="gs_ct2">[PDF]</span></span> <a href="https://example.org/deception.pdf">Cyber deception: <b>state of the art</b></a></h3>
    <div class="gs_a">A Smith, B&nbsp;Jones, C Lee…&nbsp;- Journal of Security, 2021&nbsp;- example.org</div>
  </div>
</div>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><span class="gs_ctu"><span class="gs_ct1">[CITATION]</span></span> Honeypots for generative AI</h3>
    <div class="gs_a">D Park&nbsp;- 2019</div>
  </div>
</div>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><a href="https://example.org/bare">Bare entry</a></h3>
  </div>
</div>
</div>
</body>
</html>"#;

    const NEXT_LINK: &str = r#"<div id="gs_n"><table><tr><td><a href="/scholar?start=10&amp;q=genai"><span class="gs_ico gs_ico_nav_next"></span><b>Next</b></a></td></tr></table></div>"#;

    fn full_page(offset: usize, has_next: bool) -> String {
        let entries: String = (0..PAGE_SIZE)
            .map(|i| {
                format!(
                    r#"<div class="gs_ri"><h3 class="gs_rt"><a href="https://example.org/{n}">Paper {n}</a></h3><div class="gs_a">X Author - Venue, 2020 - example.org</div></div>"#,
                    n = offset + i
                )
            })
            .collect();
        let pager = if has_next { NEXT_LINK } else { "" };
        format!("<html><body>{entries}{pager}</body></html>")
    }

    #[test]
    fn test_parse_results_page() {
        let page = parse_results_page(MOCK_SCHOLAR_HTML).unwrap();
        assert!(!page.has_next);
        let records = page.records;
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].title, "Cyber deception: state of the art");
        assert_eq!(records[0].link, "https://example.org/deception.pdf");
        assert_eq!(
            records[0].authors,
            Authors::Names(vec![
                "A Smith".to_string(),
                "B Jones".to_string(),
                "C Lee".to_string()
            ])
        );
        assert_eq!(records[0].year, Year::Text("2021".to_string()));

        assert_eq!(records[1].title, "Honeypots for generative AI");
        assert_eq!(records[1].link, "No URL");
        assert_eq!(records[1].year, Year::Text("2019".to_string()));

        assert_eq!(records[2].authors, Authors::Unknown);
        assert_eq!(records[2].year, Year::Unknown);
    }

    #[test]
    fn test_parse_results_page_next_link() {
        let page = parse_results_page(&full_page(0, true)).unwrap();
        assert_eq!(page.records.len(), PAGE_SIZE);
        assert!(page.has_next);

        assert!(!parse_results_page(&full_page(0, false)).unwrap().has_next);
    }

    #[test]
    fn test_parse_byline_takes_publication_year_over_venue_year() {
        let (authors, year) = parse_byline("A Smith - Proc. 1999 Workshop, 2021 - example.org");
        assert_eq!(authors, Authors::Names(vec!["A Smith".to_string()]));
        assert_eq!(year, Year::Text("2021".to_string()));
    }

    #[test]
    fn test_parse_byline_without_year() {
        let (authors, year) = parse_byline("J Doe - Some Workshop - example.org");
        assert_eq!(authors, Authors::Names(vec!["J Doe".to_string()]));
        assert_eq!(year, Year::Unknown);
    }

    #[test]
    fn test_captcha_detection() {
        assert!(is_captcha_page(r#"<form id="gs_captcha_f">"#));
        assert!(!is_captcha_page(MOCK_SCHOLAR_HTML));
    }

    #[tokio::test]
    async fn test_search_truncates_across_pages() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "cyber deception".into()),
                mockito::Matcher::UrlEncoded("start".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(full_page(0, true))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::UrlEncoded("start".into(), "10".into()))
            .with_status(200)
            .with_body(full_page(10, true))
            .expect(1)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = GoogleScholarSource::new(HttpClient::new().unwrap())
            .base_url(server.url())
            .page_delay(Duration::from_millis(3))
            .sleeper(sleeper.clone());

        let records = source
            .search(&SearchQuery::new("cyber deception").max_results(13))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(records.len(), 13);
        assert_eq!(records[12].title, "Paper 12");
        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(3)]);
    }

    #[tokio::test]
    async fn test_search_stops_on_short_page() {
        let mut server = mockito::Server::new_async().await;
        let page = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(MOCK_SCHOLAR_HTML)
            .expect(1)
            .create_async()
            .await;

        let source = GoogleScholarSource::new(HttpClient::new().unwrap()).base_url(server.url());
        let records = source.search(&SearchQuery::new("genai")).await.unwrap();

        page.assert_async().await;
        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_search_stops_on_full_page_without_next_link() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::UrlEncoded("start".into(), "0".into()))
            .with_status(200)
            .with_body(full_page(0, false))
            .expect(1)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::UrlEncoded("start".into(), "10".into()))
            .with_status(200)
            .with_body("<html><body></body></html>")
            .expect(0)
            .create_async()
            .await;

        let sleeper = Arc::new(RecordingSleeper::new());
        let source = GoogleScholarSource::new(HttpClient::new().unwrap())
            .base_url(server.url())
            .sleeper(sleeper.clone());
        let records = source
            .search(&SearchQuery::new("genai").max_results(100))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(records.len(), PAGE_SIZE);
        assert!(sleeper.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_search_captcha_is_blocked() {
        let mut server = mockito::Server::new_async().await;
        let _page = server
            .mock("GET", "/scholar")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"<html><form id="gs_captcha_f"></form></html>"#)
            .create_async()
            .await;

        let source = GoogleScholarSource::new(HttpClient::new().unwrap()).base_url(server.url());
        let err = source.search(&SearchQuery::new("genai")).await.unwrap_err();

        assert!(matches!(err, SourceError::Blocked(_)));
        assert!(!err.is_transient());
    }
}
