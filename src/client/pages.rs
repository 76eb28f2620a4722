//! Cursor over paginated extraction queries.

use bon::Builder;
use chrono::NaiveDate;
use futures::Stream;
use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;

use super::DocumentInsighter;
use crate::error::Result;
use crate::http;
use crate::types::Page;

const SEARCH_DATE_FORMAT: &str = "%Y-%m-%d";
const EXTRACTIONS_PATH: &str = "/api/extraction-exporting/extractions";

/// Date-bounded extraction query.
///
/// `start_date` is inclusive and `end_date` exclusive.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use document_insighter::client::ExtractionQuery;
///
/// let query = ExtractionQuery::builder()
///     .category("NB_COA")
///     .start_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
///     .end_date(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap())
///     .tags(vec!["HB_Ops".to_string()])
///     .build();
/// assert_eq!(query.page_size, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ExtractionQuery {
    #[builder(into)]
    pub category: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[builder(default = 50)]
    pub page_size: u32,
    #[builder(default)]
    pub tags: Vec<String>,
}

impl ExtractionQuery {
    /// Query parameters for the first page.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("category", self.category.clone()),
            (
                "startDate",
                self.start_date.format(SEARCH_DATE_FORMAT).to_string(),
            ),
            ("endDate", self.end_date.format(SEARCH_DATE_FORMAT).to_string()),
            ("page", "0".to_string()),
            ("size", self.page_size.to_string()),
        ];
        params.extend(self.tags.iter().map(|tag| ("tags[]", tag.clone())));
        params
    }
}

enum CursorState {
    Initial(ExtractionQuery),
    Next(Url),
    Finished,
}

/// Lazy, forward-only cursor over extraction pages.
///
/// Nothing is fetched until [`next_page`](Self::next_page) is called. Each
/// call follows the previous response's `Link: rel="next"` target. The
/// cursor keeps no rewind state; scanning again means building a new cursor
/// from the same query. An error ends the cursor, and pages already returned
/// stay valid.
pub struct ExtractionPages<'a> {
    client: &'a DocumentInsighter,
    state: CursorState,
    upgrade_next_links: bool,
}

impl<'a> ExtractionPages<'a> {
    /// Whether another page may be requested.
    pub fn has_next(&self) -> bool {
        !matches!(self.state, CursorState::Finished)
    }

    /// URL the next call will request, once past the first page.
    pub fn next_url(&self) -> Option<&Url> {
        match &self.state {
            CursorState::Next(url) => Some(url),
            _ => None,
        }
    }

    /// Fetch the next page, or `None` once the server stops linking further.
    pub async fn next_page(&mut self) -> Option<Result<Page>> {
        let session = self.client.session();
        let request = match std::mem::replace(&mut self.state, CursorState::Finished) {
            CursorState::Finished => return None,
            CursorState::Initial(query) => {
                tracing::debug!(category = %query.category, "Fetching first extraction page");
                session
                    .get(&self.client.url(EXTRACTIONS_PATH))
                    .query(&query.params())
            }
            CursorState::Next(url) => {
                tracing::debug!(url = %url, "Fetching next extraction page");
                session.get(url.as_str())
            }
        };

        let page = match session.send(request).await {
            Ok(response) => {
                let next = next_link(response.headers(), response.url());
                http::read_json(response)
                    .await
                    .map(|items| Page { items, next })
            }
            Err(err) => Err(err),
        };

        if let Ok(Page {
            next: Some(next), ..
        }) = &page
        {
            let target = if self.upgrade_next_links {
                upgrade_scheme(next.clone())
            } else {
                next.clone()
            };
            self.state = CursorState::Next(target);
        }
        Some(page)
    }

    /// Adapt the cursor into a [`Stream`] of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Page>> + 'a {
        futures::stream::unfold(self, |mut pages| async move {
            pages.next_page().await.map(|page| (page, pages))
        })
    }
}

impl DocumentInsighter {
    /// Start a paginated extraction query. No request is sent until the
    /// first page is asked for.
    pub fn query_extractions_pages(&self, query: ExtractionQuery) -> ExtractionPages<'_> {
        ExtractionPages {
            client: self,
            state: CursorState::Initial(query),
            upgrade_next_links: self.upgrade_next_links,
        }
    }
}

/// Follow-up links are advertised over plain HTTP behind the service's TLS
/// proxy; requests must go out over HTTPS.
pub(crate) fn upgrade_scheme(mut url: Url) -> Url {
    if url.scheme() == "http" {
        let _ = url.set_scheme("https");
    }
    url
}

/// The `rel="next"` target of all `Link` headers, resolved against `base`.
pub(crate) fn next_link(headers: &HeaderMap, base: &Url) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(parse_link_header)
        .find(|(_, rels)| rels.iter().any(|rel| rel.eq_ignore_ascii_case("next")))
        .and_then(|(target, _)| base.join(&target).ok())
}

/// Split a `Link` header value into `(target, rels)` pairs.
fn parse_link_header(value: &str) -> Vec<(String, Vec<String>)> {
    let mut links = Vec::new();
    let mut rest = value;
    while let Some(start) = rest.find('<') {
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let end = start + len;
        let target = rest[start + 1..end].trim().to_string();
        let after = &rest[end + 1..];
        let params_len = after.find('<').unwrap_or(after.len());
        let rels = after[..params_len]
            .split(';')
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("rel")
                    .then(|| value.trim().trim_end_matches(',').trim().trim_matches('"'))
            })
            .flat_map(|rel| rel.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .collect();
        links.push((target, rels));
        rest = &after[params_len..];
    }
    links
}
