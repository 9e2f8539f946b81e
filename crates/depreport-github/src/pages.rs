use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use ureq::http::Uri;

use crate::client::GithubClient;
use crate::error::GithubError;

/// URL of the `rel="next"` entry of a `Link` response header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let url = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        parts
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| url.to_string())
    })
}

/// Whether `url` has the same scheme and authority as `base`.
///
/// Pagination links come from response headers, so the bearer token must not
/// follow one that leaves the configured API host.
pub(crate) fn same_origin(base: &str, url: &str) -> bool {
    let (Ok(base), Ok(url)) = (base.parse::<Uri>(), url.parse::<Uri>()) else {
        return false;
    };
    base.scheme().is_some()
        && base.scheme() == url.scheme()
        && base.authority() == url.authority()
}

/// Lazily walks a paginated list endpoint, one request per page.
///
/// Yields the first error encountered and then stops.
pub struct Paginated<'a, T> {
    client: &'a GithubClient,
    next: Option<String>,
    buffer: VecDeque<T>,
}

impl<'a, T> Paginated<'a, T> {
    pub(crate) fn new(client: &'a GithubClient, first_url: String) -> Self {
        Self {
            client,
            next: Some(first_url),
            buffer: VecDeque::new(),
        }
    }
}

impl<T: DeserializeOwned> Iterator for Paginated<'_, T> {
    type Item = Result<T, GithubError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            let url = self.next.take()?;
            if !same_origin(self.client.api_url(), &url) {
                return Some(Err(GithubError::ForeignLink {
                    url,
                    api_url: self.client.api_url().to_string(),
                }));
            }
            let page = match self.client.get_page(&url) {
                Ok(page) => page,
                Err(e) => return Some(Err(e)),
            };
            let items: Vec<T> = match serde_json::from_str(&page.body) {
                Ok(items) => items,
                Err(source) => return Some(Err(GithubError::Decode { url, source })),
            };
            self.buffer.extend(items);
            self.next = page.next;
        }
    }
}
