//! Cursor pagination over `{items, next}` pages.
//!
//! The server's `next` URL is authoritative: the following request reuses the
//! `limit` and `offset` found in it rather than advancing a local counter.

use reqwest::Url;

use crate::error::{EtlError, Result};
use crate::model::{CategoryPlaylistsPage, Paging};

/// Largest page size the API accepts; used by default to keep the call count low.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    /// Read `limit` and `offset` from a next-page URL.
    pub fn from_next_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| EtlError::Cursor {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let param = |name: &str| -> Result<u32> {
            let raw = parsed
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
                .ok_or_else(|| EtlError::Cursor {
                    url: url.to_string(),
                    reason: format!("missing `{}` parameter", name),
                })?;
            raw.parse().map_err(|_| EtlError::Cursor {
                url: url.to_string(),
                reason: format!("`{}` is not a number: {:?}", name, raw),
            })
        };

        Ok(Self {
            limit: param("limit")?,
            offset: param("offset")?,
        })
    }
}

/// A page that may point at the page after it.
pub trait CursorPage {
    fn next_url(&self) -> Option<&str>;
}

impl<T> CursorPage for Paging<T> {
    fn next_url(&self) -> Option<&str> {
        self.next.as_deref()
    }
}

impl CursorPage for CategoryPlaylistsPage {
    fn next_url(&self) -> Option<&str> {
        self.playlists.next_url()
    }
}

/// Fetch pages starting at `first` until one comes back without a next URL.
///
/// Always issues at least one request and returns the pages in server order.
/// There is no page cap: an endpoint that never stops returning `next` keeps
/// this looping.
pub fn paginate<P, F>(first: PageRequest, mut fetch: F) -> Result<Vec<P>>
where
    P: CursorPage,
    F: FnMut(PageRequest) -> Result<P>,
{
    let mut pages = Vec::new();
    let mut request = first;

    loop {
        let page = fetch(request)?;
        let next = page.next_url().map(PageRequest::from_next_url).transpose()?;
        pages.push(page);

        match next {
            Some(following) => request = following,
            None => return Ok(pages),
        }
    }
}

/// Like [`paginate`], but the first request comes from an existing cursor.
/// A missing cursor means there is nothing left to fetch.
pub fn follow_cursor<P, F>(next: Option<&str>, fetch: F) -> Result<Vec<P>>
where
    P: CursorPage,
    F: FnMut(PageRequest) -> Result<P>,
{
    match next {
        Some(url) => paginate(PageRequest::from_next_url(url)?, fetch),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<u32>, next: Option<&str>) -> Paging<u32> {
        Paging {
            items,
            next: next.map(str::to_string),
        }
    }

    #[test]
    fn parses_limit_and_offset() {
        let req = PageRequest::from_next_url(
            "https://api.spotify.com/v1/browse/categories/latin/playlists?country=GB&offset=50&limit=50",
        )
        .unwrap();
        assert_eq!(req, PageRequest { limit: 50, offset: 50 });
    }

    #[test]
    fn cursor_without_offset_is_rejected() {
        let err = PageRequest::from_next_url("https://api.spotify.com/v1/playlists/x/tracks?limit=100")
            .unwrap_err();
        assert!(matches!(err, EtlError::Cursor { ref reason, .. } if reason.contains("offset")));
    }

    #[test]
    fn cursor_that_is_not_a_url_is_rejected() {
        assert!(matches!(
            PageRequest::from_next_url("not a url"),
            Err(EtlError::Cursor { .. })
        ));
    }

    #[test]
    fn stops_after_first_page_without_next() {
        let mut calls = Vec::new();
        let pages = paginate(PageRequest::default(), |req| {
            calls.push(req);
            Ok(page(vec![1, 2], None))
        })
        .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(calls, vec![PageRequest { limit: 50, offset: 0 }]);
    }

    #[test]
    fn follows_server_cursor_exactly() {
        // The server picks odd offsets/limits; they must be used verbatim.
        let script = vec![
            page(vec![1], Some("https://x.test/p?offset=7&limit=3")),
            page(vec![2], Some("https://x.test/p?limit=11&offset=19")),
            page(vec![3], None),
        ];
        let mut script = script.into_iter();
        let mut calls = Vec::new();

        let pages = paginate(PageRequest::first(5), |req| {
            calls.push(req);
            Ok(script.next().unwrap())
        })
        .unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(
            calls,
            vec![
                PageRequest { limit: 5, offset: 0 },
                PageRequest { limit: 3, offset: 7 },
                PageRequest { limit: 11, offset: 19 },
            ]
        );
        let items: Vec<u32> = pages.into_iter().flat_map(|p| p.items).collect();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn fetch_error_stops_pagination() {
        let mut n = 0;
        let result: Result<Vec<Paging<u32>>> = paginate(PageRequest::default(), |_| {
            n += 1;
            if n == 2 {
                Err(EtlError::Auth("token expired".into()))
            } else {
                Ok(page(vec![n], Some("https://x.test/p?offset=1&limit=1")))
            }
        });
        assert!(matches!(result, Err(EtlError::Auth(_))));
        assert_eq!(n, 2);
    }

    #[test]
    fn absent_cursor_fetches_nothing() {
        let pages: Vec<Paging<u32>> = follow_cursor(None, |_| panic!("no request expected")).unwrap();
        assert!(pages.is_empty());
    }

    #[test]
    fn follow_cursor_starts_from_cursor() {
        let mut calls = Vec::new();
        let pages = follow_cursor(Some("https://x.test/p?offset=100&limit=100"), |req| {
            calls.push(req);
            Ok(page(vec![], None))
        })
        .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(calls, vec![PageRequest { limit: 100, offset: 100 }]);
    }
}
