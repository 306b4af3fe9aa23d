//! Pagination metadata carried in response headers.

use reqwest::header::HeaderMap;

pub const TOTAL_HEADER: &str = "x-total";
pub const TOTAL_PAGES_HEADER: &str = "x-total-pages";
pub const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Item and page counts reported by the server for one response
/// (`X-Total`, `X-Total-Pages`, `X-Next-Page`).
///
/// Derived per response and never retained across calls. A missing or
/// unparseable header yields `0` for that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u64,
    pub next_page: u64,
}

impl Pagination {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            total_items: header_u64(headers, TOTAL_HEADER),
            total_pages: header_u64(headers, TOTAL_PAGES_HEADER),
            next_page: header_u64(headers, NEXT_PAGE_HEADER),
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> u64 {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parses_all_three_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(TOTAL_HEADER, HeaderValue::from_static("120"));
        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("6"));
        headers.insert(NEXT_PAGE_HEADER, HeaderValue::from_static("2"));

        let pagination = Pagination::from_headers(&headers);
        assert_eq!(
            pagination,
            Pagination {
                total_items: 120,
                total_pages: 6,
                next_page: 2,
            }
        );
    }

    #[test]
    fn unparseable_headers_default_to_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(TOTAL_HEADER, HeaderValue::from_static("lots"));
        headers.insert(TOTAL_PAGES_HEADER, HeaderValue::from_static("-3"));

        let pagination = Pagination::from_headers(&headers);
        assert_eq!(pagination, Pagination::default());
    }
}
