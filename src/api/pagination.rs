use reqwest::header::HeaderMap;

/// Extract the `rel="next"` URL from a Canvas `Link` header, if present.
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let header = headers.get("link")?.to_str().ok()?;

    for part in header.split(',') {
        let mut segments = part.split(';');
        let url = segments
            .next()
            .map(|s| s.trim().trim_start_matches('<').trim_end_matches('>'))?;
        let is_next = segments.any(|s| {
            let s = s.trim();
            s == "rel=\"next\"" || s == "rel=next"
        });
        if is_next {
            return Some(url.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    fn headers_with_link(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("link", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_next_relation() {
        let headers = headers_with_link(
            "<https://canvas.test/api/v1/courses?page=2&per_page=50>; rel=\"next\", \
             <https://canvas.test/api/v1/courses?page=1&per_page=50>; rel=\"first\"",
        );
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://canvas.test/api/v1/courses?page=2&per_page=50")
        );
    }

    #[test]
    fn last_page_has_no_next() {
        let headers = headers_with_link(
            "<https://canvas.test/api/v1/courses?page=1>; rel=\"current\", \
             <https://canvas.test/api/v1/courses?page=1>; rel=\"last\"",
        );
        assert_eq!(next_page_url(&headers), None);
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }
}
