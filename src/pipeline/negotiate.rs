//! Content negotiation over an explicit dispatch table.
//!
//! A table lists `(media type, handler)` pairs in preference order. The
//! `Accept` header ranks them; a missing or empty header picks the first entry.

struct MediaRange<'a> {
    range: &'a str,
    quality: f32,
}

fn parse_accept(accept: &str) -> Vec<MediaRange<'_>> {
    let mut ranges: Vec<MediaRange<'_>> = accept
        .split(',')
        .filter_map(|part| {
            let mut params = part.split(';');
            let range = params.next()?.trim();
            if range.is_empty() {
                return None;
            }

            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            Some(MediaRange { range, quality })
        })
        .filter(|r| r.quality > 0.0)
        .collect();

    // stable: equal weights keep header order
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

fn matches(range: &str, media_type: &str) -> bool {
    if range == "*/*" || range.eq_ignore_ascii_case(media_type) {
        return true;
    }

    match (range.strip_suffix("/*"), media_type.split_once('/')) {
        (Some(range_type), Some((media_main, _))) => range_type.eq_ignore_ascii_case(media_main),
        _ => false,
    }
}

/// Pick the handler whose media type best satisfies `accept`.
///
/// Returns `None` when the header names nothing the table can produce.
pub fn negotiate<'t, T>(accept: Option<&str>, table: &'t [(&'static str, T)]) -> Option<&'t (&'static str, T)> {
    let accept = match accept.map(str::trim) {
        Some(accept) if !accept.is_empty() => accept,
        _ => return table.first(),
    };

    parse_accept(accept)
        .iter()
        .find_map(|r| table.iter().find(|(media_type, _)| matches(r.range, media_type)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [(&str, u8); 2] = [("text/html", 1), ("application/json", 2)];

    fn pick(accept: Option<&str>) -> Option<u8> {
        negotiate(accept, &TABLE).map(|(_, v)| *v)
    }

    #[test]
    fn test_missing_accept_uses_first_entry() {
        assert_eq!(pick(None), Some(1));
        assert_eq!(pick(Some("  ")), Some(1));
    }

    #[test]
    fn test_exact_and_wildcards() {
        assert_eq!(pick(Some("application/json")), Some(2));
        assert_eq!(pick(Some("text/*")), Some(1));
        assert_eq!(pick(Some("application/*")), Some(2));
        assert_eq!(pick(Some("*/*")), Some(1));
    }

    #[test]
    fn test_quality_ordering() {
        assert_eq!(pick(Some("text/html;q=0.5, application/json")), Some(2));
        assert_eq!(pick(Some("application/json;q=0.9, text/html;q=0.9")), Some(2));
        assert_eq!(pick(Some("application/json;q=0.2, text/*;q=0.1")), Some(2));
    }

    #[test]
    fn test_browser_accept_prefers_html() {
        let accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
        assert_eq!(pick(Some(accept)), Some(1));
    }

    #[test]
    fn test_unacceptable() {
        assert_eq!(pick(Some("image/png")), None);
        assert_eq!(pick(Some("application/json;q=0")), None);
    }
}
