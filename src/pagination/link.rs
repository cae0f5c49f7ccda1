//! Link header parsing (RFC 8288)
//!
//! GitHub paginates with `Link: <https://api.github.com/...?page=2>; rel="next", ...`.

/// URL of the `rel="next"` entry
pub fn next_link(header: &str) -> Option<String> {
    parse_link_header(header, "next")
}

/// Parse a Link header and extract the URL for the given rel
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    let mut rest = header;

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let close = after_open.find('>')?;
        let url = &after_open[..close];

        // Parameters run until the next link-value; commas inside <...> never count
        let params_and_tail = &after_open[close + 1..];
        let params_end = params_and_tail.find('<').unwrap_or(params_and_tail.len());
        let params = &params_and_tail[..params_end];
        rest = &params_and_tail[params_end..];

        let matches_rel = params.split(';').any(|param| {
            let param = param.trim().trim_end_matches(',').trim();
            param.strip_prefix("rel=").is_some_and(|value| {
                let value = value.trim_matches('"').trim_matches('\'');
                // rel may hold several space-separated relation types
                value.split_whitespace().any(|r| r == target_rel)
            })
        });

        if matches_rel && !url.is_empty() {
            return Some(url.to_string());
        }
    }

    None
}
