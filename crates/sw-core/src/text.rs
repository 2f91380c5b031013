//! Plain-text views of rich-text descriptions.

/// Remove HTML tags from `html`, including an unterminated tag at the end,
/// and decode the handful of entities the editor emits.
pub fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    decode_entities(&out)
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// True when `html` has no visible text once tags are stripped.
pub fn is_blank(html: &str) -> bool {
    strip_html_tags(html).trim().is_empty()
}

/// Plain-text excerpt of at most `max_chars` characters, whitespace collapsed,
/// ending in `...` when truncated.
pub fn excerpt(html: &str, max_chars: usize) -> String {
    let plain = strip_html_tags(html);
    let collapsed = plain.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
