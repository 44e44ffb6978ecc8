use proof_schemas::CategoryId;

/// Number of leading `/`-delimited tokens that make up a category URL:
/// `https:`, the empty token between the slashes, host, and two path segments.
pub const DEFAULT_CATEGORY_DEPTH: usize = 5;

/// Derive the category page URL from a company profile URL.
///
/// The URL is cut at its query or fragment, split on `/`, and the first
/// `depth` tokens are re-joined. Returns `None` when there are fewer than
/// `depth` tokens, when the first token is not a scheme (`xxx:` followed by
/// `//`), or when any host/path token inside the prefix is empty.
pub fn category_id(url: &str, depth: usize) -> Option<CategoryId> {
    let url = url.trim();
    let url = url.split(['?', '#']).next().unwrap_or("");

    let tokens: Vec<&str> = url.split('/').take(depth).collect();
    if depth < 3 || tokens.len() < depth {
        return None;
    }

    let scheme = tokens[0];
    if scheme.len() < 2 || !scheme.ends_with(':') || !tokens[1].is_empty() {
        return None;
    }
    if tokens[2..].iter().any(|t| t.trim().is_empty()) {
        return None;
    }

    Some(CategoryId::new(tokens.join("/")))
}
