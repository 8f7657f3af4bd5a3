pub(crate) mod http;

/// Strip trailing slashes so endpoint joins never produce `//`.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
