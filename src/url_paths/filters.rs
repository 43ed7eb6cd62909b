use regex::Regex;

fn remote_url_pattern() -> &'static Regex {
  use std::sync::OnceLock;

  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"^(https?:|//)").expect("invalid remote URL regex"))
}

/// Determine whether a manifest URL points at a remote or protocol-relative resource.
///
/// Remote URLs are not known at build time, so they are handled through runtime caching
/// rules instead of being listed in the precache set.
pub fn is_http_or_https(url: &str) -> bool {
  remote_url_pattern().is_match(url)
}

/// Determine whether a local URL survives the configured ignore patterns.
pub fn is_cache_static_file(url: &str, ignore_patterns: &[Regex]) -> bool {
  !ignore_patterns.iter().any(|pattern| pattern.is_match(url))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_http_and_protocol_relative_urls() {
    assert!(is_http_or_https("https://cdn.example.com/app.js"));
    assert!(is_http_or_https("http://cdn/a.js"));
    assert!(is_http_or_https("//cdn.example.com/vendor.js"));
  }

  #[test]
  fn keeps_local_paths_static() {
    assert!(!is_http_or_https("/static/app.js"));
    assert!(!is_http_or_https("app.css"));
    assert!(!is_http_or_https("data/https:/odd.js"));
    assert!(!is_http_or_https("HTTPS://cdn/upper.js"));
  }

  #[test]
  fn everything_passes_without_ignore_patterns() {
    assert!(is_cache_static_file("/anything.map", &[]));
  }

  #[test]
  fn drops_urls_matching_an_ignore_pattern() {
    let patterns = vec![
      Regex::new(r"\.map$").unwrap(),
      Regex::new(r"^/hot/").unwrap(),
    ];

    assert!(!is_cache_static_file("/app.js.map", &patterns));
    assert!(!is_cache_static_file("/hot/update.json", &patterns));
    assert!(is_cache_static_file("/app.js", &patterns));
  }
}
