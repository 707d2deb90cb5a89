use once_cell::sync::Lazy;
use regex::Regex;

/// `http://` or `https://`, then a run of URL characters holding at least one dot
///
/// An HTML-escaped ampersand (`&amp;`, `&#38;`, `&#038;`) counts as one URL
/// character, so escaped query strings in markup are kept whole.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bhttps?://(?:&amp;|&#0?38;|[a-z0-9./?:@\-_=#&%~+])+\.(?:&amp;|&#0?38;|[a-z0-9./?:@\-_=#&%~+])*",
    )
    .expect("URL pattern is a valid regex")
});

static ESCAPED_AMPERSAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&amp;|&#0?38;").expect("entity pattern is a valid regex"));

/// Pulls candidate absolute URLs out of raw document text
///
/// Extraction is purely lexical: nothing is resolved or validated here
/// beyond turning escaped ampersands back into `&`. Results keep
/// first-occurrence order and duplicates are retained, the filter
/// deduplicates later.
///
/// # Examples
///
/// ```
/// use url2snapshot::url::extract_urls;
///
/// let urls = extract_urls("see http://example.com/a and https://example.org");
/// assert_eq!(urls, vec!["http://example.com/a", "https://example.org"]);
/// assert!(extract_urls("").is_empty());
/// ```
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| ESCAPED_AMPERSAND.replace_all(m.as_str(), "&").into_owned())
        .collect()
}
