//! Derivation of filesystem-safe base names from page URLs

/// Base name used when a URL reduces to nothing, e.g. the site root
pub const INDEX_FILENAME: &str = "index";

/// Map a page URL to the base name shared by its HTML and PDF files
///
/// The host prefix is removed, then one leading and one trailing slash,
/// remaining slashes become hyphens and a trailing `.html` is dropped.
///
/// ```
/// use sitearchive::archive::derive_filename;
///
/// let host = "https://example.com";
/// assert_eq!(derive_filename(host, "https://example.com/a/b/"), "a-b");
/// assert_eq!(derive_filename(host, "https://example.com/"), "index");
/// ```
pub fn derive_filename(host: &str, url: &str) -> String {
    let path = if host.is_empty() {
        url
    } else {
        url.strip_prefix(host).unwrap_or(url)
    };
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.strip_suffix('/').unwrap_or(path);

    let name = path.replace('/', "-");
    let name = name.strip_suffix(".html").unwrap_or(&name);

    if name.is_empty() {
        INDEX_FILENAME.to_string()
    } else {
        name.to_string()
    }
}
