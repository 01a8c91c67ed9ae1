//! Static asset exemptions.
//!
//! Requests matched here never reach the route table or the session check,
//! so asset fetches from public pages are not redirected to sign-in.

/// Pre-check that lets framework assets, images and icons through unconditionally.
#[derive(Debug, Clone, Default)]
pub struct ExemptionFilter {
    prefixes: Vec<String>,
    paths: Vec<String>,
    extensions: Vec<String>,
}

impl ExemptionFilter {
    /// Build the filter.
    ///
    /// - `prefixes`: plain string prefixes, e.g. `/_next/static`.
    /// - `paths`: exact paths, e.g. `/favicon.ico`.
    /// - `extensions`: file extensions with or without the leading dot.
    pub fn new<A, B, C>(prefixes: A, paths: B, extensions: C) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            paths: paths.into_iter().map(Into::into).collect(),
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Whether `path` bypasses the gate entirely.
    pub fn is_exempt(&self, path: &str) -> bool {
        if self.paths.iter().any(|p| p == path) {
            return true;
        }
        if self.prefixes.iter().any(|p| path.starts_with(p.as_str())) {
            return true;
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        file_name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| {
                !stem.is_empty() && self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
            })
    }

    /// Total number of configured prefixes, paths and extensions.
    pub fn len(&self) -> usize {
        self.prefixes.len() + self.paths.len() + self.extensions.len()
    }

    /// True when nothing is exempt.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_filter() -> ExemptionFilter {
        ExemptionFilter::new(
            ["/_next/static", "/_next/image"],
            ["/favicon.ico"],
            ["svg", ".png", "jpg", "jpeg", "gif", "webp", "ico"],
        )
    }

    #[test]
    fn test_framework_assets_are_exempt() {
        let filter = next_filter();
        assert!(filter.is_exempt("/_next/static/chunk.js"));
        assert!(filter.is_exempt("/_next/static/css/app.css"));
        assert!(filter.is_exempt("/_next/image"));
        assert!(filter.is_exempt("/favicon.ico"));
    }

    #[test]
    fn test_image_extensions_are_exempt_anywhere() {
        let filter = next_filter();
        assert!(filter.is_exempt("/logo.svg"));
        assert!(filter.is_exempt("/acme/gallery/cut.JPG"));
        assert!(filter.is_exempt("/icons/apple-touch.png"));
    }

    #[test]
    fn test_pages_are_not_exempt() {
        let filter = next_filter();
        assert!(!filter.is_exempt("/dashboard"));
        assert!(!filter.is_exempt("/_next/data/build/page.json"));
        assert!(!filter.is_exempt("/reports.pdf"));
        assert!(!filter.is_exempt("/png"));
    }

    #[test]
    fn test_extension_only_in_last_segment() {
        let filter = next_filter();
        assert!(!filter.is_exempt("/images.png/settings"));
        // A bare dotfile has no stem.
        assert!(!filter.is_exempt("/.png"));
    }

    #[test]
    fn test_empty_filter_exempts_nothing() {
        let filter = ExemptionFilter::default();
        assert!(filter.is_empty());
        assert!(!filter.is_exempt("/favicon.ico"));
    }
}
