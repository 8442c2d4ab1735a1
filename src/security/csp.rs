//! Content-Security-Policy construction.
//!
//! Directives keep insertion order so the emitted header is stable across
//! runs. Overriding a directive replaces its sources in place.

/// An ordered set of CSP directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    directives: Vec<(String, Vec<String>)>,
}

impl ContentSecurityPolicy {
    /// An empty policy.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
        }
    }

    /// The baseline secure-header policy that configured directives are
    /// layered on top of.
    pub fn baseline() -> Self {
        Self::new()
            .directive("default-src", ["'self'"])
            .directive("base-uri", ["'self'"])
            .directive("font-src", ["'self'", "https:", "data:"])
            .directive("form-action", ["'self'"])
            .directive("frame-ancestors", ["'self'"])
            .directive("img-src", ["'self'", "data:"])
            .directive("object-src", ["'none'"])
            .directive("script-src", ["'self'"])
            .directive("script-src-attr", ["'none'"])
            .directive("style-src", ["'self'", "https:", "'unsafe-inline'"])
            .directive("upgrade-insecure-requests", [] as [&str; 0])
    }

    /// Set a directive, replacing any existing sources for it.
    pub fn directive<I, S>(mut self, name: &str, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        match self.directives.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = sources,
            None => self.directives.push((name.to_string(), sources)),
        }
        self
    }

    pub fn script_src<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive("script-src", sources)
    }

    pub fn style_src<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive("style-src", sources)
    }

    pub fn img_src<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive("img-src", sources)
    }

    pub fn font_src<I, S>(self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directive("font-src", sources)
    }

    /// Sources configured for `name`, if the directive is present.
    pub fn sources(&self, name: &str) -> Option<&[String]> {
        self.directives
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sources)| sources.as_slice())
    }

    /// Render as a header value: `name src src;name src`.
    pub fn to_header_value(&self) -> String {
        self.directives
            .iter()
            .map(|(name, sources)| {
                if sources.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl Default for ContentSecurityPolicy {
    fn default() -> Self {
        Self::baseline()
    }
}
