//! CSS and JavaScript assets required by widgets and forms.
//!
//! [`Media`] values merge with `+`: paths keep their first-seen order and
//! duplicates are dropped, so a form set can combine the media of all of
//! its forms.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use multiform_core::utils::text::escape_html;

/// Asset declarations for a widget, form, or form set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    css: BTreeMap<String, Vec<String>>,
    js: Vec<String>,
}

impl Media {
    /// Creates empty media.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stylesheet for `medium` (e.g. "all", "print").
    #[must_use]
    pub fn with_css(mut self, medium: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let paths = self.css.entry(medium.into()).or_default();
        if !paths.contains(&path) {
            paths.push(path);
        }
        self
    }

    /// Adds a script.
    #[must_use]
    pub fn with_js(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.js.contains(&path) {
            self.js.push(path);
        }
        self
    }

    /// Scripts in declaration order.
    pub fn js(&self) -> &[String] {
        &self.js
    }

    /// Stylesheets for `medium`.
    pub fn css(&self, medium: &str) -> &[String] {
        self.css.get(medium).map_or(&[], Vec::as_slice)
    }

    /// Returns `true` if no assets are declared.
    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.values().all(Vec::is_empty)
    }

    /// Renders `<link>` tags, media in name order.
    pub fn render_css(&self) -> Vec<String> {
        self.css
            .iter()
            .flat_map(|(medium, paths)| {
                paths.iter().map(move |path| {
                    format!(
                        r#"<link href="{}" type="text/css" media="{}" rel="stylesheet">"#,
                        escape_html(path),
                        escape_html(medium)
                    )
                })
            })
            .collect()
    }

    /// Renders `<script>` tags.
    pub fn render_js(&self) -> Vec<String> {
        self.js
            .iter()
            .map(|path| format!(r#"<script src="{}"></script>"#, escape_html(path)))
            .collect()
    }

    /// Renders stylesheets then scripts, one tag per line.
    pub fn render(&self) -> String {
        let mut tags = self.render_css();
        tags.extend(self.render_js());
        tags.join("\n")
    }
}

impl AddAssign<&Self> for Media {
    fn add_assign(&mut self, other: &Self) {
        for (medium, paths) in &other.css {
            let mine = self.css.entry(medium.clone()).or_default();
            for path in paths {
                if !mine.contains(path) {
                    mine.push(path.clone());
                }
            }
        }
        for path in &other.js {
            if !self.js.contains(path) {
                self.js.push(path.clone());
            }
        }
    }
}

impl Add for Media {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += &other;
        self
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_media() {
        let media = Media::new();
        assert!(media.is_empty());
        assert_eq!(media.render(), "");
    }

    #[test]
    fn test_merge_dedupes_and_keeps_order() {
        let a = Media::new().with_js("a.js").with_js("b.js").with_css("all", "x.css");
        let b = Media::new().with_js("b.js").with_js("c.js").with_css("all", "x.css");
        let merged = a + b;
        assert_eq!(merged.js(), &["a.js", "b.js", "c.js"]);
        assert_eq!(merged.css("all"), &["x.css"]);
        assert!(merged.css("print").is_empty());
    }

    #[test]
    fn test_render() {
        let media = Media::new().with_css("print", "p.css").with_js("app.js");
        assert_eq!(
            media.render(),
            "<link href=\"p.css\" type=\"text/css\" media=\"print\" rel=\"stylesheet\">\n<script src=\"app.js\"></script>"
        );
    }
}
