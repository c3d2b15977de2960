//! String utility functions for labels and HTML output.

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use multiform_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("hello"), "Hello");
/// assert_eq!(capfirst(""), "");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Turns a field name into a human-readable label.
///
/// # Examples
///
/// ```
/// use multiform_core::utils::text::pretty_name;
///
/// assert_eq!(pretty_name("char_field"), "Char field");
/// assert_eq!(pretty_name(""), "");
/// ```
pub fn pretty_name(name: &str) -> String {
    capfirst(&name.replace('_', " "))
}

/// Escapes the five HTML-significant characters.
///
/// # Examples
///
/// ```
/// use multiform_core::utils::text::escape_html;
///
/// assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
