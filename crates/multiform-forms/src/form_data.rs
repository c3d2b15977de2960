//! Submitted form data and uploaded files.
//!
//! [`FormData`] holds the text part of a submission, [`FormFiles`] the
//! uploaded files. Widgets read a field's [`RawInput`] out of them using the
//! field's html name.

use multiform_core::utils::MultiValueDict;
use percent_encoding::percent_decode_str;

/// The text part of a form submission.
///
/// # Examples
///
/// ```
/// use multiform_forms::form_data::FormData;
///
/// let data = FormData::parse("form-0-char_field=hello+world&form-1-int_field=1");
/// assert_eq!(data.get("form-0-char_field"), Some("hello world"));
/// assert_eq!(data.get("form-1-int_field"), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    data: MultiValueDict<String, String>,
}

impl FormData {
    /// Creates empty form data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body or query string.
    ///
    /// `+` decodes to a space and percent escapes are decoded as UTF-8
    /// (invalid sequences are replaced).
    pub fn parse(encoded: &str) -> Self {
        let mut data = MultiValueDict::new();
        for pair in encoded.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.append(decode_component(key), decode_component(value));
        }
        Self { data }
    }

    /// Builds form data from `(name, value)` pairs. Repeated names keep
    /// every value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            data: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns the last value submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Returns every value submitted under `key`.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get_list(key)
    }

    /// Replaces the values under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.set(key.into(), value.into());
    }

    /// Adds a value under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.append(key.into(), value.into());
    }

    /// Returns `true` if `key` was submitted.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterates over submitted names.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// A file uploaded with a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The size of the content in bytes.
    pub size: usize,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file, deriving `size` from the content.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: content.len(),
            content,
        }
    }

    /// Returns the lowercase extension of the filename, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// Uploaded files keyed by field html name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFiles {
    files: MultiValueDict<String, UploadedFile>,
}

impl FormFiles {
    /// Creates an empty set of files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file under `key`.
    pub fn insert(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.files.append(key.into(), file);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_file(mut self, key: impl Into<String>, file: UploadedFile) -> Self {
        self.insert(key, file);
        self
    }

    /// Returns the last file uploaded under `key`.
    pub fn get(&self, key: &str) -> Option<&UploadedFile> {
        self.files.get(key)
    }

    /// Number of distinct names with files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files were uploaded.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The value a single field received from a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Nothing was submitted under the field's name.
    Missing,
    /// A text value.
    Text(String),
    /// Several text values (multi-selects).
    List(Vec<String>),
    /// An uploaded file.
    File(UploadedFile),
}

impl RawInput {
    /// Returns the text value, if this input is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` if nothing usable was submitted.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::File(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent_encoding() {
        let data = FormData::parse("name=J%C3%BCrgen&note=a%26b&empty=&flag");
        assert_eq!(data.get("name"), Some("Jürgen"));
        assert_eq!(data.get("note"), Some("a&b"));
        assert_eq!(data.get("empty"), Some(""));
        assert_eq!(data.get("flag"), Some(""));
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_parse_repeated_keys() {
        let data = FormData::parse("c=red&c=blue");
        assert_eq!(data.get("c"), Some("blue"));
        assert_eq!(data.get_list("c").map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_parse_empty() {
        assert!(FormData::parse("").is_empty());
    }

    #[test]
    fn test_from_pairs_and_set() {
        let mut data = FormData::from_pairs([("a", "1"), ("b", "2")]);
        data.set("a", "3");
        data.append("b", "4");
        assert_eq!(data.get("a"), Some("3"));
        assert_eq!(data.get_list("b").map(<[String]>::to_vec), Some(vec!["2".into(), "4".into()]));
        assert!(data.contains_key("a"));
    }

    #[test]
    fn test_uploaded_file() {
        let file = UploadedFile::new("Report.PDF", "application/pdf", vec![1, 2, 3]);
        assert_eq!(file.size, 3);
        assert_eq!(file.extension().as_deref(), Some("pdf"));
        let files = FormFiles::new().with_file("doc", file.clone());
        assert_eq!(files.get("doc"), Some(&file));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_raw_input_is_empty() {
        assert!(RawInput::Missing.is_empty());
        assert!(RawInput::Text(String::new()).is_empty());
        assert!(!RawInput::Text("x".into()).is_empty());
        assert!(!RawInput::File(UploadedFile::new("a", "b", vec![])).is_empty());
        assert_eq!(RawInput::Text("x".into()).as_text(), Some("x"));
    }
}
