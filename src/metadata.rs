use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use tracing::debug;

static CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)charset\s*=\s*([^\s;]+)").expect("charset pattern is valid")
});

/// The `Key: Value` header block stored as the translation of the empty message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: Vec<(String, String)>,
}

impl Metadata {
    pub fn parse(block: &str) -> Self {
        let fields = block
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Metadata { fields }
    }

    /// Value of `key`, compared case-insensitively. The last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn plural_forms(&self) -> Option<&str> {
        self.get("Plural-Forms")
    }

    /// Charset label declared in `Content-Type`, if any.
    pub fn charset(&self) -> Option<&str> {
        let content_type = self.get("Content-Type")?;
        CHARSET
            .captures(content_type)
            .and_then(|captures| captures.get(1))
            .map(|label| label.as_str())
    }

    /// Encoding for every non-header string. Unknown or missing labels mean UTF-8.
    pub fn encoding(&self) -> &'static Encoding {
        match self.charset() {
            Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
                debug!(charset = %label, "unrecognized charset, decoding as UTF-8");
                UTF_8
            }),
            None => UTF_8,
        }
    }
}
