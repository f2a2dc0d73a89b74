use std::collections::HashMap;
use std::collections::hash_map;

use serde::Serialize;
use tracing::warn;

use crate::plural::DEFAULT_PLURAL_FORMS;

/// Lookup key of a catalog entry. An empty context means "no context".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MessageKey {
    pub context: String,
    pub id: String,
}

impl MessageKey {
    pub fn new(context: &str, id: &str) -> Self {
        MessageKey {
            context: context.to_owned(),
            id: id.to_owned(),
        }
    }
}

/// Immutable snapshot of the translations for one resolved culture.
///
/// Each entry maps a `(context, id)` key to its translated forms. Index 0 is
/// the singular form; plural entries carry exactly `plural_count` forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    plural_forms: String,
    plural_count: usize,
    charset: &'static str,
    entries: HashMap<MessageKey, Vec<String>>,
}

impl Catalog {
    /// A catalog with no entries and a single plural form.
    ///
    /// This is what a culture without any translation file resolves to.
    pub fn empty() -> Self {
        Catalog {
            plural_forms: "nplurals=1; plural=0;".to_string(),
            plural_count: 1,
            charset: "UTF-8",
            entries: HashMap::new(),
        }
    }

    pub(crate) fn with_header(plural_forms: String, plural_count: usize, charset: &'static str) -> Self {
        Catalog {
            plural_forms,
            plural_count: plural_count.max(1),
            charset,
            entries: HashMap::new(),
        }
    }

    pub fn plural_forms(&self) -> &str {
        &self.plural_forms
    }

    pub fn plural_count(&self) -> usize {
        self.plural_count
    }

    pub fn charset(&self) -> &'static str {
        self.charset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, context: &str, id: &str) -> Option<&[String]> {
        self.entries
            .get(&MessageKey::new(context, id))
            .map(|forms| forms.as_slice())
    }

    pub fn iter(&self) -> hash_map::Iter<'_, MessageKey, Vec<String>> {
        self.entries.iter()
    }

    /// Entries sorted by context, then id.
    pub fn sorted_entries(&self) -> Vec<(&MessageKey, &Vec<String>)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Insert an entry, enforcing the form count invariant.
    ///
    /// Form sequences whose length is neither 1 nor `plural_count` keep only
    /// their singular form. Returns the previous forms for the key, if any.
    pub fn insert(&mut self, key: MessageKey, mut forms: Vec<String>) -> Option<Vec<String>> {
        if forms.is_empty() {
            forms.push(String::new());
        }
        if forms.len() != 1 && forms.len() != self.plural_count {
            warn!(
                context = %key.context,
                id = %key.id,
                forms = forms.len(),
                plural_count = self.plural_count,
                "plural form count mismatch, keeping singular form only"
            );
            forms.truncate(1);
        }
        self.entries.insert(key, forms)
    }

    /// Merge `other` into this catalog, `other` taking precedence.
    ///
    /// Identical keys are replaced wholesale. The plural header of `other`
    /// wins; entries already present whose forms no longer fit its plural
    /// count are reduced to their singular form.
    pub fn merge(&mut self, other: Catalog) {
        if other.plural_count != self.plural_count || other.plural_forms != self.plural_forms {
            if !self.entries.is_empty() && other.plural_forms != self.plural_forms {
                warn!(
                    previous = %self.plural_forms,
                    replacement = %other.plural_forms,
                    "merging catalogs with different plural forms headers"
                );
            }
            self.plural_forms = other.plural_forms;
            self.plural_count = other.plural_count;
            let plural_count = self.plural_count;
            for forms in self.entries.values_mut() {
                if forms.len() != 1 && forms.len() != plural_count {
                    forms.truncate(1);
                }
            }
        }
        self.charset = other.charset;
        self.entries.extend(other.entries);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::with_header(DEFAULT_PLURAL_FORMS.to_string(), 2, "UTF-8")
    }
}
