use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::loader::{CatalogRepository, SearchRoot};
use crate::plural::PluralRule;

/// Suffix marking an action whose control opens another window.
pub const WINDOW_MARKER: &str = "…";

/// The catalog currently served by a domain together with its compiled rule.
#[derive(Debug)]
struct ActiveCatalog {
    culture: Option<String>,
    catalog: Catalog,
    rule: PluralRule,
}

impl ActiveCatalog {
    fn new(culture: Option<String>, catalog: Catalog) -> Self {
        let rule = PluralRule::compile_or_default(catalog.plural_forms());
        ActiveCatalog {
            culture,
            catalog,
            rule,
        }
    }

    fn lookup(&self, context: &str, id: &str) -> Option<&str> {
        self.catalog
            .get(context, id)
            .and_then(|forms| forms.first())
            .map(String::as_str)
    }

    fn lookup_plural(&self, context: &str, id: &str, value: u64) -> Option<&str> {
        let forms = self.catalog.get(context, id)?;
        let index = if forms.len() > 1 && forms.len() == self.catalog.plural_count() {
            self.rule.evaluate(value)
        } else {
            0
        };
        forms.get(index).or_else(|| forms.first()).map(String::as_str)
    }
}

/// Runtime translation facade for one package.
///
/// Lookups read an immutable snapshot; [`LanguageDomain::load`] builds a new
/// snapshot and swaps it in whole, so readers see either the old or the new
/// catalog. Lookups never fail: missing entries return the source text.
#[derive(Debug)]
pub struct LanguageDomain {
    package: String,
    repository: RwLock<CatalogRepository>,
    active: RwLock<Arc<ActiveCatalog>>,
}

impl LanguageDomain {
    pub fn new(package: &str, repository: CatalogRepository) -> Self {
        LanguageDomain {
            package: package.to_string(),
            repository: RwLock::new(repository),
            active: RwLock::new(Arc::new(ActiveCatalog::new(None, Catalog::empty()))),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn repository(&self) -> CatalogRepository {
        self.repository.read().clone()
    }

    /// Replace the search roots used by the next [`LanguageDomain::load`].
    pub fn set_search_roots(&self, roots: Vec<SearchRoot>) {
        *self.repository.write() = CatalogRepository::new(roots);
    }

    /// Resolve `chain` against the package's search roots and make the
    /// result the active catalog. Returns the culture that was selected.
    pub fn load<S: AsRef<str>>(&self, chain: &[S]) -> Option<String> {
        let resolution = self.repository().resolve(chain);
        debug!(
            package = %self.package,
            culture = resolution.culture.as_deref().unwrap_or("<source>"),
            entries = resolution.catalog.len(),
            "loaded language domain"
        );
        let culture = resolution.culture.clone();
        self.install(resolution.culture, resolution.catalog);
        culture
    }

    /// Replace the active catalog with an already built one.
    pub fn install(&self, culture: Option<String>, catalog: Catalog) {
        let next = Arc::new(ActiveCatalog::new(culture, catalog));
        *self.active.write() = next;
    }

    fn snapshot(&self) -> Arc<ActiveCatalog> {
        Arc::clone(&self.active.read())
    }

    pub fn text(&self, message: &str) -> String {
        self.particular_text("", message)
    }

    pub fn particular_text(&self, context: &str, message: &str) -> String {
        let active = self.snapshot();
        match active.lookup(context, message) {
            Some(translation) => translation.to_string(),
            None => {
                trace!(package = %self.package, context = %context, message = %message, "untranslated");
                message.to_string()
            }
        }
    }

    pub fn plural_text(&self, singular: &str, plural: &str, value: u64) -> String {
        self.particular_plural_text("", singular, plural, value)
    }

    /// Plural lookup keyed on `(context, singular)`.
    ///
    /// Without a translation the source pluralization applies: `singular`
    /// for exactly one, `plural` for everything else.
    pub fn particular_plural_text(&self, context: &str, singular: &str, plural: &str, value: u64) -> String {
        let active = self.snapshot();
        match active.lookup_plural(context, singular, value) {
            Some(translation) => translation.to_string(),
            None => {
                trace!(package = %self.package, context = %context, message = %singular, value, "untranslated plural");
                let source = if value == 1 { singular } else { plural };
                source.to_string()
            }
        }
    }

    /// Translated proper name annotated with the original, e.g. `München (Munich)`.
    pub fn proper_name(&self, name: &str) -> String {
        let active = self.snapshot();
        match active.lookup("", name) {
            Some(translation) if translation.contains(&format!("({})", name)) => translation.to_string(),
            Some(translation) => format!("{} ({})", translation, name),
            None => name.to_string(),
        }
    }

    /// Mark `action_text` as opening another window. No lookup is performed.
    pub fn opens_window(&self, action_text: &str) -> String {
        format!("{}{}", action_text, WINDOW_MARKER)
    }

    pub fn active_culture(&self) -> Option<String> {
        self.snapshot().culture.clone()
    }

    pub fn plural_count(&self) -> usize {
        self.snapshot().catalog.plural_count()
    }

    pub fn plural_forms(&self) -> String {
        self.snapshot().catalog.plural_forms().to_string()
    }

    pub fn entry_count(&self) -> usize {
        self.snapshot().catalog.len()
    }

    /// Plural form index the active rule picks for `value`.
    pub fn plural_index(&self, value: u64) -> usize {
        self.snapshot().rule.evaluate(value)
    }
}
