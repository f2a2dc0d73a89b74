use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::culture::{CulturePreference, ListenerId};
use crate::domain::LanguageDomain;
use crate::fallbacks::culture_chain;
use crate::loader::{CatalogRepository, SearchRoot};

/// Supplies the search roots of a package, queried on every (re)load.
pub trait SearchRootsProvider: Send + Sync {
    fn search_roots(&self) -> Vec<SearchRoot>;
}

impl<F> SearchRootsProvider for F
where
    F: Fn() -> Vec<SearchRoot> + Send + Sync,
{
    fn search_roots(&self) -> Vec<SearchRoot> {
        self()
    }
}

impl SearchRootsProvider for Vec<SearchRoot> {
    fn search_roots(&self) -> Vec<SearchRoot> {
        self.clone()
    }
}

#[derive(Clone)]
struct Registration {
    root_culture: String,
    provider: Arc<dyn SearchRootsProvider>,
}

/// Process-wide map from package name to its [`LanguageDomain`].
///
/// Packages register explicitly; a domain is built and loaded the first
/// time it is requested and reloaded whenever the culture changes.
#[derive(Default)]
pub struct DomainRegistry {
    registrations: RwLock<BTreeMap<String, Registration>>,
    domains: RwLock<BTreeMap<String, Arc<LanguageDomain>>>,
    culture: RwLock<Option<String>>,
    /// Serializes building a domain against reloading all of them.
    loading: Mutex<()>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared registry of this process.
    pub fn global() -> &'static Arc<DomainRegistry> {
        static GLOBAL: OnceLock<Arc<DomainRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(DomainRegistry::new()))
    }

    /// Register a package. Registering a name again replaces the previous
    /// registration and discards its domain.
    pub fn register<P>(&self, package: &str, root_culture: &str, provider: P)
    where
        P: SearchRootsProvider + 'static,
    {
        let registration = Registration {
            root_culture: root_culture.to_string(),
            provider: Arc::new(provider),
        };
        self.registrations
            .write()
            .insert(package.to_string(), registration);
        self.domains.write().remove(package);
        debug!(package = %package, root_culture = %root_culture, "registered package");
    }

    pub fn unregister(&self, package: &str) -> bool {
        self.domains.write().remove(package);
        self.registrations.write().remove(package).is_some()
    }

    /// Registered package names, sorted.
    pub fn packages(&self) -> Vec<String> {
        self.registrations.read().keys().cloned().collect()
    }

    pub fn culture(&self) -> Option<String> {
        self.culture.read().clone()
    }

    /// Fallback chain used for `package` under the current culture.
    pub fn chain_for(&self, package: &str) -> Option<Vec<String>> {
        let registration = self.registrations.read().get(package).cloned()?;
        Some(self.chain(&registration))
    }

    fn chain(&self, registration: &Registration) -> Vec<String> {
        let culture = self
            .culture()
            .unwrap_or_else(|| registration.root_culture.clone());
        culture_chain(&culture, &registration.root_culture)
    }

    /// The domain of `package`, built and loaded on first request.
    pub fn domain(&self, package: &str) -> Option<Arc<LanguageDomain>> {
        if let Some(domain) = self.domains.read().get(package) {
            return Some(Arc::clone(domain));
        }

        let _loading = self.loading.lock();
        if let Some(domain) = self.domains.read().get(package) {
            return Some(Arc::clone(domain));
        }

        let registration = self.registrations.read().get(package).cloned()?;
        let repository = CatalogRepository::new(registration.provider.search_roots());
        let domain = Arc::new(LanguageDomain::new(package, repository));
        domain.load(&self.chain(&registration));

        self.domains
            .write()
            .insert(package.to_string(), Arc::clone(&domain));
        Some(domain)
    }

    /// Select `culture` and reload every constructed domain.
    pub fn set_culture(&self, culture: &str) {
        *self.culture.write() = Some(culture.to_string());
        self.reload_all();
    }

    /// Re-query search roots and reload every constructed domain.
    pub fn reload_all(&self) {
        let _loading = self.loading.lock();
        let domains: Vec<(String, Arc<LanguageDomain>)> = self
            .domains
            .read()
            .iter()
            .map(|(name, domain)| (name.clone(), Arc::clone(domain)))
            .collect();

        for (package, domain) in domains {
            let Some(registration) = self.registrations.read().get(&package).cloned() else {
                continue;
            };
            domain.set_search_roots(registration.provider.search_roots());
            domain.load(&self.chain(&registration));
        }
        info!(culture = self.culture().as_deref().unwrap_or("<root>"), "reloaded language domains");
    }

    /// Drop every constructed domain; registrations and culture are kept.
    pub fn reset(&self) {
        self.domains.write().clear();
    }

    /// Follow `preference`: every selection change reloads all domains.
    pub fn attach_to(self: &Arc<Self>, preference: &CulturePreference) -> ListenerId {
        if let Some(culture) = preference.current() {
            *self.culture.write() = Some(culture);
        }
        let registry = Arc::downgrade(self);
        preference.subscribe(move |culture| {
            if let Some(registry) = registry.upgrade() {
                registry.set_culture(culture);
            }
        })
    }
}

impl std::fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainRegistry")
            .field("packages", &self.packages())
            .field("loaded", &self.domains.read().keys().collect::<Vec<_>>())
            .field("culture", &self.culture())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CatalogBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn catalogs() -> TempDir {
        let dir = TempDir::new().unwrap();
        CatalogBuilder::new()
            .message("Save", "Enregistrer")
            .write_to(dir.path(), "fr", ".mo");
        CatalogBuilder::new()
            .message("Save", "Speichern")
            .write_to(dir.path(), "de", ".mo");
        dir
    }

    #[test]
    fn test_domain_built_on_first_request() {
        let dir = catalogs();
        let registry = DomainRegistry::new();
        registry.set_culture("fr-FR");
        registry.register("ui", "en", vec![SearchRoot::new(dir.path(), ".mo")]);

        let domain = registry.domain("ui").unwrap();
        assert_eq!(domain.text("Save"), "Enregistrer");
        assert!(Arc::ptr_eq(&domain, &registry.domain("ui").unwrap()));
        assert!(registry.domain("unknown").is_none());
    }

    #[test]
    fn test_set_culture_reloads_existing_domains() {
        let dir = catalogs();
        let registry = DomainRegistry::new();
        registry.register("ui", "en", vec![SearchRoot::new(dir.path(), ".mo")]);

        let domain = registry.domain("ui").unwrap();
        assert_eq!(domain.text("Save"), "Save");
        assert_eq!(registry.chain_for("ui").unwrap(), vec!["en"]);

        registry.set_culture("de-AT");
        assert_eq!(domain.text("Save"), "Speichern");
        assert_eq!(domain.active_culture().as_deref(), Some("de"));
    }

    #[test]
    fn test_provider_queried_on_reload() {
        let dir = catalogs();
        let path = dir.path().to_path_buf();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = DomainRegistry::new();
        registry.register("ui", "en", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![SearchRoot::new(&path, "mo")]
        });

        registry.domain("ui").unwrap();
        registry.reload_all();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reset_and_unregister() {
        let dir = catalogs();
        let registry = DomainRegistry::new();
        registry.register("ui", "en", vec![SearchRoot::new(dir.path(), ".mo")]);

        let first = registry.domain("ui").unwrap();
        registry.reset();
        let second = registry.domain("ui").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        assert_eq!(registry.packages(), vec!["ui"]);
        assert!(registry.unregister("ui"));
        assert!(registry.domain("ui").is_none());
        assert!(!registry.unregister("ui"));
    }

    #[test]
    fn test_attached_preference_drives_reload() {
        let dir = catalogs();
        let registry = Arc::new(DomainRegistry::new());
        registry.register("ui", "en", vec![SearchRoot::new(dir.path(), ".mo")]);
        let preference = CulturePreference::with_culture("fr");
        registry.attach_to(&preference);

        let domain = registry.domain("ui").unwrap();
        assert_eq!(domain.text("Save"), "Enregistrer");

        preference.select("de-DE");
        assert_eq!(domain.text("Save"), "Speichern");
        assert_eq!(registry.culture().as_deref(), Some("de-DE"));
    }

    #[test]
    fn test_culture_change_during_first_build_is_not_lost() {
        let dir = catalogs();
        for _ in 0..100 {
            let registry = DomainRegistry::new();
            registry.set_culture("fr");
            registry.register("ui", "en", vec![SearchRoot::new(dir.path(), ".mo")]);

            let domain = std::thread::scope(|scope| {
                let builder = scope.spawn(|| registry.domain("ui").unwrap());
                let switcher = scope.spawn(|| registry.set_culture("de"));
                switcher.join().unwrap();
                builder.join().unwrap()
            });
            assert_eq!(domain.text("Save"), "Speichern");
            assert_eq!(domain.active_culture().as_deref(), Some("de"));
        }
    }

    #[test]
    fn test_global_registry_is_shared() {
        let first = DomainRegistry::global();
        let second = DomainRegistry::global();
        assert!(Arc::ptr_eq(first, second));

        let dir = catalogs();
        first.register("registry.tests.global", "fr", vec![SearchRoot::new(dir.path(), ".mo")]);
        assert!(second.packages().contains(&"registry.tests.global".to_string()));
        assert!(first.unregister("registry.tests.global"));
    }
}
