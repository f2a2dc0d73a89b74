//! Translated text from compiled gettext catalogs.
//!
//! Catalog files (`<culture>.mo`) are discovered under a package's search
//! roots for a culture fallback chain, merged, and served through a
//! [`LanguageDomain`]:
//!
//! ```ignore
//! use gettext_domain::{CatalogRepository, LanguageDomain, SearchRoot, culture_chain};
//!
//! let repository = CatalogRepository::new(vec![SearchRoot::new("/opt/app/locale", ".mo")]);
//! let domain = LanguageDomain::new("com.example.ui", repository);
//! domain.load(&culture_chain("fr-FR", "en"));
//!
//! println!("{}", domain.text("Save"));
//! println!("{}", domain.particular_text("menu", "Open"));
//! println!("{}", domain.plural_text("one file", "{0} files", 3));
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod culture;
pub mod domain;
pub mod error;
pub mod fallbacks;
pub mod loader;
pub mod metadata;
pub mod parser;
pub mod plural;
pub mod registry;

#[cfg(test)]
mod testing;

// Re-export the main types for convenient access
pub use catalog::{Catalog, MessageKey};
pub use config::{PackageConfig, RegistryConfig, SearchRootConfig};
pub use culture::{CulturePreference, ListenerId};
pub use domain::LanguageDomain;
pub use error::{ConfigError, ExpressionError, FormatError, RepositoryError};
pub use fallbacks::culture_chain;
pub use loader::{CatalogRepository, Resolution, SearchRoot, load_catalog_from_file, resolve};
pub use parser::{Parser, parse};
pub use plural::{DEFAULT_PLURAL_FORMS, PluralExpression, PluralRule};
pub use registry::{DomainRegistry, SearchRootsProvider};
