use icu_locale::Locale;
use tracing::debug;

/// Build the culture fallback chain for `requested`, most specific first.
///
/// `de-CH-1996` with root `en` gives `de-CH-1996 -> de-CH -> de -> en`. The
/// identifier as given comes first when its canonical form differs, so
/// catalogs named after either spelling are found. Unparseable identifiers
/// give `[requested, root_culture]`.
pub fn culture_chain(requested: &str, root_culture: &str) -> Vec<String> {
    let requested = requested.trim();
    let mut chain: Vec<String> = Vec::new();
    let mut push = |culture: String| {
        if !culture.is_empty() && !chain.contains(&culture) {
            chain.push(culture);
        }
    };

    push(requested.to_string());
    match requested.parse::<Locale>() {
        Ok(locale) => {
            let id = &locale.id;
            let language = id.language.as_str();
            let script = id.script.as_ref().map(|script| script.as_str());
            let region = id.region.as_ref().map(|region| region.as_str());

            if language != "und" {
                push(id.to_string());
                push(join(&[Some(language), script, region]));
                push(join(&[Some(language), script]));
                push(language.to_string());
            }
        }
        Err(e) => debug!(culture = %requested, error = %e, "culture identifier is not a valid locale"),
    }
    push(root_culture.trim().to_string());

    chain
}

fn join(subtags: &[Option<&str>]) -> String {
    subtags
        .iter()
        .flatten()
        .copied()
        .collect::<Vec<_>>()
        .join("-")
}
