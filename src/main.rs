use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command};
use gettext_domain::{DomainRegistry, RegistryConfig, load_catalog_from_file};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct EntryReport<'a> {
    context: &'a str,
    id: &'a str,
    forms: &'a [String],
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    charset: &'a str,
    plural_forms: &'a str,
    plural_count: usize,
    entries: Vec<EntryReport<'a>>,
}

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .short('c')
        .help("Registry configuration file (JSON)")
        .value_parser(clap::value_parser!(PathBuf))
        .required(true);
    let package_arg = Arg::new("package")
        .long("package")
        .short('p')
        .help("Package name as declared in the configuration")
        .required(true);

    Command::new("gettext-domain")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect compiled message catalogs and resolve translations")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log catalog discovery and parsing")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the header and entries of one catalog file")
                .arg(
                    Arg::new("file")
                        .help("Catalog file to read")
                        .value_parser(clap::value_parser!(PathBuf))
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("lookup")
                .about("Translate a message the way application code would")
                .arg(config_arg.clone())
                .arg(package_arg.clone())
                .arg(
                    Arg::new("culture")
                        .long("culture")
                        .help("Culture to resolve (default: from the configuration)"),
                )
                .arg(Arg::new("context").long("context").help("Message context"))
                .arg(
                    Arg::new("plural")
                        .long("plural")
                        .help("Source plural form; enables plural lookup")
                        .requires("count"),
                )
                .arg(
                    Arg::new("count")
                        .long("count")
                        .short('n')
                        .help("Count selecting the plural form")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("proper-name")
                        .long("proper-name")
                        .help("Annotate the translation with the original name")
                        .conflicts_with_all(["plural", "context"])
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("message")
                        .help("Source message")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("cultures")
                .about("List cultures with at least one catalog file")
                .arg(config_arg)
                .arg(package_arg),
        )
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn inspect(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let file = matches
        .get_one::<PathBuf>("file")
        .ok_or("missing catalog file")?;
    let catalog = load_catalog_from_file(file)?;

    let report = CatalogReport {
        charset: catalog.charset(),
        plural_forms: catalog.plural_forms(),
        plural_count: catalog.plural_count(),
        entries: catalog
            .sorted_entries()
            .into_iter()
            .map(|(key, forms)| EntryReport {
                context: &key.context,
                id: &key.id,
                forms,
            })
            .collect(),
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("charset:      {}", report.charset);
    println!("plural forms: {}", report.plural_forms);
    println!("entries:      {}", report.entries.len());
    for entry in &report.entries {
        if entry.context.is_empty() {
            println!("\n\"{}\"", entry.id);
        } else {
            println!("\n[{}] \"{}\"", entry.context, entry.id);
        }
        for (index, form) in entry.forms.iter().enumerate() {
            println!("  [{}] \"{}\"", index, form);
        }
    }
    Ok(())
}

fn load_registry(matches: &ArgMatches) -> Result<(DomainRegistry, String), Box<dyn std::error::Error>> {
    let config_path = matches
        .get_one::<PathBuf>("config")
        .ok_or("missing configuration file")?;
    let package = matches
        .get_one::<String>("package")
        .ok_or("missing package name")?;

    let config = RegistryConfig::from_file(config_path)?;
    if config.package(package).is_none() {
        return Err(format!("package '{}' is not declared in {}", package, config_path.display()).into());
    }
    let registry = DomainRegistry::new();
    config.apply(&registry);
    Ok((registry, package.clone()))
}

fn lookup(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, package) = load_registry(matches)?;
    if let Some(culture) = matches.get_one::<String>("culture") {
        registry.set_culture(culture);
    }
    let domain = registry
        .domain(&package)
        .ok_or_else(|| format!("package '{}' is not registered", package))?;

    let message = matches
        .get_one::<String>("message")
        .ok_or("missing message")?;
    let context = matches
        .get_one::<String>("context")
        .map(String::as_str)
        .unwrap_or("");

    let result = if matches.get_flag("proper-name") {
        domain.proper_name(message)
    } else if let Some(plural) = matches.get_one::<String>("plural") {
        let count = matches.get_one::<u64>("count").copied().unwrap_or(1);
        domain.particular_plural_text(context, message, plural, count)
    } else {
        domain.particular_text(context, message)
    };

    tracing::debug!(
        culture = domain.active_culture().as_deref().unwrap_or("<source>"),
        plural_count = domain.plural_count(),
        entries = domain.entry_count(),
        "lookup complete"
    );
    println!("{}", result);
    Ok(())
}

fn cultures(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, package) = load_registry(matches)?;
    let domain = registry
        .domain(&package)
        .ok_or_else(|| format!("package '{}' is not registered", package))?;
    for culture in domain.repository().available_cultures() {
        println!("{}", culture);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("inspect", sub)) => inspect(sub),
        Some(("lookup", sub)) => lookup(sub),
        Some(("cultures", sub)) => cultures(sub),
        _ => unreachable!("subcommand is required"),
    }
}
