use altsource_catalog::deep_link::DetailLink;
use altsource_catalog::render::{ConsoleRenderer, NullRenderer};
use altsource_catalog::source_store::SourceStore;
use altsource_catalog::{Catalog, CatalogConfig, SortMode};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse AltStore-compatible app sources")]
struct Cli {
    /// Source URL or short name; repeat to load several (overrides saved sources)
    #[arg(long = "source", global = true)]
    sources: Vec<String>,

    /// Print every result instead of the first page
    #[arg(long, global = true)]
    all: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every app across the configured sources
    List {
        #[arg(long, default_value = "name-asc")]
        sort: String,
    },
    /// Search apps and versions by name or bundle identifier
    Search {
        query: String,
        #[arg(long, default_value = "name-asc")]
        sort: String,
    },
    /// Show one app's details from a single source
    Show {
        bundle_id: String,
        #[arg(long)]
        version: Option<String>,
    },
    /// Manage the saved source list
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
}

#[derive(Subcommand, Debug)]
enum SourcesAction {
    List,
    Add { source: String },
    Remove { source: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), altsource_catalog::CatalogError> {
    let config = CatalogConfig::load();
    let store = SourceStore::new(&config.default_source);
    let sources = if cli.sources.is_empty() {
        store.load()
    } else {
        cli.sources.clone()
    };

    match cli.command {
        Command::Sources { action } => {
            match action {
                SourcesAction::List => {}
                SourcesAction::Add { source } => {
                    if !store.add(&source)? {
                        println!("{} is already listed", source.trim());
                    }
                }
                SourcesAction::Remove { source } => {
                    if !store.remove(&source)? {
                        println!("{} is not listed", source.trim());
                    }
                }
            }
            for source in store.load() {
                println!("{}", source);
            }
        }
        Command::Show { bundle_id, version } => {
            let Some(source) = sources.first().cloned() else {
                return Ok(());
            };
            let catalog = Catalog::from_config(config);
            let link = DetailLink {
                bundle_id,
                version,
                source,
            };
            match catalog.open_detail(&link).await? {
                Some(view) => print_detail(&view),
                None => println!("No app with bundle id {} in {}", link.bundle_id, link.source),
            }
        }
        Command::List { sort } => {
            browse(config, &sources, None, &sort, cli.all).await;
        }
        Command::Search { query, sort } => {
            browse(config, &sources, Some(&query), &sort, cli.all).await;
        }
    }
    Ok(())
}

async fn browse(
    config: CatalogConfig,
    sources: &[String],
    query: Option<&str>,
    sort: &str,
    all: bool,
) {
    let mut catalog = Catalog::from_config(config);
    // Incremental output is noise on a terminal; render only the reconciled view.
    let mut silent = NullRenderer;
    let mut console = ConsoleRenderer::default();

    if let Some(q) = query {
        catalog.set_query(q, &mut silent);
    }
    catalog.set_sort_mode(SortMode::from_name(sort), &mut silent);

    let report = catalog.load(sources, &mut silent).await;
    for (source, error) in &report.failed {
        log::warn!("Skipped {}: {}", source, error);
    }

    catalog.refresh(&mut console);
    if all {
        catalog.render_all(&mut console);
    }
    if catalog.visible().is_empty() {
        println!("No apps found.");
    } else if catalog.has_more() {
        println!(
            "Showing {} of {} (use --all for everything)",
            catalog.cursor(),
            catalog.visible().len()
        );
    }
}

fn print_detail(view: &altsource_catalog::deep_link::DetailView) {
    let app = &view.app;
    println!("{} ({})", app.name, app.bundle_id);
    if !app.developer.is_empty() {
        println!("Developer: {}", app.developer);
    }
    println!("Source: {}", app.source);
    if !app.description.is_empty() {
        println!("\n{}\n", app.description);
    }
    for (i, v) in view.versions().iter().enumerate() {
        let marker = if i == view.selected_index() { "*" } else { " " };
        let size = v.display_size().unwrap_or_default();
        println!("{} {} {} {}", marker, v.display_version(), v.date, size);
    }
    if let Some(v) = view.selected_version() {
        if !v.notes.is_empty() {
            println!("\n{}", v.notes);
        }
        if !v.download_url.is_empty() {
            println!("Download: {}", v.download_url);
        }
    }
    println!("Link: {}", view.link().to_query_string());
}
