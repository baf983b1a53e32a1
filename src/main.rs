use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use golocate::core::{GoEnvironment, PackageLocator, TypeGraphBuilder};
use golocate::formatters::{JsonCompactFormatter, TextFormatter};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "golocate",
    version = "0.1.0",
    author = "golocate developers",
    about = "Locate Go packages on disk and collect struct dependency graphs"
)]
struct Cli {
    /// Working directory to inspect and resolve imports from
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    dir: PathBuf,

    /// Import paths to resolve from the working directory
    #[arg(value_name = "IMPORT")]
    imports: Vec<String>,

    /// Build the dependency graph of this struct, declared in the working directory
    #[arg(short = 't', long = "type", value_name = "NAME")]
    type_name: Option<String>,

    /// Print the graph as compact JSON
    #[arg(long)]
    json: bool,

    /// Struct tag key used for serialized field names
    #[arg(long, value_name = "KEY", default_value = "json")]
    tag_key: String,

    /// Overrides $GOROOT
    #[arg(long, value_name = "PATH")]
    goroot: Option<PathBuf>,

    /// Overrides $GOPATH; only the first entry of a list is used
    #[arg(long, value_name = "PATH")]
    gopath: Option<PathBuf>,

    /// Overrides $GOMODCACHE
    #[arg(long, value_name = "PATH")]
    mod_cache: Option<PathBuf>,

    /// Project root without a go.mod
    #[arg(long, value_name = "PATH")]
    workspace_root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_environment(cli: &Cli) -> GoEnvironment {
    let mut env = GoEnvironment::from_env();
    if let Some(ref goroot) = cli.goroot {
        env = env.with_goroot(goroot);
    }
    if let Some(ref gopath) = cli.gopath {
        env = env.with_gopath(gopath);
    }
    if let Some(ref cache) = cli.mod_cache {
        env = env.with_mod_cache(cache);
    }
    if let Some(ref root) = cli.workspace_root {
        env = env.with_workspace_root(root);
    }
    env
}

fn run(cli: Cli) -> Result<()> {
    let start_time = Instant::now();
    let env = build_environment(&cli);
    debug!("environment: {:?}", env);

    let locator = PackageLocator::new(env);
    let text = TextFormatter::new();

    match locator.inspect(&cli.dir) {
        Ok(location) => {
            println!("{}", location.directory.display());
            print!("{}", text.format_location(&location));
        }
        Err(e) => eprintln!("{}: {}", cli.dir.display(), e),
    }

    for import_path in &cli.imports {
        match locator.resolve(import_path, &cli.dir) {
            Ok(resolved) => println!("{} -> {}", import_path, resolved.directory.display()),
            Err(e) => eprintln!("{}: {}", import_path, e),
        }
    }

    if let Some(ref type_name) = cli.type_name {
        let mut graph = TypeGraphBuilder::new(locator)
            .with_work_dir(&cli.dir)
            .with_tag_key(cli.tag_key.clone());
        graph.add_from_directory(type_name, &cli.dir);

        if graph.is_empty() {
            eprintln!("{}: no declaration in {}", type_name, cli.dir.display());
        } else if cli.json {
            println!("{}", JsonCompactFormatter::new().format_graph(&graph)?);
        } else {
            print!("{}", text.format_graph(&graph));
        }

        let stats = graph.cache_stats();
        debug!(
            "{} types from {} packages ({} cache hits)",
            graph.len(),
            stats.entries,
            stats.hits
        );
    }

    debug!("done in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}
