use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use docnote_core::{normalize_name, AnnotationCache, DocBlock, IndexOptions, SourceIndex};
use std::io::{self, Read};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "doc comment annotation reader", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a raw doc comment from STDIN and print its annotations as JSON
    Scan,
    /// Print the value of one annotation on a class or class member
    Get(GetArgs),
    /// Index a source tree and print every annotated element as JSON
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Source file containing the element
    file: String,
    /// `Class` or `Class::member`
    #[arg(long, short)]
    element: String,
    /// Annotation name, with or without the leading `@`
    #[arg(long, short)]
    name: String,
    /// Print every value instead of the first one
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Project root to walk
    root: String,
    /// Extra file extension to index (repeatable)
    #[arg(long = "ext")]
    extensions: Vec<String>,
}

fn scan() -> Result<ExitCode> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read from STDIN")?;
    let block = DocBlock::new("<stdin>", raw);
    let annotations = AnnotationCache::new().annotations(&block)?;
    println!("{}", serde_json::to_string(&annotations)?);
    Ok(ExitCode::SUCCESS)
}

fn get(args: GetArgs) -> Result<ExitCode> {
    let index = SourceIndex::new();
    index.index_file(&args.file)?;
    let element = index.find(&args.file, &args.element)?;
    let cache = AnnotationCache::new();

    if args.all {
        let values = cache.get_all(&element, &args.name)?;
        println!("{}", serde_json::to_string(&values)?);
        return Ok(ExitCode::SUCCESS);
    }

    match cache.get(&element, &args.name)? {
        Some(value) => {
            println!("{}", serde_json::to_string(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!(
                "annotation {} not present on {}",
                normalize_name(&args.name),
                element.identity
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn dump(args: DumpArgs) -> Result<ExitCode> {
    let mut options = IndexOptions::default();
    options.extensions.extend(args.extensions);
    let index = SourceIndex::index_project(&args.root, &options);
    let cache = AnnotationCache::new();
    println!("{}", index.to_json(&cache)?);
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Scan => scan(),
        Commands::Get(args) => get(args),
        Commands::Dump(args) => dump(args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
