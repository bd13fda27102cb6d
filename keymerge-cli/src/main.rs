use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use keymerge::{Job, KeyColor, OutputStore, PngOutOpts};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keymerge", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge layer images, filling key-colored pixels from later layers.
    Combine(CombineArgs),
    /// Run a merge described by a JSON manifest.
    Job(JobArgs),
    /// Copy a stored output out of the id store.
    Get(GetArgs),
}

#[derive(Parser, Debug)]
struct CombineArgs {
    /// Layer images, base first.
    layers: Vec<PathBuf>,

    /// File listing more layers, one path per line (appended after positional layers).
    #[arg(long)]
    list: Option<PathBuf>,

    /// Key color: #rgb, #rrggbb, #rrggbbaa or #rrrrggggbbbbaaaa. Invalid values fall back to white.
    #[arg(long, default_value = "#ffffff")]
    color: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Input job manifest JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct GetArgs {
    /// Id printed by `combine` or `job`.
    id: String,

    /// Directory holding id-named outputs.
    #[arg(long, default_value = "tmp")]
    out_dir: PathBuf,

    /// Destination path. Defaults to `combined.png` in the current directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Refuse to replace an existing destination file.
    #[arg(long, default_value_t = false)]
    no_clobber: bool,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Output PNG path. Without it the result is stored under a random id.
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Directory for id-named outputs.
    #[arg(long, default_value = "tmp")]
    out_dir: PathBuf,

    /// Refuse to replace an existing `--out` file.
    #[arg(long, default_value_t = false)]
    no_clobber: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Combine(args) => cmd_combine(args),
        Command::Job(args) => cmd_job(args),
        Command::Get(args) => cmd_get(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_combine(args: CombineArgs) -> anyhow::Result<()> {
    let mut paths = args.layers;
    if let Some(list) = &args.list {
        let text = std::fs::read_to_string(list)
            .with_context(|| format!("read layer list '{}'", list.display()))?;
        paths.extend(keymerge::parse_layer_list(&text).into_iter().map(PathBuf::from));
    }

    let key = KeyColor::parse_or_default(&args.color);
    merge(key, &paths, args.output.out.as_deref(), &args.output)
}

fn cmd_job(args: JobArgs) -> anyhow::Result<()> {
    let job = Job::from_path(&args.in_path)?;
    let out = args.output.out.as_deref().or(job.out.as_deref());
    merge(job.key_color(), &job.layers, out, &args.output)
}

fn cmd_get(args: GetArgs) -> anyhow::Result<()> {
    let store = OutputStore::with_random_ids(&args.out_dir);
    let bytes = store.open(&args.id)?;

    let dest = args
        .out
        .unwrap_or_else(|| PathBuf::from(keymerge::DOWNLOAD_NAME));
    if args.no_clobber && dest.exists() {
        anyhow::bail!("output file '{}' already exists", dest.display());
    }
    keymerge::ensure_parent_dir(&dest)?;
    std::fs::write(&dest, bytes).with_context(|| format!("write '{}'", dest.display()))?;

    eprintln!("wrote {}", dest.display());
    Ok(())
}

fn merge(
    key: KeyColor,
    paths: &[PathBuf],
    out: Option<&Path>,
    output: &OutputArgs,
) -> anyhow::Result<()> {
    tracing::info!(%key, layers = paths.len(), "combining");
    let layers = keymerge::load_layers(paths)?;
    let merged = keymerge::combine(key, &layers)?.context("no images provided")?;

    match out {
        Some(path) => {
            let opts = PngOutOpts {
                out_path: path.to_path_buf(),
                overwrite: !output.no_clobber,
            };
            keymerge::write_png(&merged, &opts)?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let mut store = OutputStore::with_random_ids(&output.out_dir);
            let saved = store.save(&merged)?;
            println!("{}", saved.id);
            eprintln!("wrote {}", saved.path.display());
        }
    }
    Ok(())
}
