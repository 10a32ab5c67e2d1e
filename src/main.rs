//! preprint - LaTeX manuscript preparation tool

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use preprint::config::{Config, CONFIG_FILE, DEFAULT_MASTER};
use preprint::pack::{self, project_dir, PackOptions, PackStyle};
use preprint::tool::{Compiler, ImageMagick, ShellCompiler};
use preprint::{diff, find_root_document, Error, Result};

#[derive(Parser)]
#[command(name = "preprint")]
#[command(version, about = "LaTeX manuscript preparation tool", long_about = None)]
#[command(after_help = "EXAMPLES:
    preprint init                       Detect the master document, write preprint.json
    preprint make                       Compile the manuscript
    preprint pack mypaper               Package for journal submission
    preprint pack arxiv --style arxiv   Package for arXiv with size-capped figures
    preprint diff HEAD~3 -n revision    Diff-highlighted PDF against an earlier commit")]
struct Cli {
    /// Master document (overrides preprint.json)
    #[arg(long, global = true, value_name = "PATH")]
    master: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a preprint.json for the current project
    Init,
    /// Compile the manuscript with the configured command
    Make,
    /// Package the manuscript into a submission bundle
    Pack {
        /// Bundle name; output lands in build/NAME/
        #[arg(value_name = "NAME")]
        name: Option<String>,

        /// Submission style
        #[arg(long, value_enum, default_value_t = StyleArg::Aastex)]
        style: StyleArg,

        /// Figure extension priority, highest first (comma separated)
        #[arg(long, value_delimiter = ',', value_name = "EXT,...")]
        exts: Option<Vec<String>>,

        /// Figure size cap in MB before JPEG conversion (arxiv style)
        #[arg(long, default_value_t = 2.0, value_name = "MB")]
        maxsize: f64,
    },
    /// Build a diff-highlighted PDF against an earlier commit
    Diff {
        /// Revision to compare the working tree against
        #[arg(value_name = "COMMIT")]
        since: String,

        /// Name of the difference document
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    Aastex,
    Arxiv,
}

impl From<StyleArg> for PackStyle {
    fn from(style: StyleArg) -> Self {
        match style {
            StyleArg::Aastex => PackStyle::Aastex,
            StyleArg::Arxiv => PackStyle::Arxiv,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "preprint=debug" } else { "preprint=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(Path::new("."))?;
    let master = cli
        .master
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.master));

    match cli.command {
        Command::Init => cmd_init(cli.master),
        Command::Make => cmd_make(&config, &master),
        Command::Pack {
            name,
            style,
            exts,
            maxsize,
        } => cmd_pack(&config, master, name, style, exts, maxsize),
        Command::Diff { since, name } => cmd_diff(&config, master, since, name),
    }
}

fn cmd_init(master_flag: Option<PathBuf>) -> Result<()> {
    let master = match master_flag {
        Some(master) => master,
        None => match find_root_document(Path::new(".")) {
            Ok(found) => found
                .strip_prefix(".")
                .map(Path::to_path_buf)
                .unwrap_or(found),
            Err(_) => {
                tracing::warn!("no \\documentclass found; defaulting to {DEFAULT_MASTER}");
                PathBuf::from(DEFAULT_MASTER)
            }
        },
    };

    let config = Config {
        master: master.display().to_string(),
        ..Config::default()
    };
    config.store(Path::new("."))?;
    println!("Wrote {CONFIG_FILE} (master: {})", config.master);
    Ok(())
}

fn cmd_make(config: &Config, master: &Path) -> Result<()> {
    if !master.is_file() {
        return Err(Error::MissingMasterFile(master.to_path_buf()));
    }
    preprint::tool::run_vc_hook(&project_dir(master))?;

    let compiler = ShellCompiler::new(config.cmd.as_str());
    let output = compiler.compile(master)?;
    print!("{}", output.stdout);
    eprint!("{}", output.stderr);
    if !output.success {
        return Err(Error::ToolFailed {
            tool: config.cmd.split_whitespace().next().unwrap_or("sh").to_string(),
            detail: "exited with failure".to_string(),
        });
    }
    println!("Compiled {}", master.display());
    Ok(())
}

fn cmd_pack(
    config: &Config,
    master: PathBuf,
    name: Option<String>,
    style: StyleArg,
    exts: Option<Vec<String>>,
    maxsize: f64,
) -> Result<()> {
    preprint::tool::run_vc_hook(&project_dir(&master))?;

    let mut options = PackOptions::new(master);
    if let Some(name) = name {
        options.name = name;
    }
    options.style = style.into();
    options.extensions = exts.unwrap_or_else(|| config.exts.clone());
    options.max_figure_bytes = (maxsize * 1_000_000.0) as u64;

    let report = pack::run(&options, &ImageMagick::default())?;
    println!(
        "Packed {} -> {} ({} figures, {} files)",
        options.master.display(),
        report.output_dir.display(),
        report.figure_count(),
        report.artifacts.len()
    );
    Ok(())
}

fn cmd_diff(config: &Config, master: PathBuf, since: String, name: Option<String>) -> Result<()> {
    let mut options = diff::DiffOptions::new(master, since);
    options.name = name;
    options.compile_template = config.cmd.clone();

    let pdf = diff::run(&options)?;
    println!("Built diff PDF: {}", pdf.display());
    Ok(())
}
