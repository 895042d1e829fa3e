use anyhow::{
    Context,
    Result,
    ensure,
};
use clap::{
    Parser,
    Subcommand,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    process::Command,
};

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Family bingo helper tasks (fmt, clippy, tests)",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format the workspace, or only verify formatting with --check
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy for the entire workspace with warnings-as-errors
    Clippy,
    /// Run unit and integration tests for the bingo crate
    Test {
        /// Only run tests whose name contains this string
        filter: Option<String>,
    },
    /// fmt --check, clippy and test, stopping at the first failure
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = repo_root()?;

    match cli.command {
        Commands::Fmt { check } => run_fmt(&root, check)?,
        Commands::Clippy => run_clippy(&root)?,
        Commands::Test { filter } => run_tests(&root, filter.as_deref())?,
        Commands::Ci => {
            run_fmt(&root, true)?;
            run_clippy(&root)?;
            run_tests(&root, None)?;
        }
    }

    Ok(())
}

fn repo_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

fn run_fmt(root: &Path, check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all").current_dir(root);
    if check {
        cmd.arg("--").arg("--check");
    }
    run_command(cmd, "cargo fmt")
}

fn run_clippy(root: &Path) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy")
        .arg("--workspace")
        .arg("--all-targets")
        .arg("--all-features")
        .arg("--")
        .arg("-D")
        .arg("warnings")
        .current_dir(root);
    run_command(cmd, "cargo clippy")
}

fn run_tests(root: &Path, filter: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test").arg("-p").arg("family-bingo").current_dir(root);
    if let Some(filter) = filter {
        cmd.arg(filter);
    }
    run_command(cmd, "cargo test -p family-bingo")
}

fn run_command(mut cmd: Command, label: &str) -> Result<()> {
    println!("Running: {}", label);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {label}"))?;
    ensure!(status.success(), "{label} failed with status {status}");
    Ok(())
}
