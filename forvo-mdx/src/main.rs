//! Forvo dictionary builder.
//!
//! Turns `metadata.jsonl` plus the per-language audio folders into an
//! MDX/MDD pair. Every stage writes named artifacts into the working
//! directory and is skipped on later runs once they exist, so an interrupted
//! build resumes where it stopped.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use forvo_mdx::build::{BuildOptions, load_build_config, run_build, run_clean};
use forvo_mdx::exit_codes;
use forvo_mdx::io::process::SystemCommandRunner;
use forvo_mdx::io::prompt::StdinPrompter;
use forvo_mdx::io::toolchain::PathLocator;
use forvo_mdx::logging;
use forvo_mdx::pipeline::Services;

#[derive(Parser)]
#[command(
    name = "forvo-mdx",
    version,
    about = "Build an MDX/MDD dictionary from a Forvo pronunciation dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every stage whose artifacts are missing, then offer cleanup.
    Build(CommonArgs),
    /// Offer to remove intermediate artifacts.
    Clean(CommonArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Print what would run without touching files or spawning tools.
    #[arg(long)]
    dry_run: bool,
    /// Language code (2-3 characters); prompted for when omitted.
    #[arg(short, long)]
    lang: Option<String>,
    /// Directory holding the dump and receiving all artifacts.
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,
    /// Config file (default: <workdir>/forvo.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl From<CommonArgs> for BuildOptions {
    fn from(args: CommonArgs) -> Self {
        Self {
            workdir: args.workdir,
            config_path: args.config,
            lang: args.lang,
            dry_run: args.dry_run,
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FAILED);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let (is_build, options): (bool, BuildOptions) = match cli.command {
        Command::Build(args) => (true, args.into()),
        Command::Clean(args) => (false, args.into()),
    };
    let config = load_build_config(&options)?;
    let runner = SystemCommandRunner {
        output_limit_bytes: config.output_limit_bytes,
    };
    let services = Services {
        runner: &runner,
        prompter: &StdinPrompter,
        locator: &PathLocator,
    };

    if is_build {
        let summary = run_build(&options, &config, services)?;
        println!(
            "{}: {} stages ran",
            summary.locale,
            summary.report.ran().len()
        );
    } else {
        run_clean(&options, &config, services)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build_with_flags() {
        let cli = Cli::parse_from([
            "forvo-mdx",
            "build",
            "--dry-run",
            "--lang",
            "es",
            "--workdir",
            "/data",
        ]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert!(args.dry_run);
        assert_eq!(args.lang.as_deref(), Some("es"));
        assert_eq!(args.workdir, PathBuf::from("/data"));
        assert_eq!(args.config, None);
    }

    #[test]
    fn parse_clean_defaults() {
        let cli = Cli::parse_from(["forvo-mdx", "clean"]);
        let Command::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        assert!(!args.dry_run);
        assert_eq!(args.lang, None);
        assert_eq!(args.workdir, PathBuf::from("."));
    }
}
