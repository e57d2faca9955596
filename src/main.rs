//! oortc command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oortc")]
#[command(about = "Compile Oort projects into Minecraft datapacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a datapack from an Oort project
    Build {
        /// Project directory (containing properties.json)
        project_dir: PathBuf,

        /// Override the output directory from the project descriptor
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build { project_dir, out } => {
            match oortc::build_project(&project_dir, out.as_deref()) {
                Ok(report) => {
                    info!(
                        modules = report.modules,
                        functions = report.functions,
                        diagnostics = report.diagnostics.len(),
                        "build successful"
                    );
                    println!("Datapack generated at: {}", report.datapack_root.display());
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    eprintln!("build failed: {err}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
