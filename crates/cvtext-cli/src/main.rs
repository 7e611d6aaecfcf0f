mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cvtext",
    version,
    about = "Best-effort plain text from PDF resumes"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract resume text from a PDF
    Extract {
        /// Path to PDF file
        input_file: PathBuf,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,

        /// Write the result to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// TOML settings file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Also save embedded photos to the configured upload directory
        #[arg(long)]
        photos: bool,
    },
    /// Show what every extraction strategy produced and how it scored
    Inspect {
        /// Path to PDF file
        input_file: PathBuf,

        /// TOML settings file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the quality breakdown of a text file
    Score {
        /// Path to text file
        text_file: PathBuf,
    },
    /// Normalize a text file and print the result
    Normalize {
        /// Path to text file
        text_file: PathBuf,
    },
    /// List and save embedded images
    Images {
        /// Path to PDF file
        input_file: PathBuf,

        /// Maximum number of images to save (0 lists without saving)
        #[arg(short, long, default_value_t = 5)]
        max: usize,

        /// Directory to save images into
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            output,
            out,
            config,
            photos,
        } => commands::extract::run(input_file, &output, out, config, photos),
        Commands::Inspect { input_file, config } => commands::inspect::run(input_file, config),
        Commands::Score { text_file } => commands::text::score(&text_file),
        Commands::Normalize { text_file } => commands::text::normalize(&text_file),
        Commands::Images {
            input_file,
            max,
            dir,
        } => commands::images::run(input_file, max, dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
