//! Command-line interface implementation for sitegen.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for sitegen.
#[derive(Parser, Debug)]
#[command(author, version, about = "sitegen: static site generator driving an external document converter", long_about = None)]
pub struct Args {
    /// Path to the site configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "default_cfg")]
    pub config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    pub default_cfg: bool,

    /// Regenerate every page, ignoring the stored build time
    #[arg(short, long)]
    pub rebuild: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if the configuration path is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
