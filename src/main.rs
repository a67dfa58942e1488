//! sitegen's main application entry point.
//! Handles command-line argument parsing and hands the loaded configuration
//! to the page generator.

use sitegen::{
    cli::{get_args, Args},
    config::Config,
    constants::DEFAULT_CONFIG,
    error::{default_error_handler, Result},
    logger::init_logger,
    processor::generate_site,
    renderer::MiniJinjaRenderer,
};

/// Main application entry point.
fn main() {
    let args = get_args();

    if args.default_cfg {
        print!("{}", DEFAULT_CONFIG);
        return;
    }

    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads and merges the configuration
/// 2. Validates directories and feed settings
/// 3. Generates every page
/// 4. Records the build time
fn run(args: Args) -> Result<()> {
    let Some(config_path) = args.config else {
        return Ok(());
    };

    let engine = MiniJinjaRenderer::new();
    let config = Config::load(&config_path)?;
    let summary = generate_site(&config, &engine, args.rebuild)?;

    println!(
        "Site generation completed in {}: {} generated, {} skipped.",
        config.public_dir.display(),
        summary.generated,
        summary.skipped
    );
    Ok(())
}
