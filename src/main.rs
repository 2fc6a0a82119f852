use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use zhscribe::app::run_transcribe_command;
use zhscribe::cli::{Cli, Commands, ModelsAction};
use zhscribe::config::Config;
use zhscribe::defaults;
use zhscribe::models::{ensure_model, is_model_installed, list_models};

fn main() -> Result<()> {
    // Pick up HF_TOKEN and friends from a local .env, if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Models { action }) => {
            handle_models_command(action)?;
        }
        None => {
            let audio_file = cli
                .audio
                .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_AUDIO_FILE));

            // Checked before any other work so a typo fails fast.
            if !audio_file.exists() {
                eprintln!(
                    "{}",
                    format!("File not found: {}", audio_file.display()).red()
                );
                std::process::exit(1);
            }

            let config = load_config(cli.config.as_deref())?;
            let config = apply_cli_overrides(config, cli.model, cli.batch_size);

            run_transcribe_command(
                config,
                &audio_file,
                cli.output,
                cli.quiet,
                cli.verbose,
                cli.no_download,
                cli.no_diarize,
            )?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/zhscribe/config.toml)
/// 3. Built-in defaults
/// Environment variables override whatever was loaded.
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// CLI flags win over config file and environment.
fn apply_cli_overrides(
    mut config: Config,
    model: Option<String>,
    batch_size: Option<usize>,
) -> Config {
    if let Some(model) = model {
        config.asr.model = model;
    }
    if let Some(batch_size) = batch_size
        && batch_size > 0
    {
        config.asr.batch_size = batch_size;
    }
    config
}

/// Handle model management commands.
fn handle_models_command(action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("Available models:");
            for model in list_models() {
                let status = if is_model_installed(model.name) {
                    "installed".green().to_string()
                } else {
                    "not installed".dimmed().to_string()
                };
                println!("  {} ({} MB, {})", model.name, model.size_mb, status);
            }
        }
        ModelsAction::Install { name } => {
            let path = ensure_model(&name, false, true)?;
            println!("Model '{}' installed", name);
            println!("Location: {}", path.display());
        }
    }
    Ok(())
}
