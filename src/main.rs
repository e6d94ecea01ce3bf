use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use title_ratings::adapters::discord;
use title_ratings::app::commands::{registration_payload, validate_command_table, COMMANDS, RATE};
use title_ratings::app::AutocompleteRequest;
use title_ratings::config::{BotConfig, CliConfig, Command};
use title_ratings::domain::ports::UserNameResolver;
use title_ratings::utils::error::ErrorSeverity;
use title_ratings::utils::{logger, validation::Validate};
use title_ratings::{CommandSurface, DiscordUserResolver, Ledger, LocalStorage, RawIdResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let mut config = BotConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config file '{}'", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    validate_command_table(COMMANDS).context("Built-in command table is invalid")?;

    if let Command::Commands = cli.command {
        println!("{}", serde_json::to_string_pretty(&registration_payload(COMMANDS))?);
        return Ok(());
    }

    let storage = LocalStorage::new(&config.storage.data_dir);
    let ledger = Ledger::load(storage, config.storage.files())
        .await
        .with_context(|| format!("Failed to open ledger in '{}'", config.storage.data_dir))?;

    let resolver: Arc<dyn UserNameResolver> = match config.require_token() {
        Ok(token) => Arc::new(DiscordUserResolver::new(
            config.discord.api_base.clone(),
            token,
            config.discord.request_timeout(),
        )?),
        Err(_) => {
            tracing::debug!("No bot token configured, ratings will show raw user ids");
            Arc::new(RawIdResolver)
        }
    };

    let surface = CommandSurface::new(ledger, resolver);

    match &cli.command {
        Command::Dispatch { payload } => {
            let body = tokio::fs::read(payload)
                .await
                .with_context(|| format!("Failed to read payload '{}'", payload.display()))?;
            let response = discord::dispatch(&surface, &body).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Search { partial } => {
            let request = AutocompleteRequest {
                command: RATE.to_string(),
                option: "title".to_string(),
                partial: partial.clone(),
            };
            for title in surface.autocomplete(&request).await? {
                println!("{}", title);
            }
        }
        command => {
            let Some(invocation) = command.invocation() else {
                return Ok(());
            };

            match surface.run(&cli.caller(), &invocation).await {
                Ok(reply) => println!("{}", reply.to_plain_text()),
                Err(e) => {
                    tracing::error!(
                        "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
                        invocation.command,
                        e,
                        e.category(),
                        e.severity()
                    );
                    eprintln!("{}", e.user_friendly_message());
                    eprintln!("💡 {}", e.recovery_suggestion());

                    let exit_code = match e.severity() {
                        ErrorSeverity::Low => 2,
                        ErrorSeverity::Medium => 4,
                        ErrorSeverity::High => 1,
                        ErrorSeverity::Critical => 3,
                    };
                    std::process::exit(exit_code);
                }
            }
        }
    }

    Ok(())
}
