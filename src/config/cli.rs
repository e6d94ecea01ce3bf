use crate::app::action::{Caller, Invocation};
use crate::app::commands::{
    ADD_TITLE, DELETE_TITLE, LIST_TITLES, MY_RATINGS, RATE, RATINGS, TOP_TITLES,
};
use crate::config::toml_config::BotConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "title-ratings")]
#[command(about = "Catalog media titles and collect community ratings")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "title-ratings.toml")]
    pub config: PathBuf,

    /// Override storage.data_dir from config
    #[arg(long)]
    pub data_dir: Option<String>,

    /// User id to act as
    #[arg(long, env = "TITLE_RATINGS_USER_ID", default_value = "0")]
    pub user_id: String,

    /// Display name to act as
    #[arg(long, env = "TITLE_RATINGS_USER_NAME", default_value = "local")]
    pub user_name: String,

    /// Act with administrator permission
    #[arg(long)]
    pub admin: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add a new media title to rate
    AddTitle { name: String },
    /// Delete a media title and its ratings
    DeleteTitle { name: String },
    /// List all available media titles
    ListTitles,
    /// Rate a media title from 0 to 10
    Rate {
        title: String,
        #[arg(allow_negative_numbers = true)]
        score: f64,
    },
    /// See ratings for a title
    GetRatings { title: String },
    /// See all the media you have rated
    MyRatings,
    /// Show top 10 highest rated media titles
    TopTitles,
    /// Titles matching a partial name, as offered by autocomplete
    Search {
        #[arg(default_value = "")]
        partial: String,
    },
    /// Handle a raw interaction payload and print the response body
    Dispatch { payload: PathBuf },
    /// Print the command registration JSON
    Commands,
}

impl Command {
    /// The slash-command equivalent, for subcommands that map onto one.
    pub fn invocation(&self) -> Option<Invocation> {
        let invocation = match self {
            Command::AddTitle { name } => Invocation::new(ADD_TITLE).with_string("name", name),
            Command::DeleteTitle { name } => {
                Invocation::new(DELETE_TITLE).with_string("name", name)
            }
            Command::ListTitles => Invocation::new(LIST_TITLES),
            Command::Rate { title, score } => Invocation::new(RATE)
                .with_string("title", title)
                .with_number("score", *score),
            Command::GetRatings { title } => Invocation::new(RATINGS).with_string("title", title),
            Command::MyRatings => Invocation::new(MY_RATINGS),
            Command::TopTitles => Invocation::new(TOP_TITLES),
            Command::Search { .. } | Command::Dispatch { .. } | Command::Commands => return None,
        };
        Some(invocation)
    }
}

impl CliConfig {
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id.clone(), self.user_name.clone(), self.admin)
    }

    pub fn apply_overrides(&self, config: &mut BotConfig) {
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
            tracing::info!("🔧 Data directory overridden to: {}", data_dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::action::{Action, OptionValue};

    #[test]
    fn test_rate_subcommand_maps_to_invocation() {
        let cli = CliConfig::parse_from(["title-ratings", "rate", "Naruto", "9.5"]);

        let invocation = cli.command.invocation().unwrap();
        assert_eq!(invocation.command, RATE);
        assert_eq!(
            invocation.options[1],
            ("score".to_string(), OptionValue::Number(9.5))
        );
        assert!(matches!(
            Action::parse(&invocation).unwrap(),
            Action::Rate { .. }
        ));
    }

    #[test]
    fn test_negative_score_reaches_the_ledger() {
        let cli = CliConfig::parse_from(["title-ratings", "rate", "Naruto", "-1"]);
        assert!(matches!(cli.command, Command::Rate { score, .. } if score == -1.0));
    }

    #[test]
    fn test_admin_flag_and_overrides() {
        let cli = CliConfig::parse_from([
            "title-ratings",
            "--admin",
            "--user-id",
            "42",
            "--data-dir",
            "/tmp/x",
            "add-title",
            "Bleach",
        ]);

        assert!(cli.caller().is_admin);
        assert_eq!(cli.caller().user_id, "42");

        let mut config = BotConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.storage.data_dir, "/tmp/x");
    }

    #[test]
    fn test_non_ledger_subcommands_have_no_invocation() {
        let cli = CliConfig::parse_from(["title-ratings", "commands"]);
        assert!(cli.command.invocation().is_none());
    }
}
