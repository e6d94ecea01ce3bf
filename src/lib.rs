pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::discord::DiscordUserResolver;
pub use adapters::storage::LocalStorage;
pub use adapters::RawIdResolver;
pub use app::{Action, Caller, CommandSurface, Invocation, Reply};
pub use config::BotConfig;
pub use crate::core::ledger::{Ledger, LedgerFiles};
pub use utils::error::{LedgerError, Result};
