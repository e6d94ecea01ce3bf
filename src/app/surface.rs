use crate::app::action::{Action, AutocompleteRequest, Caller, Invocation};
use crate::app::commands::find_command;
use crate::app::reply::{format_score, Embed, EmbedColor, Reply};
use crate::core::ledger::Ledger;
use crate::domain::model::{RATINGS_DISPLAY_LIMIT, TOP_TITLES_LIMIT};
use crate::domain::ports::{Storage, UserNameResolver};
use crate::utils::error::{ErrorSeverity, LedgerError, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Receives parsed user actions, applies them to the ledger and renders replies.
pub struct CommandSurface<S: Storage> {
    ledger: Mutex<Ledger<S>>,
    resolver: Arc<dyn UserNameResolver>,
}

impl<S: Storage> CommandSurface<S> {
    pub fn new(ledger: Ledger<S>, resolver: Arc<dyn UserNameResolver>) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            resolver,
        }
    }

    pub async fn ledger(&self) -> MutexGuard<'_, Ledger<S>> {
        self.ledger.lock().await
    }

    /// Like [`Self::run`], but turns errors into a private reply for the caller.
    pub async fn handle(&self, caller: &Caller, invocation: &Invocation) -> Reply {
        match self.run(caller, invocation).await {
            Ok(reply) => reply,
            Err(e) => error_reply(&invocation.command, &e),
        }
    }

    pub async fn run(&self, caller: &Caller, invocation: &Invocation) -> Result<Reply> {
        let action = Action::parse(invocation)?;
        self.execute(caller, action).await
    }

    pub async fn execute(&self, caller: &Caller, action: Action) -> Result<Reply> {
        if action.requires_admin() && !caller.is_admin {
            tracing::info!(
                user = %caller.user_id,
                command = action.command_name(),
                "Rejected command from non-admin"
            );
            return Err(LedgerError::PermissionDenied {
                command: action.command_name().to_string(),
            });
        }

        tracing::debug!(user = %caller.user_id, ?action, "Executing command");

        match action {
            Action::AddTitle { name } => {
                self.ledger.lock().await.add_title(&name).await?;
                Ok(Reply::public(format!("✅ Added title **{}**!", name)))
            }
            Action::DeleteTitle { name } => {
                self.ledger.lock().await.delete_title(&name).await?;
                Ok(Reply::public(format!(
                    "✅ Deleted title **{}** and its ratings.",
                    name
                )))
            }
            Action::ListTitles => {
                let titles = self.ledger.lock().await.list_titles();
                if titles.is_empty() {
                    return Ok(Reply::private("No titles available yet."));
                }
                Ok(Reply::embed(
                    Embed::new("Available Titles", EmbedColor::Blue).description(titles.join("\n")),
                ))
            }
            Action::Rate { title, score } => {
                self.ledger
                    .lock()
                    .await
                    .submit_rating(&title, &caller.user_id, score)
                    .await?;
                Ok(Reply::public(format!(
                    "✅ You rated **{}** with {}/10!",
                    title,
                    format_score(score)
                )))
            }
            Action::GetRatings { title } => self.ratings_view(&title).await,
            Action::MyRatings => {
                let ratings = self.ledger.lock().await.get_user_ratings(&caller.user_id);
                if ratings.is_empty() {
                    return Ok(Reply::private("You haven't rated any titles yet."));
                }
                let lines: Vec<String> = ratings
                    .iter()
                    .map(|r| format!("**{}**: {}/10", r.title, format_score(r.score)))
                    .collect();
                Ok(Reply::embed(
                    Embed::new(format!("{}'s Ratings", caller.name), EmbedColor::Green)
                        .description(lines.join("\n")),
                ))
            }
            Action::TopTitles => {
                let top = self.ledger.lock().await.top_titles(TOP_TITLES_LIMIT);
                if top.is_empty() {
                    return Ok(Reply::private("No ratings available yet."));
                }
                let embed = top
                    .iter()
                    .fold(Embed::new("Top 10 Rated Titles", EmbedColor::Purple), |embed, t| {
                        embed.field(&t.title, format!("{:.2}/10", t.mean))
                    });
                Ok(Reply::embed(embed))
            }
        }
    }

    /// Completions for an autocomplete-enabled option.
    pub async fn autocomplete(&self, request: &AutocompleteRequest) -> Result<Vec<String>> {
        let enabled = find_command(&request.command)
            .and_then(|c| c.option(&request.option))
            .is_some_and(|o| o.autocomplete);
        if !enabled {
            return Err(LedgerError::InvalidCommand {
                message: format!(
                    "option '{}' of '{}' has no autocomplete",
                    request.option, request.command
                ),
            });
        }

        Ok(self.ledger.lock().await.search_titles(&request.partial))
    }

    async fn ratings_view(&self, title: &str) -> Result<Reply> {
        // Names are resolved over the network, so the lock is released first.
        let view = self.ledger.lock().await.get_ratings(title)?;

        let Some(mean) = view.mean else {
            return Ok(Reply::private(format!("No ratings yet for **{}**.", title)));
        };

        let mut lines = Vec::with_capacity(view.ratings.len().min(RATINGS_DISPLAY_LIMIT));
        for (user_id, score) in view.ratings.iter().take(RATINGS_DISPLAY_LIMIT) {
            let name = self.display_name(user_id).await;
            lines.push(format!("**{}**: {}/10", name, format_score(*score)));
        }

        Ok(Reply::embed(
            Embed::new(format!("Ratings for {}", title), EmbedColor::Gold)
                .field("Average Score", format!("{:.2}/10", mean))
                .field("User Ratings", lines.join("\n")),
        ))
    }

    async fn display_name(&self, user_id: &str) -> String {
        match self.resolver.resolve(user_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(user = user_id, error = %e, "Name lookup failed, showing raw id");
                user_id.to_string()
            }
        }
    }
}

fn error_reply(command: &str, error: &LedgerError) -> Reply {
    match error.severity() {
        ErrorSeverity::Low => {
            tracing::debug!(command, error = %error, "Command refused");
        }
        ErrorSeverity::Medium => {
            tracing::warn!(command, error = %error, "Command failed");
        }
        ErrorSeverity::High | ErrorSeverity::Critical => {
            tracing::error!(
                command,
                error = %error,
                category = ?error.category(),
                suggestion = error.recovery_suggestion(),
                "Command failed"
            );
        }
    }
    Reply::private(error.user_friendly_message())
}
