use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use title_ratings::app::{AutocompleteRequest, EmbedColor};
use title_ratings::domain::ports::UserNameResolver;
use title_ratings::{
    Caller, CommandSurface, Invocation, Ledger, LedgerError, LedgerFiles, LocalStorage,
    RawIdResolver, Result,
};

/// Resolves from a fixed table; anything else is a lookup failure.
struct TableResolver {
    names: HashMap<String, String>,
}

#[async_trait]
impl UserNameResolver for TableResolver {
    async fn resolve(&self, user_id: &str) -> Result<String> {
        self.names
            .get(user_id)
            .cloned()
            .ok_or_else(|| LedgerError::InvalidUserId {
                user_id: user_id.to_string(),
            })
    }
}

async fn surface_with(
    dir: &TempDir,
    resolver: Arc<dyn UserNameResolver>,
) -> CommandSurface<LocalStorage> {
    let ledger = Ledger::load(LocalStorage::new(dir.path()), LedgerFiles::default())
        .await
        .unwrap();
    CommandSurface::new(ledger, resolver)
}

async fn surface(dir: &TempDir) -> CommandSurface<LocalStorage> {
    surface_with(dir, Arc::new(RawIdResolver)).await
}

fn admin() -> Caller {
    Caller::new("1", "Admin", true)
}

fn member(id: &str) -> Caller {
    Caller::new(id, format!("user{}", id), false)
}

fn add(name: &str) -> Invocation {
    Invocation::new("addtitle").with_string("name", name)
}

fn rate(title: &str, score: f64) -> Invocation {
    Invocation::new("rate")
        .with_string("title", title)
        .with_number("score", score)
}

#[tokio::test]
async fn test_add_title_requires_admin() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;

    let reply = surface.handle(&member("2"), &add("Naruto")).await;
    assert!(reply.ephemeral);
    assert_eq!(
        reply.content.as_deref(),
        Some("❌ You must be an admin to add titles.")
    );
    assert!(surface.ledger().await.list_titles().is_empty());

    let reply = surface.handle(&admin(), &add("Naruto")).await;
    assert!(!reply.ephemeral);
    assert_eq!(reply.content.as_deref(), Some("✅ Added title **Naruto**!"));
}

#[tokio::test]
async fn test_delete_title_requires_admin() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;

    let delete = Invocation::new("deletetitle").with_string("name", "Naruto");
    let err = surface.run(&member("2"), &delete).await.unwrap_err();
    assert!(matches!(err, LedgerError::PermissionDenied { .. }));

    let reply = surface.handle(&admin(), &delete).await;
    assert_eq!(
        reply.content.as_deref(),
        Some("✅ Deleted title **Naruto** and its ratings.")
    );
    assert!(surface.ledger().await.list_titles().is_empty());
}

#[tokio::test]
async fn test_duplicate_title_reply() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;

    let reply = surface.handle(&admin(), &add("Naruto")).await;
    assert!(reply.ephemeral);
    assert_eq!(
        reply.content.as_deref(),
        Some("⚠️ Title **Naruto** already exists.")
    );
}

#[tokio::test]
async fn test_list_titles_empty_and_filled() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    let list = Invocation::new("listtitles");

    let reply = surface.handle(&member("2"), &list).await;
    assert!(reply.ephemeral);
    assert_eq!(reply.content.as_deref(), Some("No titles available yet."));

    surface.handle(&admin(), &add("Naruto")).await;
    surface.handle(&admin(), &add("Bleach")).await;

    let reply = surface.handle(&member("2"), &list).await;
    let embed = reply.embed.unwrap();
    assert_eq!(embed.title, "Available Titles");
    assert_eq!(embed.color, EmbedColor::Blue);
    assert_eq!(embed.description.as_deref(), Some("Naruto\nBleach"));
}

#[tokio::test]
async fn test_rate_replies() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;

    let reply = surface.handle(&member("2"), &rate("Naruto", 8.0)).await;
    assert_eq!(
        reply.content.as_deref(),
        Some("✅ You rated **Naruto** with 8.0/10!")
    );

    let reply = surface.handle(&member("2"), &rate("Naruto", 11.0)).await;
    assert!(reply.ephemeral);
    assert_eq!(
        reply.content.as_deref(),
        Some("❌ Score must be between 0 and 10.")
    );

    let reply = surface.handle(&member("2"), &rate("Bleach", 5.0)).await;
    assert!(reply.ephemeral);
    assert_eq!(reply.content.as_deref(), Some("❌ Title **Bleach** not found."));
}

#[tokio::test]
async fn test_rating_is_stored_under_caller_id() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;

    surface.handle(&member("77"), &rate("Naruto", 6.5)).await;

    let ledger = surface.ledger().await;
    let view = ledger.get_ratings("Naruto").unwrap();
    assert_eq!(view.ratings, vec![("77".to_string(), 6.5)]);
}

#[tokio::test]
async fn test_ratings_view_resolves_names_with_fallback() {
    let dir = TempDir::new().unwrap();
    let resolver = TableResolver {
        names: HashMap::from([("10".to_string(), "alice".to_string())]),
    };
    let surface = surface_with(&dir, Arc::new(resolver)).await;
    surface.handle(&admin(), &add("Naruto")).await;
    surface.handle(&member("10"), &rate("Naruto", 10.0)).await;
    surface.handle(&member("20"), &rate("Naruto", 0.0)).await;

    let reply = surface
        .handle(
            &member("10"),
            &Invocation::new("ratings").with_string("title", "Naruto"),
        )
        .await;

    let embed = reply.embed.unwrap();
    assert_eq!(embed.title, "Ratings for Naruto");
    assert_eq!(embed.color, EmbedColor::Gold);
    assert_eq!(embed.fields[0].name, "Average Score");
    assert_eq!(embed.fields[0].value, "5.00/10");
    assert_eq!(embed.fields[1].name, "User Ratings");
    assert_eq!(embed.fields[1].value, "**alice**: 10.0/10\n**20**: 0.0/10");
}

#[tokio::test]
async fn test_ratings_view_shows_at_most_ten_users() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;
    for user in 0..12 {
        surface
            .handle(&member(&user.to_string()), &rate("Naruto", 5.0))
            .await;
    }

    let reply = surface
        .handle(
            &member("1"),
            &Invocation::new("ratings").with_string("title", "Naruto"),
        )
        .await;

    let embed = reply.embed.unwrap();
    assert_eq!(embed.fields[1].value.lines().count(), 10);
}

#[tokio::test]
async fn test_ratings_view_without_ratings() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    surface.handle(&admin(), &add("Naruto")).await;

    let reply = surface
        .handle(
            &member("1"),
            &Invocation::new("ratings").with_string("title", "Naruto"),
        )
        .await;
    assert!(reply.ephemeral);
    assert_eq!(
        reply.content.as_deref(),
        Some("No ratings yet for **Naruto**.")
    );
}

#[tokio::test]
async fn test_my_ratings() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    let me = Caller::new("5", "Sam", false);

    let reply = surface.handle(&me, &Invocation::new("myratings")).await;
    assert_eq!(
        reply.content.as_deref(),
        Some("You haven't rated any titles yet.")
    );

    surface.handle(&admin(), &add("Naruto")).await;
    surface.handle(&admin(), &add("Bleach")).await;
    surface.handle(&me, &rate("Bleach", 7.5)).await;
    surface.handle(&me, &rate("Naruto", 9.0)).await;

    let reply = surface.handle(&me, &Invocation::new("myratings")).await;
    let embed = reply.embed.unwrap();
    assert_eq!(embed.title, "Sam's Ratings");
    assert_eq!(
        embed.description.as_deref(),
        Some("**Naruto**: 9.0/10\n**Bleach**: 7.5/10")
    );
}

#[tokio::test]
async fn test_top_titles_embed() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    let top = Invocation::new("toptitles");

    let reply = surface.handle(&member("1"), &top).await;
    assert_eq!(reply.content.as_deref(), Some("No ratings available yet."));

    for title in ["A", "B", "C"] {
        surface.handle(&admin(), &add(title)).await;
    }
    surface.handle(&member("1"), &rate("A", 9.0)).await;
    surface.handle(&member("1"), &rate("B", 7.0)).await;
    surface.handle(&member("1"), &rate("C", 8.0)).await;
    surface.handle(&member("2"), &rate("C", 7.0)).await;

    let embed = surface.handle(&member("1"), &top).await.embed.unwrap();
    assert_eq!(embed.title, "Top 10 Rated Titles");
    let fields: Vec<(&str, &str)> = embed
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.value.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![("A", "9.00/10"), ("C", "7.50/10"), ("B", "7.00/10")]
    );
}

#[tokio::test]
async fn test_malformed_invocation_is_reported_privately() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;

    let reply = surface
        .handle(&member("1"), &Invocation::new("rate").with_string("title", "A"))
        .await;
    assert!(reply.ephemeral);
    assert!(reply.content.unwrap().starts_with("❌ Invalid command"));
}

#[tokio::test]
async fn test_autocomplete() {
    let dir = TempDir::new().unwrap();
    let surface = surface(&dir).await;
    for title in ["Naruto", "Bleach", "Narcos"] {
        surface.handle(&admin(), &add(title)).await;
    }

    let request = AutocompleteRequest {
        command: "rate".to_string(),
        option: "title".to_string(),
        partial: "NA".to_string(),
    };
    assert_eq!(
        surface.autocomplete(&request).await.unwrap(),
        vec!["Naruto", "Narcos"]
    );

    let not_enabled = AutocompleteRequest {
        command: "addtitle".to_string(),
        option: "name".to_string(),
        partial: "".to_string(),
    };
    assert!(surface.autocomplete(&not_enabled).await.is_err());
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let surface = surface(&dir).await;
        surface.handle(&admin(), &add("Naruto")).await;
        surface.handle(&member("3"), &rate("Naruto", 4.0)).await;
    }

    let surface = surface(&dir).await;
    let reply = surface
        .handle(&member("3"), &Invocation::new("myratings"))
        .await;
    assert_eq!(
        reply.embed.unwrap().description.as_deref(),
        Some("**Naruto**: 4.0/10")
    );
}
