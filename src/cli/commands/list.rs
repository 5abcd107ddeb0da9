//! List favorites command handler

use crate::config::Config;
use crate::db::Store;
use crate::domain::WatchStatus;

pub async fn cmd_list_favorites(
    config: &Config,
    username: &str,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let status = status
        .map(str::parse::<WatchStatus>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let store = Store::from_config(&config.general).await?;

    let Some(user) = store.get_user_by_username(username).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    let favorites = store.list_favorites(user.id, status).await?;

    if favorites.is_empty() {
        println!("{username}'s list is empty.");
        return Ok(());
    }

    println!("{}'s list ({} total)", username, favorites.len());
    println!("{:-<70}", "");

    for favorite in &favorites {
        let status_indicator = match favorite.status {
            WatchStatus::ToWatch => "📅",
            WatchStatus::Watching => "▶",
            WatchStatus::Completed => "✓",
        };

        let rating = favorite
            .user_rating
            .map_or_else(|| "-".to_string(), |r| format!("{r}/10"));
        let score = favorite
            .score
            .map_or_else(|| "?".to_string(), |s| format!("{s:.2}"));

        println!("{} {}", status_indicator, favorite.title);
        println!(
            "  ID: {} | MAL: {} | Score: {} | Rating: {} | Status: {}",
            favorite.id,
            favorite.mal_id,
            score,
            rating,
            favorite.status.label()
        );
    }

    let counts = store.favorite_status_counts(user.id).await?;
    println!();
    println!(
        "To watch: {} | Watching: {} | Completed: {}",
        counts.to_watch, counts.watching, counts.completed
    );

    Ok(())
}
