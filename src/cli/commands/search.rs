//! Catalog search command handler

use crate::clients::jikan::JikanClient;
use crate::config::Config;

pub async fn cmd_search_catalog(config: &Config, query: &str, limit: u32) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let jikan = JikanClient::from_config(&config.catalog)?;
    let limit = limit.clamp(1, config.catalog.max_limit.max(1));
    let results = jikan.search_typed(query, limit).await?;

    if results.is_empty() {
        println!("No anime found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");

    for anime in &results {
        let eps = anime
            .episodes
            .map_or_else(|| "? eps".to_string(), |e| format!("{e} eps"));
        let title_en = anime.title_english.as_deref().unwrap_or("");

        println!("• {} ({})", anime.title, eps);
        if !title_en.is_empty() && title_en != anime.title {
            println!("  EN: {title_en}");
        }
        println!(
            "  MAL: {} | Type: {} | Score: {} | Year: {}",
            anime.mal_id,
            anime.anime_type.as_deref().unwrap_or("?"),
            anime
                .score
                .map_or_else(|| "?".to_string(), |s| format!("{s:.2}")),
            anime.year.map_or_else(|| "?".to_string(), |y| y.to_string()),
        );
        if let Some(status) = &anime.status {
            println!("  Status: {status}");
        }
        println!();
    }

    Ok(())
}
