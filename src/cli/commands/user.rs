//! User management command handlers

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::services::auth_service::{validate_new_password, validate_username};

pub async fn cmd_user_add(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    validate_username(username)?;
    validate_new_password(password)?;

    let store = Store::from_config(&config.general).await?;

    if store.get_user_by_username(username).await?.is_some() {
        anyhow::bail!("User '{username}' already exists");
    }

    let user = store
        .create_user(username, password, &config.security)
        .await
        .with_context(|| format!("Failed to create user '{username}'"))?;

    println!("✓ Created user: {} (ID: {})", user.username, user.id);
    println!("  API key: {}", user.api_key);

    Ok(())
}

pub async fn cmd_user_reset_api_key(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::from_config(&config.general).await?;

    if store.get_user_by_username(username).await?.is_none() {
        println!("User '{username}' not found.");
        return Ok(());
    }

    let api_key = store.regenerate_user_api_key(username).await?;

    println!("✓ New API key for {username}: {api_key}");
    println!("  The previous key no longer works.");

    Ok(())
}
