use anyhow::{Context, Result};

use crate::config::Config;
use crate::db::{NewUser, Store};

/// `murmur create-superuser`
pub async fn create_superuser(
    config: &Config,
    username: String,
    email: String,
    password: Option<String>,
    first_name: String,
    last_name: String,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => std::env::var("MURMUR_SUPERUSER_PASSWORD")
            .context("Pass --password or set MURMUR_SUPERUSER_PASSWORD")?,
    };

    let store = Store::new(&config.general.database_path).await?;

    let user = store
        .create_superuser(NewUser {
            username,
            email,
            password,
            first_name,
            last_name,
        })
        .await?;

    println!("Superuser '{}' created ({})", user.username, user.public_id);
    println!("API key: {}", user.api_key);

    Ok(())
}
