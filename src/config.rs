use std::env;

use anyhow::{anyhow, Context as _};

const DEFAULT_DATABASE_URL: &str = "suggestions.db";
const DEFAULT_POOL_SIZE: u32 = 4;

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub database_url: String,
    pub pool_size: u32,
    /// Register commands on this guild only instead of globally.
    pub dev_guild_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Config, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, anyhow::Error> {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow!("DISCORD_TOKEN is not set"))?;
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_PATH"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let pool_size = match lookup("DATABASE_POOL_SIZE") {
            Some(size) => size
                .parse()
                .ok()
                .filter(|&n: &u32| n > 0)
                .ok_or_else(|| anyhow!("invalid DATABASE_POOL_SIZE {:?}, expected a positive number", size))?,
            None => DEFAULT_POOL_SIZE,
        };
        let dev_guild_id = lookup("DEV_GUILD_ID")
            .map(|id| {
                id.parse()
                    .with_context(|| format!("invalid DEV_GUILD_ID {:?}", id))
            })
            .transpose()?;
        Ok(Config {
            token,
            database_url,
            pool_size,
            dev_guild_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("DISCORD_TOKEN", " ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let c = config(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(c.database_url, "suggestions.db");
        assert_eq!(c.pool_size, 4);
        assert_eq!(c.dev_guild_id, None);
    }

    #[test]
    fn legacy_db_path_is_honoured() {
        let c = config(&[("DISCORD_TOKEN", "abc"), ("DB_PATH", "old.db")]).unwrap();
        assert_eq!(c.database_url, "old.db");
        let c = config(&[
            ("DISCORD_TOKEN", "abc"),
            ("DB_PATH", "old.db"),
            ("DATABASE_URL", "new.db"),
        ])
        .unwrap();
        assert_eq!(c.database_url, "new.db");
    }

    #[test]
    fn empty_pool_is_rejected() {
        let err = config(&[("DISCORD_TOKEN", "abc"), ("DATABASE_POOL_SIZE", "0")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_POOL_SIZE"));
    }

    #[test]
    fn numbers_are_validated() {
        assert!(config(&[("DISCORD_TOKEN", "abc"), ("DATABASE_POOL_SIZE", "many")]).is_err());
        assert_eq!(
            config(&[("DISCORD_TOKEN", "abc"), ("DATABASE_POOL_SIZE", "8")])
                .unwrap()
                .pool_size,
            8
        );
        let c = config(&[("DISCORD_TOKEN", "abc"), ("DEV_GUILD_ID", "1234")]).unwrap();
        assert_eq!(c.dev_guild_id, Some(1234));
    }
}
