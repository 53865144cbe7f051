use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{categories::CategoryConfig, errors::Error, Result};

/// Where digest pages are delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryBackend {
    Discord,
    Telegram,
}

/// Typed configuration, loaded once at startup and read-only afterwards.
#[derive(Clone, Debug)]
pub struct Config {
    // Delivery
    pub delivery_backend: DeliveryBackend,
    pub discord_token: Option<String>,
    pub discord_channel_id: Option<u64>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
    pub telegram_allowed_users: Vec<i64>,

    // Schedule
    pub update_interval: Duration,

    // Storage
    pub database_path: PathBuf,

    // Feeds
    pub categories: CategoryConfig,
    pub feed_timeout: Duration,
    pub feed_user_agent: String,
    pub max_concurrent_fetches: usize,
    pub entries_per_feed: usize,

    // Output
    pub send_interval: Duration,
    pub digest_title: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let str_of = |key: &str| get(key).and_then(non_empty);

        let delivery_backend = match str_of("DELIVERY_BACKEND")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("discord") => DeliveryBackend::Discord,
            Some("telegram") => DeliveryBackend::Telegram,
            Some(other) => {
                return Err(Error::Config(format!(
                    "DELIVERY_BACKEND must be `discord` or `telegram`, got `{other}`"
                )))
            }
        };

        let discord_token = str_of("DISCORD_TOKEN");
        let discord_channel_id = parse_opt::<u64>("DISCORD_CHANNEL_ID", str_of("DISCORD_CHANNEL_ID"))?;
        let telegram_bot_token = str_of("TELEGRAM_BOT_TOKEN");
        let telegram_chat_id = parse_opt::<i64>("TELEGRAM_CHAT_ID", str_of("TELEGRAM_CHAT_ID"))?;
        let telegram_allowed_users = parse_csv_i64(str_of("TELEGRAM_ALLOWED_USERS"));

        match delivery_backend {
            DeliveryBackend::Discord => {
                if discord_token.is_none() || discord_channel_id.is_none() {
                    return Err(Error::Config(
                        "DISCORD_TOKEN and DISCORD_CHANNEL_ID environment variables are required"
                            .to_string(),
                    ));
                }
            }
            DeliveryBackend::Telegram => {
                if telegram_bot_token.is_none() || telegram_chat_id.is_none() {
                    return Err(Error::Config(
                        "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID environment variables are required"
                            .to_string(),
                    ));
                }
            }
        }
        if telegram_bot_token.is_some() && telegram_allowed_users.is_empty() {
            return Err(Error::Config(
                "TELEGRAM_ALLOWED_USERS is required when TELEGRAM_BOT_TOKEN is set".to_string(),
            ));
        }

        let interval_hours = parse_opt::<u64>("UPDATE_INTERVAL_HOURS", str_of("UPDATE_INTERVAL_HOURS"))?
            .unwrap_or(8);
        if interval_hours == 0 {
            return Err(Error::Config(
                "UPDATE_INTERVAL_HOURS must be at least 1".to_string(),
            ));
        }
        let update_interval = Duration::from_secs(interval_hours * 3600);

        let database_path =
            PathBuf::from(str_of("DB_PATH").unwrap_or("posted_articles.db".to_string()));

        let categories = match str_of("CATEGORIES_FILE") {
            Some(path) => CategoryConfig::load(Path::new(&path))?,
            None => CategoryConfig::builtin(),
        };

        let feed_timeout = Duration::from_secs(
            parse_opt::<u64>("FEED_TIMEOUT_SECS", str_of("FEED_TIMEOUT_SECS"))?.unwrap_or(20),
        );
        let feed_user_agent = str_of("FEED_USER_AGENT")
            .unwrap_or_else(|| format!("newsbot/{}", env!("CARGO_PKG_VERSION")));
        let max_concurrent_fetches =
            parse_opt::<usize>("MAX_CONCURRENT_FETCHES", str_of("MAX_CONCURRENT_FETCHES"))?
                .unwrap_or(10)
                .max(1);
        let entries_per_feed =
            parse_opt::<usize>("ENTRIES_PER_FEED", str_of("ENTRIES_PER_FEED"))?.unwrap_or(10);

        let send_interval = Duration::from_millis(
            parse_opt::<u64>("SEND_INTERVAL_MS", str_of("SEND_INTERVAL_MS"))?.unwrap_or(1000),
        );
        let digest_title =
            str_of("DIGEST_TITLE").unwrap_or_else(|| "Daily AI News Summary".to_string());

        Ok(Self {
            delivery_backend,
            discord_token,
            discord_channel_id,
            telegram_bot_token,
            telegram_chat_id,
            telegram_allowed_users,
            update_interval,
            database_path,
            categories,
            feed_timeout,
            feed_user_agent,
            max_concurrent_fetches,
            entries_per_feed,
            send_interval,
            digest_title,
        })
    }

    pub fn commands_enabled(&self) -> bool {
        self.telegram_bot_token.is_some()
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_opt<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {raw}")))
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn discord_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "tok"),
            ("DISCORD_CHANNEL_ID", "123456"),
        ]))
        .unwrap();

        assert_eq!(cfg.delivery_backend, DeliveryBackend::Discord);
        assert_eq!(cfg.discord_channel_id, Some(123456));
        assert_eq!(cfg.update_interval, Duration::from_secs(8 * 3600));
        assert_eq!(cfg.database_path, PathBuf::from("posted_articles.db"));
        assert_eq!(cfg.max_concurrent_fetches, 10);
        assert_eq!(cfg.entries_per_feed, 10);
        assert_eq!(cfg.send_interval, Duration::from_millis(1000));
        assert_eq!(cfg.categories, CategoryConfig::builtin());
        assert!(!cfg.commands_enabled());
    }

    #[test]
    fn missing_discord_channel_is_fatal() {
        let err = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "tok")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_channel_id_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "tok"),
            ("DISCORD_CHANNEL_ID", "general"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DISCORD_CHANNEL_ID"));
    }

    #[test]
    fn telegram_backend_requires_allowed_users() {
        let err = Config::from_lookup(lookup(&[
            ("DELIVERY_BACKEND", "telegram"),
            ("TELEGRAM_BOT_TOKEN", "tok"),
            ("TELEGRAM_CHAT_ID", "-100200"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_ALLOWED_USERS"));

        let cfg = Config::from_lookup(lookup(&[
            ("DELIVERY_BACKEND", "Telegram"),
            ("TELEGRAM_BOT_TOKEN", "tok"),
            ("TELEGRAM_CHAT_ID", "-100200"),
            ("TELEGRAM_ALLOWED_USERS", "1, 2,x"),
            ("UPDATE_INTERVAL_HOURS", "12"),
        ]))
        .unwrap();
        assert_eq!(cfg.delivery_backend, DeliveryBackend::Telegram);
        assert_eq!(cfg.telegram_chat_id, Some(-100200));
        assert_eq!(cfg.telegram_allowed_users, vec![1, 2]);
        assert_eq!(cfg.update_interval, Duration::from_secs(12 * 3600));
        assert!(cfg.commands_enabled());
    }

    #[test]
    fn zero_interval_and_unknown_backend_are_rejected() {
        let base = [("DISCORD_TOKEN", "tok"), ("DISCORD_CHANNEL_ID", "1")];

        let mut zero = base.to_vec();
        zero.push(("UPDATE_INTERVAL_HOURS", "0"));
        assert!(Config::from_lookup(lookup(&zero)).is_err());

        let mut slack = base.to_vec();
        slack.push(("DELIVERY_BACKEND", "slack"));
        assert!(Config::from_lookup(lookup(&slack)).is_err());
    }
}
