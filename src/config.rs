use anyhow::{Context, Result};
use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::audio::player::PlayerSettings;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Descargas
    pub cache_dir: PathBuf,
    pub cookies_file: Option<PathBuf>,
    pub cookies_data: Option<String>, // Contenido de cookies.txt en línea
    pub ytdlp_binary: String,
    pub purge_cache_on_start: bool,

    // Reproducción
    pub poll_interval_ms: u64,
    pub max_queue_size: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Construye la configuración a partir de una función de búsqueda de variables
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        // Las variables vacías cuentan como no definidas
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            // Discord
            discord_token: var("DISCORD_TOKEN").context("DISCORD_TOKEN no está definido")?,
            guild_id: parse_optional(var("GUILD_ID"), "GUILD_ID")?,

            // Descargas
            cache_dir: var("CACHE_DIR").map(PathBuf::from).unwrap_or(defaults.cache_dir),
            cookies_file: var("COOKIES_FILE")
                .map(PathBuf::from)
                .or_else(|| var("COOKIES_DATA").map(|_| PathBuf::from(DEFAULT_COOKIES_FILE))),
            cookies_data: var("COOKIES_DATA"),
            ytdlp_binary: var("YTDLP_BINARY").unwrap_or(defaults.ytdlp_binary),
            purge_cache_on_start: parse_optional(var("PURGE_CACHE_ON_START"), "PURGE_CACHE_ON_START")?
                .unwrap_or(defaults.purge_cache_on_start),

            // Reproducción
            poll_interval_ms: parse_optional(var("POLL_INTERVAL_MS"), "POLL_INTERVAL_MS")?
                .unwrap_or(defaults.poll_interval_ms),
            max_queue_size: parse_optional(var("MAX_QUEUE_SIZE"), "MAX_QUEUE_SIZE")?
                .unwrap_or(defaults.max_queue_size),
        })
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Poll interval must be between 1ms and 1000ms (skip/stop latency bound)
    /// - Queue size must be greater than 0
    /// - The Discord token must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("Discord token must not be empty");
        }

        if !(1..=1000).contains(&self.poll_interval_ms) {
            anyhow::bail!(
                "Poll interval must be between 1 and 1000 ms, got: {}",
                self.poll_interval_ms
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        Ok(())
    }

    pub fn player_settings(&self) -> PlayerSettings {
        PlayerSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_queue_size: self.max_queue_size,
        }
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The Discord token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: Guild {}\n  \
            Downloads: {} in {} (cookies: {}, purge on start: {})\n  \
            Playback: {}ms poll, {} max queue",
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            self.ytdlp_binary,
            self.cache_dir.display(),
            self.cookies_file
                .as_ref()
                .map_or("none".to_string(), |path| path.display().to_string()),
            self.purge_cache_on_start,
            self.poll_interval_ms,
            self.max_queue_size,
        )
    }
}

/// Destino de `COOKIES_DATA` cuando no se indica `COOKIES_FILE`
const DEFAULT_COOKIES_FILE: &str = "cookies.txt";

fn parse_optional<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|raw| raw.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{} tiene un valor inválido", key))
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no defaults - must be provided)
            discord_token: String::new(),
            guild_id: None,

            // Download defaults
            cache_dir: "/app/cache".into(),
            cookies_file: None,
            cookies_data: None,
            ytdlp_binary: "yt-dlp".to_string(),
            purge_cache_on_start: true,

            // Playback defaults
            poll_interval_ms: 500,
            max_queue_size: 100,
        }
    }
}
