use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod sources;
mod storage;
mod ui;

use crate::audio::{registry::QueueRegistry, voice::SongbirdSink};
use crate::bot::JukeboxBot;
use crate::config::Config;
use crate::sources::YtDlpResolver;
use crate::storage::MediaStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ytdb=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando YTDB v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&config).await;
    }

    // Almacenamiento de descargas
    let store = MediaStore::new(config.cache_dir.clone()).await?;
    if config.purge_cache_on_start {
        if let Err(e) = store.purge().await {
            warn!("⚠️ No se pudo limpiar {}: {:?}", store.root().display(), e);
        }
    }

    // Cookies pasadas en línea (útil en contenedores sin volumen)
    if let (Some(data), Some(path)) = (&config.cookies_data, &config.cookies_file) {
        if let Err(e) = storage::write_cookies(path, data).await {
            warn!("⚠️ No se pudieron escribir las cookies en {}: {:?}", path.display(), e);
        }
    }

    let resolver = Arc::new(YtDlpResolver::new(
        config.ytdlp_binary.clone(),
        store,
        config.cookies_file.clone(),
    ));
    let songbird = Songbird::serenity();
    let sink = Arc::new(SongbirdSink::new(Arc::clone(&songbird)));
    let registry = Arc::new(QueueRegistry::new(resolver, sink, config.player_settings()));

    // Solo necesitamos servidores y estados de voz: todo va por slash commands
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let handler = JukeboxBot::new(Arc::clone(&config), registry);
    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                shard_manager.shutdown_all().await;
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(config: &Config) -> Result<()> {
    // yt-dlp es la única dependencia externa
    let yt_dlp = async_process::Command::new(&config.ytdlp_binary)
        .arg("--version")
        .output()
        .await?;

    if yt_dlp.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("{} no está disponible", config.ytdlp_binary);
    }
}
