//! # Bot Module
//!
//! Discord front-end for the playback queues.
//!
//! This module contains:
//! - Slash command registration ([`commands`])
//! - Command and button handling ([`handlers`])
//! - The [`ChannelOrigin`] that reports playback events back to the text channel
//!
//! The bot itself holds no playback state: every command is forwarded to the
//! [`QueueRegistry`] keyed by guild.

use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Http, Interaction, Ready},
    builder::CreateMessage,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub mod commands;
pub mod handlers;

use crate::{
    audio::{
        queue::{Origin, PlaybackEvent},
        registry::QueueRegistry,
        voice::SongbirdSink,
    },
    config::Config,
    ui::embeds,
};

/// Main Discord event handler.
///
/// Owns the configuration and a shared handle to the queue registry; both are
/// cheap to clone into spawned tasks.
pub struct JukeboxBot {
    config: Arc<Config>,
    pub registry: Arc<QueueRegistry<SongbirdSink>>,
}

impl JukeboxBot {
    pub fn new(config: Arc<Config>, registry: Arc<QueueRegistry<SongbirdSink>>) -> Self {
        Self { config, registry }
    }

    /// Registers slash commands with Discord.
    ///
    /// Uses guild commands when `GUILD_ID` is configured (instant propagation)
    /// and global commands otherwise.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registrando comandos para guild específica: {}", guild_id);
                commands::register_guild_commands(ctx, guild_id).await?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command_interaction) => {
                if let Err(e) = handlers::handle_command(&ctx, command_interaction, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Component(component_interaction) => {
                if let Err(e) = handlers::handle_component(&ctx, component_interaction, self).await {
                    error!("Error manejando componente: {:?}", e);
                }
            }
            _ => {}
        }
    }
}

/// Canal de texto donde se pidió la canción
pub struct ChannelOrigin {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelOrigin {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Origin for ChannelOrigin {
    async fn notify(&self, event: PlaybackEvent) {
        let embed = match &event {
            PlaybackEvent::Started(resource) => embeds::create_now_playing_embed(resource),
            PlaybackEvent::Failed { request, reason } => embeds::create_failure_embed(request, reason),
        };

        if let Err(e) = self
            .channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
        {
            warn!("No se pudo avisar en el canal {}: {:?}", self.channel_id, e);
        }
    }
}
