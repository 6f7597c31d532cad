use anyhow::Result;
use serenity::{
    builder::{
        CreateEmbed, CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage,
    },
    model::{
        application::{CommandInteraction, ComponentInteraction},
        channel::ChannelType,
        id::{GuildId, UserId},
        user::User,
    },
    prelude::Context,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    audio::{queue::Origin, voice::VoiceTarget},
    bot::{commands::BotCommand, ChannelOrigin, JukeboxBot},
    ui::{
        buttons::{self, button_ids},
        embeds,
    },
};

/// Maneja comandos slash
pub async fn handle_command(ctx: &Context, command: CommandInteraction, bot: &JukeboxBot) -> Result<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    let embed = match BotCommand::parse(&command.data.name) {
        Some(BotCommand::Play) => return handle_play(ctx, &command, guild_id, bot).await,
        Some(BotCommand::Skip) => skip_embed(bot, guild_id),
        Some(BotCommand::Stop) => stop_embed(bot, guild_id, &command.user).await,
        Some(BotCommand::Queue) => queue_embed(bot, guild_id),
        None => {
            command
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .content("❌ Comando no reconocido")
                            .ephemeral(true),
                    ),
                )
                .await?;
            return Ok(());
        }
    };

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().embed(embed)),
        )
        .await?;

    Ok(())
}

/// Maneja los botones de control; las respuestas solo las ve quien pulsa
pub async fn handle_component(ctx: &Context, component: ComponentInteraction, bot: &JukeboxBot) -> Result<()> {
    let guild_id = component
        .guild_id
        .ok_or_else(|| anyhow::anyhow!("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {} presionado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let embed = match component.data.custom_id.as_str() {
        button_ids::SKIP => skip_embed(bot, guild_id),
        button_ids::STOP => stop_embed(bot, guild_id, &component.user).await,
        button_ids::QUEUE => queue_embed(bot, guild_id),
        other => {
            warn!("Componente no manejado: {}", other);
            embeds::create_info_embed("Acción no reconocida", "Este botón ya no está disponible")
        }
    };

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

async fn handle_play(ctx: &Context, command: &CommandInteraction, guild_id: GuildId, bot: &JukeboxBot) -> Result<()> {
    let query = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "query")
        .and_then(|opt| opt.value.as_str())
        .ok_or_else(|| anyhow::anyhow!("Query no proporcionado"))?
        .trim()
        .to_string();
    let requested_channel = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == "channel_name")
        .and_then(|opt| opt.value.as_str())
        .map(|name| name.trim().trim_start_matches('#').to_string());

    // La descarga puede tardar más que el límite de 3s de Discord
    command.defer(&ctx.http).await?;

    let target = match voice_target(ctx, guild_id, command.user.id, requested_channel.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            command
                .create_followup(
                    &ctx.http,
                    CreateInteractionResponseFollowup::new()
                        .embed(embeds::create_failure_embed(&query, &e.to_string())),
                )
                .await?;
            return Ok(());
        }
    };

    let origin: Arc<dyn Origin> = Arc::new(ChannelOrigin::new(Arc::clone(&ctx.http), command.channel_id));

    let followup = match bot.registry.enqueue(guild_id, &query, target, origin).await {
        Ok(resource) => CreateInteractionResponseFollowup::new()
            .embed(embeds::create_track_added_embed(&resource, &command.user))
            .components(buttons::create_control_buttons()),
        Err(e) => {
            warn!("⚠️ No se pudo agregar '{}' en guild {}: {}", query, guild_id, e);
            CreateInteractionResponseFollowup::new().embed(embeds::create_failure_embed(&query, &e.to_string()))
        }
    };

    command.create_followup(&ctx.http, followup).await?;
    Ok(())
}

fn skip_embed(bot: &JukeboxBot, guild_id: GuildId) -> CreateEmbed {
    let current = bot
        .registry
        .peek_queue(guild_id)
        .first()
        .map(|entry| entry.resource.title.clone());

    match current {
        Some(title) if bot.registry.request_skip(guild_id) => embeds::create_skipped_embed(&title),
        _ => embeds::create_info_embed("Nada sonando", "No hay ninguna canción que saltar"),
    }
}

async fn stop_embed(bot: &JukeboxBot, guild_id: GuildId, user: &User) -> CreateEmbed {
    if !bot.registry.is_playing(guild_id) {
        return embeds::create_info_embed("Nada sonando", "La cola ya está vacía");
    }

    let discarded = bot.registry.request_stop(guild_id).await;
    embeds::create_stopped_embed(discarded, Some(user))
}

fn queue_embed(bot: &JukeboxBot, guild_id: GuildId) -> CreateEmbed {
    embeds::create_queue_embed(&bot.registry.peek_queue(guild_id))
}

/// Canal de voz con ese nombre, o el del usuario si no se indicó ninguno.
///
/// Reads everything it needs from the cache and returns owned data, so no
/// cache guard outlives this call.
fn voice_target(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
    requested: Option<&str>,
) -> Result<VoiceTarget> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or_else(|| anyhow::anyhow!("Guild no encontrada en caché"))?;

    let channel = match requested {
        Some(name) => guild
            .channels
            .values()
            .find(|channel| channel.kind == ChannelType::Voice && channel.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("No existe un canal de voz llamado `{}`", name))?,
        None => guild
            .voice_states
            .get(&user_id)
            .and_then(|voice_state| voice_state.channel_id)
            .and_then(|channel_id| guild.channels.get(&channel_id))
            .ok_or_else(|| anyhow::anyhow!("Debes estar en un canal de voz o indicar uno"))?,
    };

    Ok(VoiceTarget {
        guild_id,
        channel_id: channel.id,
        channel_name: channel.name.clone(),
    })
}
