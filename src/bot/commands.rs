use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{
        application::{Command, CommandOptionType},
        id::GuildId,
    },
    prelude::Context,
};

/// Comandos soportados; cada uno se registra también con su alias corto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Play,
    Skip,
    Stop,
    Queue,
}

impl BotCommand {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "play" | "p" => Some(Self::Play),
            "skip" | "sk" => Some(Self::Skip),
            "stop" | "st" => Some(Self::Stop),
            "queue" | "q" => Some(Self::Queue),
            _ => None,
        }
    }
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    Command::set_global_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;
    Ok(())
}

fn all_commands() -> Vec<CreateCommand> {
    vec![
        play_command("play"),
        play_command("p"),
        skip_command("skip"),
        skip_command("sk"),
        stop_command("stop"),
        stop_command("st"),
        queue_command("queue"),
        queue_command("q"),
    ]
}

fn play_command(name: &str) -> CreateCommand {
    CreateCommand::new(name)
        .description("Reproduce una canción de YouTube (URL o búsqueda)")
        .add_option(
            CreateCommandOption::new(CommandOptionType::String, "query", "URL o término de búsqueda")
                .required(true),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::String,
            "channel_name",
            "Nombre del canal de voz (por defecto, el tuyo)",
        ))
}

fn skip_command(name: &str) -> CreateCommand {
    CreateCommand::new(name).description("Salta la canción actual")
}

fn stop_command(name: &str) -> CreateCommand {
    CreateCommand::new(name).description("Detiene la reproducción y limpia la cola")
}

fn queue_command(name: &str) -> CreateCommand {
    CreateCommand::new(name).description("Muestra la cola de reproducción")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_same_command() {
        assert_eq!(BotCommand::parse("play"), Some(BotCommand::Play));
        assert_eq!(BotCommand::parse("p"), Some(BotCommand::Play));
        assert_eq!(BotCommand::parse("sk"), Some(BotCommand::Skip));
        assert_eq!(BotCommand::parse("st"), Some(BotCommand::Stop));
        assert_eq!(BotCommand::parse("q"), Some(BotCommand::Queue));
        assert_eq!(BotCommand::parse("pause"), None);
    }

    #[test]
    fn test_every_alias_is_registered() {
        assert_eq!(all_commands().len(), 8);
    }
}
