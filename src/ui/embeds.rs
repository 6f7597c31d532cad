use serenity::{
    all::{Timestamp, User},
    builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter},
};

use crate::{audio::queue::QueueEntry, sources::MediaResource};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 YTDB • Usa los botones para controlar la reproducción";

/// Máximo de canciones listadas en el embed de la cola
const QUEUE_PREVIEW_LIMIT: usize = 10;

/// Límite de Discord para el valor de un campo de embed
const FIELD_LIMIT: usize = 1024;

/// Crea un embed para mostrar que se agregó una canción
pub fn create_track_added_embed(resource: &MediaResource, user: &User) -> CreateEmbed {
    resource_embed("🎵 Agregada a la cola", resource)
        .author(CreateEmbedAuthor::new(user.display_name()).icon_url(user.face()))
        .color(colors::SUCCESS_GREEN)
}

/// Crea un embed para la canción que empieza a sonar
pub fn create_now_playing_embed(resource: &MediaResource) -> CreateEmbed {
    resource_embed("🎶 Reproduciendo Ahora", resource).color(colors::MUSIC_PURPLE)
}

fn resource_embed(title: &str, resource: &MediaResource) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title(title)
        .description(format!("**{}**", resource.title))
        .url(&resource.source_url);

    if let Some(thumbnail) = &resource.thumbnail_url {
        embed = embed.thumbnail(thumbnail);
    }
    if let Some(duration) = &resource.duration_display {
        embed = embed.field("⏱️ Duración", duration, true);
    }
    if let Some(uploader) = &resource.uploader {
        embed = embed.field("👤 Canal", uploader, true);
    }

    embed
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para una canción saltada
pub fn create_skipped_embed(title: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("⏭️ Canción Saltada")
        .description(format!("**{}**", title))
        .color(colors::SUCCESS_GREEN)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para la cola detenida
pub fn create_stopped_embed(discarded: usize, user: Option<&User>) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("⏹️ Reproducción Detenida")
        .description(format!("Cola limpiada: {} canciones descartadas", discarded))
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER));

    if let Some(user) = user {
        embed = embed.author(CreateEmbedAuthor::new(user.display_name()).icon_url(user.face()));
    }
    embed
}

/// Crea un embed de error al agregar o reproducir una canción
pub fn create_failure_embed(request: &str, reason: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("❌ No se pudo reproducir")
        .field("Petición", format!("`{}`", truncate(request, FIELD_LIMIT - 2)), false)
        .field("Motivo", truncate(reason, FIELD_LIMIT), false)
        .color(colors::ERROR_RED)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Corta el texto a `limit` caracteres, terminando en `…` si sobra
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Crea un embed de información
pub fn create_info_embed(title: &str, description: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title(format!("ℹ️ {}", title))
        .description(description)
        .color(colors::INFO_BLUE)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Crea un embed para mostrar la cola de reproducción
pub fn create_queue_embed<T>(entries: &[QueueEntry<T>]) -> CreateEmbed {
    let embed = CreateEmbed::default()
        .title("📋 Cola de Reproducción")
        .timestamp(Timestamp::now());

    if entries.is_empty() {
        return embed
            .description("😴 **La cola está vacía**\n\n💡 Usa `/play <canción>` para agregar música")
            .color(colors::NEUTRAL_GRAY)
            .footer(CreateEmbedFooter::new(STANDARD_FOOTER));
    }

    let (listing, remaining) = queue_listing(entries);
    let footer = match remaining {
        0 => STANDARD_FOOTER.to_string(),
        n => format!("y {} más...", n),
    };

    embed
        .description(listing)
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new(footer))
}

/// Lista las primeras canciones; la cabeza es la que está sonando.
///
/// Returns the text and how many entries were left out.
fn queue_listing<T>(entries: &[QueueEntry<T>]) -> (String, usize) {
    let mut listing = String::new();

    for (i, entry) in entries.iter().take(QUEUE_PREVIEW_LIMIT).enumerate() {
        let marker = if i == 0 { "▶️".to_string() } else { format!("**{}**.", i) };
        let duration = entry
            .resource
            .duration_display
            .as_ref()
            .map(|d| format!(" `[{}]`", d))
            .unwrap_or_default();

        listing.push_str(&format!(
            "{} {}{} • <t:{}:R>\n",
            marker,
            entry.resource.title,
            duration,
            entry.enqueued_at.timestamp()
        ));
    }

    (listing, entries.len().saturating_sub(QUEUE_PREVIEW_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::queue::{Origin, PlaybackEvent};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, time::Duration};

    struct Silent;

    #[async_trait]
    impl Origin for Silent {
        async fn notify(&self, _event: PlaybackEvent) {}
    }

    fn entries(count: usize) -> Vec<QueueEntry<()>> {
        (0..count)
            .map(|i| {
                let title = format!("Canción {}", i);
                let resource = MediaResource::new(format!("/cache/{}.m4a", i), title.clone(), "https://youtu.be/x")
                    .with_duration(Duration::from_secs(65));
                QueueEntry::new(title, resource, (), Arc::new(Silent))
            })
            .collect()
    }

    #[test]
    fn test_listing_marks_head_as_playing() {
        let entries = entries(3);
        let (listing, remaining) = queue_listing(&entries);
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(remaining, 0);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("▶️ Canción 0 `[1:05]`"));
        assert!(lines[1].starts_with("**1**. Canción 1"));
        assert!(lines[2].contains(&format!("<t:{}:R>", entries[2].enqueued_at.timestamp())));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("corto", 10), "corto");
        assert_eq!(truncate("canción larga", 7), "canció…");
        assert_eq!(truncate(&"ñ".repeat(2000), FIELD_LIMIT).chars().count(), FIELD_LIMIT);
    }

    #[test]
    fn test_failure_fields_fit_discord_limit() {
        let embed = create_failure_embed(&"q".repeat(6000), &"ERROR: yt-dlp\n".repeat(500));
        let json = serde_json::to_value(&embed).unwrap();
        let fields = json["fields"].as_array().unwrap();

        assert_eq!(fields.len(), 2);
        for field in fields {
            let value = field["value"].as_str().unwrap();
            assert!(value.chars().count() <= FIELD_LIMIT, "campo de {} caracteres", value.chars().count());
        }
        assert!(fields[0]["value"].as_str().unwrap().ends_with("…`"));
    }

    #[test]
    fn test_listing_is_capped() {
        let (listing, remaining) = queue_listing(&entries(14));

        assert_eq!(listing.lines().count(), QUEUE_PREVIEW_LIMIT);
        assert_eq!(remaining, 4);
        assert!(!listing.contains("Canción 10"));
    }
}
