use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::File,
    tracks::{PlayMode, TrackHandle, TrackResult},
    Songbird,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    audio::sink::{Connection, Sink, SinkError},
    sources::MediaResource,
};

/// Canal de voz donde se reproduce una entrada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTarget {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub channel_name: String,
}

/// Salida de audio sobre songbird: cada entrada abre su propia llamada
pub struct SongbirdSink {
    manager: Arc<Songbird>,
}

impl SongbirdSink {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Sink for SongbirdSink {
    type Target = VoiceTarget;
    type Connection = SongbirdConnection;

    async fn open(&self, resource: &MediaResource, target: &VoiceTarget) -> Result<SongbirdConnection, SinkError> {
        let call = match self.manager.join(target.guild_id, target.channel_id).await {
            Ok(call) => call,
            Err(e) => {
                // join deja la llamada registrada aunque falle
                discard_call(&self.manager, target.guild_id).await;
                return Err(SinkError::Open(format!("#{}: {}", target.channel_name, e)));
            }
        };
        info!("🔊 Conectado a #{} en guild {}", target.channel_name, target.guild_id);

        let track = {
            let mut handler = call.lock().await;
            handler.play_input(File::new(resource.local_path.clone()).into())
        };
        debug!("🎧 Stream iniciado: {}", resource.local_path.display());

        Ok(SongbirdConnection {
            manager: Arc::clone(&self.manager),
            guild_id: target.guild_id,
            track,
        })
    }
}

pub struct SongbirdConnection {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    track: TrackHandle,
}

#[async_trait]
impl Connection for SongbirdConnection {
    async fn is_active(&self) -> Result<bool, SinkError> {
        // Si el driver ya soltó el track, terminó
        let Ok(state) = self.track.get_info().await else {
            return Ok(false);
        };

        match state.playing {
            PlayMode::Errored(e) => Err(SinkError::Stream(format!("{:?}", e))),
            PlayMode::Stop | PlayMode::End => Ok(false),
            _ => Ok(true),
        }
    }

    async fn stop(&self) {
        log_stop(self.guild_id, self.track.stop());
    }

    async fn close(&self) {
        if let Err(e) = self.manager.remove(self.guild_id).await {
            warn!("Error al desconectar de guild {}: {:?}", self.guild_id, e);
        } else {
            info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
        }
    }
}

async fn discard_call(manager: &Songbird, guild_id: GuildId) {
    if let Err(e) = manager.remove(guild_id).await {
        debug!("Sin llamada que limpiar en guild {}: {:?}", guild_id, e);
    }
}

/// Devuelve `true` si el track se detuvo; si ya había terminado solo se anota
fn log_stop(guild_id: GuildId, result: TrackResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            debug!("Track ya detenido en guild {}: {:?}", guild_id, e);
            false
        }
    }
}
