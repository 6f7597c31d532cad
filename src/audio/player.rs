use parking_lot::Mutex;
use serenity::model::id::GuildId;
use std::{path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    audio::{
        queue::{EntryId, PlaybackEvent, PlayerPhase, QueueEntry, QueueState},
        sink::{Connection, Sink, SinkError},
    },
    sources::{MediaResource, ResolutionError, Resolver},
    storage,
};

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("el archivo local {0} ya no existe")]
    StaleResource(PathBuf),
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("la cola está llena (máximo {0} canciones)")]
    QueueFull(usize),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerSettings {
    /// Intervalo de sondeo del stream; es la latencia máxima de skip/stop
    pub poll_interval: Duration,
    pub max_queue_size: usize,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_queue_size: 100,
        }
    }
}

/// Cola de reproducción de un servidor.
///
/// Owns the FIFO of [`QueueEntry`] and drives at most one play-loop task at a
/// time. The lock is only held for the duration of each mutation, never across
/// an `.await`.
pub struct GuildQueue<S: Sink> {
    guild_id: GuildId,
    state: Mutex<QueueState<S::Target>>,
    resolver: Arc<dyn Resolver>,
    sink: Arc<S>,
    settings: PlayerSettings,
}

impl<S: Sink> GuildQueue<S> {
    pub fn new(guild_id: GuildId, resolver: Arc<dyn Resolver>, sink: Arc<S>, settings: PlayerSettings) -> Self {
        Self {
            guild_id,
            state: Mutex::new(QueueState::new()),
            resolver,
            sink,
            settings,
        }
    }

    #[allow(dead_code)]
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Agrega una entrada y arranca el play-loop si estaba inactivo
    pub fn enqueue(self: &Arc<Self>, entry: QueueEntry<S::Target>) -> Result<(), EnqueueError> {
        let start_loop = {
            let mut state = self.state.lock();
            if state.len() >= self.settings.max_queue_size {
                return Err(EnqueueError::QueueFull(self.settings.max_queue_size));
            }
            state.push(entry)
        };

        if start_loop {
            let queue = Arc::clone(self);
            tokio::spawn(async move { queue.play_loop().await });
        }
        Ok(())
    }

    pub fn has_capacity(&self) -> bool {
        self.state.lock().len() < self.settings.max_queue_size
    }

    /// Pide saltar la canción actual. Devuelve `false` si no hay nada sonando
    pub fn request_skip(&self) -> bool {
        let skipped = self.state.lock().request_skip();
        if skipped {
            info!("⏭️ Skip solicitado en guild {}", self.guild_id);
        }
        skipped
    }

    /// Vacía la cola e interrumpe la canción en curso.
    ///
    /// Nothing queued when this returns will be played. Files of the discarded
    /// entries are deleted here; the in-flight one is released by the loop.
    pub async fn request_stop(&self) -> usize {
        let (discarded, releasable) = self.state.lock().stop();
        info!("⏹️ Stop solicitado en guild {}", self.guild_id);

        for path in releasable {
            storage::release(&path).await;
        }
        discarded
    }

    pub fn peek(&self) -> Vec<QueueEntry<S::Target>> {
        self.state.lock().snapshot()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.state.lock().phase()
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn is_referenced(&self, path: &std::path::Path) -> bool {
        self.state.lock().is_referenced(path)
    }

    async fn play_loop(self: Arc<Self>) {
        info!("▶️ Play-loop iniciado en guild {}", self.guild_id);

        loop {
            let next = self.state.lock().begin_next();
            let Some(mut entry) = next else { break };

            if let Err(e) = self.play_entry(&mut entry).await {
                error!("❌ Falló '{}' en guild {}: {}", entry.request, self.guild_id, e);
                entry
                    .origin
                    .notify(PlaybackEvent::Failed {
                        request: entry.request.clone(),
                        reason: e.to_string(),
                    })
                    .await;
            }

            self.finish_entry(entry).await;
        }

        info!("⏹️ Play-loop terminado en guild {}", self.guild_id);
    }

    async fn play_entry(&self, entry: &mut QueueEntry<S::Target>) -> Result<(), PlaybackError> {
        self.prepare(entry).await?;

        // Un stop durante la preparación impide abrir el stream
        if !self.state.lock().is_still_wanted(entry.id()) {
            debug!("🚫 '{}' descartada antes de reproducir", entry.resource.title);
            return Ok(());
        }

        let connection = self.sink.open(&entry.resource, &entry.target).await?;

        let streaming = {
            let mut state = self.state.lock();
            let wanted = state.is_still_wanted(entry.id());
            if wanted {
                state.set_phase(PlayerPhase::Streaming);
            }
            wanted
        };
        if !streaming {
            connection.stop().await;
            connection.close().await;
            return Ok(());
        }

        info!("🎵 Reproduciendo en guild {}: {}", self.guild_id, entry.resource.title);
        entry.origin.notify(PlaybackEvent::Started(entry.resource.clone())).await;

        let streamed = self.stream(&connection, entry.id()).await;
        connection.close().await;
        streamed
    }

    /// Verifica el archivo local y lo vuelve a resolver si desapareció
    async fn prepare(&self, entry: &mut QueueEntry<S::Target>) -> Result<(), PlaybackError> {
        match ensure_available(&entry.resource).await {
            Ok(()) => Ok(()),
            Err(PlaybackError::StaleResource(path)) => {
                warn!("♻️ {} ya no existe, resolviendo de nuevo '{}'", path.display(), entry.request);
                let fresh = self
                    .resolver
                    .resolve(&entry.request, &self.guild_id.to_string())
                    .await?;
                self.state.lock().replace_resource(entry.id(), fresh.clone());
                entry.resource = fresh;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn stream(&self, connection: &S::Connection, id: EntryId) -> Result<(), PlaybackError> {
        loop {
            if self.state.lock().take_skip(id) {
                debug!("⏭️ Deteniendo stream en guild {}", self.guild_id);
                connection.stop().await;
            }

            if !connection.is_active().await? {
                return Ok(());
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Saca la entrada terminada y libera su archivo si nadie más lo usa
    async fn finish_entry(&self, entry: QueueEntry<S::Target>) {
        let path = entry.resource.local_path.clone();
        let still_referenced = {
            let mut state = self.state.lock();
            state.set_phase(PlayerPhase::Finishing);
            if !state.stop_requested() {
                state.pop_if_head(entry.id());
            }
            state.is_referenced(&path)
        };

        if still_referenced {
            debug!("📎 {} sigue en la cola, no se elimina", path.display());
        } else {
            storage::release(&path).await;
        }
    }
}

async fn ensure_available(resource: &MediaResource) -> Result<(), PlaybackError> {
    if storage::is_available(&resource.local_path).await {
        Ok(())
    } else {
        Err(PlaybackError::StaleResource(resource.local_path.clone()))
    }
}
