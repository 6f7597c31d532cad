use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    audio::{
        player::{EnqueueError, GuildQueue, PlayerSettings},
        queue::{Origin, QueueEntry},
        sink::Sink,
    },
    sources::{MediaResource, Resolver},
    storage,
};

/// Registro de colas por servidor.
///
/// This is the only entry point for the command layer: callers hold a
/// [`GuildId`], never a [`GuildQueue`]. Queues are created on first use and kept
/// for the lifetime of the process.
pub struct QueueRegistry<S: Sink> {
    queues: DashMap<GuildId, Arc<GuildQueue<S>>>,
    resolver: Arc<dyn Resolver>,
    sink: Arc<S>,
    settings: PlayerSettings,
}

impl<S: Sink> QueueRegistry<S> {
    pub fn new(resolver: Arc<dyn Resolver>, sink: Arc<S>, settings: PlayerSettings) -> Self {
        Self {
            queues: DashMap::new(),
            resolver,
            sink,
            settings,
        }
    }

    /// Resuelve la petición y la agrega a la cola del servidor.
    ///
    /// Resolution errors are returned to the caller and nothing is queued.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        request: &str,
        target: S::Target,
        origin: Arc<dyn Origin>,
    ) -> Result<MediaResource, EnqueueError> {
        let queue = self.get_or_create(guild_id);
        if !queue.has_capacity() {
            return Err(EnqueueError::QueueFull(self.settings.max_queue_size));
        }

        let resource = self.resolver.resolve(request, &guild_id.to_string()).await?;

        let entry = QueueEntry::new(request, resource.clone(), target, origin);
        if let Err(e) = queue.enqueue(entry) {
            // Se llenó mientras descargábamos
            if !queue.is_referenced(&resource.local_path) {
                storage::release(&resource.local_path).await;
            }
            return Err(e);
        }

        Ok(resource)
    }

    pub fn request_skip(&self, guild_id: GuildId) -> bool {
        self.get(guild_id).is_some_and(|queue| queue.request_skip())
    }

    pub async fn request_stop(&self, guild_id: GuildId) -> usize {
        match self.get(guild_id) {
            Some(queue) => queue.request_stop().await,
            None => 0,
        }
    }

    /// Copia de la cola; la primera entrada es la que está sonando
    pub fn peek_queue(&self, guild_id: GuildId) -> Vec<QueueEntry<S::Target>> {
        self.get(guild_id).map(|queue| queue.peek()).unwrap_or_default()
    }

    pub fn is_playing(&self, guild_id: GuildId) -> bool {
        self.get(guild_id).is_some_and(|queue| queue.is_playing())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Obtiene la cola del servidor o la crea de forma atómica
    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<GuildQueue<S>> {
        self.queues
            .entry(guild_id)
            .or_insert_with(|| {
                info!("🆕 Cola creada para guild {}", guild_id);
                Arc::new(GuildQueue::new(
                    guild_id,
                    Arc::clone(&self.resolver),
                    Arc::clone(&self.sink),
                    self.settings,
                ))
            })
            .clone()
    }

    fn get(&self, guild_id: GuildId) -> Option<Arc<GuildQueue<S>>> {
        let queue = self.queues.get(&guild_id).map(|q| Arc::clone(q.value()));
        if queue.is_none() {
            debug!("Sin cola para guild {}", guild_id);
        }
        queue
    }
}
