use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

use crate::sources::MediaResource;

#[derive(Debug, Clone, Error)]
pub enum SinkError {
    #[error("no se pudo conectar a la salida de audio: {0}")]
    Open(String),
    #[error("la reproducción falló: {0}")]
    Stream(String),
}

/// Salida de audio capaz de reproducir un [`MediaResource`] en un destino
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Destino opaco (por ejemplo, un canal de voz)
    type Target: Clone + Debug + Send + Sync + 'static;
    type Connection: Connection;

    /// Opens the target and starts streaming `resource.local_path`.
    async fn open(&self, resource: &MediaResource, target: &Self::Target) -> Result<Self::Connection, SinkError>;
}

/// Stream en curso devuelto por [`Sink::open`].
///
/// `stop` and `close` must be idempotent: the play-loop may call `stop` on a
/// stream that already ended and always calls `close` once it is done.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// `Ok(false)` once the stream finished or was stopped, `Err` if it failed.
    async fn is_active(&self) -> Result<bool, SinkError>;

    async fn stop(&self);

    async fn close(&self);
}
