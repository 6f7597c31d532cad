pub mod ytdlp;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use ytdlp::YtDlpResolver;

/// Recurso reproducible ya descargado en disco
#[derive(Debug, Clone, PartialEq)]
pub struct MediaResource {
    pub local_path: PathBuf,
    pub title: String,
    pub source_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_display: Option<String>,
    pub uploader: Option<String>,
}

impl MediaResource {
    pub fn new(local_path: impl Into<PathBuf>, title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            title: title.into(),
            source_url: source_url.into(),
            thumbnail_url: None,
            duration_display: None,
            uploader: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: String) -> Self {
        self.thumbnail_url = Some(thumbnail);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_display = Some(format_duration(duration));
        self
    }

    pub fn with_uploader(mut self, uploader: String) -> Self {
        self.uploader = Some(uploader);
        self
    }
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no se encontró ningún resultado para `{0}`")]
    NoMatch(String),
    #[error("la fuente no está disponible: {0}")]
    Unreachable(String),
    #[error("respuesta inválida de yt-dlp: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("error preparando el almacenamiento local: {0}")]
    Storage(#[from] std::io::Error),
}

/// Convierte una petición (URL o búsqueda) en un archivo local con metadata.
///
/// Implementations must tolerate being called again for the same request: the
/// play-loop re-resolves entries whose file disappeared before playback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    /// `tag` identifies the guild the resource is prepared for.
    async fn resolve(&self, request: &str, tag: &str) -> Result<MediaResource, ResolutionError>;
}

/// Formatea una duración como `H:MM:SS` o `M:SS`
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
