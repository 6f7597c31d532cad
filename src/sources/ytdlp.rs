use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use super::{MediaResource, ResolutionError, Resolver};
use crate::storage::MediaStore;

/// Preferimos m4a: symphonia lo decodifica sin pasar por ffmpeg
const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

/// Resolver que descarga el audio con yt-dlp
pub struct YtDlpResolver {
    binary: String,
    store: MediaStore,
    cookies: Option<PathBuf>,
    // Limitar descargas concurrentes para evitar rate limiting
    rate_limiter: Semaphore,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: String,
    title: String,
    webpage_url: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Option<Vec<Thumbnail>>,
    duration: Option<f64>,
    uploader: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
    ext: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, store: MediaStore, cookies: Option<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            store,
            cookies,
            rate_limiter: Semaphore::new(3),
        }
    }

    fn command(&self, target: &str, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("--no-playlist")
            .arg("--format")
            .arg(AUDIO_FORMAT)
            .arg("--output")
            .arg(output_dir.join("%(id)s.%(ext)s"))
            .arg("--dump-json")
            .arg("--no-simulate")
            .arg("--no-progress")
            .arg("--no-warnings");

        match &self.cookies {
            Some(cookies) if cookies.exists() => {
                debug!("🍪 Usando cookies de: {}", cookies.display());
                command.arg("--cookies").arg(cookies);
            }
            Some(cookies) => warn!("🍪 No se encontraron cookies en: {}", cookies.display()),
            None => {}
        }

        command.arg(target);
        command
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, request: &str, tag: &str) -> Result<MediaResource, ResolutionError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| ResolutionError::Unreachable(e.to_string()))?;

        let output_dir = self.store.guild_dir(tag).await?;
        let target = search_target(request);
        info!("⬇️ Descargando con yt-dlp: {}", target);

        let output = self
            .command(&target, &output_dir)
            .output()
            .await
            .map_err(|e| ResolutionError::Unreachable(format!("no se pudo ejecutar yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(request, &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let resource = parse_info(&stdout, request, &output_dir)?;
        info!("✅ Descargado: {} -> {}", resource.title, resource.local_path.display());
        Ok(resource)
    }
}

/// Las URLs se pasan tal cual, el resto se busca en YouTube
fn search_target(request: &str) -> String {
    match Url::parse(request) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => request.to_string(),
        _ => format!("ytsearch1:{}", request),
    }
}

fn classify_failure(request: &str, stderr: &str) -> ResolutionError {
    const NO_MATCH_MARKERS: [&str; 4] = [
        "Unsupported URL",
        "Video unavailable",
        "No video formats found",
        "Requested format is not available",
    ];

    if NO_MATCH_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        ResolutionError::NoMatch(request.to_string())
    } else {
        let reason = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("yt-dlp terminó con error");
        ResolutionError::Unreachable(reason.trim().to_string())
    }
}

/// Toma la última línea JSON (la de la entrada descargada)
fn parse_info(stdout: &str, request: &str, output_dir: &Path) -> Result<MediaResource, ResolutionError> {
    let line = stdout
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with('{'))
        .ok_or_else(|| ResolutionError::NoMatch(request.to_string()))?;

    let info: YtDlpInfo = serde_json::from_str(line)?;
    Ok(info.into_resource(request, output_dir))
}

impl YtDlpInfo {
    fn into_resource(self, request: &str, output_dir: &Path) -> MediaResource {
        let local_path = self
            .filename
            .or(self.legacy_filename)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let ext = self.ext.as_deref().unwrap_or("m4a");
                output_dir.join(format!("{}.{}", self.id, ext))
            });

        let thumbnail = self.thumbnail.or_else(|| {
            // La última suele ser la de mayor calidad
            self.thumbnails
                .unwrap_or_default()
                .into_iter()
                .rev()
                .find_map(|thumb| thumb.url)
        });

        let mut resource = MediaResource::new(
            local_path,
            self.title,
            self.webpage_url.unwrap_or_else(|| request.to_string()),
        );
        if let Some(thumbnail) = thumbnail {
            resource = resource.with_thumbnail(thumbnail);
        }
        if let Some(duration) = self.duration.filter(|d| *d > 0.0) {
            resource = resource.with_duration(Duration::from_secs_f64(duration));
        }
        if let Some(uploader) = self.uploader {
            resource = resource.with_uploader(uploader);
        }
        resource
    }
}
