use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Directorio de descargas compartido por todos los servidores.
///
/// Each guild gets its own subdirectory so the same video requested in two
/// guilds never shares a file across queues.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub async fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root).await?;
        info!("📁 Almacenamiento de audio en: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Devuelve (y crea si falta) el directorio de un servidor
    pub async fn guild_dir(&self, tag: &str) -> std::io::Result<PathBuf> {
        let dir = self.root.join(tag);
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Elimina archivos que quedaron de una ejecución anterior
    pub async fn purge(&self) -> Result<usize> {
        let mut removed = 0;
        let mut guilds = fs::read_dir(&self.root).await?;

        while let Some(guild_dir) = guilds.next_entry().await? {
            if !guild_dir.file_type().await?.is_dir() {
                continue;
            }
            let mut files = fs::read_dir(guild_dir.path()).await?;
            while let Some(file) = files.next_entry().await? {
                if file.file_type().await?.is_file() && release(&file.path()).await {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!("🧹 Eliminados {} archivos de audio huérfanos", removed);
        }
        Ok(removed)
    }
}

/// Escribe el archivo de cookies si todavía no existe.
///
/// An existing file is never overwritten. Returns `true` if it was written.
pub async fn write_cookies(path: &Path, data: &str) -> Result<bool> {
    if is_available(path).await {
        debug!("🍪 {} ya existe, no se sobrescribe", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    info!("🍪 Cookies escritas en {}", path.display());
    Ok(true)
}

/// Verifica que el archivo siga existiendo en disco
pub async fn is_available(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Borra un archivo local ya reproducido. Devuelve `true` si se eliminó.
pub async fn release(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("🗑️ Archivo eliminado: {}", path.display());
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("⚠️ No se pudo eliminar {}: {}", path.display(), e);
            false
        }
    }
}
