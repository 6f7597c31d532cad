use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::VecDeque,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};

use crate::sources::MediaResource;

/// Identificador único de una entrada dentro de su cola
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

/// Eventos que se notifican a quien pidió la canción
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    Started(MediaResource),
    Failed { request: String, reason: String },
}

/// Referencia de vuelta a quien encoló la canción (comando, interacción...).
///
/// The queue never inspects it; it only forwards playback events.
#[async_trait]
pub trait Origin: Send + Sync {
    async fn notify(&self, event: PlaybackEvent);
}

/// Una canción en la cola de un servidor
#[derive(Clone)]
pub struct QueueEntry<T> {
    pub(crate) id: EntryId,
    pub request: String,
    pub resource: MediaResource,
    pub target: T,
    pub origin: Arc<dyn Origin>,
    pub enqueued_at: DateTime<Utc>,
}

impl<T> QueueEntry<T> {
    pub fn new(request: impl Into<String>, resource: MediaResource, target: T, origin: Arc<dyn Origin>) -> Self {
        Self {
            id: EntryId(0),
            request: request.into(),
            resource,
            target,
            origin,
            enqueued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }
}

impl<T: fmt::Debug> fmt::Debug for QueueEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("resource", &self.resource)
            .field("target", &self.target)
            .field("enqueued_at", &self.enqueued_at)
            .finish_non_exhaustive()
    }
}

/// Fase del play-loop. Cualquier fase distinta de `Idle` significa que hay un
/// loop corriendo para la cola.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Idle,
    Preparing,
    Streaming,
    Finishing,
}

/// Estado protegido por el lock de cada [`GuildQueue`](super::player::GuildQueue).
///
/// The head of `entries` is the entry being played (or about to be): it is only
/// popped once its playback is finished, so a snapshot always shows what is
/// really playing.
#[derive(Debug)]
pub struct QueueState<T> {
    entries: VecDeque<QueueEntry<T>>,
    phase: PlayerPhase,
    /// Entrada a la que va dirigido el skip pendiente
    skip_requested: Option<EntryId>,
    stop_requested: bool,
    current: Option<EntryId>,
    next_id: u64,
}

impl<T: Clone> QueueState<T> {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            phase: PlayerPhase::Idle,
            skip_requested: None,
            stop_requested: false,
            current: None,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase != PlayerPhase::Idle
    }

    pub fn snapshot(&self) -> Vec<QueueEntry<T>> {
        self.entries.iter().cloned().collect()
    }

    /// Agrega al final. Devuelve `true` si hay que arrancar un play-loop
    pub fn push(&mut self, mut entry: QueueEntry<T>) -> bool {
        entry.id = EntryId(self.next_id);
        self.next_id += 1;
        info!("➕ Agregado a la cola: {}", entry.resource.title);
        self.entries.push_back(entry);

        if self.phase == PlayerPhase::Idle {
            self.phase = PlayerPhase::Preparing;
            true
        } else {
            false
        }
    }

    /// Toma la cabeza para reproducirla, o pasa a `Idle` si no queda nada.
    ///
    /// Returning `None` is the only way the loop ends, and it happens under the
    /// same lock that `push` takes, so no entry can be left behind without a loop.
    /// A pending skip survives only if it targets the new head.
    pub fn begin_next(&mut self) -> Option<QueueEntry<T>> {
        if self.stop_requested {
            self.stop_requested = false;
            self.skip_requested = None;
        }

        match self.entries.front() {
            Some(head) => {
                let head_id = head.id;
                self.skip_requested = self.skip_requested.filter(|target| *target == head_id);
                self.phase = PlayerPhase::Preparing;
                self.current = Some(head_id);
                Some(head.clone())
            }
            None => {
                self.phase = PlayerPhase::Idle;
                self.skip_requested = None;
                self.current = None;
                debug!("📭 Cola vacía, play-loop terminado");
                None
            }
        }
    }

    pub fn set_phase(&mut self, phase: PlayerPhase) {
        self.phase = phase;
    }

    /// La entrada sigue siendo la cabeza y nadie pidió detener
    pub fn is_still_wanted(&self, id: EntryId) -> bool {
        !self.stop_requested && self.entries.front().map(|e| e.id) == Some(id)
    }

    pub fn replace_resource(&mut self, id: EntryId, resource: MediaResource) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.resource = resource;
        }
    }

    /// Quita la cabeza solo si sigue siendo la entrada indicada
    pub fn pop_if_head(&mut self, id: EntryId) -> Option<QueueEntry<T>> {
        if self.entries.front().map(|e| e.id) == Some(id) {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn is_referenced(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.resource.local_path == path)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Marca la cabeza actual para saltarla. Devuelve `false` si no hay loop
    pub fn request_skip(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.entries.front() {
            Some(head) => {
                self.skip_requested = Some(head.id);
                true
            }
            None => false,
        }
    }

    /// Consume el skip solo si va dirigido a `id`
    pub fn take_skip(&mut self, id: EntryId) -> bool {
        if self.skip_requested == Some(id) {
            self.skip_requested = None;
            true
        } else {
            false
        }
    }

    /// Vacía la cola y marca la parada del loop en curso.
    ///
    /// Returns the files of the discarded entries that are safe to delete now:
    /// the entry currently in flight keeps its file until the loop finishes it.
    pub fn stop(&mut self) -> (usize, Vec<PathBuf>) {
        if self.is_running() {
            self.stop_requested = true;
            self.skip_requested = self.current;
        }

        let in_flight = self
            .current
            .and_then(|id| self.entries.iter().find(|e| e.id == id))
            .map(|e| e.resource.local_path.clone());

        let discarded: Vec<_> = self.entries.drain(..).collect();
        let mut releasable: Vec<PathBuf> = Vec::new();
        for entry in &discarded {
            let path = &entry.resource.local_path;
            if in_flight.as_ref() != Some(path) && !releasable.contains(path) {
                releasable.push(path.clone());
            }
        }

        info!("🗑️ Cola limpiada: {} canciones descartadas", discarded.len());
        (discarded.len(), releasable)
    }
}

impl<T: Clone> Default for QueueState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Silent;

    #[async_trait]
    impl Origin for Silent {
        async fn notify(&self, _event: PlaybackEvent) {}
    }

    fn entry(title: &str, path: &str) -> QueueEntry<()> {
        QueueEntry::new(
            title,
            MediaResource::new(path, title, format!("https://youtu.be/{}", title)),
            (),
            Arc::new(Silent),
        )
    }

    fn titles(state: &QueueState<()>) -> Vec<String> {
        state.snapshot().into_iter().map(|e| e.resource.title).collect()
    }

    #[test]
    fn test_push_starts_loop_only_once() {
        let mut state = QueueState::new();

        assert!(state.push(entry("a", "/a")));
        assert!(!state.push(entry("b", "/b")));
        assert_eq!(state.phase(), PlayerPhase::Preparing);
        assert_eq!(titles(&state), vec!["a", "b"]);
    }

    #[test]
    fn test_begin_next_keeps_head_until_popped() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        state.push(entry("b", "/b"));

        let head = state.begin_next().unwrap();
        assert_eq!(head.resource.title, "a");
        assert_eq!(state.len(), 2);

        assert!(state.pop_if_head(head.id()).is_some());
        assert_eq!(titles(&state), vec!["b"]);
    }

    #[test]
    fn test_begin_next_on_empty_goes_idle() {
        let mut state = QueueState::new();
        let first = {
            state.push(entry("a", "/a"));
            state.begin_next().unwrap()
        };
        state.pop_if_head(first.id());

        assert!(state.begin_next().is_none());
        assert_eq!(state.phase(), PlayerPhase::Idle);
        assert!(state.push(entry("b", "/b")));
    }

    #[test]
    fn test_pop_if_head_ignores_other_entries() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        let head = state.begin_next().unwrap();
        state.stop();
        state.push(entry("b", "/b"));

        assert!(state.pop_if_head(head.id()).is_none());
        assert_eq!(titles(&state), vec!["b"]);
    }

    #[test]
    fn test_skip_is_ignored_while_idle() {
        let mut state: QueueState<()> = QueueState::new();
        assert!(!state.request_skip());

        state.push(entry("a", "/a"));
        let head = state.begin_next().unwrap();
        assert!(state.request_skip());
        assert!(state.take_skip(head.id()));
        assert!(!state.take_skip(head.id()));
    }

    #[test]
    fn test_skip_of_finished_entry_does_not_reach_next() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        state.push(entry("b", "/b"));
        let a = state.begin_next().unwrap();

        // a ya terminó sola pero sigue en cabeza mientras se cierra la conexión
        assert!(state.request_skip());
        state.pop_if_head(a.id());
        let b = state.begin_next().unwrap();

        assert_eq!(b.resource.title, "b");
        assert!(!state.take_skip(b.id()));
    }

    #[test]
    fn test_skip_after_pop_targets_new_head() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        state.push(entry("b", "/b"));
        let a = state.begin_next().unwrap();
        state.pop_if_head(a.id());

        assert!(state.request_skip());
        let b = state.begin_next().unwrap();

        assert!(!state.take_skip(a.id()));
        assert!(state.take_skip(b.id()));
    }

    #[test]
    fn test_stop_keeps_in_flight_file() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        state.push(entry("b", "/b"));
        state.push(entry("b-again", "/b"));
        state.push(entry("a-again", "/a"));
        let head = state.begin_next().unwrap();

        let (discarded, releasable) = state.stop();

        assert_eq!(discarded, 4);
        assert_eq!(releasable, vec![PathBuf::from("/b")]);
        assert!(state.snapshot().is_empty());
        assert!(!state.is_still_wanted(head.id()));
        assert!(state.take_skip(head.id()));
    }

    #[test]
    fn test_stop_clears_flags_on_next_cycle() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        state.begin_next();
        state.stop();
        assert!(state.stop_requested());

        state.push(entry("c", "/c"));
        let next = state.begin_next().unwrap();

        assert_eq!(next.resource.title, "c");
        assert!(!state.stop_requested());
        assert!(!state.take_skip(next.id()));
    }

    #[test]
    fn test_is_referenced_and_replace() {
        let mut state = QueueState::new();
        state.push(entry("a", "/a"));
        let head = state.begin_next().unwrap();

        state.replace_resource(head.id(), MediaResource::new("/a2", "a", "https://youtu.be/a"));

        assert!(!state.is_referenced(Path::new("/a")));
        assert!(state.is_referenced(Path::new("/a2")));
    }
}
