//! Player controller
//!
//! Two states: idle (no session) and playing (exactly one session). Each
//! session owns a [`CancellationToken`] and a generation number. Starting or
//! stopping always clears the current session *and then* cancels its token
//! while holding the state lock, so by the time the old player task wakes
//! up, the session it belongs to is already gone.
//!
//! When a player task finishes it re-checks its generation under the same
//! lock. Only a task whose generation is still current may clear the state
//! and start the successor track; anything else is a superseded session and
//! leaves the state alone. This is what keeps two players from ever running
//! at once and guarantees one auto-advance per natural completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use remplay_common::{CommandTemplate, ProcessError, ProcessRunner};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::events::PlayerEvent;
use crate::library::{LibraryIndex, Track};

/// Event channel capacity
const EVENT_BUFFER: usize = 64;

/// The live playback session
struct Session {
    generation: u64,
    track: Track,
    token: CancellationToken,
}

/// A session that has been recorded but whose player is not yet spawned
struct Launch {
    generation: u64,
    track: Track,
    token: CancellationToken,
}

#[derive(Default)]
struct SessionState {
    current: Option<Session>,
    generation: u64,
}

impl SessionState {
    /// Clear the current session, then cancel its token
    fn take_current(&mut self) -> Option<Session> {
        let session = self.current.take()?;
        session.token.cancel();
        Some(session)
    }

    /// Record a new session for `track`
    fn begin(&mut self, track: Track) -> Launch {
        self.generation += 1;
        let token = CancellationToken::new();

        self.current = Some(Session {
            generation: self.generation,
            track: track.clone(),
            token: token.clone(),
        });

        Launch {
            generation: self.generation,
            track,
            token,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|session| session.generation == generation)
    }
}

struct Inner {
    library: Arc<LibraryIndex>,
    runner: Arc<dyn ProcessRunner>,
    command: CommandTemplate,
    state: Mutex<SessionState>,
    event_tx: broadcast::Sender<PlayerEvent>,
}

/// Owns the playback session
///
/// Cloning is cheap and every clone drives the same session.
#[derive(Clone)]
pub struct PlayerController {
    inner: Arc<Inner>,
}

impl PlayerController {
    /// Create an idle controller
    ///
    /// `command` is rendered with `{file}` set to the track's full path.
    pub fn new(
        library: Arc<LibraryIndex>,
        runner: Arc<dyn ProcessRunner>,
        command: CommandTemplate,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(Inner {
                library,
                runner,
                command,
                state: Mutex::new(SessionState::default()),
                event_tx,
            }),
        }
    }

    /// Start playing `track`, replacing whatever is playing
    ///
    /// Returns as soon as the new session is recorded; the player process
    /// runs on a spawned task. Must be called inside a Tokio runtime.
    pub fn play(&self, track: &Track) {
        let (replaced, launch) = {
            let mut state = self.lock_state();
            let replaced = state.take_current();
            (replaced, state.begin(track.clone()))
        };

        if let Some(old) = replaced {
            debug!(
                position = old.track.position,
                generation = old.generation,
                "Replacing current session"
            );
        }

        self.launch(launch);
    }

    /// Stop the current session, if any
    ///
    /// Returns whether a session was stopped. Stopping never auto-advances.
    pub fn stop(&self) -> bool {
        let stopped = self.lock_state().take_current();

        match stopped {
            Some(session) => {
                info!(file = %session.track.short_path, "Stopped playback");
                self.broadcast(PlayerEvent::Stopped {
                    position: session.track.position,
                });
                true
            }
            None => {
                debug!("Stop requested while idle");
                false
            }
        }
    }

    /// Track of the current session
    pub fn current(&self) -> Option<Track> {
        self.lock_state()
            .current
            .as_ref()
            .map(|session| session.track.clone())
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn library(&self) -> &Arc<LibraryIndex> {
        &self.inner.library
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        // The state is a plain value; a panic elsewhere cannot leave it torn
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn broadcast(&self, event: PlayerEvent) {
        // No receivers is fine
        let _ = self.inner.event_tx.send(event);
    }

    fn launch(&self, launch: Launch) {
        info!(
            position = launch.track.position,
            artist = launch.track.artist().unwrap_or("-"),
            album = launch.track.album().unwrap_or("-"),
            file = %launch.track.short_path,
            "Starting playback"
        );
        self.broadcast(PlayerEvent::Started {
            position: launch.track.position,
            short_path: launch.track.short_path.clone(),
        });

        let controller = self.clone();
        tokio::spawn(async move {
            let invocation = controller
                .inner
                .command
                .render(&[("file", launch.track.path.as_str())]);
            let result = controller
                .inner
                .runner
                .run(&invocation, Some(launch.token))
                .await;
            controller.finish(launch.generation, launch.track, result);
        });
    }

    /// Completion handler for a player task
    fn finish(&self, generation: u64, track: Track, result: Result<String, ProcessError>) {
        let cancelled = matches!(&result, Err(e) if e.is_cancelled());

        let (was_current, next) = {
            let mut state = self.lock_state();
            if !state.is_current(generation) {
                (false, None)
            } else {
                state.current = None;
                let next = match &result {
                    Ok(_) => self
                        .inner
                        .library
                        .successor(track.position)
                        .map(|next| state.begin(next.clone())),
                    Err(_) => None,
                };
                (true, next)
            }
        };

        if cancelled || !was_current {
            if cancelled && was_current {
                warn!(
                    position = track.position,
                    "Session cancelled without a replacement; now idle"
                );
            } else {
                debug!(
                    position = track.position,
                    generation,
                    cancelled,
                    "Superseded session ended"
                );
            }
            self.broadcast(PlayerEvent::Superseded {
                position: track.position,
            });
            return;
        }

        match result {
            Ok(_) => {
                info!(file = %track.short_path, "Track finished");
                self.broadcast(PlayerEvent::Finished {
                    position: track.position,
                });

                match next {
                    Some(launch) => self.launch(launch),
                    None => {
                        info!("Reached end of library");
                        self.broadcast(PlayerEvent::Idle);
                    }
                }
            }
            Err(e) => {
                error!(file = %track.short_path, error = %e, "Playback failed");
                self.broadcast(PlayerEvent::Failed {
                    position: track.position,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(position: usize) -> Track {
        Track {
            position,
            path: format!("/m/{position}.mp3"),
            short_path: format!("{position}.mp3"),
        }
    }

    #[test]
    fn test_take_current_clears_then_cancels() {
        let mut state = SessionState::default();
        let launch = state.begin(track(0));

        let taken = state.take_current().expect("session should exist");
        assert!(state.current.is_none());
        assert!(taken.token.is_cancelled());
        assert!(launch.token.is_cancelled());
    }

    #[test]
    fn test_take_current_on_idle() {
        let mut state = SessionState::default();
        assert!(state.take_current().is_none());
    }

    #[test]
    fn test_generations_increase() {
        let mut state = SessionState::default();
        let first = state.begin(track(0));
        let second = state.begin(track(1));

        assert!(second.generation > first.generation);
        assert!(!state.is_current(first.generation));
        assert!(state.is_current(second.generation));
    }

    #[test]
    fn test_new_token_is_live() {
        let mut state = SessionState::default();
        let launch = state.begin(track(0));
        assert!(!launch.token.is_cancelled());
    }
}
