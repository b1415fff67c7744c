//! Shared test fixtures
//!
//! - [`ScriptedRunner`]: a player stand-in whose runs finish only when the
//!   test says so, and which honours cancellation like a real process
//! - [`RecordingRunner`]: records invocations and returns immediately
//! - A three-track library and helpers for waiting on player events

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use remplay::library::LibraryIndex;
use remplay::player::{PlayerController, PlayerEvent};
use remplay_common::{CommandTemplate, Invocation, ProcessError, ProcessRunner};
use tokio::sync::{broadcast, oneshot, watch};
use tokio_util::sync::CancellationToken;

pub const ROOT: &str = "/media/music";

pub const LISTING: &str = "\
/media/music
├── /media/music/Aria
│   └── /media/music/Aria/1986 - Megalomania
│       ├── /media/music/Aria/1986 - Megalomania/01 - Intro.mp3
│       └── /media/music/Aria/1986 - Megalomania/02 - Track Two.mp3
└── /media/music/Kino
    └── /media/music/Kino/1988 - Gruppa krovi
        └── /media/music/Kino/1988 - Gruppa krovi/01 - Gruppa krovi.mp3
";

/// Upper bound for any single wait in a test
pub const WAIT: Duration = Duration::from_secs(5);

pub fn library() -> Arc<LibraryIndex> {
    Arc::new(LibraryIndex::from_listing(ROOT, LISTING))
}

pub fn player_command() -> CommandTemplate {
    CommandTemplate::new("mplayer", &["{file}"])
}

/// One call made to a [`ScriptedRunner`]
struct ScriptedRun {
    invocation: Invocation,
    finish: Option<oneshot::Sender<Result<String, ProcessError>>>,
}

/// Runner whose runs stay pending until completed from the test
pub struct ScriptedRunner {
    runs: Mutex<Vec<ScriptedRun>>,
    count: watch::Sender<usize>,
    honour_cancel: bool,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Self::build(true)
    }

    /// Variant that keeps running after cancellation, like a process that
    /// exits on its own at the same moment it is told to stop
    pub fn ignoring_cancellation() -> Arc<Self> {
        Self::build(false)
    }

    fn build(honour_cancel: bool) -> Arc<Self> {
        let (count, _) = watch::channel(0);
        Arc::new(Self {
            runs: Mutex::new(Vec::new()),
            count,
            honour_cancel,
        })
    }

    /// Number of runs started so far
    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    /// Arguments of every run, in start order
    pub fn played_files(&self) -> Vec<String> {
        self.runs
            .lock()
            .unwrap()
            .iter()
            .map(|run| run.invocation.args.join(" "))
            .collect()
    }

    /// Wait until at least `n` runs have started
    pub async fn wait_for_runs(&self, n: usize) {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(WAIT, rx.wait_for(|count| *count >= n))
            .await
            .expect("timed out waiting for runs")
            .expect("runner dropped");
    }

    /// Let run `index` exit naturally
    pub fn complete(&self, index: usize) {
        self.finish(index, Ok(String::new()));
    }

    /// Let the run playing `file` exit naturally
    pub fn complete_file(&self, file: &str) {
        let index = self
            .played_files()
            .iter()
            .position(|played| played == file)
            .expect("file was never played");
        self.complete(index);
    }

    /// Make run `index` fail
    pub fn fail(&self, index: usize, error: ProcessError) {
        self.finish(index, Err(error));
    }

    fn finish(&self, index: usize, result: Result<String, ProcessError>) {
        let sender = self.runs.lock().unwrap()[index].finish.take();
        if let Some(sender) = sender {
            // The run may already have resolved through cancellation
            let _ = sender.send(result);
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: Option<CancellationToken>,
    ) -> Result<String, ProcessError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut runs = self.runs.lock().unwrap();
            runs.push(ScriptedRun {
                invocation: invocation.clone(),
                finish: Some(tx),
            });
            self.count.send_replace(runs.len());
        }

        let cancelled = async {
            match cancel {
                Some(token) if self.honour_cancel => token.cancelled_owned().await,
                _ => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancelled => Err(ProcessError::Cancelled),
            result = rx => result.unwrap_or(Err(ProcessError::Cancelled)),
        }
    }
}

/// Runner that records calls and returns at once
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    fail: bool,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        _cancel: Option<CancellationToken>,
    ) -> Result<String, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if self.fail {
            return Err(ProcessError::ExitStatus {
                program: invocation.program.clone(),
                code: 1,
                stderr: "mixer unavailable".to_string(),
            });
        }
        Ok(String::new())
    }
}

/// Player over the standard library driven by `runner`
pub fn player(runner: Arc<ScriptedRunner>) -> PlayerController {
    PlayerController::new(library(), runner, player_command())
}

/// Receive events until one matches `predicate`
pub async fn wait_for_event<F>(rx: &mut broadcast::Receiver<PlayerEvent>, predicate: F) -> PlayerEvent
where
    F: Fn(&PlayerEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for player event")
}
