//! Playback session tests
//!
//! Player processes are scripted: each run stays pending until the test
//! completes or fails it, and resolves as cancelled when its session is
//! stopped or replaced.

mod helpers;

use helpers::{player, wait_for_event, ScriptedRunner};
use remplay::player::PlayerEvent;
use remplay_common::ProcessError;

#[tokio::test]
async fn test_stop_while_idle_is_noop() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());

    assert!(!player.stop());
    assert!(player.current().is_none());
    assert_eq!(runner.run_count(), 0);
}

#[tokio::test]
async fn test_play_records_session_immediately() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let track = player.library().get(0).unwrap().clone();

    player.play(&track);

    assert_eq!(player.current(), Some(track.clone()));
    runner.wait_for_runs(1).await;
    assert_eq!(runner.played_files(), vec![track.path]);
}

#[tokio::test]
async fn test_play_replaces_current_session() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let first = player.library().get(0).unwrap().clone();
    let second = player.library().get(1).unwrap().clone();

    player.play(&first);
    runner.wait_for_runs(1).await;
    player.play(&second);

    wait_for_event(&mut events, |e| *e == PlayerEvent::Superseded { position: 0 }).await;
    runner.wait_for_runs(2).await;

    assert_eq!(player.current(), Some(second.clone()));
    assert_eq!(runner.played_files(), vec![first.path, second.path]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_natural_completion_advances_once() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let first = player.library().get(0).unwrap().clone();
    let second = player.library().get(1).unwrap().clone();

    player.play(&first);
    runner.wait_for_runs(1).await;
    runner.complete(0);

    wait_for_event(&mut events, |e| *e == PlayerEvent::Finished { position: 0 }).await;
    wait_for_event(&mut events, |e| matches!(e, PlayerEvent::Started { position: 1, .. })).await;
    runner.wait_for_runs(2).await;
    assert_eq!(player.current(), Some(second.clone()));

    assert!(player.stop());
    wait_for_event(&mut events, |e| *e == PlayerEvent::Superseded { position: 1 }).await;

    assert_eq!(runner.run_count(), 2);
    assert_eq!(runner.played_files(), vec![first.path, second.path]);
    assert!(player.current().is_none());
}

#[tokio::test]
async fn test_last_track_goes_idle() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let last = player.library().get(2).unwrap().clone();

    player.play(&last);
    runner.wait_for_runs(1).await;
    runner.complete(0);

    wait_for_event(&mut events, |e| *e == PlayerEvent::Idle).await;

    assert!(player.current().is_none());
    assert_eq!(runner.run_count(), 1);
}

#[tokio::test]
async fn test_stop_prevents_advance() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let first = player.library().get(0).unwrap().clone();

    player.play(&first);
    runner.wait_for_runs(1).await;

    assert!(player.stop());
    assert!(player.current().is_none());
    wait_for_event(&mut events, |e| *e == PlayerEvent::Superseded { position: 0 }).await;

    // Too late: the run already resolved as cancelled
    runner.complete(0);

    assert_eq!(runner.run_count(), 1);
    assert!(player.current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stale_completion_does_not_advance() {
    // The first player exits normally even though it was replaced
    let runner = ScriptedRunner::ignoring_cancellation();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let first = player.library().get(0).unwrap().clone();
    let third = player.library().get(2).unwrap().clone();

    player.play(&first);
    runner.wait_for_runs(1).await;
    player.play(&third);
    runner.wait_for_runs(2).await;

    runner.complete(0);
    wait_for_event(&mut events, |e| *e == PlayerEvent::Superseded { position: 0 }).await;

    assert_eq!(player.current(), Some(third.clone()));
    assert_eq!(runner.run_count(), 2);
    assert_eq!(runner.played_files(), vec![first.path, third.path]);
}

#[tokio::test]
async fn test_failure_goes_idle_without_advance() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let first = player.library().get(0).unwrap().clone();

    player.play(&first);
    runner.wait_for_runs(1).await;
    runner.fail(
        0,
        ProcessError::ExitStatus {
            program: "mplayer".to_string(),
            code: 1,
            stderr: "cannot open audio device".to_string(),
        },
    );

    let event =
        wait_for_event(&mut events, |e| matches!(e, PlayerEvent::Failed { position: 0, .. })).await;
    if let PlayerEvent::Failed { error, .. } = event {
        assert!(error.contains("mplayer"));
    }

    assert!(player.current().is_none());
    assert_eq!(runner.run_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rapid_requests_leave_one_session() {
    let runner = ScriptedRunner::new();
    let player = player(runner.clone());
    let mut events = player.subscribe();
    let tracks: Vec<_> = player.library().iter().cloned().collect();

    for track in &tracks {
        player.play(track);
    }
    runner.wait_for_runs(tracks.len()).await;
    assert_eq!(player.current(), tracks.last().cloned());

    // Only the surviving session may finish and settle
    let last = tracks.last().unwrap();
    runner.complete_file(&last.path);

    let mut pending = vec![
        PlayerEvent::Superseded { position: 0 },
        PlayerEvent::Superseded { position: 1 },
        PlayerEvent::Idle,
    ];
    while !pending.is_empty() {
        let event = wait_for_event(&mut events, |e| pending.contains(e)).await;
        pending.retain(|e| *e != event);
    }

    assert!(player.current().is_none());
    assert_eq!(runner.run_count(), tracks.len());
}
