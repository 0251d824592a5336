//! Integration tests for the full work/break cycle.
//!
//! These drive the service the way the daemon does - commands plus a
//! stream of 1 Hz ticks - and check the timer, the blocking rule set and
//! the focus ledger stay consistent through phase transitions.

use focusguard_core::{
    Command, Database, Event, MemoryBackend, Phase, Response, Settings, SettingsPatch,
    TimerService,
};

fn service() -> (TimerService, MemoryBackend, tempfile::TempDir) {
    let backend = MemoryBackend::new();
    let dir = tempfile::tempdir().unwrap();
    let service = TimerService::new(
        Database::open_memory().unwrap(),
        Settings::default(),
        dir.path().join("config.toml"),
        Box::new(backend.clone()),
    );
    (service, backend, dir)
}

fn tick_n(service: &mut TimerService, n: u32) {
    for _ in 0..n {
        service.tick();
    }
}

#[test]
fn full_focus_phase_takes_exactly_1500_ticks() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::StartTimer);

    tick_n(&mut service, 1499);
    let state = service.full_state().timer;
    assert_eq!(state.phase, Phase::Focus);
    assert_eq!(state.time_left_secs, 1);

    // The 1500th tick crosses zero and transitions atomically.
    service.tick();
    let state = service.full_state().timer;
    assert_eq!(state.phase, Phase::ShortBreak);
    assert_eq!(state.time_left_secs, 5 * 60);
    assert_eq!(state.completed_focus_cycles, 1);
    assert!(state.is_running);
}

#[test]
fn completed_focus_credits_the_ledger_once() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::StartTimer);
    tick_n(&mut service, 1500);

    assert_eq!(service.stats().today_focused_secs(), 1500);

    // Finishing the break credits nothing.
    tick_n(&mut service, 5 * 60);
    assert_eq!(service.full_state().timer.phase, Phase::Focus);
    assert_eq!(service.stats().today_focused_secs(), 1500);
}

#[test]
fn long_break_after_every_fourth_cycle() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::UpdateSettings {
        settings: SettingsPatch {
            focus_minutes: Some(1),
            short_break_minutes: Some(1),
            long_break_minutes: Some(2),
            ..Default::default()
        },
    });
    service.dispatch(Command::ResetTimer);
    service.dispatch(Command::StartTimer);

    let mut observed = Vec::new();
    for _ in 0..5 {
        tick_n(&mut service, 60); // finish the focus minute
        observed.push(service.full_state().timer.phase);
        let break_secs = service.full_state().timer.time_left_secs;
        tick_n(&mut service, break_secs); // finish the break
    }

    assert_eq!(
        observed,
        vec![
            Phase::ShortBreak,
            Phase::ShortBreak,
            Phase::ShortBreak,
            Phase::LongBreak,
            Phase::ShortBreak,
        ]
    );
}

#[test]
fn blocking_rules_follow_the_phase() {
    let (mut service, backend, _dir) = service();
    assert!(backend.installed().is_empty());

    service.dispatch(Command::StartTimer);
    assert_eq!(backend.installed().len(), 4);

    // Entering the break removes every rule.
    tick_n(&mut service, 1500);
    assert_eq!(service.full_state().timer.phase, Phase::ShortBreak);
    assert!(backend.installed().is_empty());

    // Re-entering focus reinstalls the full set.
    tick_n(&mut service, 5 * 60);
    assert_eq!(service.full_state().timer.phase, Phase::Focus);
    assert_eq!(backend.installed().len(), 4);

    service.dispatch(Command::ResetTimer);
    assert!(backend.installed().is_empty());
}

#[test]
fn reset_from_any_state_leaves_zero_rules() {
    let (mut service, backend, _dir) = service();

    // Idle reset.
    service.dispatch(Command::ResetTimer);
    assert!(backend.installed().is_empty());

    // Paused mid-focus.
    service.dispatch(Command::StartTimer);
    service.dispatch(Command::PauseTimer);
    service.dispatch(Command::ResetTimer);
    assert!(backend.installed().is_empty());
    let state = service.full_state().timer;
    assert!(!state.is_running);
    assert!(!state.is_paused);
    assert_eq!(state.phase, Phase::Focus);
}

#[test]
fn start_twice_matches_start_once() {
    let (mut service, backend, _dir) = service();
    service.dispatch(Command::StartTimer);
    let once = service.full_state().timer;
    let rules_once = backend.installed();

    service.dispatch(Command::StartTimer);
    assert_eq!(service.full_state().timer, once);
    assert_eq!(backend.installed(), rules_once);
}

#[test]
fn pause_suspends_ticking_without_losing_time() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::StartTimer);
    tick_n(&mut service, 10);

    service.dispatch(Command::PauseTimer);
    tick_n(&mut service, 100);
    let state = service.full_state().timer;
    assert!(state.is_running);
    assert!(state.is_paused);
    assert_eq!(state.time_left_secs, 25 * 60 - 10);

    service.dispatch(Command::PauseTimer);
    service.tick();
    assert_eq!(service.full_state().timer.time_left_secs, 25 * 60 - 11);
}

#[test]
fn set_duration_only_while_idle() {
    let (mut service, _backend, _dir) = service();

    service.dispatch(Command::SetTimerDuration {
        minutes: 10,
        mode: Some(Phase::LongBreak),
    });
    let state = service.full_state().timer;
    assert_eq!(state.phase, Phase::LongBreak);
    assert_eq!(state.time_left_secs, 10 * 60);

    service.dispatch(Command::StartTimer);
    let response = service.dispatch(Command::SetTimerDuration {
        minutes: 1,
        mode: None,
    });
    assert!(matches!(response, Response::Ack { success: true }));
    assert_eq!(service.full_state().timer.time_left_secs, 10 * 60);
}

#[test]
fn every_mutation_broadcasts_the_full_state() {
    let (mut service, _backend, _dir) = service();
    let mut rx = service.subscribe();

    service.dispatch(Command::StartTimer);
    let mut saw_state_update = false;
    while let Ok(event) = rx.try_recv() {
        if let Event::StateUpdate { state, .. } = event {
            assert!(state.timer.is_running);
            assert_eq!(state.settings.focus_minutes, 25);
            saw_state_update = true;
        }
    }
    assert!(saw_state_update);
}

#[test]
fn completion_requests_a_notification_when_enabled() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::StartTimer);
    tick_n(&mut service, 1499);

    let mut rx = service.subscribe();
    service.tick();

    let mut message = None;
    while let Ok(event) = rx.try_recv() {
        if let Event::NotificationRequested { message: m, chime, .. } = event {
            assert!(chime);
            message = Some(m);
        }
    }
    assert_eq!(
        message.as_deref(),
        Some("Focus session complete! Time for a break.")
    );
}

#[test]
fn notifications_can_be_disabled() {
    let (mut service, _backend, _dir) = service();
    service.dispatch(Command::UpdateSettings {
        settings: SettingsPatch {
            enable_notifications: Some(false),
            ..Default::default()
        },
    });
    service.dispatch(Command::StartTimer);
    tick_n(&mut service, 1499);

    let mut rx = service.subscribe();
    service.tick();

    while let Ok(event) = rx.try_recv() {
        assert!(!matches!(event, Event::NotificationRequested { .. }));
    }
    assert_eq!(service.full_state().timer.phase, Phase::ShortBreak);
}
