//! The background engine loop.
//!
//! Hosts the service on a tokio runtime with two cadences: the 1 Hz tick
//! and the 1-minute snapshot save. Both are fixed; the service tolerates
//! drift rather than reconciling against the wall clock. Ctrl-C saves a
//! final snapshot before exiting so a restart resumes close to where the
//! countdown stopped.

use std::time::Duration;

use focusguard_core::Event;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const TICK_PERIOD: Duration = Duration::from_secs(1);
const SAVE_PERIOD: Duration = Duration::from_secs(60);

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut service = super::open_service()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut events = service.subscribe();

        let mut tick = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut save = interval_at(Instant::now() + SAVE_PERIOD, SAVE_PERIOD);
        save.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("focusguard engine running");
        loop {
            tokio::select! {
                _ = tick.tick() => service.tick(),
                _ = save.tick() => service.save_snapshot(),
                event = events.recv() => match event {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "event subscriber lagged");
                    }
                    Err(RecvError::Closed) => {}
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutting down");
                    service.save_snapshot();
                    break;
                }
            }
        }
        Ok(())
    })
}

fn log_event(event: &Event) {
    match event {
        Event::NotificationRequested { message, chime, .. } => {
            tracing::info!(%message, chime, "notification requested");
        }
        Event::StateUpdate { .. } => {
            tracing::trace!("state update broadcast");
        }
        other => tracing::debug!(event = ?other, "event"),
    }
}
