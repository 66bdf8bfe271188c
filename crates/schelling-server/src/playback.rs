//! Play/pause state and the timer that steps the simulation while playing.

use crate::api::AppState;
use schelling_core::PlaybackConfig;
use schelling_world::StepOutcome;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

pub struct Playback {
    playing: AtomicBool,
    config: PlaybackConfig,
}

impl Playback {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            playing: AtomicBool::new(false),
            config,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn play(&self) {
        self.playing.store(true, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.config.tick_interval_ms.max(1))
    }
}

/// Advance once if playing. Pauses when a step moves nobody (and auto-pause is on)
/// or when the engine reports an error.
pub fn tick_once(state: &AppState) -> Option<StepOutcome> {
    if !state.playback.is_playing() {
        return None;
    }

    let result = {
        let mut simulation = state.simulation.lock();
        // A pause may have landed while we waited for the lock
        if !state.playback.is_playing() {
            return None;
        }
        simulation
            .step()
            .map(|outcome| (outcome, simulation.tick(), simulation.stats()))
    };

    match result {
        Ok((outcome, tick, stats)) => {
            crate::record_counter!("relocations", outcome.relocations.len(), tick = tick);
            crate::record_gauge!("segregation", stats.segregation, tick = tick);

            if !outcome.moved() && state.playback.config.auto_pause_when_settled {
                state.playback.pause();
                info!(tick, status = ?outcome.status, "Simulation stopped moving, pausing playback");
            }
            Some(outcome)
        }
        Err(e) => {
            state.playback.pause();
            error!("Step failed, pausing playback: {}", e);
            None
        }
    }
}

pub async fn run_playback_loop(state: AppState) {
    let mut ticker = interval(state.playback.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        interval_ms = state.playback.config.tick_interval_ms,
        "Playback loop started"
    );

    loop {
        ticker.tick().await;
        tick_once(&state);
    }
}
