use log::info;
use std::time::{Duration, Instant};

use crate::firework_engine::{
    fleet::{Fleet, RocketId},
    spawn_policy::InputEvent,
    types::{TickReport, Timestamp},
};
use crate::scene_engine::SceneBackend;

/// Cumul des bilans de tick depuis le début du spectacle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShowMetrics {
    pub frames: u64,
    pub spawned: u64,
    pub launched: u64,
    pub explosions: u64,
    pub cleaned_up: u64,
    pub max_live: usize,
}

impl ShowMetrics {
    fn accumulate(&mut self, report: &TickReport) {
        self.frames += 1;
        self.spawned += report.spawned as u64;
        self.launched += report.launched as u64;
        self.explosions += report.explosions_started as u64;
        self.cleaned_up += report.cleaned_up as u64;
        self.max_live = self.max_live.max(report.live);
    }
}

/// Boucle de frames du spectacle : un `now` échantillonné une seule fois par
/// frame, puis simulation de la scène et tick de la flotte.
pub struct Show<S>
where
    S: SceneBackend,
{
    scene: S,
    fleet: Fleet,

    metrics: ShowMetrics,
    last_now: Option<Timestamp>,
    last_log: Option<Timestamp>,
    last_report: TickReport,
}

impl<S> Show<S>
where
    S: SceneBackend,
{
    pub fn new(scene: S, fleet: Fleet) -> Self {
        Self {
            scene,
            fleet,
            metrics: ShowMetrics::default(),
            last_now: None,
            last_log: None,
            last_report: TickReport::default(),
        }
    }

    /// Une frame à l'instant `now`.
    pub fn step(&mut self, now: Timestamp) -> TickReport {
        debug_assert!(
            !matches!(self.last_now, Some(last) if now < last),
            "show clock went backwards"
        );
        self.last_now = Some(now);

        self.scene.step_simulation(now);
        let report = self.fleet.tick(now, &mut self.scene);
        self.metrics.accumulate(&report);
        self.last_report = report;

        // affichage périodique
        let interval = self.fleet.config().metrics_interval_ms;
        match self.last_log {
            Some(last) if now.saturating_sub(last) < interval => {}
            _ => {
                self.log_metrics(now);
                self.last_log = Some(now);
            }
        }

        report
    }

    /// Transmet un événement d'entrée à la flotte.
    pub fn handle_input(&mut self, event: &InputEvent) -> Option<RocketId> {
        self.fleet.handle_input(&mut self.scene, event)
    }

    /// Joue `duration_ms` de spectacle avec une horloge simulée, une frame
    /// toutes les `frame_ms`, à la suite de la dernière frame jouée.
    pub fn run_simulated(&mut self, duration_ms: Timestamp, frame_ms: Timestamp) -> ShowMetrics {
        let frame_ms = frame_ms.max(1);
        let start = self.last_now.map_or(0, |last| last + frame_ms);
        let mut now = start;
        while now <= start + duration_ms {
            self.step(now);
            now += frame_ms;
        }
        self.metrics
    }

    /// Joue `duration` en temps réel (horloge monotone), en dormant entre
    /// deux frames.
    pub fn run_realtime(&mut self, duration: Duration, frame: Duration) -> ShowMetrics {
        let origin = Instant::now();
        let offset = self.last_now.map_or(0, |last| last + 1);
        while origin.elapsed() < duration {
            let frame_start = Instant::now();
            self.step(offset + origin.elapsed().as_millis() as Timestamp);
            if let Some(remaining) = frame.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        self.metrics
    }

    fn log_metrics(&self, now: Timestamp) {
        info!(
            "🎆 t={:>7} ms | live: {:>3} | spawned: {} | exploded: {} | cleaned up: {} | frames: {}",
            now,
            self.last_report.live,
            self.metrics.spawned,
            self.metrics.explosions,
            self.metrics.cleaned_up,
            self.metrics.frames
        );
    }

    pub fn metrics(&self) -> ShowMetrics {
        self.metrics
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn fleet_mut(&mut self) -> &mut Fleet {
        &mut self.fleet
    }

    /// Sépare le spectacle en ses deux composants.
    pub fn into_parts(self) -> (S, Fleet) {
        (self.scene, self.fleet)
    }
}
