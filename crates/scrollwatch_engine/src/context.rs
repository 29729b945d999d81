//! Per-container observation state
//!
//! Everything one scroll container observes with lives here, created at
//! mount and dropped with the container: the gesture direction, the DPR
//! calibration, the watch set, next-frame work, the registered points and
//! the element registry. Nothing is process-global, so several containers
//! can run side by side.

use scrollwatch_core::{Direction, DirectionTracker, FrameScheduler, Result};

use crate::calibration::Calibration;
use crate::config::ContainerConfig;
use crate::host::ScrollHost;
use crate::intersection::{Crossing, IntersectionEntry};
use crate::point::PointSet;
use crate::registry::ElementRegistry;
use crate::watch_set::WatchSet;

/// Work deferred to the next animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTask {
    /// Rebuild the watch set with the current calibration
    Recalibrate,
}

#[derive(Debug)]
pub struct ScrollObservationContext {
    direction: DirectionTracker,
    calibration: Calibration,
    watch_set: WatchSet,
    frames: FrameScheduler<FrameTask>,
    points: PointSet,
    registry: ElementRegistry,
}

impl ScrollObservationContext {
    pub fn new(config: &ContainerConfig) -> Self {
        Self {
            direction: DirectionTracker::new(),
            calibration: Calibration::new(
                config.calibration_tolerance_px,
                config.min_calibration_margin_px,
            ),
            watch_set: WatchSet::new(),
            frames: FrameScheduler::new(),
            points: PointSet::new(),
            registry: ElementRegistry::new(),
        }
    }

    pub fn direction(&self) -> &DirectionTracker {
        &self.direction
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    pub fn frames(&self) -> &FrameScheduler<FrameTask> {
        &self.frames
    }

    pub fn points(&self) -> &PointSet {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut PointSet {
        &mut self.points
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────
    // Watch set
    // ─────────────────────────────────────────────────────────────────────

    /// Refresh the element registry from the host's last render
    pub fn sync_registry<H: ScrollHost + ?Sized>(&mut self, host: &H) {
        self.registry.rebuild(&host.rendered_items());
    }

    pub fn install<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> Result<usize> {
        self.watch_set
            .install(host, &self.points, self.calibration.correction())
    }

    pub fn attach<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> usize {
        self.watch_set.attach(host, &self.registry)
    }

    pub fn teardown<H: ScrollHost + ?Sized>(&mut self, host: &mut H) {
        self.watch_set.teardown(host);
    }

    /// Tear down, install with the current calibration and attach
    pub fn rebuild<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> Result<usize> {
        self.teardown(host);
        self.install(host)?;
        Ok(self.attach(host))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entries and frames
    // ─────────────────────────────────────────────────────────────────────

    /// Sample, classify and dispatch a batch of host entries
    ///
    /// Returns the crossings that were dispatched to point callbacks. A
    /// calibration disagreement only queues a rebuild; the watch set is not
    /// touched while the batch is being walked.
    pub fn handle_entries<H: ScrollHost + ?Sized>(
        &mut self,
        host: &H,
        entries: &[IntersectionEntry],
        ratio_epsilon: f32,
    ) -> Vec<Crossing> {
        let direction = self.direction.current_direction();
        let container = host.container_rect();
        let mut crossings = Vec::new();

        for entry in entries {
            let watcher = self.watch_set.watcher(entry.watcher).copied();
            if let (Some(watcher), Some(container)) = (watcher, container.as_ref()) {
                if self.calibration.sample(&watcher, entry, container) {
                    self.frames.request(FrameTask::Recalibrate);
                }
            }

            if let Some(crossing) =
                self.watch_set
                    .process(entry, direction, &self.points, ratio_epsilon)
            {
                tracing::debug!(
                    key = %crossing.key,
                    point = ?crossing.point,
                    classification = %crossing.classification,
                    direction = %crossing.direction,
                    "crossing"
                );
                if let Some(point) = self.points.get(crossing.point) {
                    point.notify(&crossing);
                }
                crossings.push(crossing);
            }
        }

        crossings
    }

    /// Run the work queued for this frame; returns the number of tasks run
    pub fn run_frame<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let tasks = self.frames.take_frame();
        for task in &tasks {
            match task {
                FrameTask::Recalibrate => match self.rebuild(host) {
                    Ok(attached) => {
                        self.calibration.complete();
                        tracing::debug!(attached, "watch set reinstalled for calibration");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "calibration reinstall deferred");
                        self.frames.request(FrameTask::Recalibrate);
                    }
                },
            }
        }
        tasks.len()
    }

    /// Allow one more calibration measurement and resample
    pub fn request_recalibration(&mut self) -> bool {
        if !self.calibration.reset() {
            return false;
        }
        self.frames.request(FrameTask::Recalibrate);
        true
    }

    /// Drop queued frame work
    pub fn cancel_frames(&mut self) {
        self.frames.cancel(&FrameTask::Recalibrate);
    }

    pub fn current_direction(&self) -> Direction {
        self.direction.current_direction()
    }
}
