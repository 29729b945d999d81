//! Scroll container
//!
//! [`ScrollContainer`] is the composition root: it owns one
//! [`ScrollObservationContext`] plus the anchor repositioner and the scroll
//! notifier, and exposes the host-facing lifecycle:
//!
//! ```text
//! mount ──► after_layout ──► (entries / touch / scroll / frames)*
//!               ▲                         │
//!               └──── begin_update ◄──────┘ props changed
//!
//! unmount (any time, idempotent)
//! ```
//!
//! Every error is logged and degrades to "nothing this cycle"; none of the
//! hooks fail.

use std::time::Instant;

use scrollwatch_core::{Direction, EngineError, PointId, Result};

use crate::anchor::{AnchorElement, AnchorRepositioner};
use crate::calibration::Calibration;
use crate::config::ContainerConfig;
use crate::context::ScrollObservationContext;
use crate::events::{ScrollHandlers, ScrollNotifier};
use crate::host::ScrollHost;
use crate::intersection::{Crossing, IntersectionEntry};
use crate::point::ObservationPoint;
use scrollwatch_core::WatchState;

/// Inputs of one render of the container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerProps {
    /// Item keys in render order
    pub items: Vec<String>,
    pub anchor: Option<AnchorElement>,
}

impl ContainerProps {
    pub fn new<I, K>(items: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: ToString,
    {
        Self {
            items: items.into_iter().map(|key| key.to_string()).collect(),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: AnchorElement) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

/// A scroll container watched for reference-line crossings
#[derive(Debug)]
pub struct ScrollContainer {
    config: ContainerConfig,
    context: ScrollObservationContext,
    notifier: ScrollNotifier,
    repositioner: AnchorRepositioner,
    props: ContainerProps,
    mounted: bool,
    layout_pending: bool,
}

impl ScrollContainer {
    /// Create a container, registering the points the config names
    pub fn new(config: ContainerConfig) -> Self {
        let mut context = ScrollObservationContext::new(&config);
        for point in config.observation_points() {
            context.points_mut().register(point);
        }
        let notifier = ScrollNotifier::new(
            ScrollHandlers::default(),
            config.scroll_throttle_ms,
            config.scroll_end_debounce_ms,
        );

        Self {
            config,
            context,
            notifier,
            repositioner: AnchorRepositioner::new(),
            props: ContainerProps::default(),
            mounted: false,
            layout_pending: false,
        }
    }

    pub fn with_handlers(mut self, handlers: ScrollHandlers) -> Self {
        self.notifier.set_handlers(handlers);
        self
    }

    /// Register an observation point
    ///
    /// Points are fixed once the container is mounted. The config's
    /// `report_through` turns THROUGH reporting on for every point; a point
    /// can still opt in on its own when it is off.
    pub fn add_point(&mut self, mut point: ObservationPoint) -> Result<PointId> {
        if self.mounted {
            return Err(EngineError::MalformedConfig(
                "observation points cannot be added after mount".to_string(),
            ));
        }
        if self.config.report_through {
            point = point.report_through(true);
        }
        Ok(self.context.points_mut().register(point))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// First render: install the watch set and queue the initial anchor
    pub fn mount<H: ScrollHost + ?Sized>(&mut self, host: &mut H, props: ContainerProps) {
        if self.mounted {
            tracing::warn!("container already mounted");
            return;
        }
        self.mounted = true;
        self.props = props;

        self.context.sync_registry(&*host);
        if let Err(e) = self.context.install(host) {
            tracing::warn!(error = %e, "watch set not installed on mount, retrying after layout");
        }

        if let Some(ref anchor) = self.props.anchor {
            if anchor.is_preserve() {
                self.repositioner.record(anchor.key(), 0.0);
            }
            self.repositioner.request();
        }
        self.layout_pending = true;

        tracing::debug!(
            items = self.props.items.len(),
            points = self.context.points().len(),
            "container mounted"
        );
    }

    /// New props arrived; returns `true` when the host must re-render
    ///
    /// Must run before the host renders the new items: the preserve anchor
    /// is snapshotted from the geometry still on screen.
    pub fn begin_update<H: ScrollHost + ?Sized>(
        &mut self,
        host: &mut H,
        props: ContainerProps,
    ) -> bool {
        if !self.mounted {
            tracing::warn!("update on an unmounted container ignored");
            return false;
        }

        let items_changed = props.items != self.props.items;
        let anchor_changed = props.anchor != self.props.anchor;
        if !items_changed && !anchor_changed {
            return false;
        }

        self.context.teardown(host);

        match props.anchor {
            Some(ref anchor) => {
                match self
                    .repositioner
                    .snapshot(&*host, self.context.registry(), anchor)
                {
                    Ok(_) => self.repositioner.request(),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            selector = %anchor.selector,
                            "anchor not repositioned this update"
                        );
                        self.repositioner.cancel();
                    }
                }
            }
            None => self.repositioner.cancel(),
        }

        tracing::debug!(items_changed, anchor_changed, items = props.items.len(), "container update");
        self.props = props;
        self.layout_pending = true;
        true
    }

    /// The host finished laying out the latest render
    ///
    /// Applies the queued anchor scroll once, then (re)installs the watch set
    /// and attaches it to the rendered items.
    pub fn after_layout<H: ScrollHost + ?Sized>(&mut self, host: &mut H) {
        if !std::mem::take(&mut self.layout_pending) {
            return;
        }

        self.context.sync_registry(&*host);

        if let Some(ref anchor) = self.props.anchor {
            let before = host.scroll_top();
            match self.repositioner.apply(
                host,
                self.context.registry(),
                self.context.points(),
                anchor,
            ) {
                Ok(Some(_)) => {
                    if (host.scroll_top() - before).abs() > f32::EPSILON {
                        self.notifier.suppress_next_scroll();
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, selector = %anchor.selector, "anchor not applied");
                }
            }
        }

        if !self.context.watch_set().state().is_live() {
            if let Err(e) = self.context.install(host) {
                tracing::warn!(error = %e, "watch set not installed after layout");
                return;
            }
        }
        let attached = self.context.attach(host);
        tracing::trace!(attached, "elements attached after layout");
    }

    /// Run next-animation-frame work; returns the number of tasks run
    pub fn tick_frame<H: ScrollHost + ?Sized>(&mut self, host: &mut H) -> usize {
        if !self.mounted {
            return 0;
        }
        self.context.run_frame(host)
    }

    /// Tear everything down; safe to call repeatedly
    pub fn unmount<H: ScrollHost + ?Sized>(&mut self, host: &mut H) {
        self.context.teardown(host);
        self.context.cancel_frames();
        self.notifier.cancel();
        self.repositioner.cancel();
        self.layout_pending = false;
        if std::mem::take(&mut self.mounted) {
            tracing::debug!("container unmounted");
        }
    }

    // ========================================================================
    // Host events
    // ========================================================================

    /// Deliver a batch of intersection entries from the host
    pub fn on_intersections<H: ScrollHost + ?Sized>(
        &mut self,
        host: &H,
        entries: &[IntersectionEntry],
    ) -> Vec<Crossing> {
        if !self.mounted {
            return Vec::new();
        }
        self.context
            .handle_entries(host, entries, self.config.ratio_epsilon)
    }

    pub fn on_touch_start(&mut self, y: f32) {
        self.context.direction().touch_start(y);
    }

    pub fn on_touch_move(&mut self, y: f32) -> Direction {
        let direction = self.context.direction().touch_move(y);
        self.notifier.touch(direction);
        direction
    }

    /// A raw scroll event; returns whether `on_scroll` fired
    pub fn on_scroll(&mut self, now: Instant) -> bool {
        let direction = self.context.current_direction();
        self.notifier.scroll(now, direction)
    }

    /// Flush due throttle and debounce notifications
    pub fn poll_timers(&mut self, now: Instant) {
        let direction = self.context.current_direction();
        self.notifier.poll(now, direction);
    }

    /// Measure the device pixel ratio distortion again
    ///
    /// Returns `false` when no calibration has been made yet.
    pub fn request_recalibration(&mut self) -> bool {
        self.context.request_recalibration()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn context(&self) -> &ScrollObservationContext {
        &self.context
    }

    pub fn props(&self) -> &ContainerProps {
        &self.props
    }

    pub fn direction(&self) -> Direction {
        self.context.current_direction()
    }

    pub fn calibration(&self) -> &Calibration {
        self.context.calibration()
    }

    pub fn watch_state(&self) -> WatchState {
        self.context.watch_set().state()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn point_ids(&self) -> Vec<PointId> {
        self.context.points().ids().collect()
    }
}
