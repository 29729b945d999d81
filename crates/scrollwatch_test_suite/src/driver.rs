//! Scenario driver
//!
//! Plays the host's part around a [`ScrollContainer`]: commits renders to
//! the [`SimulatedDom`], forwards its queued entries and scroll events,
//! runs animation frames and advances a virtual clock.

use std::time::{Duration, Instant};

use anyhow::Result;

use scrollwatch_core::PointId;
use scrollwatch_engine::{
    AnchorElement, ContainerConfig, ContainerProps, Crossing, ObservationPoint, ScrollContainer,
    ScrollHandlers, ScrollHost,
};

use crate::dom::SimulatedDom;

/// Rounds of event delivery before the driver gives up settling
const MAX_PUMP_ROUNDS: usize = 16;

/// Virtual time between two touch moves
const FRAME: Duration = Duration::from_millis(16);

/// Where a swipe puts the finger down
const TOUCH_ORIGIN_Y: f32 = 500.0;

pub struct ScrollDriver {
    pub dom: SimulatedDom,
    pub container: ScrollContainer,
    crossings: Vec<Crossing>,
    clock: Instant,
}

impl ScrollDriver {
    pub fn new(config: ContainerConfig) -> Self {
        Self::with_dom(config, SimulatedDom::default())
    }

    pub fn with_dom(config: ContainerConfig, dom: SimulatedDom) -> Self {
        Self {
            dom,
            container: ScrollContainer::new(config),
            crossings: Vec::new(),
            clock: Instant::now(),
        }
    }

    pub fn with_handlers(mut self, handlers: ScrollHandlers) -> Self {
        self.container = self.container.with_handlers(handlers);
        self
    }

    pub fn add_point(&mut self, point: ObservationPoint) -> Result<PointId> {
        Ok(self.container.add_point(point)?)
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// First render of `items`
    pub fn mount(&mut self, items: &[String], anchor: Option<AnchorElement>) {
        let props = props(items, anchor);
        self.dom.render(&props.items);
        self.container.mount(&mut self.dom, props);
        self.container.after_layout(&mut self.dom);
        self.pump();
    }

    /// Re-render with new props; returns whether a render happened
    pub fn update(&mut self, items: &[String], anchor: Option<AnchorElement>) -> bool {
        let props = props(items, anchor);
        if !self.container.begin_update(&mut self.dom, props.clone()) {
            return false;
        }
        self.dom.render(&props.items);
        self.container.after_layout(&mut self.dom);
        self.pump();
        true
    }

    pub fn unmount(&mut self) {
        self.container.unmount(&mut self.dom);
        self.pump();
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Deliver queued host events until nothing is left to do
    pub fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let scrolls = self.dom.take_scroll_events();
            for _ in 0..scrolls {
                self.container.on_scroll(self.clock);
            }

            let entries = self.dom.take_entries();
            if !entries.is_empty() {
                let crossings = self.container.on_intersections(&self.dom, &entries);
                self.crossings.extend(crossings);
            }

            let frames = self.container.tick_frame(&mut self.dom);
            self.container.poll_timers(self.clock);

            if scrolls == 0 && entries.is_empty() && frames == 0 {
                return;
            }
        }
        tracing::warn!(rounds = MAX_PUMP_ROUNDS, "host events did not settle");
    }

    /// Touch-scroll the content by `delta` pixels in `step` increments
    ///
    /// Positive deltas scroll forward: items move up the container.
    pub fn swipe(&mut self, delta: f32, step: f32) {
        let sign = delta.signum();
        let mut remaining = delta.abs();
        let mut finger_y = TOUCH_ORIGIN_Y;

        self.container.on_touch_start(finger_y);
        while remaining > 0.0 {
            let dy = step.min(remaining);
            remaining -= dy;

            // The finger travels against the scroll offset
            finger_y -= dy * sign;
            self.container.on_touch_move(finger_y);
            self.dom.scroll_by(dy * sign);
            self.clock += FRAME;
            self.pump();
        }
    }

    /// Let virtual time pass without input
    ///
    /// Timers are polled once per frame, like a host's animation loop.
    pub fn advance(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() {
            let tick = FRAME.min(remaining);
            remaining -= tick;
            self.clock += tick;
            self.container.poll_timers(self.clock);
        }
    }

    // ========================================================================
    // Observations
    // ========================================================================

    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    pub fn crossings_at(&self, point: PointId) -> Vec<&Crossing> {
        self.crossings.iter().filter(|c| c.point == point).collect()
    }

    pub fn clear_crossings(&mut self) {
        self.crossings.clear();
    }

    pub fn scroll_top(&self) -> f32 {
        self.dom.scroll_top()
    }

    pub fn top_of(&self, key: &str) -> Option<f32> {
        self.dom.top_in_container(key)
    }
}

fn props(items: &[String], anchor: Option<AnchorElement>) -> ContainerProps {
    ContainerProps {
        items: items.to_vec(),
        anchor,
    }
}
