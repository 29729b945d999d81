//! Scrollwatch Engine
//!
//! Reference-line crossing detection for infinite scroll lists.
//!
//! A container registers observation points (horizontal lines measured from
//! its top or bottom edge). As items scroll past a line the engine reports
//! whether each item went `Above` or `Below` it, together with the gesture
//! direction. It also calibrates away device-pixel-ratio margin distortion
//! and keeps an anchor item stationary across list mutations.
//!
//! The engine never touches a real DOM: hosts implement [`ScrollHost`] and
//! drive a [`ScrollContainer`] through its lifecycle hooks.
//!
//! # Example
//!
//! ```rust
//! use scrollwatch_engine::prelude::*;
//!
//! let mut container = ScrollContainer::new(ContainerConfig::default());
//! let near_bottom = container
//!     .add_point(ObservationPoint::bottom(100.0).on_crossing(|crossing| {
//!         if crossing.classification == Classification::Above {
//!             // fetch the next page
//!         }
//!     }))
//!     .expect("points are added before mount");
//!
//! let props = ContainerProps::new(0..20).with_anchor(AnchorElement::pin("0", near_bottom));
//! assert_eq!(props.items.len(), 20);
//! ```

pub mod anchor;
pub mod band;
pub mod calibration;
pub mod config;
pub mod context;
pub mod controller;
pub mod events;
pub mod host;
pub mod intersection;
pub mod point;
pub mod registry;
pub mod watch_set;

// Points
pub use point::{
    CrossingCallback, ObservationPoint, PointSet, PointSpec, Reference, DEFAULT_DISPLACEMENT,
};

// Geometry and classification
pub use band::{classify, BandSide, Classification, ClassifyOptions, RootMargin};
pub use intersection::{Crossing, IntersectionEntry, WatcherSpec};

// Host seam
pub use host::{RenderedItem, ScrollHost};
pub use registry::ElementRegistry;

// Engine
pub use anchor::{AnchorElement, AnchorGeometry, AnchorRepositioner};
pub use calibration::Calibration;
pub use config::{ContainerConfig, Parsed};
pub use context::{FrameTask, ScrollObservationContext};
pub use controller::{ContainerProps, ScrollContainer};
pub use events::{DirectionCallback, ScrollHandlers, ScrollNotifier};
pub use watch_set::{Watcher, WatchSet};

/// Prelude module - import everything a host needs
pub mod prelude {
    pub use crate::anchor::AnchorElement;
    pub use crate::band::Classification;
    pub use crate::config::ContainerConfig;
    pub use crate::controller::{ContainerProps, ScrollContainer};
    pub use crate::events::ScrollHandlers;
    pub use crate::host::{RenderedItem, ScrollHost};
    pub use crate::intersection::{Crossing, IntersectionEntry, WatcherSpec};
    pub use crate::point::{ObservationPoint, PointSpec, Reference};
    pub use scrollwatch_core::{Direction, ElementId, EngineError, PointId, Rect, WatcherId};
}
