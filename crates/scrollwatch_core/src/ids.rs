//! Opaque handles
//!
//! Every identity the engine correlates on is a slotmap key: rendered
//! elements are allocated by the host, observation points and watchers by
//! the engine. Keys are cheap to copy and never compared by value of the
//! thing they name, so two points with identical geometry stay distinct.

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Handle to a rendered item element, allocated by the host
    pub struct ElementId;
    /// Handle to a registered observation point
    pub struct PointId;
    /// Handle to one intersection watcher derived from a point
    pub struct WatcherId;
}

macro_rules! impl_raw {
    ($($ty:ty),*) => {
        $(
            impl $ty {
                /// Convert to raw u64 for storage outside the engine
                pub fn to_raw(self) -> u64 {
                    self.data().as_ffi()
                }

                /// Reconstruct from a raw u64 produced by `to_raw()`
                pub fn from_raw(raw: u64) -> Self {
                    slotmap::KeyData::from_ffi(raw).into()
                }
            }
        )*
    };
}

impl_raw!(ElementId, PointId, WatcherId);
