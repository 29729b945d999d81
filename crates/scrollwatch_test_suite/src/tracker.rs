//! Near/far membership tracking
//!
//! Four points bracket the container: a near and a far line above its top
//! edge and a near and a far line below its bottom edge. The tracker keeps
//! the items that sit between a near and a far line, plus the item that most
//! recently crossed each near line.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;

use scrollwatch_core::PointId;
use scrollwatch_engine::{Classification, Crossing, ObservationPoint};

/// Role of one of the four tracking points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    NearTop,
    FarTop,
    NearBottom,
    FarBottom,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::NearTop, Role::FarTop, Role::NearBottom, Role::FarBottom];

    /// The point watching this role's line
    pub fn point(self) -> ObservationPoint {
        match self {
            Role::NearTop => ObservationPoint::top(10.0),
            Role::FarTop => ObservationPoint::top(300.0),
            Role::NearBottom => ObservationPoint::bottom(-10.0),
            Role::FarBottom => ObservationPoint::bottom(-300.0),
        }
    }
}

#[derive(Debug, Default)]
pub struct VisibilityTracker {
    roles: Vec<(PointId, Role)>,
    pub top_most: Option<String>,
    pub bottom_most: Option<String>,
    /// Items between the near and far top lines
    pub above_top: IndexSet<String>,
    /// Items between the near and far bottom lines
    pub below_bottom: IndexSet<String>,
}

impl VisibilityTracker {
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Point for `role` reporting into `tracker`
    pub fn point_for(tracker: &Rc<RefCell<Self>>, role: Role) -> ObservationPoint {
        let tracker = Rc::clone(tracker);
        role.point()
            .on_crossing(move |crossing| tracker.borrow_mut().on_crossing(crossing))
    }

    pub fn assign(&mut self, point: PointId, role: Role) {
        self.roles.push((point, role));
    }

    fn role_of(&self, point: PointId) -> Option<Role> {
        self.roles
            .iter()
            .find(|(id, _)| *id == point)
            .map(|(_, role)| *role)
    }

    pub fn on_crossing(&mut self, crossing: &Crossing) {
        let Some(role) = self.role_of(crossing.point) else {
            return;
        };
        let key = crossing.key.to_string();

        match (crossing.classification, role) {
            (Classification::Above, Role::NearTop) => {
                self.above_top.insert(key.clone());
                self.top_most = Some(key);
            }
            (Classification::Above, Role::FarTop) => {
                self.above_top.shift_remove(&key);
            }
            (Classification::Above, Role::NearBottom) => {
                self.below_bottom.shift_remove(&key);
                self.bottom_most = Some(key);
            }
            (Classification::Above, Role::FarBottom) => {
                self.below_bottom.insert(key);
            }
            (Classification::Below, Role::NearTop) => {
                self.above_top.shift_remove(&key);
                self.top_most = Some(key);
            }
            (Classification::Below, Role::FarTop) => {
                self.above_top.insert(key);
            }
            (Classification::Below, Role::NearBottom) => {
                self.below_bottom.insert(key.clone());
                self.bottom_most = Some(key);
            }
            (Classification::Below, Role::FarBottom) => {
                self.below_bottom.shift_remove(&key);
            }
            (Classification::Through, _) => return,
        }

        tracing::debug!(
            top_most = ?self.top_most,
            bottom_most = ?self.bottom_most,
            above_top = self.above_top.len(),
            below_bottom = self.below_bottom.len(),
            "visibility updated"
        );
    }
}
