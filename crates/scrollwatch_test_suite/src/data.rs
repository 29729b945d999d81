//! Demo data service
//!
//! Serves fixed item lists with an injected latency. Each mutation only
//! applies from the list it was designed against (usually the initial one)
//! or undoes its inverse; from anywhere else it yields an empty list.

use std::time::Duration;

use tokio::sync::Mutex;

/// The lists the service can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixture {
    Initial,
    AddedTop,
    AddedBottom,
    RemovedTop,
    RemovedBottom,
    SingleAddedMiddle,
    MultipleAddedMiddle,
    SingleRemovedMiddle,
    MultipleRemovedMiddle,
    Empty,
}

const SINGLE_ADDED_MIDDLE: [f64; 21] = [
    0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 6.5, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
    16.0, 17.0, 18.0, 19.0,
];

const MULTIPLE_ADDED_MIDDLE: [f64; 26] = [
    0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 6.5, 7.0, 7.2, 7.5, 8.0, 8.3, 8.4, 8.7, 9.0, 10.0, 11.0,
    12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0,
];

const SINGLE_REMOVED_MIDDLE: [f64; 19] = [
    0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0,
    18.0, 19.0,
];

const MULTIPLE_REMOVED_MIDDLE: [f64; 17] = [
    0.0, 1.0, 2.0, 3.0, 4.0, 6.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0, 19.0,
];

fn range(start: i32, end_inclusive: i32) -> Vec<f64> {
    (start..=end_inclusive).map(f64::from).collect()
}

impl Fixture {
    pub fn values(self) -> Vec<f64> {
        match self {
            Fixture::Initial => range(0, 19),
            Fixture::AddedTop => range(-9, 19),
            Fixture::AddedBottom => range(0, 29),
            Fixture::RemovedTop => range(6, 19),
            Fixture::RemovedBottom => range(0, 14),
            Fixture::SingleAddedMiddle => SINGLE_ADDED_MIDDLE.to_vec(),
            Fixture::MultipleAddedMiddle => MULTIPLE_ADDED_MIDDLE.to_vec(),
            Fixture::SingleRemovedMiddle => SINGLE_REMOVED_MIDDLE.to_vec(),
            Fixture::MultipleRemovedMiddle => MULTIPLE_REMOVED_MIDDLE.to_vec(),
            Fixture::Empty => Vec::new(),
        }
    }
}

/// A list mutation the view can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    AddTop,
    AddBottom,
    RemoveTop,
    RemoveBottom,
    AddSingleMiddle,
    AddMultipleMiddle,
    RemoveSingleMiddle,
    RemoveMultipleMiddle,
}

impl Mutation {
    pub const ALL: [Mutation; 8] = [
        Mutation::AddTop,
        Mutation::AddBottom,
        Mutation::RemoveTop,
        Mutation::RemoveBottom,
        Mutation::AddSingleMiddle,
        Mutation::AddMultipleMiddle,
        Mutation::RemoveSingleMiddle,
        Mutation::RemoveMultipleMiddle,
    ];

    /// List this mutation yields when `current` is the last list served
    pub fn target(self, current: Fixture) -> Fixture {
        use Fixture::*;

        match (self, current) {
            (Mutation::AddTop, Initial) => AddedTop,
            (Mutation::AddBottom, Initial) => AddedBottom,
            (Mutation::RemoveTop, Initial) => RemovedTop,
            (Mutation::RemoveTop, AddedTop) => Initial,
            (Mutation::RemoveBottom, Initial) => RemovedBottom,
            (Mutation::RemoveBottom, AddedBottom) => Initial,
            (Mutation::AddSingleMiddle, Initial) => SingleAddedMiddle,
            (Mutation::AddMultipleMiddle, Initial) => MultipleAddedMiddle,
            (
                Mutation::AddSingleMiddle | Mutation::AddMultipleMiddle,
                SingleRemovedMiddle | MultipleRemovedMiddle,
            ) => Initial,
            (Mutation::RemoveSingleMiddle, Initial) => SingleRemovedMiddle,
            (Mutation::RemoveMultipleMiddle, Initial) => MultipleRemovedMiddle,
            (
                Mutation::RemoveSingleMiddle | Mutation::RemoveMultipleMiddle,
                SingleAddedMiddle | MultipleAddedMiddle,
            ) => Initial,
            _ => Empty,
        }
    }
}

/// Item keys as rendered (`6.5`, `-9`, `12`)
pub fn keys(values: &[f64]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Debug)]
pub struct DataService {
    latency: Duration,
    current: Mutex<Fixture>,
}

impl Default for DataService {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl DataService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            current: Mutex::new(Fixture::Initial),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub async fn current(&self) -> Fixture {
        *self.current.lock().await
    }

    pub async fn initial(&self) -> Vec<f64> {
        self.serve(|_| Fixture::Initial).await
    }

    pub async fn fetch(&self, mutation: Mutation) -> Vec<f64> {
        self.serve(|current| mutation.target(current)).await
    }

    /// Fetches are served one at a time: the lock is held across the
    /// latency so each one picks from the list the previous one stored
    async fn serve(&self, pick: impl FnOnce(Fixture) -> Fixture) -> Vec<f64> {
        let mut current = self.current.lock().await;
        let from = *current;
        let next = pick(from);
        tokio::time::sleep(self.latency).await;

        *current = next;
        tracing::debug!(from = ?from, to = ?next, "data served");
        next.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_shapes() {
        assert_eq!(Fixture::Initial.values().len(), 20);
        assert_eq!(Fixture::AddedTop.values().first(), Some(&-9.0));
        assert_eq!(Fixture::AddedBottom.values().len(), 30);
        assert_eq!(Fixture::RemovedTop.values().first(), Some(&6.0));
        assert_eq!(Fixture::RemovedBottom.values().last(), Some(&14.0));
    }

    #[test]
    fn test_keys_render_like_numbers() {
        assert_eq!(keys(&[-9.0, 0.0, 6.5, 8.3]), vec!["-9", "0", "6.5", "8.3"]);
    }

    #[test]
    fn test_transition_rules() {
        assert_eq!(Mutation::AddTop.target(Fixture::Initial), Fixture::AddedTop);
        assert_eq!(Mutation::AddTop.target(Fixture::AddedTop), Fixture::Empty);
        assert_eq!(Mutation::RemoveTop.target(Fixture::AddedTop), Fixture::Initial);
        assert_eq!(
            Mutation::AddSingleMiddle.target(Fixture::MultipleRemovedMiddle),
            Fixture::Initial
        );
        assert_eq!(
            Mutation::RemoveMultipleMiddle.target(Fixture::SingleAddedMiddle),
            Fixture::Initial
        );
        assert_eq!(Mutation::RemoveBottom.target(Fixture::AddedTop), Fixture::Empty);
    }

    #[test]
    fn test_every_mutation_applies_to_the_initial_list() {
        let initial = Fixture::Initial.values();
        for mutation in Mutation::ALL {
            let target = mutation.target(Fixture::Initial);
            assert_ne!(target, Fixture::Empty, "{:?}", mutation);
            assert_ne!(target.values(), initial, "{:?}", mutation);
        }
    }

    #[tokio::test]
    async fn test_rules_follow_the_last_served_list() {
        let service = DataService::new(Duration::from_millis(1));
        assert_eq!(service.initial().await.len(), 20);
        assert_eq!(service.fetch(Mutation::AddTop).await.len(), 29);
        assert_eq!(service.current().await, Fixture::AddedTop);

        // Undo, then the same mutation applies again
        assert_eq!(service.fetch(Mutation::RemoveTop).await.len(), 20);
        assert_eq!(service.fetch(Mutation::AddTop).await.len(), 29);
        assert!(service.fetch(Mutation::AddBottom).await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_apply_in_turn() {
        let service = DataService::new(Duration::from_millis(5));
        let (added, undone) = tokio::join!(
            service.fetch(Mutation::AddTop),
            service.fetch(Mutation::RemoveTop)
        );

        // The removal sees the list the addition stored, so it undoes it
        assert_eq!(added.len(), 29);
        assert_eq!(undone.len(), 20);
        assert_eq!(service.current().await, Fixture::Initial);
    }
}
