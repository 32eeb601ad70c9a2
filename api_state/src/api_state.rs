use crate::Instant;

/// Which kind of cycle, if any, an [`ApiStateController`](crate::ApiStateController) is waiting on.
///
/// Loading and refreshing are variants of one enum, so they can never both be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    /// Nothing outstanding.
    #[default]
    Idle,
    /// An `execute` cycle is outstanding.
    Loading,
    /// A `refresh` cycle is outstanding.
    Refreshing,
}

/// Snapshot of an [`ApiStateController`](crate::ApiStateController).
#[derive(Clone, PartialEq, Eq)]
pub struct ApiState<T> {
    /// Last committed result, or the seed value.
    pub data: Option<T>,
    /// The outstanding cycle.
    pub activity: Activity,
    /// Message of the most recent failure.
    /// Cleared when a cycle starts or succeeds.
    pub error: Option<String>,
    /// When `data` was last committed by a cycle.
    pub updated_at: Option<Instant>,
}

impl<T> ApiState<T> {
    pub(crate) fn seeded(data: Option<T>) -> Self {
        Self {
            data,
            activity: Activity::Idle,
            error: None,
            updated_at: None,
        }
    }

    /// True while an `execute` cycle is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(self.activity, Activity::Loading)
    }

    /// True while a `refresh` cycle is outstanding.
    pub fn is_refreshing(&self) -> bool {
        matches!(self.activity, Activity::Refreshing)
    }

    /// Returns the data, if present.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

impl<T> Default for ApiState<T> {
    fn default() -> Self {
        Self::seeded(None)
    }
}

impl<T> std::fmt::Debug for ApiState<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("data", &self.data)
            .field("activity", &self.activity)
            .field("error", &self.error)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
