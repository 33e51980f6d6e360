use std::fmt;
use thiserror::Error;

/// Rejection reason that tells a [`Runner`](crate::script::Runner) to step
/// backwards instead of failing.
///
/// ELI5: this is NOT a bug report, it's "the player pressed back"
/// - a menu closing, a selection being abandoned, a timer running out ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancel {
    reason: Option<String>,
}

impl Cancel {
    pub fn new() -> Self {
        Cancel { reason: None }
    }

    pub fn because(reason: impl Into<String>) -> Self {
        Cancel {
            reason: Some(reason.into()),
        }
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or("No reason given")
    }
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Cancel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cancelled Action: {}", self.reason())
    }
}

/// Why an action's forward or inverse step did not produce a value
#[derive(Debug, Error)]
pub enum Fault {
    #[error("{0}")]
    Cancel(Cancel),

    #[error(transparent)]
    Error(#[from] anyhow::Error),
}

impl Fault {
    pub fn cancel() -> Self {
        Fault::Cancel(Cancel::new())
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Fault::Cancel(_))
    }
}

impl From<Cancel> for Fault {
    fn from(cancel: Cancel) -> Self {
        Fault::Cancel(cancel)
    }
}

/// How a call to [`Runner::start`](crate::script::Runner::start) can end
/// without a value
#[derive(Debug, Error)]
pub enum RunError {
    /// every completed action was unwound
    #[error("script was cancelled ({0})")]
    Canceled(Cancel),

    /// a forward or inverse failed for real, nothing was unwound
    #[error("script failed: {0:#}")]
    Failed(anyhow::Error),

    #[error("runner already failed and can not be started again")]
    Poisoned,
}

impl RunError {
    pub fn is_cancel(&self) -> bool {
        matches!(self, RunError::Canceled(_))
    }
}

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("region has no weight modifiers, it will never terminate")]
    NoWeightModifiers,

    #[error("expansion needs at least one weight range")]
    NoRanges,

    #[error("region was already expanded, create a new one (or clear it) to expand again")]
    AlreadyExpanded,

    #[error("a previous expansion of this region failed, it must be discarded")]
    Poisoned,

    #[error("weight modifier or validator failed: {0:#}")]
    Rule(#[from] anyhow::Error),
}
