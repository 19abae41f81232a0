//! Reconcile Module - pure membership reconciliation
//!
//! [`reconcile`] has no side effects and is deterministic, so it is tested
//! without any backend at all. Controllers turn its result into remote
//! calls via [`MembershipDelta::steps`].

mod actions;

pub use actions::{MembershipDelta, MembershipStep};

use std::collections::BTreeSet;

/// Computes which members to add and which to remove so that `observed`
/// becomes `desired`.
///
/// `to_add` and `to_remove` are disjoint. An entry present on both sides
/// never appears in the delta, and duplicates on either side are ignored.
///
/// # Example
///
/// ```
/// use slackctl_runner::reconcile;
///
/// let desired = vec!["a".to_string(), "d".to_string()];
/// let observed = vec!["a".to_string(), "b".to_string(), "c".to_string()];
/// let delta = reconcile(&desired, &observed);
///
/// assert_eq!(delta.to_add.into_iter().collect::<Vec<_>>(), vec!["d"]);
/// assert_eq!(delta.to_remove.into_iter().collect::<Vec<_>>(), vec!["b", "c"]);
/// ```
pub fn reconcile(desired: &[String], observed: &[String]) -> MembershipDelta {
    let desired: BTreeSet<&String> = desired.iter().collect();
    let observed: BTreeSet<&String> = observed.iter().collect();

    MembershipDelta {
        to_add: desired
            .difference(&observed)
            .map(|m| (*m).clone())
            .collect(),
        to_remove: observed
            .difference(&desired)
            .map(|m| (*m).clone())
            .collect(),
    }
}
