//! Membership actions derived by the reconciler.

use std::collections::BTreeSet;

/// Difference between desired and observed membership.
///
/// Both sides are sets: duplicates collapse and iteration is sorted, so the
/// same inputs always yield the same calls in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

/// One remote membership call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipStep {
    /// Bulk invite, sent as one comma separated list
    Invite { members: Vec<String> },
    /// Single removal; the remote has no bulk variant
    Kick { member: String },
}

impl MembershipDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Calls to issue in order: at most one invite, then one kick per removal.
    pub fn steps(&self) -> Vec<MembershipStep> {
        let mut steps = Vec::with_capacity(1 + self.to_remove.len());

        if !self.to_add.is_empty() {
            steps.push(MembershipStep::Invite {
                members: self.to_add.iter().cloned().collect(),
            });
        }

        steps.extend(self.to_remove.iter().map(|member| MembershipStep::Kick {
            member: member.clone(),
        }));

        steps
    }

    /// The membership that results from applying this delta to `observed`.
    pub fn apply_to<'a>(&self, observed: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
        let mut result: BTreeSet<String> = observed.into_iter().cloned().collect();
        result.retain(|m| !self.to_remove.contains(m));
        result.extend(self.to_add.iter().cloned());
        result
    }
}
