//! Budget allocation.
//!
//! Selection is greedy-by-priority truncation: walk the sorted files, stop at
//! the first one that would overflow. A large file blocks everything behind it
//! even if smaller files would fit.

use breach_config::AllocationPolicy;

use crate::model::{Group, GroupSelection, ScoredFile};

/// Running token total against a fixed budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    pub used: usize,
    pub max: usize,
}

impl TokenBudget {
    #[must_use]
    pub const fn new(max: usize) -> Self {
        Self { used: 0, max }
    }

    /// Check if adding `tokens` would exceed the budget
    #[must_use]
    pub const fn would_exceed(&self, tokens: usize) -> bool {
        match self.used.checked_add(tokens) {
            Some(total) => total > self.max,
            None => true,
        }
    }

    pub const fn add(&mut self, tokens: usize) {
        self.used += tokens;
    }
}

/// Length and token total of the longest prefix of `estimates` that fits in `budget`.
///
/// A zero budget selects nothing, not even empty files.
pub fn greedy_prefix(estimates: impl IntoIterator<Item = usize>, budget: usize) -> (usize, usize) {
    if budget == 0 {
        return (0, 0);
    }
    let mut tracker = TokenBudget::new(budget);
    let mut count = 0;
    for tokens in estimates {
        if tracker.would_exceed(tokens) {
            break;
        }
        tracker.add(tokens);
        count += 1;
    }
    (count, tracker.used)
}

/// Single-group selection against a sub-budget
#[must_use]
pub fn select_within_budget<'a>(group: &'a Group, sub_budget: usize) -> GroupSelection<'a> {
    let (count, tokens) = greedy_prefix(group.files.iter().map(|f| f.tokens), sub_budget);
    GroupSelection {
        group,
        files: &group.files[..count],
        tokens,
        sub_budget,
    }
}

/// Multi-group allocation, visiting groups in the order given.
///
/// The remaining budget `R` starts at `global_budget` and shrinks by what each
/// group consumed. The divisor is the total group count under
/// [`AllocationPolicy::FixedDenominator`], so groups late in the order get less
/// than an even split; [`AllocationPolicy::RemainingCount`] divides by the
/// number of groups not yet processed instead.
#[must_use]
pub fn allocate<'a>(
    groups: &'a [Group],
    global_budget: usize,
    policy: AllocationPolicy,
) -> Vec<GroupSelection<'a>> {
    let total = groups.len();
    let mut remaining = global_budget;
    let mut selections = Vec::with_capacity(total);

    for (index, group) in groups.iter().enumerate() {
        let divisor = match policy {
            AllocationPolicy::FixedDenominator => total,
            AllocationPolicy::RemainingCount => total - index,
        };
        let sub_budget = remaining / divisor;
        let selection = select_within_budget(group, sub_budget);
        remaining -= selection.tokens;
        selections.push(selection);
    }

    selections
}

/// Token sum of a slice of files
#[must_use]
pub fn total_tokens(files: &[ScoredFile]) -> usize {
    files.iter().map(|f| f.tokens).sum()
}
