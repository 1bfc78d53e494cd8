//! Per-solve goal bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

/// How one goal fared: its score and the activities credited to it.
///
/// A score of 0 means fully satisfied; a negative score counts the
/// conflicts left unresolved.
#[derive(Debug, Clone, Default)]
pub struct GoalEvaluation {
    score: i64,
    created: BTreeSet<String>,
    associated: BTreeSet<String>,
}

impl GoalEvaluation {
    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn set_score(&mut self, score: i64) {
        self.score = score;
    }

    /// Activities the solver created for this goal.
    pub fn created(&self) -> &BTreeSet<String> {
        &self.created
    }

    /// Pre-existing activities credited to this goal.
    pub fn associated(&self) -> &BTreeSet<String> {
        &self.associated
    }

    pub fn add_created(&mut self, name: impl Into<String>) {
        let _ = self.created.insert(name.into());
    }

    pub fn add_associated(&mut self, name: impl Into<String>) {
        let _ = self.associated.insert(name.into());
    }

    /// Forgets every credited activity, e.g. after a goal rollback.
    pub fn clear_credits(&mut self) {
        self.created.clear();
        self.associated.clear();
    }

    /// Every activity credited to the goal, created or associated.
    pub fn credited(&self) -> BTreeSet<String> {
        self.created.union(&self.associated).cloned().collect()
    }
}

/// The per-goal evaluations of one solve.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    by_goal: BTreeMap<String, GoalEvaluation>,
}

impl Evaluation {
    pub fn new() -> Evaluation {
        Evaluation::default()
    }

    /// The (created-on-demand) evaluation record of a goal.
    pub fn for_goal(&mut self, goal: &str) -> &mut GoalEvaluation {
        self.by_goal.entry(goal.to_owned()).or_default()
    }

    pub fn goal(&self, goal: &str) -> Option<&GoalEvaluation> {
        self.by_goal.get(goal)
    }

    /// Iterates goal names with their evaluations.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GoalEvaluation)> {
        self.by_goal.iter().map(|(name, eval)| (name.as_str(), eval))
    }

    /// Whether the activity is already credited to the given goal.
    pub fn is_credited_to(&self, goal: &str, activity: &str) -> bool {
        self.by_goal
            .get(goal)
            .map(|e| e.created.contains(activity) || e.associated.contains(activity))
            .unwrap_or(false)
    }

    /// Whether any *other* goal has claimed the activity.
    pub fn is_claimed_by_other(&self, goal: &str, activity: &str) -> bool {
        self.by_goal.iter().any(|(name, e)| {
            name != goal && (e.created.contains(activity) || e.associated.contains(activity))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_track_claims_across_goals() {
        let mut evaluation = Evaluation::new();
        evaluation.for_goal("imaging").add_associated("obs1");

        assert!(evaluation.is_credited_to("imaging", "obs1"));
        assert!(!evaluation.is_credited_to("downlink", "obs1"));
        assert!(evaluation.is_claimed_by_other("downlink", "obs1"));
        assert!(!evaluation.is_claimed_by_other("imaging", "obs1"));
    }

    #[test]
    fn rollback_clears_credits_but_keeps_score() {
        let mut evaluation = Evaluation::new();
        let record = evaluation.for_goal("imaging");
        record.add_created("obs1");
        record.set_score(-2);
        record.clear_credits();
        assert!(record.created().is_empty());
        assert_eq!(record.score(), -2);
    }
}
