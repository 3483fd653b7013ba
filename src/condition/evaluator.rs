use std::collections::BTreeSet;

use crate::{
    belief::{BeliefKey, BeliefStore},
    condition::types::{Binding, Clause, ConditionDnf, Conjunction},
};

/// Matches DNF conditions against a belief store. Evaluation never fails: an
/// unmatched clause just leaves the condition unsatisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Every distinct satisfying assignment across all conjunctions. A
    /// satisfied ground condition yields exactly one empty binding.
    pub fn evaluate(dnf: &ConditionDnf, beliefs: &BeliefStore) -> BTreeSet<Binding> {
        if dnf.is_empty() {
            return BTreeSet::from([Binding::new()]);
        }

        dnf.conjunctions
            .iter()
            .flat_map(|conjunction| Self::evaluate_conjunction(conjunction, beliefs))
            .collect()
    }

    pub fn is_satisfied(dnf: &ConditionDnf, beliefs: &BeliefStore) -> bool {
        if dnf.is_empty() {
            return true;
        }

        dnf.conjunctions.iter().any(|conjunction| {
            if conjunction.is_ground() {
                Self::ground_conjunction_holds(conjunction, beliefs)
            } else {
                !Self::evaluate_conjunction(conjunction, beliefs).is_empty()
            }
        })
    }

    fn evaluate_conjunction(conjunction: &Conjunction, beliefs: &BeliefStore) -> Vec<Binding> {
        if conjunction.is_ground() {
            return if Self::ground_conjunction_holds(conjunction, beliefs) {
                vec![Binding::new()]
            } else {
                Vec::new()
            };
        }

        let mut partials = vec![Binding::new()];
        for clause in conjunction.clauses.iter().filter(|clause| !clause.negated) {
            let extended: BTreeSet<Binding> = partials
                .iter()
                .flat_map(|partial| {
                    beliefs
                        .with_name(&clause.name)
                        .filter_map(move |belief| clause.unify(belief, partial))
                })
                .collect();
            if extended.is_empty() {
                return Vec::new();
            }
            partials = extended.into_iter().collect();
        }

        // Negated clauses run last so that positive clauses bind first.
        for clause in conjunction.clauses.iter().filter(|clause| clause.negated) {
            partials.retain(|partial| !Self::any_match(clause, partial, beliefs));
            if partials.is_empty() {
                break;
            }
        }

        partials
    }

    fn any_match(clause: &Clause, binding: &Binding, beliefs: &BeliefStore) -> bool {
        beliefs
            .with_name(&clause.name)
            .any(|belief| clause.unify(belief, binding).is_some())
    }

    fn ground_conjunction_holds(conjunction: &Conjunction, beliefs: &BeliefStore) -> bool {
        conjunction.clauses.iter().all(|clause| {
            let holds = Self::ground_clause_holds(clause, beliefs);
            holds != clause.negated
        })
    }

    fn ground_clause_holds(clause: &Clause, beliefs: &BeliefStore) -> bool {
        let key = BeliefKey {
            name: clause.name.clone(),
            params: clause
                .params
                .iter()
                .map(|term| term.to_string())
                .collect(),
        };
        beliefs
            .get(&key)
            .is_some_and(|belief| clause.unify(belief, &Binding::new()).is_some())
    }
}
