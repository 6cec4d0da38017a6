//! Cost payment checks.
//!
//! A selection pays a cost only when the contributions of the selected
//! providers add up to exactly the required amount. Overpaying is rejected.
//! Every selected id must appear in the candidate list, and no id may be
//! selected twice.

use std::collections::HashSet;

use credo_proto::{Cost, CostProvider, EntityId};

/// Largest candidate list searched exhaustively by [`find_exact_selection`].
const MAX_SEARCH_CANDIDATES: usize = 20;

fn lookup(candidates: &[CostProvider], entity: EntityId) -> Option<&CostProvider> {
    candidates.iter().find(|p| p.entity == entity)
}

/// Sum contributed by `selected`, or `None` if an id is not a candidate.
///
/// Duplicates are counted every time they appear; use [`is_satisfied`] for
/// the full check.
pub fn provided_total(candidates: &[CostProvider], selected: &[EntityId]) -> Option<u64> {
    selected.iter().try_fold(0u64, |total, &entity| {
        lookup(candidates, entity).map(|p| total + u64::from(p.contribution()))
    })
}

/// Whether `selected` pays exactly `cost` out of `candidates`.
pub fn is_satisfied(cost: Cost, candidates: &[CostProvider], selected: &[EntityId]) -> bool {
    let mut seen = HashSet::with_capacity(selected.len());
    if !selected.iter().all(|entity| seen.insert(*entity)) {
        return false;
    }

    provided_total(candidates, selected) == Some(u64::from(cost.any))
}

/// First selection (in candidate order) that pays exactly `cost`.
///
/// Candidates with duplicate ids are considered once. Searches at most the
/// first few candidates that contribute something; returns `None` when no
/// exact payment exists among them.
pub fn find_exact_selection(cost: Cost, candidates: &[CostProvider]) -> Option<Vec<EntityId>> {
    if cost.any == 0 {
        return Some(Vec::new());
    }

    let mut seen = HashSet::new();
    let useful: Vec<&CostProvider> = candidates
        .iter()
        .filter(|p| seen.insert(p.entity))
        .filter(|p| p.contribution() > 0)
        .take(MAX_SEARCH_CANDIDATES)
        .collect();

    let target = u64::from(cost.any);
    let mut chosen = Vec::with_capacity(useful.len());
    if search(&useful, target, 0, &mut chosen) { Some(chosen) } else { None }
}

fn search(useful: &[&CostProvider], remaining: u64, from: usize, chosen: &mut Vec<EntityId>) -> bool {
    if remaining == 0 {
        return true;
    }

    for (offset, provider) in useful[from..].iter().enumerate() {
        let amount = u64::from(provider.contribution());
        if amount > remaining {
            continue;
        }
        chosen.push(provider.entity);
        if search(useful, remaining - amount, from + offset + 1, chosen) {
            return true;
        }
        chosen.pop();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(entity: u32, any: u32) -> CostProvider {
        CostProvider { entity: EntityId(entity), provided: Some(Cost { any }) }
    }

    fn ids(raw: &[u32]) -> Vec<EntityId> {
        raw.iter().copied().map(EntityId).collect()
    }

    #[test]
    fn exact_sum_is_required() {
        let cost = Cost { any: 3 };
        let candidates = [provider(1, 2), provider(2, 1)];

        assert!(is_satisfied(cost, &candidates, &ids(&[1, 2])));
        assert!(!is_satisfied(cost, &candidates, &ids(&[1])));
        assert!(!is_satisfied(cost, &candidates, &ids(&[1, 2, 99])));
    }

    #[test]
    fn overpayment_rejected() {
        let candidates = [provider(1, 2), provider(2, 2)];
        assert!(!is_satisfied(Cost { any: 3 }, &candidates, &ids(&[1, 2])));
    }

    #[test]
    fn duplicate_selection_rejected() {
        let candidates = [provider(1, 2), provider(2, 1)];
        assert!(!is_satisfied(Cost { any: 4 }, &candidates, &ids(&[1, 1])));
        assert_eq!(provided_total(&candidates, &ids(&[1, 1])), Some(4));
    }

    #[test]
    fn empty_selection_pays_only_zero() {
        let candidates = [provider(1, 2)];
        assert!(is_satisfied(Cost { any: 0 }, &candidates, &[]));
        assert!(!is_satisfied(Cost { any: 1 }, &candidates, &[]));
    }

    #[test]
    fn provider_without_amount_counts_as_zero() {
        let candidates = [CostProvider { entity: EntityId(4), provided: None }, provider(5, 1)];
        assert!(is_satisfied(Cost { any: 1 }, &candidates, &ids(&[4, 5])));
    }

    #[test]
    fn unknown_provider_has_no_total() {
        assert_eq!(provided_total(&[provider(1, 1)], &ids(&[2])), None);
    }

    #[test]
    fn finds_exact_selection() {
        let candidates = [provider(1, 2), provider(2, 2), provider(3, 1)];
        let selection = find_exact_selection(Cost { any: 3 }, &candidates).expect("payable");

        assert_eq!(selection, ids(&[1, 3]));
        assert!(is_satisfied(Cost { any: 3 }, &candidates, &selection));
    }

    #[test]
    fn no_exact_selection() {
        let candidates = [provider(1, 2), provider(2, 2)];
        assert_eq!(find_exact_selection(Cost { any: 3 }, &candidates), None);
        assert_eq!(find_exact_selection(Cost { any: 0 }, &candidates), Some(vec![]));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn candidates() -> impl Strategy<Value = Vec<CostProvider>> {
            proptest::collection::vec((0u32..12, proptest::option::of(0u32..5)), 0..10).prop_map(
                |raw| {
                    raw.into_iter()
                        .map(|(entity, any)| CostProvider {
                            entity: EntityId(entity),
                            provided: any.map(|any| Cost { any }),
                        })
                        .collect()
                },
            )
        }

        proptest! {
            #[test]
            fn found_selection_always_satisfies(cost in 0u32..15, candidates in candidates()) {
                if let Some(selection) = find_exact_selection(Cost { any: cost }, &candidates) {
                    prop_assert!(
                        is_satisfied(Cost { any: cost }, &candidates, &selection),
                        "selection {:?} does not pay {}",
                        selection,
                        cost
                    );
                }
            }

            #[test]
            fn satisfied_means_exact_total(
                cost in 0u32..15,
                candidates in candidates(),
                picks in proptest::collection::vec(0u32..14, 0..6),
            ) {
                let selected = ids(&picks);
                if is_satisfied(Cost { any: cost }, &candidates, &selected) {
                    prop_assert_eq!(provided_total(&candidates, &selected), Some(u64::from(cost)));
                }
            }
        }
    }
}
