//! Greedy seed-based grouping.
//!
//! Images are visited in enumeration order. Each unassigned image seeds a
//! new group, and every later unassigned image that matches the seed joins
//! it. Candidates are compared against the seed only, never against other
//! members, so chains of marginal matches can end up split. Undersized
//! groups are dropped but their members stay assigned.

use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use uuid::Uuid;

/// A group of item indices, seed first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedGroup {
    pub id: Uuid,
    pub members: Vec<usize>,
}

/// Result of one grouping pass
#[derive(Debug, Clone, Default)]
pub struct GroupingOutcome {
    /// Groups that reached the minimum size, in seed order
    pub groups: Vec<SeedGroup>,
    /// Indices consumed by undersized groups
    pub dropped: Vec<usize>,
    /// Number of seed/candidate evaluations
    pub comparisons: usize,
}

/// Partitions items into seed groups
#[derive(Debug, Clone, Copy)]
pub struct SeedGrouper {
    min_group_size: usize,
}

impl SeedGrouper {
    pub fn new(min_group_size: usize) -> Self {
        Self {
            min_group_size: min_group_size.max(1),
        }
    }

    pub fn group<T, F>(&self, items: &[T], is_match: F) -> GroupingOutcome
    where
        T: Sync,
        F: Fn(&T, &T) -> bool + Sync,
    {
        self.group_with_events(items, is_match, &crate::events::null_sender())
    }

    /// Group items, reporting progress after every seed.
    ///
    /// The candidates of one seed are evaluated in parallel; admission
    /// happens afterwards in enumeration order, so the outcome is the same
    /// as a sequential pass.
    pub fn group_with_events<T, F>(&self, items: &[T], is_match: F, events: &EventSender) -> GroupingOutcome
    where
        T: Sync,
        F: Fn(&T, &T) -> bool + Sync,
    {
        let total = items.len();
        events.send(Event::Compare(CompareEvent::Started { total_images: total }));

        let mut assigned = vec![false; total];
        let mut assigned_count = 0;
        let mut outcome = GroupingOutcome::default();

        for seed in 0..total {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            assigned_count += 1;

            let candidates: Vec<usize> = (seed + 1..total).filter(|&i| !assigned[i]).collect();
            let hits: Vec<bool> = candidates
                .par_iter()
                .map(|&candidate| is_match(&items[seed], &items[candidate]))
                .collect();
            outcome.comparisons += candidates.len();

            let mut members = vec![seed];
            for (&candidate, hit) in candidates.iter().zip(hits) {
                if hit {
                    assigned[candidate] = true;
                    assigned_count += 1;
                    members.push(candidate);
                }
            }

            if members.len() >= self.min_group_size {
                let group = SeedGroup {
                    id: Uuid::new_v4(),
                    members,
                };
                events.send(Event::Compare(CompareEvent::GroupFound {
                    group_id: group.id.to_string(),
                    image_count: group.members.len(),
                }));
                outcome.groups.push(group);
            } else {
                outcome.dropped.extend(members);
            }

            events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                images_assigned: assigned_count,
                total_images: total,
                comparisons_completed: outcome.comparisons,
                groups_found: outcome.groups.len(),
            })));
        }

        events.send(Event::Compare(CompareEvent::Completed {
            total_groups: outcome.groups.len(),
            grouped_images: outcome.groups.iter().map(|g| g.members.len()).sum(),
        }));

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;

    fn members(outcome: &GroupingOutcome) -> Vec<Vec<usize>> {
        outcome.groups.iter().map(|g| g.members.clone()).collect()
    }

    #[test]
    fn empty_input_has_no_groups() {
        let outcome = SeedGrouper::new(2).group(&[] as &[u32], |a, b| a == b);
        assert!(outcome.groups.is_empty());
        assert!(outcome.dropped.is_empty());
        assert_eq!(outcome.comparisons, 0);
    }

    #[test]
    fn single_item_is_dropped() {
        let outcome = SeedGrouper::new(2).group(&[7], |a, b| a == b);
        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.dropped, vec![0]);
    }

    #[test]
    fn equal_items_group_in_order() {
        let items = [1, 2, 1, 3, 2, 1];
        let outcome = SeedGrouper::new(2).group(&items, |a, b| a == b);

        assert_eq!(members(&outcome), vec![vec![0, 2, 5], vec![1, 4]]);
        assert_eq!(outcome.dropped, vec![3]);
    }

    #[test]
    fn candidates_compare_against_seed_only() {
        // 10 ~ 12 and 12 ~ 14, but 10 and 14 are too far apart.
        let items = [10, 12, 14];
        let close = |a: &i32, b: &i32| (a - b).abs() <= 2;
        let outcome = SeedGrouper::new(2).group(&items, close);

        assert_eq!(members(&outcome), vec![vec![0, 1]]);
        assert_eq!(outcome.dropped, vec![2]);
    }

    #[test]
    fn dropped_members_are_not_reseeded() {
        // With a minimum of 3, {0, 1} is dropped and 1 never seeds {1, 2, 3}.
        let items = [0, 1, 2, 3];
        let close = |a: &i32, b: &i32| (a - b).abs() <= 1 || (*a == 1 && *b == 3);
        let outcome = SeedGrouper::new(3).group(&items, close);

        assert!(outcome.groups.is_empty());
        assert_eq!(outcome.dropped, vec![0, 1, 2, 3]);
    }

    #[test]
    fn every_item_is_accounted_for_once() {
        let items: Vec<i32> = (0..40).map(|i| (i * 7) % 5).collect();
        let outcome = SeedGrouper::new(3).group(&items, |a, b| a == b);

        let mut seen: Vec<usize> = outcome
            .groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .chain(outcome.dropped.iter().copied())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..40).collect::<Vec<_>>());
        assert!(outcome.groups.iter().all(|g| g.members.len() >= 3));
    }

    #[test]
    fn grouping_is_deterministic() {
        let items: Vec<i32> = (0..30).map(|i| (i * 13) % 7).collect();
        let first = SeedGrouper::new(2).group(&items, |a, b| (a - b).abs() <= 1);
        let second = SeedGrouper::new(2).group(&items, |a, b| (a - b).abs() <= 1);
        assert_eq!(members(&first), members(&second));
        assert_eq!(first.dropped, second.dropped);
    }

    #[test]
    fn emits_started_progress_and_completed() {
        let (sender, receiver) = EventChannel::new();
        SeedGrouper::new(2).group_with_events(&[1, 1, 2], |a, b| a == b, &sender);
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(
            events.first(),
            Some(Event::Compare(CompareEvent::Started { total_images: 3 }))
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Compare(CompareEvent::GroupFound { image_count: 2, .. }))));
        assert!(matches!(
            events.last(),
            Some(Event::Compare(CompareEvent::Completed {
                total_groups: 1,
                grouped_images: 2
            }))
        ));
    }
}
