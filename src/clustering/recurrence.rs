//! Cross-year merging of clusters into recurring birthdays.

use std::collections::BTreeMap;

use crate::models::{BirthdayCluster, IdentityId, MonthDay};

/// Group clusters whose birthday dates fall within `tolerance_days` of a
/// group's reference month/day, ignoring the year.
///
/// Clusters are visited by month/day then year; each joins the first existing
/// group whose reference (the month/day of the group's first member) is close
/// enough, or starts a new group. Returned groups hold positions into
/// `clusters`, sorted within each group by year.
pub fn group_by_calendar_day(clusters: &[BirthdayCluster], tolerance_days: i64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..clusters.len()).collect();
    order.sort_by_key(|&i| {
        let c = &clusters[i];
        (MonthDay::from_date(c.birthday_date), c.birthday_date, c.id)
    });

    let mut groups: Vec<(MonthDay, Vec<usize>)> = Vec::new();
    for i in order {
        let date = MonthDay::from_date(clusters[i].birthday_date);
        match groups.iter_mut().find(|(reference, _)| reference.distance(&date) <= tolerance_days) {
            Some((_, members)) => members.push(i),
            None => groups.push((date, vec![i])),
        }
    }

    groups
        .into_iter()
        .map(|(_, mut members)| {
            members.sort_by_key(|&i| (clusters[i].birthday_date, clusters[i].id));
            members
        })
        .collect()
}

/// Split one calendar group by resolved target.
///
/// Each resolved target gets its own partition. Unresolved members join the
/// only resolved partition when there is exactly one, and otherwise form a
/// partition of their own. Partitions come out ordered by target handle with
/// the unresolved partition last.
pub fn partition_by_target(
    members: &[usize],
    targets: &[Option<IdentityId>],
) -> Vec<(Option<IdentityId>, Vec<usize>)> {
    let mut resolved: BTreeMap<IdentityId, Vec<usize>> = BTreeMap::new();
    let mut unresolved = Vec::new();
    for &m in members {
        match targets[m] {
            Some(target) => resolved.entry(target).or_default().push(m),
            None => unresolved.push(m),
        }
    }

    if resolved.len() == 1
        && let Some((_, partition)) = resolved.iter_mut().next()
    {
        partition.extend(unresolved.drain(..));
        partition.sort_unstable();
    }

    let mut partitions: Vec<(Option<IdentityId>, Vec<usize>)> =
        resolved.into_iter().map(|(target, m)| (Some(target), m)).collect();
    if !unresolved.is_empty() {
        partitions.push((None, unresolved));
    }
    partitions
}

/// Join partitions of the same resolved target whose dates touch.
///
/// Calendar groups are measured from a fixed reference, so a birthday drifting
/// a day each year can land in two neighbouring groups. Two partitions with the
/// same target merge when any pair of their members lies within
/// `tolerance_days`, and merging repeats until nothing more joins. Unresolved
/// partitions are kept as they are.
pub fn merge_same_target(
    partitions: Vec<(Option<IdentityId>, Vec<usize>)>,
    clusters: &[BirthdayCluster],
    tolerance_days: i64,
) -> Vec<(Option<IdentityId>, Vec<usize>)> {
    let date = |i: usize| MonthDay::from_date(clusters[i].birthday_date);
    let touches = |a: &[usize], b: &[usize]| {
        a.iter().any(|&i| b.iter().any(|&j| date(i).distance(&date(j)) <= tolerance_days))
    };

    let mut merged: Vec<(Option<IdentityId>, Vec<usize>)> = Vec::new();
    for (target, mut members) in partitions {
        if target.is_some() {
            while let Some(pos) =
                merged.iter().position(|(other, m)| *other == target && touches(m, &members))
            {
                let (_, absorbed) = merged.remove(pos);
                members.extend(absorbed);
            }
            members.sort_by_key(|&i| (clusters[i].birthday_date, clusters[i].id));
        }
        merged.push((target, members));
    }
    merged
}

/// The month/day a set of occurrences points to.
///
/// Feb 29 wins whenever it appears, or when both Feb 28 and Mar 1 do, since
/// leap-day birthdays are celebrated on either neighbour in common years.
/// Otherwise the most frequent date wins, earliest in the calendar on ties.
pub fn entity_date(dates: &[MonthDay]) -> Option<MonthDay> {
    let leap_day = MonthDay { month: 2, day: 29 };
    let feb28 = MonthDay { month: 2, day: 28 };
    let mar1 = MonthDay { month: 3, day: 1 };
    if dates.contains(&leap_day) || (dates.contains(&feb28) && dates.contains(&mar1)) {
        return Some(leap_day);
    }

    let mut counts: BTreeMap<MonthDay, usize> = BTreeMap::new();
    for date in dates {
        *counts.entry(*date).or_default() += 1;
    }
    // `max_by_key` keeps the last maximum, so walk the calendar backwards
    counts.into_iter().rev().max_by_key(|(_, n)| *n).map(|(date, _)| date)
}
