//! Hourly grouping by `(date, hour, location)`.
//!
//! Groups come out in the order their key is first seen in the input.

use std::collections::HashMap;

use crate::pipeline::models::{AverageRow, ClassifiedReading, EnrichedReading, GroupKey, MetricRow};

/// Insertion-ordered accumulator keyed by [`GroupKey`].
struct OrderedGroups<A> {
    slots: HashMap<GroupKey, usize>,
    groups: Vec<(GroupKey, A)>,
}

impl<A: Default> OrderedGroups<A> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            groups: Vec::new(),
        }
    }

    fn slot(&mut self, key: GroupKey) -> &mut A {
        let idx = if let Some(&idx) = self.slots.get(&key) {
            idx
        } else {
            let idx = self.groups.len();
            self.slots.insert(key.clone(), idx);
            self.groups.push((key, A::default()));
            idx
        };
        &mut self.groups[idx].1
    }

    fn into_groups(self) -> Vec<(GroupKey, A)> {
        self.groups
    }
}

#[derive(Default)]
struct FlagCounts {
    in_range: u32,
    out_of_range: u32,
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

/// Count in-range and out-of-range readings per hour and location and derive
/// the operational ratio.
///
/// Every emitted group has at least one reading, so the ratio's denominator is
/// never zero. An empty input yields an empty output.
#[must_use]
pub fn aggregate(classified: &[ClassifiedReading<'_>]) -> Vec<MetricRow> {
    let mut groups: OrderedGroups<FlagCounts> = OrderedGroups::new();

    for c in classified {
        let flag = u32::from(c.operation_flag());
        let counts = groups.slot(c.reading.group_key());
        counts.in_range += flag;
        counts.out_of_range += 1 - flag;
    }

    groups
        .into_groups()
        .into_iter()
        .map(|(key, counts)| {
            let total = counts.in_range + counts.out_of_range;
            MetricRow {
                date: key.date,
                hour: key.hour,
                location_id: key.location_id,
                in_range_count: counts.in_range,
                out_of_range_count: counts.out_of_range,
                operational_ratio: f64::from(counts.in_range) / f64::from(total),
            }
        })
        .collect()
}

/// Arithmetic mean of `value` per hour and location.
pub fn average<'a, I>(readings: I) -> Vec<AverageRow>
where
    I: IntoIterator<Item = &'a EnrichedReading>,
{
    let mut groups: OrderedGroups<Mean> = OrderedGroups::new();

    for r in readings {
        let mean = groups.slot(r.group_key());
        mean.sum += r.value;
        mean.count += 1;
    }

    groups
        .into_groups()
        .into_iter()
        .map(|(key, mean)| AverageRow {
            date: key.date,
            hour: key.hour,
            location_id: key.location_id,
            mean_value: mean.sum / f64::from(mean.count),
        })
        .collect()
}
