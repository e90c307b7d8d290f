use crate::dataid::{Axis, AxisValue, DataId};
use crate::repo::{RepoError, Repository};

use log::info;
use std::collections::BTreeMap;

/// Returns the values to iterate for one axis: the command-line selection
/// when given, otherwise everything the repository knows about.
pub fn resolve_axis(
    repo: &dyn Repository,
    dataset: &str,
    axis: Axis,
    requested: Vec<AxisValue>,
) -> Result<Vec<AxisValue>, RepoError> {
    if requested.is_empty() {
        info!("Running over all {}", axis.plural_label());
        repo.query_metadata(dataset, axis)
    } else {
        Ok(requested)
    }
}

/// Candidate values per axis. Iterating a plan yields the full cross
/// product as data IDs, with the innermost axis varying fastest and axes
/// nested in their declaration order (visit, snap, raft/ccd, sensor/amp,
/// channel).
#[derive(Debug, Clone, Default)]
pub struct IterationPlan {
    axes: BTreeMap<Axis, Vec<AxisValue>>,
}

impl IterationPlan {
    pub fn new() -> IterationPlan {
        IterationPlan::default()
    }

    pub fn set(&mut self, axis: Axis, values: Vec<AxisValue>) {
        self.axes.insert(axis, values);
    }

    pub fn axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.axes.keys().copied()
    }

    /// Number of data IDs the plan will yield.
    pub fn tuple_count(&self) -> usize {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.values().map(Vec::len).product()
    }

    pub fn iter(&self) -> PlanIter<'_> {
        let axes: Vec<(Axis, &[AxisValue])> = self
            .axes
            .iter()
            .map(|(a, v)| (*a, v.as_slice()))
            .collect();
        let done = axes.is_empty() || axes.iter().any(|(_, v)| v.is_empty());
        PlanIter {
            indices: vec![0; axes.len()],
            axes,
            done,
        }
    }
}

impl<'a> IntoIterator for &'a IterationPlan {
    type Item = DataId;
    type IntoIter = PlanIter<'a>;

    fn into_iter(self) -> PlanIter<'a> {
        self.iter()
    }
}

/// Odometer over the axis value lists.
pub struct PlanIter<'a> {
    axes: Vec<(Axis, &'a [AxisValue])>,
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for PlanIter<'_> {
    type Item = DataId;

    fn next(&mut self) -> Option<DataId> {
        if self.done {
            return None;
        }

        let mut id = DataId::new();
        for ((axis, values), &index) in self.axes.iter().zip(self.indices.iter()) {
            id.set(*axis, values[index].clone());
        }

        // advance, innermost axis first
        self.done = true;
        for i in (0..self.axes.len()).rev() {
            self.indices[i] += 1;
            if self.indices[i] < self.axes[i].1.len() {
                self.done = false;
                break;
            }
            self.indices[i] = 0;
        }

        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<AxisValue> {
        values.iter().map(|&v| AxisValue::Int(v)).collect()
    }

    #[test]
    fn test_cross_product_nesting_order() {
        let mut plan = IterationPlan::new();
        plan.set(Axis::Ccd, ints(&[0, 1]));
        plan.set(Axis::Visit, ints(&[10, 11]));

        let ids: Vec<String> = plan.iter().map(|id| id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "visit=10 ccd=0",
                "visit=10 ccd=1",
                "visit=11 ccd=0",
                "visit=11 ccd=1",
            ]
        );
    }

    #[test]
    fn test_full_lsst_sim_nesting() {
        let mut plan = IterationPlan::new();
        plan.set(Axis::Visit, ints(&[1]));
        plan.set(Axis::Snap, ints(&[0, 1]));
        plan.set(
            Axis::Raft,
            vec![AxisValue::Text("2,2".into()), AxisValue::Text("2,3".into())],
        );
        plan.set(Axis::Sensor, vec![AxisValue::Text("1,1".into())]);

        assert_eq!(plan.tuple_count(), 4);
        let ids: Vec<String> = plan.iter().map(|id| id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "visit=1 snap=0 raft=2,2 sensor=1,1",
                "visit=1 snap=0 raft=2,3 sensor=1,1",
                "visit=1 snap=1 raft=2,2 sensor=1,1",
                "visit=1 snap=1 raft=2,3 sensor=1,1",
            ]
        );
    }

    #[test]
    fn test_single_axis_plan() {
        let mut plan = IterationPlan::new();
        plan.set(Axis::SkyTile, ints(&[7, 8]));
        let ids: Vec<String> = plan.iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["skyTile=7", "skyTile=8"]);
    }

    #[test]
    fn test_empty_axis_yields_nothing() {
        let mut plan = IterationPlan::new();
        plan.set(Axis::Visit, ints(&[1, 2]));
        plan.set(Axis::Ccd, Vec::new());
        assert_eq!(plan.iter().count(), 0);
        assert_eq!(plan.tuple_count(), 0);
    }

    #[test]
    fn test_empty_plan_yields_nothing() {
        let plan = IterationPlan::new();
        assert_eq!(plan.iter().count(), 0);
    }
}
