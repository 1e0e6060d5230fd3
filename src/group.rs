use crate::{
    config::GroupBy,
    error::{MetricError, Result},
    record::RunRecord,
};

#[derive(Debug, Clone)]
pub struct BenchmarkGroup<'a> {
    name: &'a str,
    runs: Vec<&'a RunRecord>,
}

impl<'a> BenchmarkGroup<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn runs(&self) -> &[&'a RunRecord] {
        &self.runs
    }

    /// The single run of `experiment`, if the group has one.
    pub fn run(&self, experiment: &str) -> Result<Option<&'a RunRecord>> {
        let mut matching = self.runs.iter().filter(|r| r.experiment() == experiment);
        let first = matching.next().copied();
        if matching.next().is_some() {
            return Err(MetricError::DuplicateRun {
                group: self.name.to_string(),
                experiment: experiment.to_string(),
            });
        }
        Ok(first)
    }
}

fn group_key(record: &RunRecord, group_by: GroupBy) -> &str {
    match group_by {
        GroupBy::Benchmark => record.benchmark(),
        GroupBy::Trace => record.trace(),
    }
}

/// Groups in order of first appearance in `records`.
pub fn group_runs(records: &[RunRecord], group_by: GroupBy) -> Vec<BenchmarkGroup<'_>> {
    let mut groups: Vec<BenchmarkGroup<'_>> = Vec::new();
    for record in records {
        let key = group_key(record, group_by);
        match groups.iter_mut().find(|g| g.name == key) {
            Some(group) => group.runs.push(record),
            None => groups.push(BenchmarkGroup {
                name: key,
                runs: vec![record],
            }),
        }
    }
    groups
}
