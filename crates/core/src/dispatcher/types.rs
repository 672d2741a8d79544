//! Types for the parallel dispatcher.

use thiserror::Error;

use crate::batch::{Command, Job};
use crate::executor::ExecutorError;

/// A contiguous slice of a command's item list owned by one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Worker number, starting at 0.
    pub worker: usize,
    /// Index of the first job in the original list.
    pub offset: usize,
    pub jobs: Vec<Job>,
}

/// Splits `items` into `min(workers, items.len())` contiguous slices whose
/// sizes differ by at most one. Earlier slices take the remainder.
pub fn partition(items: &[Job], workers: usize) -> Vec<Partition> {
    if items.is_empty() {
        return Vec::new();
    }

    let workers = workers.clamp(1, items.len());
    let base = items.len() / workers;
    let remainder = items.len() % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut offset = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < remainder);
        partitions.push(Partition {
            worker,
            offset,
            jobs: items[offset..offset + size].to_vec(),
        });
        offset += size;
    }
    partitions
}

/// A command stopped because a job failed.
#[derive(Debug, Error)]
#[error("{command} failed{} after {completed} completed job(s): {source}", describe_position(.index, .job))]
pub struct DispatchFailure {
    pub command: Command,
    /// Position of the failing job in the command's item list, if known.
    pub index: Option<usize>,
    /// The failing job, if known.
    pub job: Option<Job>,
    /// Jobs that finished successfully before the run stopped.
    pub completed: usize,
    #[source]
    pub source: ExecutorError,
}

fn describe_position(index: &Option<usize>, job: &Option<Job>) -> String {
    match (index, job) {
        (Some(index), Some(job)) => format!(" at item #{index} ({job})"),
        (Some(index), None) => format!(" at item #{index}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jobs(n: usize) -> Vec<Job> {
        (0..n).map(|i| Job::from(format!("job-{i}").as_str())).collect()
    }

    fn sizes(partitions: &[Partition]) -> Vec<usize> {
        partitions.iter().map(|p| p.jobs.len()).collect()
    }

    #[test]
    fn test_partition_even() {
        let parts = partition(&jobs(6), 3);
        assert_eq!(sizes(&parts), vec![2, 2, 2]);
        assert_eq!(parts[1].offset, 2);
        assert_eq!(parts[2].jobs[1], Job::from("job-5"));
    }

    #[test]
    fn test_partition_uneven() {
        let parts = partition(&jobs(7), 3);
        assert_eq!(sizes(&parts), vec![3, 2, 2]);
        let offsets: Vec<usize> = parts.iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0, 3, 5]);
    }

    #[test]
    fn test_partition_clamps_to_item_count() {
        let parts = partition(&jobs(2), 8);
        assert_eq!(sizes(&parts), vec![1, 1]);
    }

    #[test]
    fn test_partition_preserves_order() {
        let items = jobs(10);
        let flattened: Vec<Job> = partition(&items, 4)
            .into_iter()
            .flat_map(|p| p.jobs)
            .collect();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(&[], 4).is_empty());
    }

    #[test]
    fn test_failure_message() {
        let failure = DispatchFailure {
            command: Command::Copy,
            index: Some(2),
            job: Some(Job::from("c")),
            completed: 2,
            source: ExecutorError::Failed("disk full".to_string()),
        };
        assert_eq!(
            failure.to_string(),
            r#"copy failed at item #2 ("c") after 2 completed job(s): disk full"#
        );
    }
}
