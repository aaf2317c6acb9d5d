//! Horizontal partitioning of a scan across cooperating workers.
//!
//! Worker `num` of `total` owns every column `x` with `x % total == num`, so
//! the shards of one enumeration are disjoint and together cover it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ScanError;

/// One worker's share of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobShard {
    pub total: u32,
    pub num: u32,
}

impl JobShard {
    pub fn new(total: u32, num: u32) -> Result<Self, ScanError> {
        let shard = JobShard { total, num };
        shard.validate()?;
        Ok(shard)
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.total == 0 {
            return Err(ScanError::config("job.total must be > 0"));
        }
        if self.num >= self.total {
            return Err(ScanError::config(format!(
                "job.num must be in [0, {})",
                self.total
            )));
        }
        Ok(())
    }

    /// True if column `x` belongs to this worker.
    pub fn accepts(&self, x: u32) -> bool {
        x % self.total == self.num
    }
}

/// True when there is no shard or the shard owns column `x`.
pub fn belongs_to_job(x: u32, job: Option<&JobShard>) -> bool {
    job.map_or(true, |j| j.accepts(x))
}

impl fmt::Display for JobShard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.total)
    }
}

/// Parses `num/total`, e.g. `2/15`.
impl FromStr for JobShard {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, total) = s
            .split_once('/')
            .ok_or_else(|| ScanError::config("job must be of the form num/total"))?;
        let num = num
            .trim()
            .parse()
            .map_err(|_| ScanError::config("job num must be an integer"))?;
        let total = total
            .trim()
            .parse()
            .map_err(|_| ScanError::config("job total must be an integer"))?;
        JobShard::new(total, num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_job_accepts_everything() {
        assert!((0..100).all(|x| belongs_to_job(x, None)));
    }

    #[test]
    fn shards_partition_columns() {
        for total in [1u32, 4, 15, 267, 382] {
            for x in 0..500u32 {
                let owners = (0..total)
                    .filter(|&num| JobShard { total, num }.accepts(x))
                    .count();
                assert_eq!(owners, 1, "column {} with {} jobs", x, total);
            }
        }
    }

    #[test]
    fn invalid_shards_rejected() {
        assert!(JobShard::new(0, 0).is_err());
        assert!(JobShard::new(4, 4).is_err());
        assert!(JobShard::new(4, 3).is_ok());
    }

    #[test]
    fn parse_num_over_total() {
        assert_eq!("2/15".parse::<JobShard>().unwrap(), JobShard { total: 15, num: 2 });
        assert!("15".parse::<JobShard>().is_err());
        assert!("3/3".parse::<JobShard>().is_err());
        assert!("a/3".parse::<JobShard>().is_err());
        assert_eq!(JobShard { total: 4, num: 1 }.to_string(), "1/4");
    }
}
