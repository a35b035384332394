//! Job statistics.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::error::ClientResult;
use crate::job::{job_path, nullable};

/// Run-time distribution of a job, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobStatHistogram {
    #[serde(rename = "75thPercentile")]
    pub percentile_75th: f64,
    #[serde(rename = "95thPercentile")]
    pub percentile_95th: f64,
    #[serde(rename = "98thPercentile")]
    pub percentile_98th: f64,
    #[serde(rename = "99thPercentile")]
    pub percentile_99th: f64,
    #[serde(rename = "median", alias = "Median")]
    pub median: f64,
    pub mean: f64,
    pub count: u64,
}

/// One past task of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskStat {
    pub task_id: String,
    pub job_name: String,
    pub slave_id: String,
    #[serde(deserialize_with = "nullable")]
    pub start_time: String,
    #[serde(deserialize_with = "nullable")]
    pub end_time: String,
    #[serde(deserialize_with = "nullable")]
    pub duration: String,
    pub status: String,
    pub num_elements_processed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobStat {
    pub histogram: JobStatHistogram,
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub task_stat_history: Vec<TaskStat>,
}

impl Client {
    /// Fetch the run-time histogram and task history of a job.
    pub async fn job_stat(&self, name: &str) -> ClientResult<JobStat> {
        self.api_get(&job_path("/scheduler/job/stat", name)).await
    }
}
