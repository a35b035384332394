//! chronos-client — client library for the Chronos job scheduler.
//!
//! Wraps the scheduler's REST API (job CRUD, run/kill triggers, job
//! statistics) on top of a failover-aware [`Cluster`] from
//! `chronos-cluster`.
//!
//! # Architecture
//!
//! ```text
//! Client
//!   ├── ClientConfig (url, timeout, basic auth; TOML)
//!   ├── api_call()
//!   │   ├── Cluster::get_member() → base URL
//!   │   ├── Transport::send()
//!   │   └── transport failure → Cluster::mark_inactive_host(), retry
//!   ├── jobs / job / create / update / run / delete / kill
//!   └── job_stat
//! ```
//!
//! ```no_run
//! # async fn demo() -> chronos_client::ClientResult<()> {
//! use chronos_client::{Client, ClientConfig, Job};
//!
//! let client = Client::new(ClientConfig::new("http://chronos-1:4400,chronos-2:4400"))?;
//! let mut job = Job::new("nightly-report");
//! job.command = "generate-report".into();
//! job.schedule = "R/2024-01-01T02:00:00Z/P1D".into();
//! job.sanity_check()?;
//! client.create_job(&job).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod job;
pub mod stat;

pub use chronos_cluster::{Cluster, ClusterError, Member};
pub use client::Client;
pub use config::ClientConfig;
pub use container::{Container, Parameter, Volume};
pub use error::{ClientError, ClientResult};
pub use job::{EnvVar, Job, JobType};
pub use stat::{JobStat, JobStatHistogram, TaskStat};
