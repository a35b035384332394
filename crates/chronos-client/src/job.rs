//! Job definitions and the job endpoints of the scheduler API.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::client::Client;
use crate::container::Container;
use crate::error::{ClientError, ClientResult};

static REPEAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^R(?P<times>\d+)?$").unwrap());

static START_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<year>\d{4})-(?P<month>\d{2})-(?P<day>\d{2})T(?P<hour>\d{2}):(?P<minute>\d{2}):(?P<second>\d{2})(?P<zone>Z|[+-]\d{2}:\d{2})$",
    )
    .unwrap()
});

static INTERVAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^P((?P<year>\d+)Y)?((?P<month>\d+)M)?((?P<day>\d+)D)?(T((?P<hour>\d+)H)?((?P<minute>\d+)M)?((?P<second>\d+)S)?)?$",
    )
    .unwrap()
});

/// `<prefix>/<name>` with the job name percent-encoded as one path segment.
pub(crate) fn job_path(prefix: &str, name: &str) -> String {
    format!("{prefix}/{}", urlencoding::encode(name))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// How the scheduler triggers a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    /// Runs after its parents complete.
    DependencyBased,
    /// Runs on an ISO8601 repeating interval.
    ScheduleBased,
    /// Has both or neither of parents and schedule.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,

    #[serde(deserialize_with = "nullable")]
    pub command: String,
    pub shell: bool,
    #[serde(deserialize_with = "nullable")]
    pub arguments: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub run_as_user: String,

    #[serde(deserialize_with = "nullable")]
    pub environment_variables: Vec<EnvVar>,

    pub r#async: bool,
    pub disabled: bool,
    pub high_priority: bool,
    pub soft_error: bool,
    pub data_processing_job_type: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,

    pub cpus: f64,
    pub disk: f64,
    #[serde(rename = "mem")]
    pub memory: f64,

    #[serde(deserialize_with = "nullable")]
    pub uris: Vec<String>,

    #[serde(deserialize_with = "nullable")]
    pub epsilon: String,

    pub success_count: i64,
    pub error_count: i64,
    #[serde(deserialize_with = "nullable")]
    pub last_success: String,
    #[serde(deserialize_with = "nullable")]
    pub last_error: String,
    pub errors_since_last_success: i64,

    #[serde(deserialize_with = "nullable")]
    pub executor: String,
    #[serde(deserialize_with = "nullable")]
    pub executor_flags: String,

    pub retries: u32,

    #[serde(deserialize_with = "nullable")]
    pub owner: String,
    #[serde(deserialize_with = "nullable")]
    pub owner_name: String,

    #[serde(deserialize_with = "nullable")]
    pub constraints: Vec<Vec<String>>,

    // Schedule-based jobs only.
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub schedule: String,
    #[serde(skip_serializing_if = "String::is_empty", deserialize_with = "nullable")]
    pub schedule_time_zone: String,

    // Dependency-based jobs only.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "nullable")]
    pub parents: Vec<String>,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            command: String::new(),
            shell: true,
            arguments: Vec::new(),
            run_as_user: String::new(),
            environment_variables: Vec::new(),
            r#async: false,
            disabled: false,
            high_priority: false,
            soft_error: false,
            data_processing_job_type: false,
            container: None,
            cpus: 0.0,
            disk: 0.0,
            memory: 0.0,
            uris: Vec::new(),
            epsilon: "PT60S".to_string(),
            success_count: 0,
            error_count: 0,
            last_success: String::new(),
            last_error: String::new(),
            errors_since_last_success: 0,
            executor: String::new(),
            executor_flags: String::new(),
            retries: 2,
            owner: String::new(),
            owner_name: String::new(),
            constraints: Vec::new(),
            schedule: String::new(),
            schedule_time_zone: String::new(),
            parents: Vec::new(),
        }
    }
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A job that runs in a Docker container.
    pub fn new_container(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            container: Some(Container::docker(image)),
            ..Self::new(name)
        }
    }

    pub fn add_env_var(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.environment_variables.push(EnvVar {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn add_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.uris.push(uri.into());
        self
    }

    pub fn job_type(&self) -> JobType {
        let has_parents = !self.parents.is_empty();
        let has_schedule = !self.schedule.is_empty();

        match (has_parents, has_schedule) {
            (true, false) => JobType::DependencyBased,
            (false, true) => JobType::ScheduleBased,
            _ => JobType::Unknown,
        }
    }

    /// Validate the job before submitting it.
    pub fn sanity_check(&self) -> ClientResult<()> {
        match self.job_type() {
            JobType::Unknown => Err(ClientError::InvalidJob(
                "job must include one of parents and schedule".into(),
            )),
            JobType::ScheduleBased => self.check_schedule(),
            JobType::DependencyBased => Ok(()),
        }
    }

    /// Check the schedule is an ISO8601 repeating interval:
    /// `R[n]/<start time>/<period>`.
    pub fn check_schedule(&self) -> ClientResult<()> {
        let parts: Vec<&str> = self.schedule.split('/').collect();
        let [repeat, start_time, interval] = parts.as_slice() else {
            return Err(ClientError::InvalidJob(
                "schedule should contain 3 elements".into(),
            ));
        };

        if !REPEAT_RE.is_match(repeat) {
            return Err(ClientError::InvalidJob(
                "schedule: repeat field syntax error".into(),
            ));
        }
        if !START_TIME_RE.is_match(start_time) {
            return Err(ClientError::InvalidJob(
                "schedule: startTime field syntax error".into(),
            ));
        }
        if !INTERVAL_RE.is_match(interval) {
            return Err(ClientError::InvalidJob(
                "schedule: interval field syntax error".into(),
            ));
        }
        Ok(())
    }

    /// Submission endpoint for this job's type.
    fn endpoint(&self) -> ClientResult<&'static str> {
        match self.job_type() {
            JobType::DependencyBased => Ok("/scheduler/dependency"),
            JobType::ScheduleBased => Ok("/scheduler/iso8601"),
            JobType::Unknown => Err(ClientError::InvalidJob(
                "job must include one of parents and schedule".into(),
            )),
        }
    }
}

/// Decode `null` as the type's default value.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Client {
    /// List every job known to the scheduler.
    pub async fn jobs(&self) -> ClientResult<Vec<Job>> {
        self.api_get("/scheduler/jobs").await
    }

    /// Look up a single job by name.
    pub async fn job(&self, name: &str) -> ClientResult<Job> {
        self.jobs()
            .await?
            .into_iter()
            .find(|job| job.name == name)
            .ok_or_else(|| ClientError::JobNotFound(name.to_string()))
    }

    /// Trigger an immediate run.
    pub async fn run_job(&self, name: &str) -> ClientResult<()> {
        self.api_put::<()>(&job_path("/scheduler/job", name), None).await
    }

    pub async fn delete_job(&self, name: &str) -> ClientResult<()> {
        self.api_delete(&job_path("/scheduler/job", name)).await
    }

    /// Kill every running task of a job.
    pub async fn kill_job(&self, name: &str) -> ClientResult<()> {
        self.api_delete(&job_path("/scheduler/task/kill", name)).await
    }

    pub async fn create_job(&self, job: &Job) -> ClientResult<()> {
        let uri = job.endpoint()?;
        debug!(job = %job.name, %uri, "creating job");
        self.api_post(uri, Some(job)).await
    }

    pub async fn update_job(&self, job: &Job) -> ClientResult<()> {
        let uri = job.endpoint()?;
        debug!(job = %job.name, %uri, "updating job");
        self.api_put(uri, Some(job)).await
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::client::testing::*;

    fn scheduled(schedule: &str) -> Job {
        Job {
            schedule: schedule.to_string(),
            ..Job::new("nightly")
        }
    }

    fn dependent() -> Job {
        Job {
            parents: vec!["nightly".to_string()],
            ..Job::new("report")
        }
    }

    #[test]
    fn new_job_defaults() {
        let job = Job::new("x");
        assert!(job.shell);
        assert_eq!(job.epsilon, "PT60S");
        assert_eq!(job.retries, 2);
        assert!(!job.r#async);
        assert!(job.arguments.is_empty());
        assert!(job.container.is_none());
    }

    #[test]
    fn container_job_uses_docker() {
        let job = Job::new_container("x", "busybox");
        let container = job.container.unwrap();
        assert_eq!(container.kind, "DOCKER");
        assert_eq!(container.image, "busybox");
    }

    #[test]
    fn builders_append() {
        let mut job = Job::new("x");
        job.add_env_var("RUST_LOG", "info").add_uri("s3://bucket/app.tar.gz");
        assert_eq!(job.environment_variables[0].name, "RUST_LOG");
        assert_eq!(job.uris, vec!["s3://bucket/app.tar.gz"]);
    }

    #[test]
    fn job_type_detection() {
        assert_eq!(scheduled("R/2024-01-01T00:00:00Z/PT1H").job_type(), JobType::ScheduleBased);
        assert_eq!(dependent().job_type(), JobType::DependencyBased);
        assert_eq!(Job::new("x").job_type(), JobType::Unknown);

        let both = Job {
            parents: vec!["a".into()],
            ..scheduled("R/2024-01-01T00:00:00Z/PT1H")
        };
        assert_eq!(both.job_type(), JobType::Unknown);
    }

    #[test]
    fn valid_schedules_pass() {
        for schedule in [
            "R/2024-01-01T00:00:00Z/PT1H",
            "R5/2024-06-30T12:30:00+02:00/P1D",
            "R10/2024-06-30T12:30:00-05:30/P1Y2M3DT4H5M6S",
            "R/2024-01-01T00:00:00Z/P",
        ] {
            assert!(scheduled(schedule).sanity_check().is_ok(), "{schedule}");
        }
    }

    #[test]
    fn invalid_schedules_fail() {
        let cases = [
            ("R/2024-01-01T00:00:00Z", "3 elements"),
            ("X/2024-01-01T00:00:00Z/PT1H", "repeat"),
            ("R/2024-01-01 00:00:00/PT1H", "startTime"),
            ("R/2024-01-01T00:00:00+0200/PT1H", "startTime"),
            ("R/2024-01-01T00:00:00Z/1H", "interval"),
        ];
        for (schedule, expected) in cases {
            let err = scheduled(schedule).sanity_check().unwrap_err();
            assert!(err.to_string().contains(expected), "{schedule}: {err}");
        }
    }

    #[test]
    fn unknown_type_fails_sanity_check() {
        assert!(matches!(
            Job::new("x").sanity_check(),
            Err(ClientError::InvalidJob(_))
        ));
        assert!(dependent().sanity_check().is_ok());
    }

    #[test]
    fn serializes_chronos_field_names() {
        let json = serde_json::to_value(scheduled("R/2024-01-01T00:00:00Z/PT1H")).unwrap();
        assert_eq!(json["async"], false);
        assert_eq!(json["mem"], 0.0);
        assert_eq!(json["runAsUser"], "");
        assert_eq!(json["dataProcessingJobType"], false);
        assert_eq!(json["schedule"], "R/2024-01-01T00:00:00Z/PT1H");
        assert!(json.get("parents").is_none());
        assert!(json.get("scheduleTimeZone").is_none());
        assert!(json.get("container").is_none());

        let json = serde_json::to_value(dependent()).unwrap();
        assert_eq!(json["parents"][0], "nightly");
        assert!(json.get("schedule").is_none());
    }

    #[test]
    fn decodes_sparse_server_json() {
        let job: Job = serde_json::from_str(
            r#"{
                "name": "nightly",
                "command": "echo hi",
                "schedule": "R/2024-01-01T00:00:00Z/PT1H",
                "arguments": null,
                "lastError": null,
                "successCount": 12,
                "mem": 128.0,
                "container": null
            }"#,
        )
        .unwrap();
        assert_eq!(job.name, "nightly");
        assert_eq!(job.success_count, 12);
        assert_eq!(job.memory, 128.0);
        assert!(job.arguments.is_empty());
        assert!(job.container.is_none());
        // Missing fields fall back to defaults.
        assert_eq!(job.epsilon, "PT60S");
    }

    #[tokio::test]
    async fn create_routes_by_job_type() {
        let transport = MockTransport::new();
        let client = client("http://a:1", &transport);

        client
            .create_job(&scheduled("R/2024-01-01T00:00:00Z/PT1H"))
            .await
            .unwrap();
        client.create_job(&dependent()).await.unwrap();
        client.update_job(&dependent()).await.unwrap();

        let requests = transport.api_requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].url, "http://a:1/scheduler/iso8601");
        assert_eq!(requests[1].method, Method::POST);
        assert_eq!(requests[1].url, "http://a:1/scheduler/dependency");
        assert_eq!(requests[2].method, Method::PUT);
        assert_eq!(requests[2].url, "http://a:1/scheduler/dependency");

        let body: Job = serde_json::from_str(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, dependent());
    }

    #[tokio::test]
    async fn create_unknown_type_sends_nothing() {
        let transport = MockTransport::new();
        let client = client("http://a:1", &transport);

        let err = client.create_job(&Job::new("x")).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidJob(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn run_delete_and_kill_endpoints() {
        let transport = MockTransport::new();
        let client = client("http://a:1", &transport);

        client.run_job("nightly").await.unwrap();
        client.delete_job("nightly").await.unwrap();
        client.kill_job("nightly").await.unwrap();

        let calls: Vec<(Method, String)> = transport
            .api_requests()
            .into_iter()
            .map(|r| (r.method, r.url))
            .collect();
        assert_eq!(
            calls,
            vec![
                (Method::PUT, "http://a:1/scheduler/job/nightly".to_string()),
                (Method::DELETE, "http://a:1/scheduler/job/nightly".to_string()),
                (Method::DELETE, "http://a:1/scheduler/task/kill/nightly".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn job_names_are_encoded_as_one_path_segment() {
        let transport = MockTransport::new();
        let client = client("http://a:1", &transport);

        client.run_job("nightly backup").await.unwrap();
        client.delete_job("etl/daily").await.unwrap();
        client.kill_job("report?force=1").await.unwrap();
        transport.respond(200, "{}");
        client.job_stat("a#b").await.unwrap();

        let urls: Vec<String> = transport.api_requests().into_iter().map(|r| r.url).collect();
        assert_eq!(
            urls,
            vec![
                "http://a:1/scheduler/job/nightly%20backup",
                "http://a:1/scheduler/job/etl%2Fdaily",
                "http://a:1/scheduler/task/kill/report%3Fforce%3D1",
                "http://a:1/scheduler/job/stat/a%23b",
            ]
        );
    }

    #[tokio::test]
    async fn job_lookup_by_name() {
        let transport = MockTransport::new();
        transport.respond(200, r#"[{"name":"a"},{"name":"b","command":"true"}]"#);
        transport.respond(200, r#"[{"name":"a"}]"#);
        let client = client("http://a:1", &transport);

        let job = client.job("b").await.unwrap();
        assert_eq!(job.command, "true");

        let err = client.job("b").await.unwrap_err();
        assert!(matches!(err, ClientError::JobNotFound(ref name) if name == "b"));
    }
}
