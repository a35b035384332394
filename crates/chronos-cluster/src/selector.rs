//! Cluster selector — picks the endpoint for the next request and runs
//! the failover protocol.
//!
//! All state lives behind a single reader/writer lock. Readers
//! (`get_member`) take the shared lock; every mutation (demotion,
//! rescan, reinstatement) takes the exclusive lock, so no reader can
//! observe a `current` member that is inactive.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{ClusterError, ClusterResult};
use crate::member::{Member, MemberRegistry, Protocol};
use crate::recovery::{DEFAULT_RETRY_INTERVAL, run_recovery_loop};
use crate::transport::Transport;

/// Tunables for the failover protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Delay between liveness probes of an inactive member.
    pub retry_interval: Duration,
    /// Upper bound on a single liveness probe.
    pub probe_timeout: Duration,
}

impl ClusterOptions {
    /// Reject tunables that would turn recovery into a busy loop.
    pub fn validate(&self) -> ClusterResult<()> {
        if self.retry_interval.is_zero() {
            return Err(ClusterError::Configuration(
                "retry interval must be greater than zero".into(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(ClusterError::Configuration(
                "probe timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
            probe_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
struct ClusterState {
    members: Vec<Member>,
    /// Index into `members`; always points at an active member.
    current: Option<usize>,
}

impl ClusterState {
    /// Point `current` at the last active member in configured order.
    fn rescan(&mut self) {
        self.current = self.members.iter().rposition(Member::is_active);
    }
}

pub(crate) struct Shared {
    protocol: Protocol,
    state: RwLock<ClusterState>,
    transport: Arc<dyn Transport>,
    options: ClusterOptions,
    shutdown_tx: watch::Sender<bool>,
    /// Runtime the cluster was built on; recovery tasks are spawned here.
    runtime: Option<Handle>,
}

impl Shared {
    fn read_state(&self) -> RwLockReadGuard<'_, ClusterState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ClusterState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn url_for(&self, member: &Member) -> String {
        format!("{}://{}", self.protocol, member.host())
    }

    pub(crate) fn member_url(&self, index: usize) -> String {
        let state = self.read_state();
        self.url_for(&state.members[index])
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn options(&self) -> ClusterOptions {
        self.options
    }

    /// Mark a recovered member active again.
    ///
    /// When no member is current, the rescan runs so a lone recovered
    /// member is selectable right away. An existing `current` is kept.
    pub(crate) fn reinstate(&self, index: usize) {
        let mut state = self.write_state();
        state.members[index].set_active(true);
        if state.current.is_none() {
            state.rescan();
            if let Some(current) = state.current {
                info!(host = %state.members[current].host(), "failover target restored");
            }
        }
    }
}

/// Shared handle to the cluster selector.
///
/// Cloning is cheap; all clones observe and mutate the same state.
#[derive(Clone)]
pub struct Cluster {
    shared: Arc<Shared>,
}

impl Cluster {
    /// Build a cluster from a URL such as `http://host1:8080,host2:8081`.
    pub fn new(url: &str, transport: Arc<dyn Transport>) -> ClusterResult<Self> {
        Self::with_options(url, transport, ClusterOptions::default())
    }

    pub fn with_options(
        url: &str,
        transport: Arc<dyn Transport>,
        options: ClusterOptions,
    ) -> ClusterResult<Self> {
        let registry = MemberRegistry::parse(url)?;
        Self::from_registry(registry, transport, options)
    }

    /// Build a cluster from an already parsed registry.
    ///
    /// When called inside a tokio runtime, that runtime hosts every
    /// recovery task, so failures may be reported from any thread.
    pub fn from_registry(
        registry: MemberRegistry,
        transport: Arc<dyn Transport>,
        options: ClusterOptions,
    ) -> ClusterResult<Self> {
        options.validate()?;
        let (protocol, members) = registry.into_parts();
        let current = if members.is_empty() { None } else { Some(0) };
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            shared: Arc::new(Shared {
                protocol,
                state: RwLock::new(ClusterState { members, current }),
                transport,
                options,
                shutdown_tx,
                runtime: Handle::try_current().ok(),
            }),
        })
    }

    pub fn protocol(&self) -> Protocol {
        self.shared.protocol
    }

    pub fn options(&self) -> ClusterOptions {
        self.shared.options
    }

    /// Base URL (`scheme://host`) the next request should use.
    pub fn get_member(&self) -> ClusterResult<String> {
        let state = self.shared.read_state();
        match state.current.map(|index| &state.members[index]) {
            Some(member) if member.is_active() => Ok(self.shared.url_for(member)),
            _ => Err(ClusterError::NoAvailableMember),
        }
    }

    /// Host of the current member, if any.
    pub fn current_host(&self) -> Option<String> {
        let state = self.shared.read_state();
        state
            .current
            .map(|index| state.members[index].host().to_string())
    }

    /// Snapshot of every member and its availability.
    pub fn members(&self) -> Vec<Member> {
        self.shared.read_state().members.clone()
    }

    /// Report a transport failure against the current member.
    ///
    /// Demotes the current member, starts its recovery task, and
    /// re-selects the last active member in configured order.
    pub fn mark_inactive(&self) {
        let mut state = self.shared.write_state();
        match state.current.take() {
            Some(index) => self.demote(&mut state, index),
            None => debug!("no current member to mark inactive"),
        }
        self.reselect(&mut state);
    }

    /// Report a transport failure against a specific member.
    ///
    /// Used by request issuers that may race each other: if another
    /// caller already failed over, only `host` is demoted and the
    /// rescan still runs.
    pub fn mark_inactive_host(&self, host: &str) {
        let mut state = self.shared.write_state();
        // The same host may be configured twice; prefer the copy in use.
        let index = match state.current {
            Some(current) if state.members[current].host() == host => Some(current),
            _ => state
                .members
                .iter()
                .position(|m| m.host() == host && m.is_active())
                .or_else(|| state.members.iter().position(|m| m.host() == host)),
        };
        let Some(index) = index else {
            warn!(%host, "failure reported for unknown cluster member");
            return;
        };

        if state.current == Some(index) {
            state.current = None;
        }
        self.demote(&mut state, index);
        self.reselect(&mut state);
    }

    /// Stop every in-flight recovery loop.
    ///
    /// Members that are still inactive stay inactive; no new recovery
    /// tasks are started afterwards.
    pub fn shutdown(&self) {
        self.shared.shutdown_tx.send_replace(true);
        info!("cluster recovery stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shared.shutdown_tx.borrow()
    }

    fn demote(&self, state: &mut ClusterState, index: usize) {
        let member = &mut state.members[index];
        if !member.is_active() {
            debug!(host = %member.host(), "member already inactive");
            return;
        }
        member.set_active(false);
        warn!(host = %member.host(), "cluster member marked inactive");
        self.spawn_recovery(index);
    }

    fn reselect(&self, state: &mut ClusterState) {
        state.rescan();
        match state.current {
            Some(index) => info!(host = %state.members[index].host(), "failover target selected"),
            None => warn!("no active cluster members remain"),
        }
    }

    /// Launch the detached recovery task for one member.
    fn spawn_recovery(&self, index: usize) {
        if self.is_shut_down() {
            debug!(index, "cluster shut down, not starting recovery");
            return;
        }

        let Some(handle) = self
            .shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
        else {
            warn!(index, "no tokio runtime, member will not be probed for recovery");
            return;
        };

        let shared = self.shared.clone();
        let shutdown = self.shared.shutdown_tx.subscribe();
        handle.spawn(run_recovery_loop(shared, index, shutdown));
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.read_state();
        f.debug_struct("Cluster")
            .field("protocol", &self.shared.protocol)
            .field("members", &state.members)
            .field("current", &state.current)
            .finish()
    }
}
