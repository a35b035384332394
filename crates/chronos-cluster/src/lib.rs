//! chronos-cluster — cluster membership and failover for the Chronos client.
//!
//! Tracks several equivalent scheduler endpoints parsed from one cluster
//! URL, hands out the endpoint the next request should use, and recovers
//! failed endpoints in the background.
//!
//! # Architecture
//!
//! ```text
//! Cluster (Arc<RwLock<state>>)
//!   ├── MemberRegistry::parse(url) → fixed, ordered member set
//!   ├── get_member()    → "scheme://host" of current  (shared lock)
//!   ├── mark_inactive() → demote current, rescan      (exclusive lock)
//!   │                     └── spawn recovery task
//!   └── recovery task (detached, one per demotion)
//!       ├── GET <member>/ping via Transport
//!       ├── 200 → reinstate member
//!       └── otherwise sleep 5s and probe again
//! ```
//!
//! # Selection
//!
//! A fresh cluster selects the first configured member. After every
//! failure the member list is rescanned and the **last** active member in
//! configured order becomes current, so later-configured hosts win after
//! a failover.

pub mod error;
pub mod member;
pub mod recovery;
pub mod selector;
pub mod transport;

pub use error::{ClusterError, ClusterResult};
pub use member::{Member, MemberRegistry, Protocol};
pub use recovery::{DEFAULT_RETRY_INTERVAL, PING_PATH, ProbeResult, ping_probe};
pub use selector::{Cluster, ClusterOptions};
pub use transport::{
    BoxFuture, HttpRequest, HttpResponse, HyperTransport, Transport, TransportError,
};
