//! Cache client port and redis-backed implementations.
//!
//! The port mirrors the handful of commands the cached repository needs:
//! string get with a distinguished not-found error, reverse sorted-set range,
//! pipelined batches of SET/ZADD/EXPIRE, and the cluster topology query.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::cluster::ClusterClient;
use redis::cluster_async::ClusterConnection;
use redis::{AsyncCommands, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The distinguished "no such key" signal. Never surfaced to callers of
    /// the repository; transport failures must not be folded into it.
    #[error("key not found")]
    Nil,
    #[error("cache transport error: {0}")]
    Transport(String),
    #[error("cache encoding error: {0}")]
    Encoding(String),
}

impl CacheError {
    fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

/// One command inside a pipelined batch.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheOp {
    Set {
        key: String,
        value: String,
        ttl: Duration,
    },
    ZAdd {
        key: String,
        members: Vec<ScoredMember>,
    },
    Expire {
        key: String,
        ttl: Duration,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    pub score: f64,
    pub member: String,
}

/// One master's address plus any replicas, as reported by `CLUSTER SLOTS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRange {
    pub start: u16,
    pub end: u16,
    pub nodes: Vec<String>,
}

#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<String, CacheError>;

    /// Members of a sorted set in descending score order, inclusive range.
    /// A missing key yields an empty list.
    async fn zrevrange(&self, key: &str, start: i64, stop: i64)
        -> Result<Vec<String>, CacheError>;

    /// Execute a batch as one pipeline round trip.
    async fn exec(&self, ops: Vec<CacheOp>) -> Result<(), CacheError>;

    /// Cluster slot topology, or `None` when the backend is a single node
    /// and no routing information exists.
    async fn cluster_slots(&self) -> Result<Option<Vec<SlotRange>>, CacheError>;
}

/// Redis-backed cache client: one multiplexed connection for a single node,
/// a cluster connection when several seed addresses are configured.
#[derive(Clone)]
pub enum RedisCacheClient {
    Single(ConnectionManager),
    Cluster(ClusterConnection),
}

impl RedisCacheClient {
    pub async fn connect_single(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(CacheError::transport)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(CacheError::transport)?;
        Ok(Self::Single(manager))
    }

    pub async fn connect_cluster(urls: Vec<String>) -> Result<Self, CacheError> {
        let client = ClusterClient::new(urls).map_err(CacheError::transport)?;
        let connection = client
            .get_async_connection()
            .await
            .map_err(CacheError::transport)?;
        Ok(Self::Cluster(connection))
    }

    fn build_pipeline(ops: Vec<CacheOp>) -> redis::Pipeline {
        let mut pipe = redis::pipe();
        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    pipe.set_ex(key, value, ttl.as_secs()).ignore();
                }
                CacheOp::ZAdd { key, members } => {
                    let items: Vec<(f64, String)> = members
                        .into_iter()
                        .map(|member| (member.score, member.member))
                        .collect();
                    pipe.zadd_multiple(key, &items).ignore();
                }
                CacheOp::Expire { key, ttl } => {
                    pipe.expire(key, ttl.as_secs() as i64).ignore();
                }
            }
        }
        pipe
    }
}

#[async_trait]
impl CacheClient for RedisCacheClient {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        let value: Option<String> = match self {
            Self::Single(manager) => {
                let mut conn = manager.clone();
                conn.get(key).await.map_err(CacheError::transport)?
            }
            Self::Cluster(connection) => {
                let mut conn = connection.clone();
                conn.get(key).await.map_err(CacheError::transport)?
            }
        };
        value.ok_or(CacheError::Nil)
    }

    async fn zrevrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>, CacheError> {
        match self {
            Self::Single(manager) => {
                let mut conn = manager.clone();
                conn.zrevrange(key, start as isize, stop as isize)
                    .await
                    .map_err(CacheError::transport)
            }
            Self::Cluster(connection) => {
                let mut conn = connection.clone();
                conn.zrevrange(key, start as isize, stop as isize)
                    .await
                    .map_err(CacheError::transport)
            }
        }
    }

    async fn exec(&self, ops: Vec<CacheOp>) -> Result<(), CacheError> {
        if ops.is_empty() {
            return Ok(());
        }
        let pipe = Self::build_pipeline(ops);
        match self {
            Self::Single(manager) => {
                let mut conn = manager.clone();
                pipe.query_async::<()>(&mut conn)
                    .await
                    .map_err(CacheError::transport)
            }
            Self::Cluster(connection) => {
                let mut conn = connection.clone();
                pipe.query_async::<()>(&mut conn)
                    .await
                    .map_err(CacheError::transport)
            }
        }
    }

    async fn cluster_slots(&self) -> Result<Option<Vec<SlotRange>>, CacheError> {
        let connection = match self {
            Self::Single(_) => return Ok(None),
            Self::Cluster(connection) => connection,
        };

        let mut conn = connection.clone();
        let raw: Value = redis::cmd("CLUSTER")
            .arg("SLOTS")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::transport)?;

        parse_cluster_slots(raw).map(Some)
    }
}

/// Decode a `CLUSTER SLOTS` reply. Each entry is
/// `[start, end, [master-ip, port, ...], replica..]`; only node addresses are
/// kept, master first.
fn parse_cluster_slots(value: Value) -> Result<Vec<SlotRange>, CacheError> {
    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(CacheError::Transport(format!(
                "unexpected CLUSTER SLOTS reply: {other:?}"
            )));
        }
    };

    let mut ranges = Vec::with_capacity(entries.len());
    for entry in entries {
        let Value::Array(fields) = entry else {
            return Err(CacheError::Transport(
                "malformed CLUSTER SLOTS entry".to_string(),
            ));
        };
        let mut fields = fields.into_iter();

        let start = slot_bound(fields.next())?;
        let end = slot_bound(fields.next())?;

        let mut nodes = Vec::new();
        for node in fields {
            let Value::Array(parts) = node else {
                continue;
            };
            let mut parts = parts.into_iter();
            let host = match parts.next() {
                Some(Value::BulkString(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                Some(Value::SimpleString(host)) => host,
                _ => continue,
            };
            let Some(Value::Int(port)) = parts.next() else {
                continue;
            };
            nodes.push(format!("{host}:{port}"));
        }

        ranges.push(SlotRange { start, end, nodes });
    }

    Ok(ranges)
}

fn slot_bound(value: Option<Value>) -> Result<u16, CacheError> {
    match value {
        Some(Value::Int(slot)) if (0..16384).contains(&slot) => Ok(slot as u16),
        other => Err(CacheError::Transport(format!(
            "slot bound out of range: {other:?}"
        ))),
    }
}
