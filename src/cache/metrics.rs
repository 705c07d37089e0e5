//! Cache-layer counters.
//!
//! One registry per process, shared by every decorated repository. Counter
//! names keep the `post_repository_` prefix so dashboards can tell cache
//! traffic from other subsystems. Note `redis_node_reads_by_user_total` is
//! labeled by user id, which is unbounded; retention is left to the scrape
//! side (drop or aggregate the label there if cardinality becomes a problem).

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

fn registry_err(err: prometheus::Error) -> String {
    err.to_string()
}

pub struct CacheMetrics {
    registry: Registry,
    pub cache_hits: IntCounter,
    pub cache_misses: IntCounter,
    pub shard_joins: IntCounter,
    pub db_queries: IntCounter,
    pub node_reads_by_user: IntCounterVec,
}

impl CacheMetrics {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();

        let cache_hits = IntCounter::with_opts(Opts::new(
            "post_repository_cache_hits_total",
            "Total number of cache hits for the post repository",
        ))
        .map_err(registry_err)?;
        registry
            .register(Box::new(cache_hits.clone()))
            .map_err(registry_err)?;

        let cache_misses = IntCounter::with_opts(Opts::new(
            "post_repository_cache_misses_total",
            "Total number of cache misses for the post repository",
        ))
        .map_err(registry_err)?;
        registry
            .register(Box::new(cache_misses.clone()))
            .map_err(registry_err)?;

        let shard_joins = IntCounter::with_opts(Opts::new(
            "post_repository_cache_shard_joins_total",
            "Total number of partial cache hits that fell back to a full DB query",
        ))
        .map_err(registry_err)?;
        registry
            .register(Box::new(shard_joins.clone()))
            .map_err(registry_err)?;

        let db_queries = IntCounter::with_opts(Opts::new(
            "post_repository_db_queries_total",
            "Total number of queries issued to the DB from the post repository",
        ))
        .map_err(registry_err)?;
        registry
            .register(Box::new(db_queries.clone()))
            .map_err(registry_err)?;

        let node_reads_by_user = IntCounterVec::new(
            Opts::new(
                "redis_node_reads_by_user_total",
                "Total reads issued to a specific Redis node, partitioned by user",
            ),
            &["node_addr", "user_id"],
        )
        .map_err(registry_err)?;
        registry
            .register(Box::new(node_reads_by_user.clone()))
            .map_err(registry_err)?;

        Ok(Self {
            registry,
            cache_hits,
            cache_misses,
            shard_joins,
            db_queries,
            node_reads_by_user,
        })
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(registry_err)?;
        String::from_utf8(buffer).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = CacheMetrics::new().expect("registry builds");
        assert_eq!(metrics.cache_hits.get(), 0);

        metrics.cache_hits.inc();
        metrics.db_queries.inc();
        metrics
            .node_reads_by_user
            .with_label_values(&["10.0.0.1:7001", "7"])
            .inc();

        assert_eq!(metrics.cache_hits.get(), 1);
        assert_eq!(metrics.db_queries.get(), 1);
        assert_eq!(
            metrics
                .node_reads_by_user
                .with_label_values(&["10.0.0.1:7001", "7"])
                .get(),
            1
        );
    }

    #[test]
    fn exposition_contains_registered_families() {
        let metrics = CacheMetrics::new().expect("registry builds");
        metrics.cache_misses.inc();

        let body = metrics.encode().expect("encodes");
        assert!(body.contains("post_repository_cache_misses_total 1"));
        assert!(body.contains("post_repository_cache_hits_total 0"));
    }
}
