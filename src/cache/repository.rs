//! Read-through/write-through cache decorator for the post repository.
//!
//! Wraps any `PostsRepo` and serves reads from the key-value cluster first.
//! List reads range the per-user owner index, hydrate every referenced post
//! concurrently, and fall back to one authoritative store query when any item
//! is missing (a "shard join": the store's ordering and pagination win over
//! stitching cache fragments together). Cache failures of any kind degrade
//! to store reads; only store errors reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::application::repos::{
    CreatePostParams, ListPostsByUserParams, PostsRepo, RepoError,
};
use crate::domain::entities::PostRecord;

use super::client::{CacheClient, CacheError, CacheOp, ScoredMember};
use super::keys::{key_hash_slot, post_key, user_posts_key, CACHE_TTL};
use super::metrics::CacheMetrics;
use super::router::SlotRouter;

pub struct CachedPostRepository {
    next: Arc<dyn PostsRepo>,
    cache: Arc<dyn CacheClient>,
    router: SlotRouter,
    metrics: Arc<CacheMetrics>,
}

impl CachedPostRepository {
    /// Build the decorator and seed the slot router from the cluster
    /// topology. A single-node cache reports no topology and leaves the
    /// router inert; a failed topology query is logged and ignored, since
    /// routing only feeds attribution metrics.
    pub async fn new(
        next: Arc<dyn PostsRepo>,
        cache: Arc<dyn CacheClient>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        let repo = Self {
            next,
            cache,
            router: SlotRouter::new(),
            metrics,
        };

        match repo.refresh_topology().await {
            Ok(true) => info!("slot routing table initialized from cluster topology"),
            Ok(false) => debug!("cache backend is a single node; slot routing disabled"),
            Err(err) => warn!(error = %err, "failed to initialize slot routing table"),
        }

        repo
    }

    /// Re-query the cluster topology and atomically publish a new routing
    /// snapshot. Returns whether the backend reported any topology.
    pub async fn refresh_topology(&self) -> Result<bool, CacheError> {
        match self.cache.cluster_slots().await? {
            Some(ranges) => {
                self.router.refresh(&ranges);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Fetch every referenced post from the cache concurrently.
    ///
    /// Returns the decoded posts and the index members that could not be
    /// served (missing key, transport failure, corrupt payload, or an
    /// unparseable member). Completion order decides the output order, so a
    /// full-hit result is not sorted; callers needing store order take the
    /// shard-join path.
    async fn posts_from_cache(
        &self,
        user_id: i64,
        members: &[String],
    ) -> (Vec<PostRecord>, Vec<String>) {
        let mut lookups: FuturesUnordered<_> = members
            .iter()
            .map(|member| self.hydrate_one(user_id, member))
            .collect();

        let mut posts = Vec::with_capacity(members.len());
        let mut missed = Vec::new();
        while let Some(outcome) = lookups.next().await {
            match outcome {
                Ok(post) => posts.push(post),
                Err(member) => missed.push(member),
            }
        }

        (posts, missed)
    }

    async fn hydrate_one(&self, user_id: i64, member: &str) -> Result<PostRecord, String> {
        let Ok(id) = member.parse::<i64>() else {
            warn!(member, "owner index member is not a post id");
            return Err(member.to_string());
        };
        let key = post_key(id);

        // Attribute the read to the node owning this key's slot. A gap in
        // the routing table skips attribution but never the read itself.
        if !self.router.is_empty() {
            let slot = key_hash_slot(&key);
            if let Some(node) = self.router.node_for_slot(slot) {
                self.metrics
                    .node_reads_by_user
                    .with_label_values(&[node.as_str(), user_id.to_string().as_str()])
                    .inc();
            }
        }

        let payload = match self.cache.get(&key).await {
            Ok(payload) => payload,
            Err(CacheError::Nil) => return Err(member.to_string()),
            Err(err) => {
                warn!(post_id = id, error = %err, "cache read failed during hydration");
                return Err(member.to_string());
            }
        };

        match serde_json::from_str::<PostRecord>(&payload) {
            Ok(post) => Ok(post),
            Err(err) => {
                warn!(post_id = id, error = %err, "discarding corrupt cache entry");
                Err(member.to_string())
            }
        }
    }

    /// Write one post through to the cache: the item key plus its membership
    /// in the owner index, as a single pipeline. Every mutation re-extends
    /// the index TTL.
    async fn cache_post(&self, post: &PostRecord) -> Result<(), CacheError> {
        let payload =
            serde_json::to_string(post).map_err(|err| CacheError::Encoding(err.to_string()))?;
        let index_key = user_posts_key(post.user_id);

        self.cache
            .exec(vec![
                CacheOp::Set {
                    key: post_key(post.id),
                    value: payload,
                    ttl: CACHE_TTL,
                },
                CacheOp::ZAdd {
                    key: index_key.clone(),
                    members: vec![ScoredMember {
                        score: post.created_at.unix_timestamp() as f64,
                        member: post.id.to_string(),
                    }],
                },
                CacheOp::Expire {
                    key: index_key,
                    ttl: CACHE_TTL,
                },
            ])
            .await
    }

    /// Backfill a store result: item keys and one ZADD carrying the whole
    /// page, then the index TTL refresh. Posts that fail to serialize are
    /// skipped; the rest still land.
    async fn cache_post_list(
        &self,
        user_id: i64,
        posts: &[PostRecord],
    ) -> Result<(), CacheError> {
        if posts.is_empty() {
            return Ok(());
        }

        let index_key = user_posts_key(user_id);
        let mut ops = Vec::with_capacity(posts.len() + 2);
        let mut members = Vec::with_capacity(posts.len());
        for post in posts {
            let payload = match serde_json::to_string(post) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(post_id = post.id, error = %err, "skipping unserializable post in backfill");
                    continue;
                }
            };
            ops.push(CacheOp::Set {
                key: post_key(post.id),
                value: payload,
                ttl: CACHE_TTL,
            });
            members.push(ScoredMember {
                score: post.created_at.unix_timestamp() as f64,
                member: post.id.to_string(),
            });
        }

        if !members.is_empty() {
            ops.push(CacheOp::ZAdd {
                key: index_key.clone(),
                members,
            });
            ops.push(CacheOp::Expire {
                key: index_key,
                ttl: CACHE_TTL,
            });
        }

        self.cache.exec(ops).await
    }
}

#[async_trait]
impl PostsRepo for CachedPostRepository {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let post = self.next.create_post(params).await?;

        // The authoritative write already succeeded; a failed cache write
        // only costs the next reader a miss.
        if let Err(err) = self.cache_post(&post).await {
            warn!(post_id = post.id, error = %err, "failed to cache created post");
        }

        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<PostRecord, RepoError> {
        let key = post_key(id);
        match self.cache.get(&key).await {
            Ok(payload) => match serde_json::from_str::<PostRecord>(&payload) {
                Ok(post) => {
                    debug!(post_id = id, "cache hit for post");
                    self.metrics.cache_hits.inc();
                    return Ok(post);
                }
                Err(err) => {
                    warn!(post_id = id, error = %err, "discarding corrupt cache entry");
                }
            },
            Err(CacheError::Nil) => {}
            Err(err) => {
                warn!(post_id = id, error = %err, "cache read failed for post");
            }
        }

        debug!(post_id = id, "cache miss for post, fetching from db");
        self.metrics.cache_misses.inc();
        self.metrics.db_queries.inc();
        let post = self.next.get_post(id).await?;

        if let Err(err) = self.cache_post(&post).await {
            warn!(post_id = post.id, error = %err, "failed to cache post after db fetch");
        }

        Ok(post)
    }

    async fn list_posts_by_user(
        &self,
        params: ListPostsByUserParams,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let index_key = user_posts_key(params.user_id);
        let start = i64::from(params.offset);
        let stop = start + i64::from(params.limit) - 1;

        let members = match self.cache.zrevrange(&index_key, start, stop).await {
            Ok(members) => members,
            Err(CacheError::Nil) => Vec::new(),
            Err(err) => {
                warn!(user_id = params.user_id, error = %err, "cache read failed for post list");
                Vec::new()
            }
        };

        let mut partial = false;
        if !members.is_empty() {
            let (posts, missed) = self.posts_from_cache(params.user_id, &members).await;
            if missed.is_empty() {
                debug!(
                    user_id = params.user_id,
                    limit = params.limit,
                    offset = params.offset,
                    "full cache hit for post list"
                );
                self.metrics.cache_hits.inc();
                return Ok(posts);
            }

            // Partial hit: refetch the whole page rather than only the
            // missing posts, so pagination and ordering stay the store's.
            debug!(
                user_id = params.user_id,
                missed = missed.len(),
                "partial cache hit for post list, fetching full list from db"
            );
            self.metrics.shard_joins.inc();
            partial = true;
        }

        if !partial {
            debug!(user_id = params.user_id, "full cache miss for post list");
            self.metrics.cache_misses.inc();
        }

        self.metrics.db_queries.inc();
        let posts = self.next.list_posts_by_user(params).await?;

        if !posts.is_empty() {
            if let Err(err) = self.cache_post_list(params.user_id, &posts).await {
                warn!(user_id = params.user_id, error = %err, "failed to backfill post list");
            }
        }

        Ok(posts)
    }
}
