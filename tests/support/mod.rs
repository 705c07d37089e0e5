//! Shared test doubles: an in-memory post store and a scriptable cache client.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use scorta::application::repos::{
    CreatePostParams, ListPostsByUserParams, PostsRepo, RepoError,
};
use scorta::cache::{CacheClient, CacheError, CacheOp, SlotRange};
use scorta::domain::entities::PostRecord;

/// In-memory `PostsRepo` with call counters and deterministic timestamps.
pub struct MockPostsRepo {
    pub posts: Mutex<Vec<PostRecord>>,
    next_id: AtomicI64,
    now: OffsetDateTime,
    pub create_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub last_list_params: Mutex<Option<ListPostsByUserParams>>,
}

impl MockPostsRepo {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            now,
            create_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            last_list_params: Mutex::new(None),
        }
    }

    /// Seed a post directly, bypassing the call counters.
    pub fn seed_post(&self, user_id: i64, content: &str, created_at: OffsetDateTime) -> PostRecord {
        let post = PostRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id,
            content: content.to_string(),
            created_at,
            updated_at: created_at,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn last_list_params(&self) -> Option<ListPostsByUserParams> {
        *self.last_list_params.lock().unwrap()
    }
}

#[async_trait]
impl PostsRepo for MockPostsRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let post = PostRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: params.user_id,
            content: params.content,
            created_at: self.now,
            updated_at: self.now,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<PostRecord, RepoError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list_posts_by_user(
        &self,
        params: ListPostsByUserParams,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_list_params.lock().unwrap() = Some(params);

        let mut posts: Vec<PostRecord> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|post| post.user_id == params.user_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(posts
            .into_iter()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .collect())
    }
}

/// Scriptable `CacheClient`: a string map plus sorted sets, with failure
/// injection and recorded pipelines.
#[derive(Default)]
pub struct MockCacheClient {
    pub strings: Mutex<HashMap<String, String>>,
    pub zsets: Mutex<HashMap<String, Vec<(f64, String)>>>,
    pub executed: Mutex<Vec<Vec<CacheOp>>>,
    pub fail_exec: AtomicBool,
    pub fail_zrevrange: AtomicBool,
    pub block_gets: AtomicBool,
    pub transport_error_keys: Mutex<HashSet<String>>,
    pub topology: Mutex<Option<Vec<SlotRange>>>,
}

impl MockCacheClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_string(&self, key: &str, value: String) {
        self.strings.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn put_post(&self, post: &PostRecord) {
        self.put_string(
            &scorta::cache::post_key(post.id),
            serde_json::to_string(post).unwrap(),
        );
    }

    pub fn put_index(&self, user_id: i64, members: Vec<(f64, String)>) {
        self.zsets
            .lock()
            .unwrap()
            .insert(scorta::cache::user_posts_key(user_id), members);
    }

    pub fn fail_reads_for(&self, key: &str) {
        self.transport_error_keys
            .lock()
            .unwrap()
            .insert(key.to_string());
    }

    pub fn set_topology(&self, ranges: Vec<SlotRange>) {
        *self.topology.lock().unwrap() = Some(ranges);
    }

    pub fn executed_pipelines(&self) -> Vec<Vec<CacheOp>> {
        self.executed.lock().unwrap().clone()
    }

    fn apply(&self, ops: &[CacheOp]) {
        for op in ops {
            match op {
                CacheOp::Set { key, value, .. } => {
                    self.strings
                        .lock()
                        .unwrap()
                        .insert(key.clone(), value.clone());
                }
                CacheOp::ZAdd { key, members } => {
                    let mut zsets = self.zsets.lock().unwrap();
                    let entry = zsets.entry(key.clone()).or_default();
                    for member in members {
                        entry.retain(|(_, existing)| existing != &member.member);
                        entry.push((member.score, member.member.clone()));
                    }
                }
                CacheOp::Expire { .. } => {}
            }
        }
    }
}

#[async_trait]
impl CacheClient for MockCacheClient {
    async fn get(&self, key: &str) -> Result<String, CacheError> {
        if self.block_gets.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.transport_error_keys.lock().unwrap().contains(key) {
            return Err(CacheError::Transport("injected timeout".to_string()));
        }
        self.strings
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(CacheError::Nil)
    }

    async fn zrevrange(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<String>, CacheError> {
        if self.fail_zrevrange.load(Ordering::SeqCst) {
            return Err(CacheError::Transport("injected timeout".to_string()));
        }

        let zsets = self.zsets.lock().unwrap();
        let Some(entries) = zsets.get(key) else {
            return Ok(Vec::new());
        };

        if stop < start || stop < 0 {
            return Ok(Vec::new());
        }

        let mut sorted = entries.clone();
        sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        let start = start.max(0) as usize;
        let stop = stop as usize;
        Ok(sorted
            .into_iter()
            .enumerate()
            .filter(|(index, _)| *index >= start && *index <= stop)
            .map(|(_, (_, member))| member)
            .collect())
    }

    async fn exec(&self, ops: Vec<CacheOp>) -> Result<(), CacheError> {
        if self.fail_exec.load(Ordering::SeqCst) {
            return Err(CacheError::Transport("injected pipeline failure".to_string()));
        }
        self.apply(&ops);
        self.executed.lock().unwrap().push(ops);
        Ok(())
    }

    async fn cluster_slots(&self) -> Result<Option<Vec<SlotRange>>, CacheError> {
        Ok(self.topology.lock().unwrap().clone())
    }
}
