use crate::{Context, Result, Session, truncate_long};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Prepared statements by cache key, kept for the lifetime of the cache.
///
/// Two tasks missing the same key at the same time both prepare, the last insert
/// wins and every later lookup returns it. The lock is never held while preparing.
pub struct PreparedCache<P> {
    entries: RwLock<HashMap<String, P>>,
}

impl<P> Default for PreparedCache<P> {
    fn default() -> Self {
        Self {
            entries: Default::default(),
        }
    }
}

impl<P: Clone + Send + Sync> PreparedCache<P> {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn get(&self, key: &str) -> Option<P> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn get_or_prepare<S>(&self, session: &S, cql: &str, key: &str) -> Result<P>
    where
        S: Session<Prepared = P> + ?Sized,
    {
        if let Some(prepared) = self.get(key).await {
            log::debug!("Statement cache hit `{}`", key);
            return Ok(prepared);
        }
        log::debug!("Preparing {}", truncate_long!(cql));
        let prepared = session
            .prepare(cql)
            .await
            .with_context(|| format!("While preparing the statement:\n{}", truncate_long!(cql)))?;
        self.entries
            .write()
            .await
            .insert(key.to_owned(), prepared.clone());
        Ok(prepared)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
