//! Explicit lazily-loaded values.
//!
//! Anything fetched from the node on first use is held in a [`Cached`], so
//! "not loaded yet" is a state you can see and match on instead of an
//! object that quietly mutates itself the first time you read it.

use std::future::Future;

/// A value that is either not fetched yet or fetched and held.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cached<T> {
    #[default]
    Unfetched,
    Cached(T),
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Unfetched => None,
            Cached::Cached(value) => Some(value),
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Cached::Cached(_))
    }

    /// Drops the held value so the next access fetches again.
    pub fn invalidate(&mut self) {
        *self = Cached::Unfetched;
    }

    /// Returns the held value, fetching it first if needed. A failed fetch
    /// leaves the cache empty.
    pub async fn get_or_try_fetch<F, Fut, E>(&mut self, fetch: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Cached::Unfetched = self {
            *self = Cached::Cached(fetch().await?);
        }
        match self {
            Cached::Cached(value) => Ok(value),
            // Filled just above.
            Cached::Unfetched => unreachable!("cache filled before read"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetches_once() {
        let mut calls = 0;
        let mut cache: Cached<u32> = Cached::default();
        assert!(!cache.is_cached());

        let v = *cache
            .get_or_try_fetch(|| {
                calls += 1;
                async { Ok::<_, ()>(7) }
            })
            .await
            .unwrap();
        assert_eq!(v, 7);

        let v = *cache
            .get_or_try_fetch(|| {
                calls += 1;
                async { Ok::<_, ()>(8) }
            })
            .await
            .unwrap();
        assert_eq!(v, 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_stays_unfetched() {
        let mut cache: Cached<u32> = Cached::Unfetched;
        let err = cache
            .get_or_try_fetch(|| async { Err::<u32, _>("node down") })
            .await
            .unwrap_err();
        assert_eq!(err, "node down");
        assert_eq!(cache.get(), None);

        cache = Cached::Cached(1);
        cache.invalidate();
        assert!(!cache.is_cached());
    }
}
