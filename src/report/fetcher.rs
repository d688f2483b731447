//! Bounded fan-out over a series of sample instants.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::debug;

/// Default ceiling on fetches in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Runs one fetch per instant with at most `limit` running concurrently.
///
/// `result[i]` always belongs to `instants[i]`, whatever order the fetches
/// finish in. The first failure ends the batch: the stream is dropped, which
/// cancels every fetch still in flight and never starts the rest.
#[derive(Debug, Clone, Copy)]
pub struct BoundedFetcher {
    limit: usize,
}

impl BoundedFetcher {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub async fn fetch_all<I, F, Fut, T>(&self, instants: I, fetch: F) -> Result<Vec<T>>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
        F: Fn(DateTime<Utc>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let instants: Vec<DateTime<Utc>> = instants.into_iter().collect();
        let mut slots: Vec<Option<T>> = instants.iter().map(|_| None).collect();

        debug!(
            "Fetching {} samples with concurrency {}",
            instants.len(),
            self.limit
        );

        let mut in_flight = stream::iter(instants.iter().copied().enumerate())
            .map(|(index, at)| {
                let pending = fetch(at);
                async move {
                    pending
                        .await
                        .map(|sample| (index, sample))
                        .with_context(|| format!("Failed to fetch sample at {}", at))
                }
            })
            .buffer_unordered(self.limit);

        while let Some((index, sample)) = in_flight.try_next().await? {
            slots[index] = Some(sample);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or_else(|| anyhow!("sample {} was never fetched", index)))
            .collect()
    }
}

impl Default for BoundedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
