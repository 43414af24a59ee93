//! Completion/error bridging.
//!
//! Helpers that turn a relay stream's end/error signals into a single
//! settled future. Each helper settles exactly once by construction:
//! the future returns at the first error or at the clean end, and the
//! stream is dropped afterwards, so no later signal can be observed.

use futures_util::stream::StreamExt;

use crate::error::RelayResult;
use crate::relay::RelayStream;

/// A payload that can be concatenated chunk by chunk.
///
/// Covers both text (`String`) and binary (`Vec<u8>`) streams; any
/// `Vec<T>` joins element-wise.
pub trait Chunk {
    fn empty() -> Self;
    fn join(&mut self, other: Self);
}

impl Chunk for String {
    fn empty() -> Self {
        String::new()
    }

    fn join(&mut self, other: Self) {
        self.push_str(&other);
    }
}

impl<T> Chunk for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn join(&mut self, other: Self) {
        self.extend(other);
    }
}

/// Drive the stream to completion, discarding payloads.
///
/// Resolves on a clean end; returns the first error immediately and
/// stops consuming.
pub async fn wait<T>(s: RelayStream<T>) -> RelayResult<()>
where
    T: Send + 'static,
{
    let mut s = s;
    while let Some(item) = s.next().await {
        item?;
    }
    Ok(())
}

/// Concatenate every chunk the stream emits into one combined payload.
///
/// Resolves with the combined payload on end; the first error rejects
/// and the partial payload is discarded.
pub async fn collect<C>(s: RelayStream<C>) -> RelayResult<C>
where
    C: Chunk + Send + 'static,
{
    let mut s = s;
    let mut combined = C::empty();
    while let Some(item) = s.next().await {
        combined.join(item?);
    }
    Ok(combined)
}

/// Gather every item into a `Vec`, preserving order.
pub async fn collect_items<T>(s: RelayStream<T>) -> RelayResult<Vec<T>>
where
    T: Send + 'static,
{
    let mut s = s;
    let mut items = Vec::new();
    while let Some(item) = s.next().await {
        items.push(item?);
    }
    Ok(items)
}
