//! Core relay combinators.
//!
//! This module provides the stream constructors and the promise-aware
//! specializations (`through`, `map`, `filter`, `reduce`) built on the
//! bounded-concurrency engine in [`crate::stage`].

use futures_util::{
    future,
    stream::{self, BoxStream, StreamExt},
};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{RelayError, RelayResult};
use crate::stage::{Emitter, Through, ThroughConfig};

/// A boxed, heap-allocated stream of relay results.
///
/// `Some(Ok(item))` carries a payload, `Some(Err(e))` is the error
/// signal, and `None` is the end signal.
pub type RelayStream<O> = BoxStream<'static, RelayResult<O>>;

// ================================
// Core Stream Constructors
// ================================

/// Emit a single element as a relay stream
pub fn emit<O>(item: O) -> RelayStream<O>
where
    O: Send + 'static,
{
    stream::once(future::ready(Ok(item))).boxed()
}

/// Create an empty relay stream that completes immediately
pub fn empty<O>() -> RelayStream<O>
where
    O: Send + 'static,
{
    stream::empty().boxed()
}

/// Create a relay stream from an iterator of plain values
pub fn from_iter<I, O>(iter: I) -> RelayStream<O>
where
    I: IntoIterator<Item = O> + Send + 'static,
    <I as IntoIterator>::IntoIter: Send,
    O: Send + 'static,
{
    stream::iter(iter.into_iter().map(Ok)).boxed()
}

/// Create a relay stream from an iterator of results
pub fn from_results<I, O>(iter: I) -> RelayStream<O>
where
    I: IntoIterator<Item = RelayResult<O>> + Send + 'static,
    <I as IntoIterator>::IntoIter: Send,
    O: Send + 'static,
{
    stream::iter(iter).boxed()
}

/// Evaluate a Future and emit its output
pub fn eval<O, F>(fut: F) -> RelayStream<O>
where
    F: Future<Output = O> + Send + 'static,
    O: Send + 'static,
{
    stream::once(async move { Ok(fut.await) }).boxed()
}

/// Create a relay stream that emits a single value after a delay
pub fn emit_after<O>(item: O, duration: Duration) -> RelayStream<O>
where
    O: Send + 'static,
{
    stream::once(async move {
        sleep(duration).await;
        Ok(item)
    })
    .boxed()
}

/// A stream that raises a single error and ends
pub fn raise<O>(err: RelayError) -> RelayStream<O>
where
    O: Send + 'static,
{
    stream::once(future::ready(Err(err))).boxed()
}

// ================================
// Relay Stages
// ================================

/// Run `f` over the stream with a bounded concurrency window.
///
/// Each invocation receives the item and an [`Emitter`] through which
/// it may push zero, one, or many outputs. Although transforms may
/// settle out of order, outputs are released downstream in strict
/// intake order.
///
/// # Examples
/// ```
/// use relay_stream::relay::*;
/// use relay_stream::{Emitter, ThroughConfig};
/// use futures_util::stream::StreamExt;
///
/// # async fn example() {
/// // Duplicate every element, two transforms in flight at once.
/// let s = through(
///     from_iter(vec![1, 2, 3]),
///     ThroughConfig::concurrent(2),
///     |x: i32, out: Emitter<i32>| async move {
///         out.push(x);
///         out.push(x);
///         Ok(())
///     },
/// );
/// let result = s.collect::<Vec<_>>().await;
/// assert_eq!(result, vec![Ok(1), Ok(1), Ok(2), Ok(2), Ok(3), Ok(3)]);
/// # }
/// ```
pub fn through<I, O, F, Fut>(s: RelayStream<I>, config: ThroughConfig, f: F) -> RelayStream<O>
where
    F: FnMut(I, Emitter<O>) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<()>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    Through::new(s, config, f).boxed()
}

/// [`through`] with an end hook invoked once everything has drained.
///
/// The hook may push trailing outputs; overall completion waits for it,
/// and its error fails the relay.
pub fn through_with_end<I, O, F, Fut, E, EFut>(
    s: RelayStream<I>,
    config: ThroughConfig,
    f: F,
    on_end: E,
) -> RelayStream<O>
where
    F: FnMut(I, Emitter<O>) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<()>> + Send + 'static,
    E: FnOnce(Emitter<O>) -> EFut + Send + 'static,
    EFut: Future<Output = RelayResult<()>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    Through::with_end(s, config, f, on_end).boxed()
}

/// Transform every element through an async function, one at a time.
pub fn map<I, O, F, Fut>(s: RelayStream<I>, f: F) -> RelayStream<O>
where
    F: FnMut(I) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<O>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    map_with_config(s, ThroughConfig::default(), f)
}

/// Transform every element through an async function with up to
/// `config.concurrent` invocations in flight; output order matches
/// input order regardless of completion order.
pub fn map_with_config<I, O, F, Fut>(
    s: RelayStream<I>,
    config: ThroughConfig,
    mut f: F,
) -> RelayStream<O>
where
    F: FnMut(I) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<O>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    through(s, config, move |item, out: Emitter<O>| {
        let fut = f(item);
        async move {
            out.push(fut.await?);
            Ok(())
        }
    })
}

/// Keep the elements whose async predicate resolves true, sequentially.
pub fn filter<T, F, Fut>(s: RelayStream<T>, predicate: F) -> RelayStream<T>
where
    F: FnMut(&T) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<bool>> + Send + 'static,
    T: Send + 'static + Unpin,
{
    filter_with_config(s, ThroughConfig::default(), predicate)
}

/// Concurrent [`filter`]. Survivors are the original, unmodified items
/// in their original relative order.
pub fn filter_with_config<T, F, Fut>(
    s: RelayStream<T>,
    config: ThroughConfig,
    mut predicate: F,
) -> RelayStream<T>
where
    F: FnMut(&T) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<bool>> + Send + 'static,
    T: Send + 'static + Unpin,
{
    through(s, config, move |item, out: Emitter<T>| {
        let keep = predicate(&item);
        async move {
            if keep.await? {
                out.push(item);
            }
            Ok(())
        }
    })
}

/// Fold all elements into a single accumulator.
///
/// Each fold step awaits the previous step's future before starting;
/// the fold order is the intake order. Any stream or fold error rejects
/// the whole reduction and the accumulator is discarded.
///
/// # Examples
/// ```
/// use relay_stream::relay::*;
///
/// # async fn example() {
/// let total = reduce(from_iter(vec![1, 2, 3, 4]), 0, |acc: i32, x: i32| async move { Ok(acc + x) })
///     .await;
/// assert_eq!(total, Ok(10));
/// # }
/// ```
pub fn reduce<T, A, F, Fut>(
    s: RelayStream<T>,
    init: A,
    mut f: F,
) -> impl Future<Output = RelayResult<A>>
where
    F: FnMut(A, T) -> Fut + Send + 'static,
    Fut: Future<Output = RelayResult<A>> + Send + 'static,
    T: Send + 'static,
    A: Send + 'static,
{
    async move {
        let mut s = s;
        let mut acc = init;
        while let Some(item) = s.next().await {
            acc = f(acc, item?).await?;
        }
        Ok(acc)
    }
}

/// [`reduce`] accepting a relay config for signature symmetry with
/// `map`/`filter`. Folding is inherently order-dependent, so the
/// configured `concurrent` is ignored and steps run strictly
/// sequentially.
pub fn reduce_with_config<T, A, F, Fut>(
    s: RelayStream<T>,
    _config: ThroughConfig,
    init: A,
    f: F,
) -> impl Future<Output = RelayResult<A>>
where
    F: FnMut(A, T) -> Fut + Send + 'static,
    Fut: Future<Output = RelayResult<A>> + Send + 'static,
    T: Send + 'static,
    A: Send + 'static,
{
    reduce(s, init, f)
}
