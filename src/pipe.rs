//! Pipe and pipeline composition.
//!
//! A [`Pipe`] is a reusable relay transformation from one stream type
//! to another; [`pipe`] and [`pipeline`] drive a source through stages
//! into a [`Sink`], settling exactly once with the first error from
//! any side.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_stream::stream;
use futures_util::{Sink, SinkExt, StreamExt};

use crate::error::{RelayError, RelayResult};
use crate::relay::{self, RelayStream};
use crate::stage::{Emitter, ThroughConfig};

/// A Pipe represents a relay transformation from one type to another.
/// It's a function from RelayStream\<I\> to RelayStream\<O\>.
pub struct Pipe<I, O> {
    f: Arc<dyn Fn(RelayStream<I>) -> RelayStream<O> + Send + Sync + 'static>,
}

impl<I, O> Clone for Pipe<I, O> {
    fn clone(&self) -> Self {
        Pipe {
            f: Arc::clone(&self.f),
        }
    }
}

impl<I, O> Pipe<I, O> {
    /// Create a new pipe from a function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(RelayStream<I>) -> RelayStream<O> + Send + Sync + 'static,
    {
        Pipe { f: Arc::new(f) }
    }

    /// Apply this pipe to a relay stream
    pub fn apply(&self, input: RelayStream<I>) -> RelayStream<O> {
        (self.f)(input)
    }
}

/// Stage that applies the given function to each element.
///
/// The first error is forwarded and the stage stops there, dropping
/// whatever is upstream of it.
pub fn map_stage<I, O, F>(f: F) -> Pipe<I, O>
where
    F: Fn(I) -> O + Send + Sync + Clone + 'static,
    I: Send + 'static,
    O: Send + 'static,
{
    Pipe::new(move |input| {
        let f = f.clone();
        stream! {
            let mut s = input;
            while let Some(item) = s.next().await {
                match item {
                    Ok(v) => yield Ok(f(v)),
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
        .boxed()
    })
}

/// Stage that keeps elements matching the predicate, same error policy
/// as [`map_stage`].
pub fn filter_stage<I, F>(predicate: F) -> Pipe<I, I>
where
    F: Fn(&I) -> bool + Send + Sync + Clone + 'static,
    I: Send + 'static,
{
    Pipe::new(move |input| {
        let predicate = predicate.clone();
        stream! {
            let mut s = input;
            while let Some(item) = s.next().await {
                match item {
                    Ok(v) => {
                        if predicate(&v) {
                            yield Ok(v);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        }
        .boxed()
    })
}

/// A bounded-concurrency relay as a pipeline stage.
pub fn through_stage<I, O, F, Fut>(config: ThroughConfig, f: F) -> Pipe<I, O>
where
    F: FnMut(I, Emitter<O>) -> Fut + Send + Sync + Clone + 'static + Unpin,
    Fut: Future<Output = RelayResult<()>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    Pipe::new(move |input| relay::through(input, config.clone(), f.clone()))
}

/// Compose two pipes together
pub fn compose<I, M, O>(p1: Pipe<I, M>, p2: Pipe<M, O>) -> Pipe<I, O>
where
    I: Send + 'static,
    M: Send + 'static,
    O: Send + 'static,
{
    Pipe::new(move |input| {
        let p1 = p1.clone();
        let p2 = p2.clone();
        p2.apply(p1.apply(input))
    })
}

/// Identity pipe that doesn't transform the relay stream
pub fn identity<I>() -> Pipe<I, I>
where
    I: Send + 'static,
{
    Pipe::new(|input| input)
}

/// Extension trait for pipes
pub trait PipeExt<I, O> {
    /// Compose this pipe with another pipe
    fn compose<P>(self, other: Pipe<O, P>) -> Pipe<I, P>
    where
        P: Send + 'static;
}

impl<I, O> PipeExt<I, O> for Pipe<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn compose<P>(self, other: Pipe<O, P>) -> Pipe<I, P>
    where
        P: Send + 'static,
    {
        compose(self, other)
    }
}

// ================================
// Driving
// ================================

/// Drive `source` into `sink`.
///
/// Resolves when the source ends and the sink has been closed. Rejects
/// with the source's first error, or with
/// [`RelayError::Destination`] when the sink refuses a write or fails
/// to close. Settles exactly once; on error both halves are dropped,
/// so the sink never sees another write.
pub async fn pipe<O, K>(source: RelayStream<O>, sink: K) -> RelayResult<()>
where
    O: Send + 'static,
    K: Sink<O> + Unpin,
    K::Error: fmt::Display,
{
    let mut source = source;
    let mut sink = sink;
    while let Some(item) = source.next().await {
        match item {
            Ok(value) => {
                if let Err(e) = sink.send(value).await {
                    let err = RelayError::destination(e);
                    log::warn!("pipe aborted by destination: {}", err);
                    return Err(err);
                }
            }
            Err(e) => {
                log::debug!("pipe aborted by upstream error: {}", e);
                return Err(e);
            }
        }
    }
    sink.close().await.map_err(RelayError::destination)?;
    Ok(())
}

/// Thread `source` through `stages` in order, then [`pipe`] the final
/// stage into `sink`.
///
/// Rejects with the first error from any stage; dropping the chain at
/// that point cancels everything upstream, so an early failure leaves
/// no stage running. Type-changing chains compose explicitly with
/// [`PipeExt::compose`].
pub async fn pipeline<T, K>(
    source: RelayStream<T>,
    stages: Vec<Pipe<T, T>>,
    sink: K,
) -> RelayResult<()>
where
    T: Send + 'static,
    K: Sink<T> + Unpin,
    K::Error: fmt::Display,
{
    let mut s = source;
    for stage in &stages {
        s = stage.apply(s);
    }
    pipe(s, sink).await
}
