use futures_core::Stream;
use futures_util::{Sink, StreamExt};
use std::fmt;
use std::future::Future;

use crate::bridge::{self, Chunk};
use crate::error::RelayResult;
use crate::relay::{self, RelayStream};
use crate::stage::{Emitter, ThroughConfig};

/// Extension trait providing relay combinators on Result streams
pub trait RelayStreamExt<T: Send + 'static>:
    Stream<Item = RelayResult<T>> + Sized + Unpin + Send + 'static
{
    /// Run an emitter-style transform with the given config
    fn through_relay<O, F, Fut>(self, config: ThroughConfig, f: F) -> RelayStream<O>
    where
        F: FnMut(T, Emitter<O>) -> Fut + Send + 'static + Unpin,
        Fut: Future<Output = RelayResult<()>> + Send + 'static,
        O: Send + 'static + Unpin,
    {
        relay::through(self.boxed(), config, f)
    }

    /// Transform each element through an async function, sequentially
    fn map_relay<O, F, Fut>(self, f: F) -> RelayStream<O>
    where
        F: FnMut(T) -> Fut + Send + 'static + Unpin,
        Fut: Future<Output = RelayResult<O>> + Send + 'static,
        O: Send + 'static + Unpin,
    {
        relay::map(self.boxed(), f)
    }

    /// Order-preserving concurrent map with up to `concurrent`
    /// transforms in flight
    fn map_concurrent_relay<O, F, Fut>(self, concurrent: usize, f: F) -> RelayStream<O>
    where
        F: FnMut(T) -> Fut + Send + 'static + Unpin,
        Fut: Future<Output = RelayResult<O>> + Send + 'static,
        O: Send + 'static + Unpin,
    {
        relay::map_with_config(self.boxed(), ThroughConfig::concurrent(concurrent), f)
    }

    /// Keep elements whose async predicate resolves true, sequentially
    fn filter_relay<F, Fut>(self, predicate: F) -> RelayStream<T>
    where
        F: FnMut(&T) -> Fut + Send + 'static + Unpin,
        Fut: Future<Output = RelayResult<bool>> + Send + 'static,
        T: Unpin,
    {
        relay::filter(self.boxed(), predicate)
    }

    /// Concurrent filter; survivors keep their original relative order
    fn filter_concurrent_relay<F, Fut>(self, concurrent: usize, predicate: F) -> RelayStream<T>
    where
        F: FnMut(&T) -> Fut + Send + 'static + Unpin,
        Fut: Future<Output = RelayResult<bool>> + Send + 'static,
        T: Unpin,
    {
        relay::filter_with_config(self.boxed(), ThroughConfig::concurrent(concurrent), predicate)
    }

    /// Fold all elements into an accumulator, strictly sequentially
    fn reduce_relay<A, F, Fut>(self, init: A, f: F) -> impl Future<Output = RelayResult<A>>
    where
        F: FnMut(A, T) -> Fut + Send + 'static,
        Fut: Future<Output = RelayResult<A>> + Send + 'static,
        A: Send + 'static,
    {
        relay::reduce(self.boxed(), init, f)
    }

    /// Drive the stream to completion; first error wins
    fn wait_relay(self) -> impl Future<Output = RelayResult<()>> {
        bridge::wait(self.boxed())
    }

    /// Concatenate every chunk into one combined payload
    fn collect_relay(self) -> impl Future<Output = RelayResult<T>>
    where
        T: Chunk,
    {
        bridge::collect(self.boxed())
    }

    /// Gather every item into a `Vec`, preserving order
    fn collect_items_relay(self) -> impl Future<Output = RelayResult<Vec<T>>> {
        bridge::collect_items(self.boxed())
    }

    /// Drive the stream into a sink; see [`crate::pipe::pipe`]
    fn pipe_relay<K>(self, sink: K) -> impl Future<Output = RelayResult<()>>
    where
        K: Sink<T> + Unpin,
        K::Error: fmt::Display,
    {
        crate::pipe::pipe(self.boxed(), sink)
    }
}

impl<S, T> RelayStreamExt<T> for S
where
    S: Stream<Item = RelayResult<T>> + Sized + Unpin + Send + 'static,
    T: Send + 'static,
{
}
