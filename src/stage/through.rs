use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::error::{RelayError, RelayResult};

/// Configuration for a relay stage.
#[derive(Debug, Clone)]
pub struct ThroughConfig {
    /// Maximum number of transform invocations allowed to be unsettled
    /// at the same time. Zero is treated as one.
    pub concurrent: usize,
    /// Upper bound on in-flight transforms plus buffered outputs. When
    /// reached, the relay stops admitting new items until the consumer
    /// drains the queue. `None` removes the bound; zero is treated as
    /// one.
    pub max_buffered: Option<usize>,
}

impl Default for ThroughConfig {
    fn default() -> Self {
        Self {
            concurrent: 1,
            max_buffered: Some(1000),
        }
    }
}

impl ThroughConfig {
    /// Config with the given concurrency window and default buffering.
    pub fn concurrent(concurrent: usize) -> Self {
        Self {
            concurrent,
            ..Default::default()
        }
    }

    /// One transform slot per CPU core.
    pub fn cpu_bound() -> Self {
        Self {
            concurrent: num_cpus::get(),
            ..Default::default()
        }
    }
}

/// Handle a transform invocation uses to emit outputs for its slot.
///
/// A transform may push zero, one, or many values. Pushed values keep
/// their intra-invocation order and are released downstream as a block
/// once the slot is committed in intake order. Pushes after the owning
/// slot has been released are dropped.
pub struct Emitter<O> {
    buf: Arc<Mutex<Vec<O>>>,
}

impl<O> Clone for Emitter<O> {
    fn clone(&self) -> Self {
        Emitter {
            buf: Arc::clone(&self.buf),
        }
    }
}

impl<O> Emitter<O> {
    fn channel() -> (Self, Arc<Mutex<Vec<O>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let emitter = Emitter {
            buf: Arc::clone(&buf),
        };
        (emitter, buf)
    }

    /// Queue a value for release when this slot commits.
    pub fn push(&self, value: O) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }
}

fn drain_buf<O>(buf: &Mutex<Vec<O>>) -> Vec<O> {
    let mut guard = buf.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *guard)
}

/// Terminal-state tracking for a relay instance.
enum CompletionState {
    Running,
    Failed(RelayError),
    Ended,
}

struct Slot<O> {
    fut: Pin<Box<dyn Future<Output = RelayResult<()>> + Send>>,
    outputs: Arc<Mutex<Vec<O>>>,
}

type BoxedEndFuture = Pin<Box<dyn Future<Output = RelayResult<()>> + Send>>;
type EndHook<O> = Box<dyn FnOnce(Emitter<O>) -> BoxedEndFuture + Send>;

/// Bounded-concurrency relay stage preserving intake order on output.
///
/// Up to `concurrent` transforms run at once; slot N's outputs are never
/// yielded before the outputs of slots 0..N-1, no matter which transform
/// settles first. The first error (upstream, transform, or end hook)
/// is yielded exactly once, after which remaining in-flight transforms
/// are drained cooperatively with their results discarded.
pub struct Through<S, F, O> {
    source: Pin<Box<S>>,
    f: F,
    config: ThroughConfig,
    // HashMap keyed by intake sequence number; commit order is tracked
    // separately so completion order never leaks downstream.
    in_flight: HashMap<usize, Slot<O>>,
    completed: HashMap<usize, Vec<O>>,
    committed: VecDeque<O>,
    next_index: usize,
    next_commit_index: usize,
    source_done: bool,
    end_hook: Option<EndHook<O>>,
    end_fut: Option<(BoxedEndFuture, Arc<Mutex<Vec<O>>>)>,
    state: CompletionState,
    error_reported: bool,
}

impl<S, F, I, O, Fut> Through<S, F, O>
where
    S: Stream<Item = RelayResult<I>> + Send + 'static,
    F: FnMut(I, Emitter<O>) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<()>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    pub fn new(source: S, config: ThroughConfig, f: F) -> Self {
        let config = ThroughConfig {
            concurrent: config.concurrent.max(1),
            max_buffered: config.max_buffered.map(|max| max.max(1)),
        };

        Self {
            source: Box::pin(source),
            f,
            config,
            in_flight: HashMap::new(),
            completed: HashMap::new(),
            committed: VecDeque::new(),
            next_index: 0,
            next_commit_index: 0,
            source_done: false,
            end_hook: None,
            end_fut: None,
            state: CompletionState::Running,
            error_reported: false,
        }
    }

    /// Like [`Through::new`], with a hook invoked once after all input
    /// is consumed, all transforms have settled, and all outputs are
    /// released. The hook may push trailing outputs; completion waits
    /// for it, and its error fails the relay.
    pub fn with_end<E, EFut>(source: S, config: ThroughConfig, f: F, on_end: E) -> Self
    where
        E: FnOnce(Emitter<O>) -> EFut + Send + 'static,
        EFut: Future<Output = RelayResult<()>> + Send + 'static,
    {
        let mut through = Self::new(source, config, f);
        through.end_hook = Some(Box::new(move |emitter| Box::pin(on_end(emitter))));
        through
    }

    /// Drive the relay to a terminal state, discarding outputs.
    ///
    /// Resolves `Ok(())` once ended, or with the first error once
    /// failed.
    pub async fn promise(mut self) -> RelayResult<()> {
        while let Some(item) = self.next().await {
            item?;
        }
        Ok(())
    }

    fn buffered(&self) -> usize {
        self.in_flight.len() + self.completed.len() + self.committed.len()
    }

    fn is_buffer_full(&self) -> bool {
        match self.config.max_buffered {
            Some(max) => self.buffered() >= max,
            None => false,
        }
    }

    fn fail(&mut self, err: RelayError) {
        if let CompletionState::Running = self.state {
            log::warn!("relay entering failed state: {}", err);
            // Results that have not reached the consumer are discarded.
            self.completed.clear();
            self.committed.clear();
            self.state = CompletionState::Failed(err);
        }
    }
}

impl<S, F, I, O, Fut> Stream for Through<S, F, O>
where
    S: Stream<Item = RelayResult<I>> + Send + 'static,
    F: FnMut(I, Emitter<O>) -> Fut + Send + 'static + Unpin,
    Fut: Future<Output = RelayResult<()>> + Send + 'static,
    I: Send + 'static,
    O: Send + 'static + Unpin,
{
    type Item = RelayResult<O>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        'turn: loop {
            // Release order is committed already; yield before anything else.
            if let Some(value) = this.committed.pop_front() {
                return Poll::Ready(Some(Ok(value)));
            }

            if let CompletionState::Failed(err) = &this.state {
                if !this.error_reported {
                    this.error_reported = true;
                    return Poll::Ready(Some(Err(err.clone())));
                }
                // Cooperative drain: in-flight transforms settle, results
                // are discarded.
                let mut settled = Vec::new();
                for (index, slot) in this.in_flight.iter_mut() {
                    if slot.fut.as_mut().poll(cx).is_ready() {
                        settled.push(*index);
                    }
                }
                for index in settled {
                    this.in_flight.remove(&index);
                }
                return if this.in_flight.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                };
            }

            if let CompletionState::Ended = this.state {
                return Poll::Ready(None);
            }

            // Admit new work while a slot and buffer space are free.
            while this.in_flight.len() < this.config.concurrent
                && !this.source_done
                && !this.is_buffer_full()
            {
                match this.source.as_mut().poll_next(cx) {
                    Poll::Ready(Some(Ok(item))) => {
                        let index = this.next_index;
                        this.next_index += 1;

                        let (emitter, outputs) = Emitter::channel();
                        let fut = (this.f)(item, emitter);
                        this.in_flight.insert(
                            index,
                            Slot {
                                fut: Box::pin(fut),
                                outputs,
                            },
                        );
                    }
                    Poll::Ready(Some(Err(err))) => {
                        this.fail(err);
                        continue 'turn;
                    }
                    Poll::Ready(None) => {
                        this.source_done = true;
                        break;
                    }
                    Poll::Pending => break,
                }
            }

            // Poll in-flight transforms. First error wins.
            let mut settled = Vec::new();
            let mut first_err: Option<(usize, RelayError)> = None;
            for (index, slot) in this.in_flight.iter_mut() {
                match slot.fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(())) => settled.push(*index),
                    Poll::Ready(Err(err)) => {
                        if first_err.is_none() {
                            first_err = Some((*index, err));
                        }
                    }
                    Poll::Pending => {}
                }
            }
            for index in settled {
                if let Some(slot) = this.in_flight.remove(&index) {
                    this.completed.insert(index, drain_buf(&slot.outputs));
                }
            }
            if let Some((index, err)) = first_err {
                this.in_flight.remove(&index);
                this.fail(err);
                continue 'turn;
            }

            // Commit completed slots in intake order.
            while let Some(outputs) = this.completed.remove(&this.next_commit_index) {
                this.next_commit_index += 1;
                this.committed.extend(outputs);
            }
            if !this.committed.is_empty() {
                continue 'turn;
            }

            // Fully drained: run the end hook, then finish.
            if this.source_done && this.in_flight.is_empty() && this.completed.is_empty() {
                if this.end_fut.is_none() {
                    match this.end_hook.take() {
                        Some(hook) => {
                            log::debug!("relay drained, running end hook");
                            let (emitter, outputs) = Emitter::channel();
                            this.end_fut = Some((hook(emitter), outputs));
                        }
                        None => {
                            this.state = CompletionState::Ended;
                            return Poll::Ready(None);
                        }
                    }
                }
                if let Some((fut, outputs)) = this.end_fut.as_mut() {
                    match fut.as_mut().poll(cx) {
                        Poll::Ready(Ok(())) => {
                            let trailing = drain_buf(outputs);
                            this.end_fut = None;
                            this.committed.extend(trailing);
                            this.state = CompletionState::Ended;
                            continue 'turn;
                        }
                        Poll::Ready(Err(err)) => {
                            this.end_fut = None;
                            this.fail(err);
                            continue 'turn;
                        }
                        Poll::Pending => return Poll::Pending,
                    }
                }
            }

            return Poll::Pending;
        }
    }
}
