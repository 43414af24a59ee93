//! Poll-based relay engine.
//!
//! The [`Through`] stream is the single engine underlying `through`,
//! `map`, and `filter`: a bounded window of concurrently running
//! transforms whose outputs are committed downstream in strict intake
//! order.

pub mod through;

pub use through::{Emitter, Through, ThroughConfig};
