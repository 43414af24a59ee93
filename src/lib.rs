pub mod bridge;
pub mod error;
pub mod pipe;
pub mod relay;
pub mod stage;

pub mod relay_stream_ext;

// Re-export all items from the relay module at the crate root
pub use relay::*;

pub use bridge::{collect, collect_items, wait, Chunk};
pub use error::{RelayError, RelayResult};
pub use pipe::{pipe, pipeline, Pipe, PipeExt};
pub use relay_stream_ext::RelayStreamExt;
pub use stage::{Emitter, Through, ThroughConfig};
