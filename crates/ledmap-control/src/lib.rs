//! LedMap Control - network input
//!
//! This crate provides:
//! - Art-Net decoding and PollReply/Dmx packet building
//! - LM protocol parsing
//! - The bounded frame and configuration queues
//! - The pooled LM buffers
//! - The input and strip-type threads

#![warn(missing_docs)]

pub mod dmx;
pub mod error;
pub mod input;
pub mod lm;
pub mod mode_listener;
pub mod pool;
pub mod queue;

pub use dmx::{ArtNetPacket, NodeInfo};
pub use error::{ControlError, Result};
pub use input::{InputEndpoints, InputFrame, InputThread, InputWorker, LmFrame, PollSummary};
pub use lm::{ChannelRun, LmPacket};
pub use mode_listener::ModeListener;
pub use pool::{BufferPool, PooledBuffer};
pub use queue::{frame_queue, Consumer, Producer, QueueStats};
