#![no_std]
//! Exclusive ownership manager for a fixed pool of DMA transfer channels.
//!
//! The pool does no I/O itself: a platform [`DmaEngine`] programs the
//! controller registers, while the pool enforces that every channel has at
//! most one owner, that transfers only start on owned channels, and that
//! channels return to the pool with nothing in flight. All bookkeeping runs
//! under a blocking mutex over the platform's critical-section
//! implementation, so allocation is safe against interrupt-context
//! completion callbacks.

mod channel;
mod engine;
mod error;
mod manager;
mod transfer;

pub use channel::DmaChannel;
pub use engine::DmaEngine;
pub use error::DmaError;
pub use manager::{DmaManager, MAX_REQUEST_LINE};
pub use transfer::{
    ChannelPriority, Direction, PeripheralId, TransferCallback,
    TransferRequest, Width,
};
