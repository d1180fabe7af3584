#![no_std]
//! Priority-ordered interrupt callback registration over a fixed table.
//!
//! Peripheral drivers `connect` callbacks against interrupt lines; the
//! platform's vector routine calls [`IrqManager::dispatch`], which walks
//! the line's chain Highest-priority-first. Masking and hardware priority
//! are forwarded to a platform [`InterruptController`] and are orthogonal
//! to chain order. No allocation, no runtime registration storage beyond
//! the fixed table.

mod controller;
mod error;
mod manager;

pub use controller::{HwPriority, InterruptController, IrqLine};
pub use error::IrqError;
pub use manager::{CallbackPriority, IrqCallback, IrqHandle, IrqManager};
