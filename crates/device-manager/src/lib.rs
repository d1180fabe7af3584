#![no_std]
//! Reference-counted device lifecycle management over a static registry.
//!
//! Devices are declared at build time with [`device_registry!`]; nothing is
//! registered or allocated at runtime. The [`DeviceManager`] lazily runs a
//! driver's constructor on the first acquisition, hands out RAII
//! [`DeviceHandle`]s that share the constructed capability bundle, and
//! tears the device down when the last handle drops. Drivers expose their
//! functionality through the composition traits in this crate
//! ([`Lifecycle`], [`Power`], [`Configurable`], [`Diagnostic`]) rather than
//! through concrete types.
//!
//! All shared state sits behind blocking mutexes over the platform's
//! critical-section implementation, so the manager works unchanged on
//! bare-metal single-core targets, under an RTOS, or in host tests with
//! `critical-section/std`.

mod caps;
mod error;
mod factory;
mod handle;
mod manager;
mod registry;

pub use caps::{
    Configurable, DeviceDriver, DeviceStats, DeviceStatus, Diagnostic,
    DynDriver, Lifecycle, LifecycleState, Power, PowerCallback,
};
pub use error::DeviceError;
pub use factory::DeviceSnapshot;
pub use handle::DeviceHandle;
pub use manager::DeviceManager;
pub use registry::{
    ConstructFn, DeviceDescriptor, DeviceKind, DeviceRegistry,
    CONFIG_CAPACITY, MAX_REFS,
};
