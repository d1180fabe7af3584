use crate::error::DeviceError;

/// Lifecycle states a device moves through.
///
/// Legal transitions: Uninitialized → Initialized (construct) → Running
/// (driver start) → Suspended ⇄ Running → Uninitialized (teardown on last
/// release). `Error` is entered when a driver lifecycle call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Running,
    Suspended,
    Error,
}

/// Notification hook for power state changes. The argument is the new
/// enabled state.
pub type PowerCallback = fn(enabled: bool);

/// Core lifecycle contract every driver must implement.
///
/// `deinit`, `suspend` and `resume` are driven by the lifecycle manager;
/// calling them directly bypasses the manager's state tracking.
pub trait Lifecycle {
    fn init(&self) -> Result<(), DeviceError>;
    fn deinit(&self) -> Result<(), DeviceError>;
    fn suspend(&self) -> Result<(), DeviceError>;
    fn resume(&self) -> Result<(), DeviceError>;
    fn state(&self) -> LifecycleState;
}

/// Optional power control capability.
pub trait Power {
    fn enable(&self) -> Result<(), DeviceError>;
    fn disable(&self) -> Result<(), DeviceError>;
    fn is_enabled(&self) -> bool;
    /// Register (or clear) a hook invoked after each power transition.
    fn set_callback(&self, callback: Option<PowerCallback>);
}

/// Optional runtime configuration capability.
///
/// Configurations are opaque byte strings; the serialization format is the
/// driver's business and the managers never interpret it.
pub trait Configurable {
    /// Copy the active configuration into `out`, returning its length.
    fn get_config(&self, out: &mut [u8]) -> Result<usize, DeviceError>;
    /// Validate and apply a new configuration.
    fn set_config(&self, config: &[u8]) -> Result<(), DeviceError>;
    /// Revert to the build-time default configuration.
    fn reset_config(&self) -> Result<(), DeviceError>;
}

/// Transfer counters reported by [`Diagnostic::statistics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStats {
    pub ops: u32,
    pub bytes: u32,
    pub errors: u32,
}

/// Health summary reported by [`Diagnostic::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    pub healthy: bool,
    pub last_error: Option<DeviceError>,
}

/// Optional introspection capability.
pub trait Diagnostic {
    fn status(&self) -> DeviceStatus;
    fn statistics(&self) -> DeviceStats;
    fn clear_statistics(&self);
}

/// Capability bundle a constructed driver exposes.
///
/// Composition instead of inheritance: `Lifecycle` is mandatory, the rest
/// are opt-in accessors returning `None` by default. The lifecycle manager
/// only ever sees this trait, never a concrete driver type.
pub trait DeviceDriver: Lifecycle {
    fn power(&self) -> Option<&dyn Power> {
        None
    }
    fn configurable(&self) -> Option<&dyn Configurable> {
        None
    }
    fn diagnostic(&self) -> Option<&dyn Diagnostic> {
        None
    }
}

/// Trait object form every registry entry resolves to.
pub type DynDriver = dyn DeviceDriver + Sync;
