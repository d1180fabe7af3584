use core::ops::Deref;

use crate::caps::{DynDriver, LifecycleState};
use crate::error::DeviceError;
use crate::registry::{DeviceDescriptor, DeviceKind};

/// Scoped acquisition of one registry device.
///
/// Holding a handle keeps the driver constructed. Dropping it releases the
/// reference and tears the device down when the count reaches zero, on every
/// exit path. Handles are not `Clone`; acquiring again goes through the
/// manager so the reference count stays honest.
pub struct DeviceHandle {
    desc: &'static DeviceDescriptor,
    driver: &'static DynDriver,
}

impl DeviceHandle {
    pub(crate) fn new(
        desc: &'static DeviceDescriptor,
        driver: &'static DynDriver,
    ) -> Self {
        Self { desc, driver }
    }

    pub fn name(&self) -> &'static str {
        self.desc.name()
    }

    pub fn kind(&self) -> DeviceKind {
        self.desc.kind()
    }

    pub fn index(&self) -> u8 {
        self.desc.index()
    }

    pub fn descriptor(&self) -> &'static DeviceDescriptor {
        self.desc
    }

    /// The capability bundle; equivalent to going through `Deref`.
    pub fn driver(&self) -> &'static DynDriver {
        self.driver
    }

    /// Lifecycle state as tracked by the manager.
    pub fn state(&self) -> LifecycleState {
        self.desc.state()
    }

    pub fn ref_count(&self) -> u8 {
        self.desc.ref_count()
    }

    /// Suspend the device. Fails `InvalidState` unless it is Running.
    pub fn suspend(&self) -> Result<(), DeviceError> {
        self.desc.suspend_running()
    }

    /// Resume the device. Fails `InvalidState` unless it is Suspended.
    pub fn resume(&self) -> Result<(), DeviceError> {
        self.desc.resume_suspended()
    }
}

impl core::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("name", &self.desc.name())
            .field("state", &self.desc.state())
            .field("refs", &self.desc.ref_count())
            .finish()
    }
}

impl Deref for DeviceHandle {
    type Target = DynDriver;

    #[inline]
    fn deref(&self) -> &DynDriver {
        self.driver
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.desc.release();
    }
}
