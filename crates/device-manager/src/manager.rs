use crate::error::DeviceError;
use crate::handle::DeviceHandle;
use crate::registry::{DeviceDescriptor, DeviceKind, DeviceRegistry};

/// Reference-counted lifecycle manager over a static registry.
///
/// Construction is lazy: the first `get` of a device runs its constructor,
/// later `get`s share the cached capability bundle, and the last handle to
/// drop tears the device down. Every mutation runs under the registry
/// critical section, so the manager is safe to call from any context the
/// critical-section provider admits.
pub struct DeviceManager {
    registry: DeviceRegistry,
}

impl DeviceManager {
    pub const fn new(registry: DeviceRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Acquire a device by its unique name.
    ///
    /// On the first acquisition the driver's constructor runs; on failure
    /// the reference count and cached bundle keep their pre-call values, so
    /// a failed `get` is always retryable. The count is bounded; acquiring
    /// past the bound fails `NoResource` rather than wrapping.
    pub fn get(&self, name: &str) -> Result<DeviceHandle, DeviceError> {
        self.acquire(self.registry.find(name)?)
    }

    /// Acquire a device by kind and index.
    pub fn get_by_kind(
        &self,
        kind: DeviceKind,
        index: u8,
    ) -> Result<DeviceHandle, DeviceError> {
        self.acquire(self.registry.find_by_kind(kind, index)?)
    }

    /// Replace the configuration and acquire in one critical section.
    ///
    /// Fails `Busy` while anyone holds the device: configuration can only
    /// change when no capability bundle is outstanding, which makes a stale
    /// bundle reference unrepresentable.
    pub fn get_with_config(
        &self,
        name: &str,
        config: &[u8],
    ) -> Result<DeviceHandle, DeviceError> {
        self.acquire_with_config(self.registry.find(name)?, config)
    }

    /// Replace the runtime configuration of an idle device. The next
    /// acquisition constructs with the new configuration.
    ///
    /// Fails `Busy` while the device is held; callers must release and
    /// re-acquire, never reconfigure under a live bundle.
    pub fn reinit(
        &self,
        name: &str,
        config: &[u8],
    ) -> Result<(), DeviceError> {
        self.registry.find(name)?.reconfigure(config)
    }

    /// Explicit release; equivalent to dropping the handle.
    pub fn put(&self, handle: DeviceHandle) {
        drop(handle);
    }

    pub(crate) fn acquire(
        &self,
        desc: &'static DeviceDescriptor,
    ) -> Result<DeviceHandle, DeviceError> {
        let driver = desc.acquire()?;
        Ok(DeviceHandle::new(desc, driver))
    }

    pub(crate) fn acquire_with_config(
        &self,
        desc: &'static DeviceDescriptor,
        config: &[u8],
    ) -> Result<DeviceHandle, DeviceError> {
        let driver = desc.acquire_with_config(config)?;
        Ok(DeviceHandle::new(desc, driver))
    }
}
