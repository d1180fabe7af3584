/// Errors returned by the registry, the lifecycle manager, and the
/// capability interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// An argument was out of range or otherwise malformed.
    InvalidParameter,
    /// No registered device matches the requested name or kind/index.
    NotFound,
    /// The driver was asked to initialize while already initialized.
    AlreadyInitialized,
    /// The operation requires an initialized device.
    NotInitialized,
    /// The operation is not legal from the device's current lifecycle state.
    InvalidState,
    /// The device is held by other callers and cannot be reconfigured.
    Busy,
    /// A fixed bound was hit: reference count, pool, or table capacity.
    NoResource,
    /// An underlying hardware resource is owned by another peripheral.
    ResourceBusy,
    /// The platform refused the operation.
    Permission,
}
