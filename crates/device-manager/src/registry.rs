use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use portable_atomic::{AtomicU8, Ordering};

use crate::caps::{DynDriver, LifecycleState};
use crate::error::DeviceError;

/// Capacity of the per-device runtime configuration slot, in bytes.
pub const CONFIG_CAPACITY: usize = 64;

/// Highest representable reference count per device.
pub const MAX_REFS: u8 = 15;

/// Peripheral classes the registry distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    Uart,
    Spi,
    I2c,
    Gpio,
    Adc,
    Timer,
}

/// Driver entry point that produces the device's capability bundle.
///
/// Runs on the first acquisition, inside the registry critical section. The
/// driver may read its descriptor (configuration, index) but must not call
/// back into the lifecycle manager.
pub type ConstructFn =
    fn(&'static DeviceDescriptor) -> Result<&'static DynDriver, DeviceError>;

struct DeviceShared {
    state: LifecycleState,
    driver: Option<&'static DynDriver>,
    last_error: Option<DeviceError>,
}

/// One statically declared device instance.
///
/// The descriptor layout (name, kind, defaults, constructor) is immutable
/// and lives for program lifetime; only the runtime state bundle cycles.
/// All state mutation happens under the critical section, so descriptors
/// can be shared freely between threads and interrupt handlers.
pub struct DeviceDescriptor {
    name: &'static str,
    kind: DeviceKind,
    index: u8,
    default_config: &'static [u8],
    construct: ConstructFn,
    /// Mutated only under `shared`; read lock-free by diagnostics.
    refs: AtomicU8,
    shared: Mutex<CriticalSectionRawMutex, RefCell<DeviceShared>>,
    config: Mutex<CriticalSectionRawMutex, RefCell<Vec<u8, CONFIG_CAPACITY>>>,
}

impl DeviceDescriptor {
    pub const fn new(
        kind: DeviceKind,
        index: u8,
        name: &'static str,
        default_config: &'static [u8],
        construct: ConstructFn,
    ) -> Self {
        Self {
            name,
            kind,
            index,
            default_config,
            construct,
            refs: AtomicU8::new(0),
            shared: Mutex::new(RefCell::new(DeviceShared {
                state: LifecycleState::Uninitialized,
                driver: None,
                last_error: None,
            })),
            config: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Current number of outstanding acquisitions.
    pub fn ref_count(&self) -> u8 {
        self.refs.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.lock(|cell| cell.borrow().state)
    }

    /// Most recent lifecycle failure, if any.
    pub fn last_error(&self) -> Option<DeviceError> {
        self.shared.lock(|cell| cell.borrow().last_error)
    }

    /// Copy the active configuration into `out`, returning its length.
    ///
    /// An empty runtime slot means the build-time defaults apply.
    pub fn config(&self, out: &mut [u8]) -> Result<usize, DeviceError> {
        self.config.lock(|cell| {
            let cfg = cell.borrow();
            let bytes: &[u8] = if cfg.is_empty() {
                self.default_config
            } else {
                cfg.as_slice()
            };
            if out.len() < bytes.len() {
                return Err(DeviceError::InvalidParameter);
            }
            out[..bytes.len()].copy_from_slice(bytes);
            Ok(bytes.len())
        })
    }

    /// Length of the active configuration.
    pub fn config_len(&self) -> usize {
        self.config.lock(|cell| {
            let cfg = cell.borrow();
            if cfg.is_empty() {
                self.default_config.len()
            } else {
                cfg.len()
            }
        })
    }

    /// Replace the runtime configuration.
    ///
    /// Normal callers go through [`DeviceManager::reinit`] or the driver's
    /// [`Configurable`] implementation; this is the storage primitive both
    /// build on. An oversized configuration leaves the slot unchanged.
    ///
    /// [`DeviceManager::reinit`]: crate::DeviceManager::reinit
    /// [`Configurable`]: crate::Configurable
    pub fn write_config(&self, bytes: &[u8]) -> Result<(), DeviceError> {
        let mut staged: Vec<u8, CONFIG_CAPACITY> = Vec::new();
        staged
            .extend_from_slice(bytes)
            .map_err(|_| DeviceError::InvalidParameter)?;
        self.config.lock(|cell| {
            cell.replace(staged);
        });
        Ok(())
    }

    /// Clear the runtime slot so the build-time defaults apply again.
    pub fn reset_config(&self) {
        self.config.lock(|cell| cell.borrow_mut().clear());
    }

    /// Record the driver-specific start transition (Initialized → Running).
    ///
    /// Drivers call this from their start path, typically `Power::enable`.
    pub fn mark_running(&self) -> Result<(), DeviceError> {
        self.shared.lock(|cell| {
            let mut shared = cell.borrow_mut();
            match shared.state {
                LifecycleState::Initialized => {
                    shared.state = LifecycleState::Running;
                    Ok(())
                }
                _ => Err(DeviceError::InvalidState),
            }
        })
    }

    pub(crate) fn acquire(
        &'static self,
    ) -> Result<&'static DynDriver, DeviceError> {
        self.shared.lock(|cell| {
            let refs = self.refs.load(Ordering::Relaxed);
            if refs == 0 {
                return self.construct_locked(cell);
            }
            if refs == MAX_REFS {
                return Err(DeviceError::NoResource);
            }
            let driver =
                cell.borrow().driver.ok_or(DeviceError::NotInitialized)?;
            self.refs.store(refs + 1, Ordering::Release);
            Ok(driver)
        })
    }

    /// Atomically replace the configuration and construct. Refused while
    /// anyone holds the device, so no caller can observe a stale bundle.
    pub(crate) fn acquire_with_config(
        &'static self,
        config: &[u8],
    ) -> Result<&'static DynDriver, DeviceError> {
        self.shared.lock(|cell| {
            if self.refs.load(Ordering::Relaxed) > 0 {
                return Err(DeviceError::Busy);
            }
            self.write_config(config)?;
            self.construct_locked(cell)
        })
    }

    /// Replace the runtime configuration of an idle device.
    pub(crate) fn reconfigure(
        &self,
        config: &[u8],
    ) -> Result<(), DeviceError> {
        // Taken under `shared` so the reference count cannot move while the
        // slot is rewritten.
        self.shared.lock(|_cell| {
            if self.refs.load(Ordering::Relaxed) > 0 {
                return Err(DeviceError::Busy);
            }
            self.write_config(config)
        })
    }

    /// First-acquisition path. The caller holds the `shared` lock; the
    /// RefCell borrow is not held across the driver call so the constructor
    /// may read its own descriptor.
    fn construct_locked(
        &'static self,
        cell: &RefCell<DeviceShared>,
    ) -> Result<&'static DynDriver, DeviceError> {
        let constructed = (self.construct)(self);
        let mut shared = cell.borrow_mut();
        match constructed {
            Ok(driver) => {
                shared.driver = Some(driver);
                shared.state = LifecycleState::Initialized;
                shared.last_error = None;
                self.refs.store(1, Ordering::Release);
                Ok(driver)
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "construct failed for {=str}: {:?}",
                    self.name,
                    e
                );
                shared.last_error = Some(e);
                Err(e)
            }
        }
    }

    /// Release one reference; tears the device down at zero. Runs from
    /// `DeviceHandle::drop`, so teardown failures land in `last_error`
    /// instead of a return value.
    pub(crate) fn release(&'static self) {
        self.shared.lock(|cell| {
            let refs = self.refs.load(Ordering::Relaxed);
            debug_assert!(refs > 0);
            if refs > 1 {
                self.refs.store(refs - 1, Ordering::Release);
                return;
            }
            let driver = {
                let mut shared = cell.borrow_mut();
                shared.state = LifecycleState::Uninitialized;
                shared.driver.take()
            };
            self.refs.store(0, Ordering::Release);
            if let Some(driver) = driver {
                if let Err(e) = driver.deinit() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "deinit failed for {=str}: {:?}",
                        self.name,
                        e
                    );
                    cell.borrow_mut().last_error = Some(e);
                }
            }
        })
    }

    /// State-checked suspend (Running → Suspended).
    pub(crate) fn suspend_running(&self) -> Result<(), DeviceError> {
        self.shared.lock(|cell| {
            let driver = {
                let shared = cell.borrow();
                if shared.state != LifecycleState::Running {
                    return Err(DeviceError::InvalidState);
                }
                shared.driver.ok_or(DeviceError::NotInitialized)?
            };
            match driver.suspend() {
                Ok(()) => {
                    cell.borrow_mut().state = LifecycleState::Suspended;
                    Ok(())
                }
                Err(e) => {
                    let mut shared = cell.borrow_mut();
                    shared.state = LifecycleState::Error;
                    shared.last_error = Some(e);
                    Err(e)
                }
            }
        })
    }

    /// State-checked resume (Suspended → Running).
    pub(crate) fn resume_suspended(&self) -> Result<(), DeviceError> {
        self.shared.lock(|cell| {
            let driver = {
                let shared = cell.borrow();
                if shared.state != LifecycleState::Suspended {
                    return Err(DeviceError::InvalidState);
                }
                shared.driver.ok_or(DeviceError::NotInitialized)?
            };
            match driver.resume() {
                Ok(()) => {
                    cell.borrow_mut().state = LifecycleState::Running;
                    Ok(())
                }
                Err(e) => {
                    let mut shared = cell.borrow_mut();
                    shared.state = LifecycleState::Error;
                    shared.last_error = Some(e);
                    Err(e)
                }
            }
        })
    }
}

/// The ordered, boundary-delimited collection of all device descriptors.
///
/// Populated at build time through [`device_registry!`](crate::device_registry);
/// iteration is ordinary slice indexing.
#[derive(Clone, Copy)]
pub struct DeviceRegistry {
    devices: &'static [&'static DeviceDescriptor],
}

impl DeviceRegistry {
    pub const fn new(devices: &'static [&'static DeviceDescriptor]) -> Self {
        Self { devices }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Linear scan by unique name. Device counts are small and fixed at
    /// build time, so O(n) is fine.
    pub fn find(
        &self,
        name: &str,
    ) -> Result<&'static DeviceDescriptor, DeviceError> {
        self.devices
            .iter()
            .copied()
            .find(|d| d.name == name)
            .ok_or(DeviceError::NotFound)
    }

    pub fn find_by_kind(
        &self,
        kind: DeviceKind,
        index: u8,
    ) -> Result<&'static DeviceDescriptor, DeviceError> {
        self.devices
            .iter()
            .copied()
            .find(|d| d.kind == kind && d.index == index)
            .ok_or(DeviceError::NotFound)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = &'static DeviceDescriptor> + '_ {
        self.devices.iter().copied()
    }
}

/// Declares the build-time device table: one static descriptor per declared
/// instance plus one registry covering them all. Which instances exist is
/// the build configuration's decision; there is no runtime registration.
///
/// ```ignore
/// device_registry! {
///     pub static DEVICES = {
///         UART0: (Uart, 0, "uart0", &[], uart0_construct),
///         GPIO0: (Gpio, 0, "gpio0", &[], gpio0_construct),
///     };
/// }
/// ```
#[macro_export]
macro_rules! device_registry {
    (
        $vis:vis static $registry:ident = {
            $( $entry:ident : (
                $kind:ident, $index:expr, $name:expr, $default:expr, $construct:expr $(,)?
            ) ),+ $(,)?
        };
    ) => {
        $(
            $vis static $entry: $crate::DeviceDescriptor =
                $crate::DeviceDescriptor::new(
                    $crate::DeviceKind::$kind,
                    $index,
                    $name,
                    $default,
                    $construct,
                );
        )+
        $vis static $registry: $crate::DeviceRegistry =
            $crate::DeviceRegistry::new(&[ $( &$entry ),+ ]);
    };
}
