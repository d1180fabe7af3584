use paste::paste;

use crate::caps::LifecycleState;
use crate::error::DeviceError;
use crate::handle::DeviceHandle;
use crate::manager::DeviceManager;
use crate::registry::DeviceKind;

/// Point-in-time view of one registry entry, as filled in by
/// [`DeviceManager::enumerate`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSnapshot {
    pub name: &'static str,
    pub kind: DeviceKind,
    pub state: LifecycleState,
    pub ref_count: u8,
}

macro_rules! typed_accessors {
    ($($fn_name:ident => $kind:ident),+ $(,)?) => {
        paste! {
            impl DeviceManager {
                $(
                    #[doc = concat!(
                        "Acquire ", stringify!($kind), " instance `index`."
                    )]
                    pub fn $fn_name(
                        &self,
                        index: u8,
                    ) -> Result<DeviceHandle, DeviceError> {
                        self.get_by_kind(DeviceKind::$kind, index)
                    }

                    #[doc = concat!(
                        "Acquire ", stringify!($kind), " instance `index` ",
                        "with a replacement configuration. Fails `Busy` ",
                        "while the device is held."
                    )]
                    pub fn [<$fn_name _with_config>](
                        &self,
                        index: u8,
                        config: &[u8],
                    ) -> Result<DeviceHandle, DeviceError> {
                        let desc = self
                            .registry()
                            .find_by_kind(DeviceKind::$kind, index)?;
                        self.acquire_with_config(desc, config)
                    }
                )+
            }
        }
    };
}

typed_accessors! {
    uart => Uart,
    spi => Spi,
    i2c => I2c,
    gpio => Gpio,
    adc => Adc,
    timer => Timer,
}

impl DeviceManager {
    /// Fill `out` with a snapshot of every registered device, in
    /// registration order. Returns the number written; truncates silently
    /// when `out` is too small. Never allocates.
    pub fn enumerate(&self, out: &mut [DeviceSnapshot]) -> usize {
        let mut written = 0;
        for desc in self.registry().iter() {
            if written == out.len() {
                break;
            }
            out[written] = DeviceSnapshot {
                name: desc.name(),
                kind: desc.kind(),
                state: desc.state(),
                ref_count: desc.ref_count(),
            };
            written += 1;
        }
        written
    }
}
