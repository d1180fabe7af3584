//! A device's DMA channels and interrupt registrations must be gone after
//! its last release. Wires a mock serial driver to real `dma-manager` and
//! `irq-manager` instances and watches both pools across the lifecycle.

use std::sync::Mutex as StdMutex;

use device_manager::{
    device_registry, DeviceDescriptor, DeviceDriver, DeviceError,
    DeviceManager, DynDriver, Lifecycle, LifecycleState,
};
use dma_manager::{
    DmaChannel, DmaEngine, DmaManager, PeripheralId, TransferRequest,
};
use grounded::uninit::GroundedCell;
use irq_manager::{
    CallbackPriority, HwPriority, InterruptController, IrqHandle, IrqLine,
    IrqManager,
};

// ---------------------------------------------------------------------------
// Null platform seams
// ---------------------------------------------------------------------------

struct NullEngine;

impl DmaEngine for NullEngine {
    type Error = core::convert::Infallible;

    fn arm(
        &self,
        _channel: usize,
        _request: &TransferRequest,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn abort(&self, _channel: usize) {}

    fn remaining(&self, _channel: usize) -> usize {
        0
    }
}

struct NullController;

impl InterruptController for NullController {
    fn enable(&self, _line: IrqLine) {}

    fn disable(&self, _line: IrqLine) {}

    fn set_priority(&self, _line: IrqLine, _priority: HwPriority) {}
}

static DMA: DmaManager<NullEngine, 4> =
    DmaManager::new(NullEngine, [u32::MAX; 4]);
static IRQS: IrqManager<NullController, 8> = IrqManager::new(NullController);

// ---------------------------------------------------------------------------
// Serial driver that owns one RX channel and one interrupt registration
// ---------------------------------------------------------------------------

const UART0_ID: PeripheralId = PeripheralId(0x0100);
const UART0_IRQ: IrqLine = IrqLine(21);
const RX_LINE: u8 = 3;

fn serial_isr(_context: u32) {}

struct DmaSerial {
    desc: &'static DeviceDescriptor,
    rx_channel: StdMutex<Option<DmaChannel<'static, NullEngine, 4>>>,
    irq: StdMutex<Option<IrqHandle>>,
}

impl Lifecycle for DmaSerial {
    fn init(&self) -> Result<(), DeviceError> {
        Err(DeviceError::AlreadyInitialized)
    }

    fn deinit(&self) -> Result<(), DeviceError> {
        if let Some(channel) = self.rx_channel.lock().unwrap().take() {
            channel.stop();
            channel.free().map_err(|_| DeviceError::ResourceBusy)?;
        }
        if let Some(handle) = self.irq.lock().unwrap().take() {
            IRQS.disable(UART0_IRQ);
            IRQS.disconnect(handle)
                .map_err(|_| DeviceError::NotFound)?;
        }
        Ok(())
    }

    fn suspend(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn state(&self) -> LifecycleState {
        self.desc.state()
    }
}

impl DeviceDriver for DmaSerial {}

static UART0_CELL: GroundedCell<DmaSerial> = GroundedCell::uninit();

fn uart0_construct(
    desc: &'static DeviceDescriptor,
) -> Result<&'static DynDriver, DeviceError> {
    let channel =
        DMA.alloc(UART0_ID, RX_LINE).map_err(|_| DeviceError::NoResource)?;

    let irq = match IRQS.connect(
        UART0_IRQ,
        serial_isr,
        0,
        CallbackPriority::High,
    ) {
        Ok(handle) => handle,
        Err(_) => {
            // The channel drops here and goes back to the pool.
            return Err(DeviceError::NoResource);
        }
    };
    IRQS.enable(UART0_IRQ);

    let mut request =
        TransferRequest::periph_to_mem(0x4000_0000, 0x2000_0000, 64);
    request.circular = true;
    if channel.start(&request).is_err() {
        IRQS.disable(UART0_IRQ);
        let _ = IRQS.disconnect(irq);
        return Err(DeviceError::ResourceBusy);
    }

    // SAFETY: constructed only while the reference count is zero, so no
    // references into the cell exist while it is rewritten.
    unsafe {
        UART0_CELL.get().write(DmaSerial {
            desc,
            rx_channel: StdMutex::new(Some(channel)),
            irq: StdMutex::new(Some(irq)),
        });
        Ok(&*UART0_CELL.get())
    }
}

device_registry! {
    static DEVICES = {
        UART0: (Uart, 0, "uart0", &[], uart0_construct),
    };
}

/// The pools above are process-wide; tests in this file run serialized.
static TEST_LOCK: StdMutex<()> = StdMutex::new(());

fn setup() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn resources_are_released_after_last_put() {
    let _guard = setup();
    let mgr = DeviceManager::new(DEVICES);

    assert_eq!(DMA.free_channels(), 4);
    assert_eq!(IRQS.registered(UART0_IRQ), 0);

    let first = mgr.get("uart0").unwrap();
    assert_eq!(DMA.free_channels(), 3);
    assert_eq!(DMA.owner_of(0), Some(UART0_ID));
    assert_eq!(IRQS.registered(UART0_IRQ), 1);

    // A second holder does not acquire more hardware.
    let second = mgr.get("uart0").unwrap();
    assert_eq!(DMA.free_channels(), 3);
    assert_eq!(IRQS.registered(UART0_IRQ), 1);

    // Not the last release: everything stays owned.
    drop(first);
    assert_eq!(DMA.free_channels(), 3);
    assert_eq!(IRQS.registered(UART0_IRQ), 1);

    drop(second);
    assert_eq!(DMA.free_channels(), 4);
    assert_eq!(DMA.owner_of(0), None);
    assert_eq!(IRQS.registered(UART0_IRQ), 0);
}

#[test]
fn failed_construct_leaks_nothing() {
    let _guard = setup();
    let mgr = DeviceManager::new(DEVICES);

    // Exhaust the channel pool so construction cannot get its RX channel.
    let hog = PeripheralId(0x0FFF);
    let held: Vec<_> =
        (0..4).map(|_| DMA.alloc(hog, RX_LINE).unwrap()).collect();

    assert_eq!(mgr.get("uart0").unwrap_err(), DeviceError::NoResource);
    assert_eq!(IRQS.registered(UART0_IRQ), 0);
    assert_eq!(UART0.ref_count(), 0);

    drop(held);
    assert_eq!(DMA.free_channels(), 4);

    // With the pool free again the device comes up cleanly.
    let handle = mgr.get("uart0").unwrap();
    assert_eq!(DMA.free_channels(), 3);
    drop(handle);
    assert_eq!(DMA.free_channels(), 4);
}

#[test]
fn each_acquisition_cycle_gets_fresh_resources() {
    let _guard = setup();
    let mgr = DeviceManager::new(DEVICES);

    for _ in 0..3 {
        let handle = mgr.get("uart0").unwrap();
        assert_eq!(DMA.free_channels(), 3);
        assert_eq!(IRQS.registered(UART0_IRQ), 1);
        drop(handle);
        assert_eq!(DMA.free_channels(), 4);
        assert_eq!(IRQS.registered(UART0_IRQ), 0);
    }
}
