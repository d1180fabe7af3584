use crate::engine::DmaEngine;
use crate::error::DmaError;
use crate::manager::DmaManager;
use crate::transfer::TransferRequest;

/// Exclusively owned DMA channel.
///
/// Only the holder can start transfers, so "started while owned" holds by
/// construction. Dropping the handle aborts any in-flight transfer and
/// returns the channel to the pool; [`free`](Self::free) releases
/// explicitly and refuses while a transfer is active.
pub struct DmaChannel<'a, E: DmaEngine, const CHANNELS: usize> {
    manager: &'a DmaManager<E, CHANNELS>,
    index: usize,
}

impl<'a, E: DmaEngine, const CHANNELS: usize> DmaChannel<'a, E, CHANNELS> {
    pub(crate) fn new(
        manager: &'a DmaManager<E, CHANNELS>,
        index: usize,
    ) -> Self {
        Self { manager, index }
    }

    /// Pool index of this channel.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Program and arm a transfer.
    ///
    /// Fails `InvalidState` while a transfer is already active (stop it
    /// first); a stopped channel may be restarted any number of times.
    pub fn start(
        &self,
        request: &TransferRequest,
    ) -> Result<(), DmaError<E::Error>> {
        self.manager.start(self.index, request)
    }

    /// Abort an in-flight transfer, keeping ownership. Idempotent.
    pub fn stop(&self) {
        self.manager.stop(self.index)
    }

    /// Outstanding element count, for progress polling. Zero when idle.
    pub fn remaining(&self) -> usize {
        self.manager.remaining(self.index)
    }

    pub fn is_active(&self) -> bool {
        self.manager.is_active(self.index)
    }

    /// Return the channel to the pool.
    ///
    /// Refused while a transfer is active; the handle comes back so the
    /// caller can stop and retry.
    pub fn free(self) -> Result<(), Self> {
        if self.manager.is_active(self.index) {
            return Err(self);
        }
        drop(self);
        Ok(())
    }
}

impl<E: DmaEngine, const CHANNELS: usize> core::fmt::Debug
    for DmaChannel<'_, E, CHANNELS>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DmaChannel").field("index", &self.index).finish()
    }
}

impl<E: DmaEngine, const CHANNELS: usize> Drop
    for DmaChannel<'_, E, CHANNELS>
{
    fn drop(&mut self) {
        self.manager.release(self.index);
    }
}
