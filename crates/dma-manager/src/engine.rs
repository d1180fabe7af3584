use crate::transfer::TransferRequest;

/// Platform half of the DMA driver.
///
/// The pool tracks ownership and transfer state; the engine programs the
/// actual controller registers. Engine methods are called under the pool's
/// critical section and must not call back into the pool.
pub trait DmaEngine {
    /// Error type for rejected transfer programming.
    type Error: core::fmt::Debug;

    /// Program and arm `channel` with `request`.
    fn arm(
        &self,
        channel: usize,
        request: &TransferRequest,
    ) -> Result<(), Self::Error>;

    /// Abort any in-flight transfer on `channel`.
    fn abort(&self, channel: usize);

    /// Outstanding element count for `channel`.
    fn remaining(&self, channel: usize) -> usize;
}
