/// Errors surfaced by the channel pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError<E: core::fmt::Debug> {
    /// Malformed transfer request or request line.
    InvalidParameter,
    /// The channel is not in a state that permits the operation.
    InvalidState,
    /// No free channel is wired to the requested line.
    NoResource,
    /// The platform engine refused the transfer.
    Engine(E),
}
