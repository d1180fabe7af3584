/// Errors surfaced by the registration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// Malformed argument.
    InvalidParameter,
    /// The handle does not name a live registration.
    NotFound,
    /// The registration table is full.
    NoResource,
}
