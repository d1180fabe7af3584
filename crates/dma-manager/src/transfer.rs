/// Identity of the peripheral that owns a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralId(pub u16);

/// Direction of a transfer through a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    PeriphToMem,
    MemToPeriph,
    MemToMem,
}

/// Bus width of one transferred element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    Bits8,
    Bits16,
    Bits32,
}

/// Arbitration priority of a channel's transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPriority {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Completion hook, fired from the platform's transfer-complete interrupt
/// via [`DmaManager::on_transfer_complete`]. The argument is the `context`
/// value from the request.
///
/// [`DmaManager::on_transfer_complete`]: crate::DmaManager::on_transfer_complete
pub type TransferCallback = fn(context: u32);

/// Everything needed to program one transfer.
///
/// Addresses are plain `usize`s; the pool never dereferences them, the
/// platform engine does.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest {
    pub src: usize,
    pub dst: usize,
    /// Element count, in units of the source width. Must be nonzero.
    pub len: usize,
    pub direction: Direction,
    pub src_width: Width,
    pub dst_width: Width,
    pub src_increment: bool,
    pub dst_increment: bool,
    /// Restart automatically on completion; the channel stays active.
    pub circular: bool,
    pub priority: ChannelPriority,
    pub on_complete: Option<TransferCallback>,
    pub context: u32,
}

impl TransferRequest {
    /// Write of `len` elements from memory at `src` to the peripheral
    /// register at `dst`.
    pub fn mem_to_periph(src: usize, dst: usize, len: usize) -> Self {
        Self {
            src,
            dst,
            len,
            direction: Direction::MemToPeriph,
            src_width: Width::Bits8,
            dst_width: Width::Bits8,
            src_increment: true,
            dst_increment: false,
            circular: false,
            priority: ChannelPriority::Medium,
            on_complete: None,
            context: 0,
        }
    }

    /// Read of `len` elements from the peripheral register at `src` into
    /// memory at `dst`.
    pub fn periph_to_mem(src: usize, dst: usize, len: usize) -> Self {
        Self {
            src,
            dst,
            len,
            direction: Direction::PeriphToMem,
            src_width: Width::Bits8,
            dst_width: Width::Bits8,
            src_increment: false,
            dst_increment: true,
            circular: false,
            priority: ChannelPriority::Medium,
            on_complete: None,
            context: 0,
        }
    }

    /// Memory-to-memory copy of `len` elements.
    pub fn mem_to_mem(src: usize, dst: usize, len: usize) -> Self {
        Self {
            src,
            dst,
            len,
            direction: Direction::MemToMem,
            src_width: Width::Bits8,
            dst_width: Width::Bits8,
            src_increment: true,
            dst_increment: true,
            circular: false,
            priority: ChannelPriority::Medium,
            on_complete: None,
            context: 0,
        }
    }
}
