use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::channel::DmaChannel;
use crate::engine::DmaEngine;
use crate::error::DmaError;
use crate::transfer::{PeripheralId, TransferCallback, TransferRequest};

/// Highest request line representable in a route mask.
pub const MAX_REQUEST_LINE: u8 = 31;

struct Slot {
    owner: Option<PeripheralId>,
    active: bool,
    circular: bool,
    on_complete: Option<TransferCallback>,
    context: u32,
}

impl Slot {
    const IDLE: Slot = Slot {
        owner: None,
        active: false,
        circular: false,
        on_complete: None,
        context: 0,
    };
}

/// Exclusive allocator for a fixed pool of `CHANNELS` transfer channels.
///
/// `routes[ch]` is the bitmask of peripheral request lines wired to channel
/// `ch`; allocation only hands out channels that can serve the requested
/// line. A channel's owner field is set by [`alloc`](Self::alloc) and
/// cleared on release, both under the same critical section, so ownership
/// stays exclusive even when allocation races an interrupt-context
/// completion.
pub struct DmaManager<E: DmaEngine, const CHANNELS: usize> {
    engine: E,
    routes: [u32; CHANNELS],
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Slot; CHANNELS]>>,
}

impl<E: DmaEngine, const CHANNELS: usize> DmaManager<E, CHANNELS> {
    pub const fn new(engine: E, routes: [u32; CHANNELS]) -> Self {
        Self {
            engine,
            routes,
            slots: Mutex::new(RefCell::new([Slot::IDLE; CHANNELS])),
        }
    }

    pub const fn capacity(&self) -> usize {
        CHANNELS
    }

    /// Claim a free channel wired to `request_line` for `owner`.
    ///
    /// Returns `NoResource` when every compatible channel is owned. The
    /// returned handle is the only way to start transfers on the channel;
    /// dropping it returns the channel to the pool.
    pub fn alloc(
        &self,
        owner: PeripheralId,
        request_line: u8,
    ) -> Result<DmaChannel<'_, E, CHANNELS>, DmaError<E::Error>> {
        if request_line > MAX_REQUEST_LINE {
            return Err(DmaError::InvalidParameter);
        }
        let index = self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            for (index, slot) in slots.iter_mut().enumerate() {
                if slot.owner.is_none()
                    && self.routes[index] & (1 << request_line) != 0
                {
                    slot.owner = Some(owner);
                    return Ok(index);
                }
            }
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "no free channel for line {=u8}, owner {:?}",
                request_line,
                owner
            );
            Err(DmaError::NoResource)
        })?;
        Ok(DmaChannel::new(self, index))
    }

    /// Transfer-complete entry point, called by the platform's DMA
    /// interrupt handler. One-shot transfers go inactive; circular ones
    /// stay armed. The completion callback runs outside the critical
    /// section.
    pub fn on_transfer_complete(&self, channel: usize) {
        if channel >= CHANNELS {
            return;
        }
        let fire = self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let slot = &mut slots[channel];
            if slot.owner.is_none() || !slot.active {
                return None;
            }
            if !slot.circular {
                slot.active = false;
            }
            slot.on_complete.map(|callback| (callback, slot.context))
        });
        if let Some((callback, context)) = fire {
            callback(context);
        }
    }

    /// Number of unowned channels.
    pub fn free_channels(&self) -> usize {
        self.slots.lock(|cell| {
            cell.borrow().iter().filter(|s| s.owner.is_none()).count()
        })
    }

    /// Owner of `channel`, if any.
    pub fn owner_of(&self, channel: usize) -> Option<PeripheralId> {
        if channel >= CHANNELS {
            return None;
        }
        self.slots.lock(|cell| cell.borrow()[channel].owner)
    }

    pub(crate) fn start(
        &self,
        channel: usize,
        request: &TransferRequest,
    ) -> Result<(), DmaError<E::Error>> {
        if request.len == 0 {
            return Err(DmaError::InvalidParameter);
        }
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let slot = &mut slots[channel];
            if slot.active {
                return Err(DmaError::InvalidState);
            }
            self.engine
                .arm(channel, request)
                .map_err(DmaError::Engine)?;
            slot.active = true;
            slot.circular = request.circular;
            slot.on_complete = request.on_complete;
            slot.context = request.context;
            Ok(())
        })
    }

    /// Abort an in-flight transfer, leaving ownership intact. Idempotent.
    pub(crate) fn stop(&self, channel: usize) {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let slot = &mut slots[channel];
            if slot.active {
                self.engine.abort(channel);
                slot.active = false;
            }
        })
    }

    pub(crate) fn remaining(&self, channel: usize) -> usize {
        self.slots.lock(|cell| {
            if cell.borrow()[channel].active {
                self.engine.remaining(channel)
            } else {
                0
            }
        })
    }

    pub(crate) fn is_active(&self, channel: usize) -> bool {
        self.slots.lock(|cell| cell.borrow()[channel].active)
    }

    pub(crate) fn release(&self, channel: usize) {
        self.slots.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let slot = &mut slots[channel];
            if slot.active {
                self.engine.abort(channel);
            }
            *slot = Slot::IDLE;
        })
    }
}
