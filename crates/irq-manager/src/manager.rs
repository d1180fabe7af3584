use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::controller::{HwPriority, InterruptController, IrqLine};
use crate::error::IrqError;

/// Position of a callback within its line's dispatch chain. Lower value
/// dispatches first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallbackPriority {
    Highest = 0,
    High = 1,
    Normal = 2,
    Low = 3,
}

/// Interrupt callback; the argument is the `context` value given to
/// [`connect`](IrqManager::connect). Must not block and must not take the
/// manager's critical section.
pub type IrqCallback = fn(context: u32);

/// Token naming one registration. Plain data, freely copyable; a stale
/// token (already disconnected, or its slot reused) is rejected with
/// `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqHandle {
    slot: u8,
    generation: u16,
}

struct Registration {
    line: IrqLine,
    callback: IrqCallback,
    context: u32,
    priority: CallbackPriority,
    /// Registration order, for stable ties within a priority level.
    seq: u16,
}

struct Slot {
    generation: u16,
    registration: Option<Registration>,
}

impl Slot {
    const EMPTY: Slot = Slot { generation: 0, registration: None };
}

struct Table<const SLOTS: usize> {
    slots: [Slot; SLOTS],
    next_seq: u16,
}

/// Priority-ordered interrupt callback chains over a fixed registration
/// table of `SLOTS` entries.
///
/// Registrations on the same line form a chain dispatched in ascending
/// priority value (Highest first), ties in registration order; lines are
/// independent of each other. Masking and hardware priority go straight to
/// the platform [`InterruptController`] and never reorder a chain.
pub struct IrqManager<C: InterruptController, const SLOTS: usize> {
    controller: C,
    table: Mutex<CriticalSectionRawMutex, RefCell<Table<SLOTS>>>,
}

impl<C: InterruptController, const SLOTS: usize> IrqManager<C, SLOTS> {
    pub const fn new(controller: C) -> Self {
        Self {
            controller,
            table: Mutex::new(RefCell::new(Table {
                slots: [Slot::EMPTY; SLOTS],
                next_seq: 0,
            })),
        }
    }

    pub const fn capacity(&self) -> usize {
        SLOTS
    }

    /// Insert a registration into `line`'s chain at the position dictated
    /// by `priority`. Returns `NoResource` when the table is full.
    pub fn connect(
        &self,
        line: IrqLine,
        callback: IrqCallback,
        context: u32,
        priority: CallbackPriority,
    ) -> Result<IrqHandle, IrqError> {
        self.table.lock(|cell| {
            let mut table = cell.borrow_mut();
            let Some(index) =
                table.slots.iter().position(|s| s.registration.is_none())
            else {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "registration table full, line {=u16}",
                    line.0
                );
                return Err(IrqError::NoResource);
            };
            let seq = table.next_seq;
            table.next_seq = table.next_seq.wrapping_add(1);
            let slot = &mut table.slots[index];
            slot.registration = Some(Registration {
                line,
                callback,
                context,
                priority,
                seq,
            });
            Ok(IrqHandle {
                slot: index as u8,
                generation: slot.generation,
            })
        })
    }

    /// Remove the registration named by `handle`. Fails `NotFound` for
    /// stale or unknown handles.
    pub fn disconnect(&self, handle: IrqHandle) -> Result<(), IrqError> {
        self.table.lock(|cell| {
            let mut table = cell.borrow_mut();
            let slot = table
                .slots
                .get_mut(handle.slot as usize)
                .ok_or(IrqError::NotFound)?;
            if slot.generation != handle.generation
                || slot.registration.is_none()
            {
                return Err(IrqError::NotFound);
            }
            slot.registration = None;
            slot.generation = slot.generation.wrapping_add(1);
            Ok(())
        })
    }

    /// Walk `line`'s chain in priority order, invoking every callback with
    /// its registered context.
    ///
    /// This is the platform interrupt entry point. The chain is snapshotted
    /// under the critical section and the callbacks run outside it, so a
    /// callback may connect or disconnect registrations (taking effect from
    /// the next dispatch) but must never block.
    pub fn dispatch(&self, line: IrqLine) {
        let mut chain: Vec<(u8, u16, IrqCallback, u32), SLOTS> = Vec::new();
        self.table.lock(|cell| {
            let table = cell.borrow();
            for slot in table.slots.iter() {
                if let Some(r) = &slot.registration {
                    if r.line == line {
                        // Capacity equals the table size, cannot overflow.
                        let _ = chain.push((
                            r.priority as u8,
                            r.seq,
                            r.callback,
                            r.context,
                        ));
                    }
                }
            }
        });
        chain
            .as_mut_slice()
            .sort_unstable_by_key(|&(priority, seq, _, _)| (priority, seq));
        for &(_, _, callback, context) in chain.iter() {
            callback(context);
        }
    }

    /// Unmask `line` at the controller.
    pub fn enable(&self, line: IrqLine) {
        self.controller.enable(line);
    }

    /// Mask `line` at the controller.
    pub fn disable(&self, line: IrqLine) {
        self.controller.disable(line);
    }

    /// Configure the controller's hardware priority for `line`.
    /// Independent of callback chain ordering.
    pub fn set_hw_priority(&self, line: IrqLine, priority: HwPriority) {
        self.controller.set_priority(line, priority);
    }

    /// Number of live registrations on `line`.
    pub fn registered(&self, line: IrqLine) -> usize {
        self.table.lock(|cell| {
            cell.borrow()
                .slots
                .iter()
                .filter(|s| {
                    s.registration.as_ref().is_some_and(|r| r.line == line)
                })
                .count()
        })
    }
}
