// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone binary wiring the KSZ8851 driver stack to a real STM32H7
//! FMC-mapped chip and its external interrupt line.
//!
//! The host-OS device-service scaffolding this would normally sit
//! behind (task/message dispatch, client open/close bookkeeping,
//! driver load/unload) is out of scope (§1 Non-goals); this binary
//! owns a single `Interface` directly and just runs its worker loop,
//! servicing the chip and draining completions. A real integration
//! would replace `main`'s loop body with whatever IPC layer is
//! fielding `SUPPORTED_COMMANDS` on the host side.

#![no_std]
#![no_main]

use core::cell::{Cell, RefCell};
use core::panic::PanicInfo;

use cortex_m_rt::entry;
use critical_section::Mutex;
use ksz8851_api::{ClientBuffer, RequestId};
use ksz8851_core::bus::RawBus;
use ksz8851_core::chip::ChipContext;
use ksz8851_dispatch::Interface;
use platform_api::{signal, Platform};
use ringbuf::*;
use stm32h7::stm32h743 as device;
use unwrap_lite::UnwrapLite;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Count)]
enum Trace {
    None,
    Booted,
}
counted_ringbuf!(Trace, 8, Trace::None);

/// Base address of the FMC NE1 bank the chip's command/data ports are
/// mapped into (board-specific; matches the Nucleo-H743ZI FMC wiring
/// used by the chip's evaluation carrier).
const CHIP_BASE: usize = 0x6000_0000;

/// Raw bus I/O over the FMC-mapped command/data register pair.
/// `ksz8851-core` only ever touches `Register::Data` (offset 0) and
/// `Register::Command` (offset 2); other offsets never appear here.
struct FmcBus;

impl RawBus for FmcBus {
    fn read16(&self, offset: u16) -> u16 {
        // Safety: `CHIP_BASE + offset` is within the FMC-mapped
        // external memory window configured by `configure_fmc`, which
        // runs once in `main` before any `ChipContext` method is
        // called.
        unsafe { core::ptr::read_volatile((CHIP_BASE + offset as usize) as *const u16) }
    }

    fn write16(&self, offset: u16, value: u16) {
        // Safety: see `read16`.
        unsafe {
            core::ptr::write_volatile((CHIP_BASE + offset as usize) as *mut u16, value);
        }
    }
}

/// The chip's external interrupt line is wired to EXTI0 on this board.
const CHIP_EXTI_LINE: usize = 0;

static PENDING: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

struct McuPlatform;

impl Platform for McuPlatform {
    fn recv_signal(&self, mask: u32) -> u32 {
        loop {
            let fired = critical_section::with(|cs| {
                let cell = PENDING.borrow(cs);
                let fired = cell.get() & mask;
                cell.set(cell.get() & !fired);
                fired
            });
            if fired != 0 {
                return fired;
            }
            cortex_m::asm::wfi();
        }
    }

    fn set_signal(&self, bits: u32) {
        critical_section::with(|cs| {
            let cell = PENDING.borrow(cs);
            cell.set(cell.get() | bits);
        });
    }

    fn sleep_ms(&self, ms: u64) {
        // Approximate: one delay-loop call per millisecond at a
        // nominal 480 MHz core clock, not calibrated against SysTick.
        // Only the soft-reset GRR pulse (single-digit ms) relies on
        // this.
        const CYCLES_PER_MS: u32 = 480_000;
        for _ in 0..ms {
            cortex_m::asm::delay(CYCLES_PER_MS);
        }
    }

    fn enable_chip_interrupt(&self) {
        cortex_m::peripheral::NVIC::unpend(device::Interrupt::EXTI0);
        // Safety: enabling our own chip's EXTI line in the NVIC; this
        // is the only task that ever touches EXTI0 on this board.
        unsafe { cortex_m::peripheral::NVIC::unmask(device::Interrupt::EXTI0) };
    }

    fn disable_chip_interrupt(&self) {
        cortex_m::peripheral::NVIC::mask(device::Interrupt::EXTI0);
    }

    fn with_chip_interrupts_disabled<R>(&self, f: impl FnOnce() -> R) -> R {
        cortex_m::interrupt::free(|_| f())
    }
}

/// Never actually constructed: no client-open bookkeeping is wired up
/// in this standalone binary (see module doc comment), so `Interface`
/// just needs a concrete `ClientHooks` type to be generic over.
enum NoClients {}

impl ksz8851_api::ClientHooks for NoClients {
    fn copy_to_client(&self, _dst: ClientBuffer, _src: &[u8]) -> bool {
        match *self {}
    }
    fn copy_from_client(&self, _dst: &mut [u8], _src: ClientBuffer) -> bool {
        match *self {}
    }
    fn filter(&self, _request: RequestId, _raw_frame: &[u8]) -> bool {
        match *self {}
    }
}

type Driver = Interface<FmcBus, McuPlatform, NoClients, ()>;

/// The one `Interface` this task owns, shared between `main` and the
/// EXTI ISR under the same short critical section the chip lock itself
/// uses (`Platform::with_chip_interrupts_disabled`), so a register pair
/// can never be split between the two contexts.
static DRIVER: Mutex<RefCell<Option<Driver>>> = Mutex::new(RefCell::new(None));

/// Configures the FMC NE1 bank for asynchronous, 16-bit, no-wait-state
/// access to the chip's command/data register pair. Runs once, before
/// any bus traffic, and never again.
///
/// TODO this timing and bank assignment is hard-coded for the
/// Nucleo-H743ZI carrier wired up during bring-up; a board with the
/// chip on a different FMC bank needs its own `configure_fmc`.
fn configure_fmc() {
    let rcc = unsafe { &*device::RCC::ptr() };
    rcc.ahb3enr().modify(|_, w| w.fmcen().set_bit());

    let fmc = unsafe { &*device::FMC::ptr() };
    fmc.bcr1().modify(|_, w| {
        w.mbken()
            .set_bit()
            .mtyp()
            .bits(0) // SRAM/PSRAM-style asynchronous access
            .mwid()
            .bits(0b01) // 16-bit external bus
            .wren()
            .set_bit()
    });
    fmc.btr1().modify(|_, w| {
        // Conservative async timing; tightened once this binary is
        // brought up against real silicon and characterized.
        unsafe { w.addset().bits(2).datast().bits(6).busturn().bits(1) }
    });
}

/// Configures EXTI0 for a falling-edge trigger on the chip's open-drain
/// active-low interrupt output, without unmasking it yet; `online()`
/// (reached via `config_interface`) unmasks it via
/// `Platform::enable_chip_interrupt` once the chip is actually
/// initialized.
fn configure_exti() {
    let syscfg = unsafe { &*device::SYSCFG::ptr() };
    syscfg.exticr1().modify(|_, w| unsafe { w.exti0().bits(0) }); // PA0

    let exti = unsafe { &*device::EXTI::ptr() };
    exti.ftsr1().modify(|_, w| w.tr0().set_bit());
    exti.imr1().modify(|_, w| w.mr0().set_bit());
}

#[entry]
fn main() -> ! {
    configure_fmc();
    configure_exti();

    let chip = ChipContext::new(FmcBus, McuPlatform);
    let mut iface: Driver = Interface::new(chip, ());
    iface.config_interface(None).unwrap_lite();
    ringbuf_entry!(Trace::Booted);

    critical_section::with(|cs| {
        DRIVER.borrow(cs).replace(Some(iface));
    });

    loop {
        let fired = McuPlatform.recv_signal(signal::CHIP_EVENT | signal::SHUTDOWN);
        if fired & signal::SHUTDOWN != 0 {
            critical_section::with(|cs| {
                let mut slot = DRIVER.borrow(cs).borrow_mut();
                if let Some(iface) = slot.as_mut() {
                    let _ = iface.offline();
                }
                if let Some(iface) = slot.take() {
                    iface.expunge();
                }
            });
            loop {
                cortex_m::asm::wfi();
            }
        }
        if fired & signal::CHIP_EVENT != 0 {
            critical_section::with(|cs| {
                let mut slot = DRIVER.borrow(cs).borrow_mut();
                if let Some(iface) = slot.as_mut() {
                    iface.process_interrupt();
                    // A real integration drains completions here and
                    // replies to whatever host IPC channel the
                    // matching request arrived on.
                    while iface.take_completion().is_some() {}
                }
            });
        }
    }
}

/// The chip's EXTI line ISR: acknowledges the EXTI pending bit and
/// runs the driver's own cheap ISR (§4.E), which masks further chip
/// interrupts at the chip and wakes `main`'s worker loop.
#[allow(non_snake_case)]
#[cortex_m_rt::interrupt]
fn EXTI0() {
    let exti = unsafe { &*device::EXTI::ptr() };
    exti.pr1().write(|w| unsafe { w.bits(1 << CHIP_EXTI_LINE) });

    critical_section::with(|cs| {
        if let Some(iface) = DRIVER.borrow(cs).borrow().as_ref() {
            iface.isr();
        }
    });
}

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    cortex_m::interrupt::disable();
    loop {
        cortex_m::asm::nop();
    }
}
