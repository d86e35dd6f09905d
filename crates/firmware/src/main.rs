//! Vox Humana is [Embassy](https://embassy.dev)-based firmware turning the switch state of a
//! multi-manual electronic organ console into a USB-MIDI event stream. It runs on the
//! [Nucleo-F767ZI development board](https://www.st.com/en/evaluation-tools/nucleo-f767zi.html)
//! and polls MCP23017 I/O expanders (one bit per key, piston, or pedal contact) over a shared
//! I2C bus routed through a TCA9548A multiplexer.
//!
//! All logic with state or timing (debounce, the sostenuto latch, edge detection,
//! expression-pedal hysteresis, bus recovery) lives in `vox_humana_lib`, where it is tested on
//! the host. This crate contributes the hardware collaborators and the synchronous scan loop:
//! re-init expanders, sample the sostenuto pedal, scan the key banks, sample the swell shoes,
//! scan the pistons, run bus recovery, record pedal history; repeat until power-off.
//!
//! For wiring details, see the `README`.

#![no_std]
#![no_main]

mod bus_lines;
mod expanders;
mod layout;
mod midi;

use crate::{
    bus_lines::RecoveryLines,
    expanders::I2C_CLOCK_HZ,
    layout::{KEY_WIRING, OrganConsole, PISTON_WIRING, build_console},
    midi::EventQueue,
};
use defmt::{unwrap, warn};
use embassy_executor::Spawner;
use embassy_stm32::{
    Config, Peri, bind_interrupts,
    adc::{Adc, Resolution},
    gpio::{Flex, Input, Pull},
    i2c::I2c,
    peripherals,
    time::Hertz,
    usb,
};
use embassy_time::Timer;
use embassy_usb::{Builder, UsbDevice, class::midi::MidiClass};
use static_cell::StaticCell;
// Instant comes through the library's re-export: this crate's embassy-time is a different
// major, and the scan APIs take the library's Instant type
use vox_humana_lib::{bus_clear::clear_bus, configuration::Tunables, embassy_time::Instant};

use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(
    #[doc(hidden)]
    struct Irqs {
        OTG_FS => usb::InterruptHandler<peripherals::USB_OTG_FS>;
    }
);

type UsbDriver = usb::Driver<'static, peripherals::USB_OTG_FS>;

/// Idle time at the end of every cycle; keeps the USB device task serviced even when no key
/// moves for a while.
const CYCLE_IDLE_MICROS: u64 = 500;

/// Everything the scan loop owns besides the console state itself.
///
/// The bus peripheral and its pins are kept as raw `Peri`s rather than a constructed driver:
/// each cycle builds a fresh I2C driver from them (the expanders are re-initialized anyway), and
/// after dropping it borrows the same pins back as GPIOs for bus recovery.
struct ScanHardware {
    i2c: Peri<'static, peripherals::I2C1>,
    scl: Peri<'static, peripherals::PB8>,
    sda: Peri<'static, peripherals::PB9>,
    sostenuto: Input<'static>,
    adc: Adc<'static, peripherals::ADC1>,
    main_swell: Peri<'static, peripherals::PA3>,
    solo_swell: Peri<'static, peripherals::PC0>,
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    defmt::info!("Initializing Vox Humana");

    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        // hse: high-speed external clock, 8MHz from the ST-Link MCO on the Nucleo
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Bypass,
        });

        // pll: phase-locked loop dividing the clock for the core and the USB peripheral
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL216,
            divp: Some(PllPDiv::DIV2), // 8mhz / 4 * 216 / 2 = 216Mhz
            // USB OTG FS needs exactly 48MHz, derived from the main PLL's Q output
            divq: Some(PllQDiv::DIV9), // 8mhz / 4 * 216 / 9 = 48Mhz
            divr: None,
        });
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.mux.clk48sel = mux::Clk48sel::PLL1_Q;
    }
    let p = embassy_stm32::init(config);

    // Create the USB driver, from the HAL.
    static ENDPOINT_OUT_BUFFER: StaticCell<[u8; 256]> = StaticCell::new();
    let driver = usb::Driver::new_fs(
        p.USB_OTG_FS,
        Irqs,
        p.PA12,
        p.PA11,
        ENDPOINT_OUT_BUFFER.init([0; 256]),
        embassy_stm32::usb::Config::default(),
    );

    // per https://pid.codes, FOSS projects can apply to be listed under the vendor ID owned by InterBiometrics
    let vendor_id = 0x1209;
    let product_id = 0x0D06;

    let mut config = embassy_usb::Config::new(vendor_id, product_id);
    config.manufacturer = Some("Vox Humana");
    config.product = Some("Organ Console Encoder");
    // the console is bus-powered; the scan electronics have their own supply
    config.max_power = 100;

    // Descriptor and control buffers for the embassy-usb DeviceBuilder.
    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUFFER: StaticCell<[u8; 64]> = StaticCell::new();

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [], // no msos descriptors
        CONTROL_BUFFER.init([0; 64]),
    );

    let class = MidiClass::new(&mut builder, 1, 1, 64);
    let usb = builder.build();
    unwrap!(spawner.spawn(usb_task(usb)));

    let tunables = Tunables::default();
    let console = build_console(&tunables);

    let mut adc = Adc::new(p.ADC1);
    adc.set_resolution(Resolution::BITS12);

    let hardware = ScanHardware {
        i2c: p.I2C1,
        scl: p.PB8,
        sda: p.PB9,
        // the pedal switch shorts the pin to ground when engaged
        sostenuto: Input::new(p.PD2, Pull::Up),
        adc,
        main_swell: p.PA3,
        solo_swell: p.PC0,
    };

    unwrap!(spawner.spawn(scan_loop(class, console, hardware, tunables)));
}

#[embassy_executor::task]
async fn usb_task(mut usb: UsbDevice<'static, UsbDriver>) -> ! {
    usb.run().await
}

/// The console's single scan cycle, repeated forever in a fixed stage order. Only this task
/// mutates console state.
#[embassy_executor::task]
async fn scan_loop(
    mut class: MidiClass<'static, UsbDriver>,
    mut console: OrganConsole,
    mut hw: ScanHardware,
    tunables: Tunables,
) -> ! {
    let mut events = EventQueue::new();

    loop {
        {
            let mut bus = I2c::new_blocking(
                hw.i2c.reborrow(),
                hw.scl.reborrow(),
                hw.sda.reborrow(),
                Hertz(I2C_CLOCK_HZ),
                Default::default(),
            );

            // expanders lose their port configuration if the bus glitched; re-init is cheap
            for wiring in KEY_WIRING.iter().chain(PISTON_WIRING.iter()) {
                if let Err(e) = wiring.init(&mut bus) {
                    warn!("expander init failed: {}", e);
                }
            }

            console.begin_cycle(hw.sostenuto.is_low());
            let pedal = console.sostenuto();
            let now = Instant::now();

            for (bank, wiring) in console.manuals.iter_mut().zip(KEY_WIRING.iter()) {
                match wiring.read(&mut bus) {
                    Ok(reading) => {
                        bank.scan(&reading[..bank.expander_cnt()], now, &pedal, &mut |msg| {
                            let _ = events.push(msg);
                        });
                    }
                    // skip the bank this cycle; its previous state is untouched, so no
                    // spurious transitions can surface once the bus recovers
                    Err(e) => warn!("key bank read failed: {}", e),
                }
                midi::send_all(&mut class, &mut events).await;
            }

            let raw = hw.adc.blocking_read(&mut hw.main_swell);
            if let Some(msg) = console.expression[0].sample(raw, &tunables) {
                let _ = events.push(msg);
            }
            let raw = hw.adc.blocking_read(&mut hw.solo_swell);
            if let Some(msg) = console.expression[1].sample(raw, &tunables) {
                let _ = events.push(msg);
            }
            midi::send_all(&mut class, &mut events).await;

            for (bank, wiring) in console.pistons.iter_mut().zip(PISTON_WIRING.iter()) {
                match wiring.read(&mut bus) {
                    Ok(reading) => {
                        bank.scan(&reading[..bank.expander_cnt()], &mut |msg| {
                            let _ = events.push(msg);
                        });
                    }
                    Err(e) => warn!("piston bank read failed: {}", e),
                }
                midi::send_all(&mut class, &mut events).await;
            }
        }

        // the I2C driver is dropped; borrow the bare pins back and check the bus
        {
            let mut lines =
                RecoveryLines::new(Flex::new(hw.scl.reborrow()), Flex::new(hw.sda.reborrow()));
            if let Err(fault) = clear_bus(&mut lines) {
                warn!("two-wire bus fault, code {}", fault.code());
            }
        }

        console.end_cycle();

        // yield so the USB device task stays serviced even through silent cycles
        Timer::after_micros(CYCLE_IDLE_MICROS).await;
    }
}
