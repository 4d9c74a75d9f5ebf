#![no_main]
#![no_std]

use cortex_m_rt::{entry, exception};
use defmt_rtt as _;
use log::{error, info, warn, LevelFilter};
use panic_halt as _;

use sense::board::{Led, Leds};
use sense::sync::MsgQueue;
use sense::task::{Cadence, EventFlags, Message, Task};
use sense::tsi::{Tsi, UserConfig};
use sense::DEFAULT_TASK_CONFIG;

use crate::adc::{KlBoard, Thermometer};
use crate::gpio::{PORTB, PORTD};
use crate::lptmr::Lptmr;
use crate::pit::TickTimer;
use crate::reg::{sim, Irq};
use crate::tsi_hw::KlTsi;

mod adc;
mod gpio;
mod logger;
mod lptmr;
mod pit;
mod reg;
mod tsi_hw;

/// Bus clock out of reset (FEI mode)
const BUS_CLOCK_HZ: u32 = 10_485_760;
const TICK_US: u32 = 1000;
const QUEUE_LEN: usize = 8;

/// Electrodes of the slider, on PTB16 and PTB17
const ELECTRODES: [u8; 2] = [9, 10];
const ELECTRODE_PINS: [u8; 2] = [16, 17];

const LED_GREEN: u8 = 19; // PTB
const LED_RED: u8 = 18; // PTB
const LED_BLUE: u8 = 1; // PTD
const SW1: u8 = 0; // PTD

/// Flash configuration field: no backdoor key, no protection, unsecured
#[link_section = ".flash_config"]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // backdoor key
    0xFF, 0xFF, 0xFF, 0xFF, // FPROT
    0xFE, // FSEC
    0xFF, // FOPT
    0xFF, 0xFF,
];

static TSI: Tsi<KlTsi, Lptmr> = Tsi::new();
static EVENTS: EventFlags = EventFlags::new();
static QUEUE: MsgQueue<QUEUE_LEN> = MsgQueue::new();
static CADENCE: Cadence = Cadence::new(
    DEFAULT_TASK_CONFIG.temp_period,
    DEFAULT_TASK_CONFIG.blink_period,
);

fn on_tick() {
    CADENCE.tick_into(&EVENTS);
}

fn on_button() {
    let flags = PORTD.take_interrupt_flags();
    if flags & (1 << SW1) != 0 && Message::KeyPressed.post(&QUEUE).is_err() {
        warn!("message queue full, key press dropped");
    }
}

#[entry]
fn main() -> ! {
    sim::disable_watchdog();
    logger::init(LevelFilter::Debug);
    info!("kl25-sense starting");

    let clock = Lptmr::start();

    PORTB.enable_clock();
    PORTD.enable_clock();
    for pin in ELECTRODE_PINS {
        PORTB.analog(pin);
    }
    let leds = Leds {
        heartbeat: Led::new(PORTB.output(LED_GREEN, true), true),
        alarm: Led::new(PORTB.output(LED_RED, true), true),
        touch: Led::new(PORTD.output(LED_BLUE, true), true),
    };
    PORTD.button(SW1);
    Irq::PortD.unmask();

    if let Err(e) = TSI.init(KlTsi::new(), clock, &UserConfig::default()) {
        defmt::panic!("tsi init failed: {}", e);
    }

    let board = KlBoard::new(Thermometer::new(), clock);
    let mut task = Task::new(&TSI, &EVENTS, &QUEUE, leds, board, None);
    if let Err(e) = task.init(&ELECTRODES) {
        error!("touch baseline failed: {:?}", e);
    }

    let mut tick = TickTimer::new(BUS_CLOCK_HZ, TICK_US);
    tick.set_callback(Some(on_tick));
    tick.start();

    task.run()
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    match Irq::from_number(irqn) {
        Some(Irq::Pit) => pit::on_interrupt(),
        Some(Irq::Tsi0) => TSI.on_interrupt(),
        Some(Irq::PortD) => on_button(),
        _ => {}
    }
}
