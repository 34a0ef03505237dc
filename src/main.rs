#![no_std]
#![no_main]

use attiny_hal::clock::MHz8;
use attiny_hal::delay::Delay;
use avr_device::attiny85::CPU;
use embedded_hal::delay::DelayNs;
use frontlight::config::board;
use frontlight::driver::{SimplePeripheral, SimplePwm};
use frontlight::{Frontlight, FrontlightConfig};
use panic_halt as _;

mod pwm;

use pwm::ComplementaryOCR1BPwm;

// Boots at 1Mhz with the CKDIV8 fuse set, main bumps that to the full 8Mhz
const BOOT_CPU_MHZ: u32 = 1;
const CPU_MHZ: u32 = 8;

static FRONTLIGHT: Frontlight<SimplePwm<ComplementaryOCR1BPwm>> =
    Frontlight::new(FrontlightConfig::new().with_base_cpu_frequency(BOOT_CPU_MHZ));

/// Change the system clock prescaler; `log2` of the divider.
fn scale_clock(cpu: &CPU, log2: u8) {
    avr_device::interrupt::free(|_| {
        // CLKPCE first, then the new value within four cycles
        cpu.clkpr.write(|w| unsafe { w.bits(0x80) });
        cpu.clkpr.write(|w| unsafe { w.bits(log2 & 0x0f) });
    })
}

#[attiny_hal::entry]
fn main() -> ! {
    let dp = attiny_hal::Peripherals::take().unwrap();
    let pins = attiny_hal::pins!(dp);

    let pwm = ComplementaryOCR1BPwm::new(dp.TC1, pins.pb3.into_output());
    let mut peripheral = SimplePeripheral::new(pwm, board::PWM_INSTANCE, board::PWM_MODULE);
    FRONTLIGHT.init(&mut peripheral).unwrap();

    scale_clock(&dp.CPU, 0);
    FRONTLIGHT.update_clock_frequency(CPU_MHZ).unwrap();

    let mut delay = Delay::<MHz8>::new();
    FRONTLIGHT.set_brightness(0.0).unwrap();
    FRONTLIGHT.turn_on().unwrap();

    loop {
        // Fade through the usable range and back, then rest dark
        for percent in (50..=100).chain((50..=100).rev()) {
            FRONTLIGHT.set_brightness(percent as f32).unwrap();
            delay.delay_ms(40);
        }
        FRONTLIGHT.turn_off().unwrap();
        delay.delay_ms(2000);
        FRONTLIGHT.turn_on().unwrap();
    }
}
