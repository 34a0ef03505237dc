use attiny_hal::port::{Pin, PB3};
use avr_device::attiny85::tc1::tccr1::CS1_A;
use avr_device::attiny85::TC1;
use avr_hal_generic::port::mode::Output;
use embedded_hal::pwm::{ErrorKind, SetDutyCycle};
use frontlight::driver::SetFrequency;
use frontlight::frequency::{CpuFrequencyMhz, HZ_PER_MHZ};

/// Timer1 counts up to OCR1C in pwm mode
const TOP: u8 = u8::MAX;

/// Complementary OCR1B pwm implementation to use on PB3; as side-effect that means PB4 will also
/// become a PWM output *if* set to output mode...
pub struct ComplementaryOCR1BPwm {
    timer: TC1,
    _pin: Pin<Output, PB3>,
}

impl ComplementaryOCR1BPwm {
    pub fn new(timer: TC1, _pin: Pin<Output, PB3>) -> Self {
        // Turn on pwm mode for ocr1b; the clock stays stopped until a
        // frequency is set
        timer.gtccr.modify(|_, w| w.pwm1b().set_bit().com1b().bits(0b01));
        timer.ocr1c.write(|w| w.bits(TOP));
        timer.tccr1.modify(|_, w| w.cs1().variant(CS1_A::STOP));

        Self { timer, _pin }
    }
}

/// Smallest Timer1 prescaler whose carrier does not exceed `pwm_hz`.
///
/// Only powers of two are available and the divider is rounded up, so above
/// `DIRECT` the carrier lands between `pwm_hz / 2` and `pwm_hz` (8 MHz asked
/// for 244 Hz runs at 122 Hz). It never runs faster than asked.
fn prescaler(cpu: CpuFrequencyMhz, pwm_hz: u32) -> Option<CS1_A> {
    if pwm_hz == 0 {
        return None;
    }
    let cpu_hz = cpu as u64 * HZ_PER_MHZ as u64;
    let divider = cpu_hz.div_ceil(pwm_hz as u64 * (TOP as u64 + 1));
    let prescaler = match divider {
        0..=1 => CS1_A::DIRECT,
        2 => CS1_A::PRESCALE_2,
        3..=4 => CS1_A::PRESCALE_4,
        5..=8 => CS1_A::PRESCALE_8,
        9..=16 => CS1_A::PRESCALE_16,
        17..=32 => CS1_A::PRESCALE_32,
        33..=64 => CS1_A::PRESCALE_64,
        65..=128 => CS1_A::PRESCALE_128,
        129..=256 => CS1_A::PRESCALE_256,
        257..=512 => CS1_A::PRESCALE_512,
        513..=1024 => CS1_A::PRESCALE_1024,
        1025..=2048 => CS1_A::PRESCALE_2048,
        2049..=4096 => CS1_A::PRESCALE_4096,
        4097..=8192 => CS1_A::PRESCALE_8192,
        8193..=16384 => CS1_A::PRESCALE_16384,
        _ => return None,
    };
    Some(prescaler)
}

impl SetDutyCycle for ComplementaryOCR1BPwm {
    fn max_duty_cycle(&self) -> u16 {
        TOP as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty > TOP as u16 {
            Err(PwmError::DutyCycleTooLarge)
        } else {
            self.timer.ocr1b.write(|w| w.bits(duty as u8));
            Ok(())
        }
    }
}

impl SetFrequency for ComplementaryOCR1BPwm {
    fn set_frequency(&mut self, cpu: CpuFrequencyMhz, pwm_hz: u32) -> Result<(), Self::Error> {
        let cs = prescaler(cpu, pwm_hz).ok_or(PwmError::FrequencyOutOfRange)?;
        self.timer.tccr1.modify(|_, w| w.cs1().variant(cs));
        Ok(())
    }
}

#[derive(Debug)]
pub enum PwmError {
    DutyCycleTooLarge,
    FrequencyOutOfRange,
}

impl embedded_hal::pwm::Error for PwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl embedded_hal::pwm::ErrorType for ComplementaryOCR1BPwm {
    type Error = PwmError;
}
