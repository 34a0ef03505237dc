use crate::duty_cycle::{MAX_DUTY_CYCLE, MIN_DUTY_CYCLE};

/// CPU core clock in MHz, as reported on clock scaling events.
pub type CpuFrequencyMhz = u32;

pub const HZ_PER_MHZ: u32 = 1_000_000;

/// PWM carrier frequency for a CPU clock.
///
/// The carrier is kept at a fixed `MIN_DUTY_CYCLE / MAX_DUTY_CYCLE` fraction
/// of the CPU clock so the PWM period stays on the same timer tick grid
/// whatever the clock is scaled to. Truncates, saturates at `u32::MAX`.
pub const fn pwm_frequency_hz(cpu: CpuFrequencyMhz) -> u32 {
    let cpu_hz = cpu as u64 * HZ_PER_MHZ as u64;
    let hz = cpu_hz * MIN_DUTY_CYCLE as u64 / MAX_DUTY_CYCLE as u64;
    if hz > u32::MAX as u64 {
        u32::MAX
    } else {
        hz as u32
    }
}
