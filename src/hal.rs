//! The PWM abstraction the frontlight is driven through.
//!
//! A [`PwmPeripheral`] hands out a channel handle once; the handle then
//! carries all register traffic. Channel errors are `embedded_hal` PWM
//! errors so any HAL error type slots in.

use embedded_hal::pwm::ErrorType;

use crate::duty_cycle::DutyCycleMapper;
use crate::frequency::CpuFrequencyMhz;

/// PWM controller instance on the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmInstance(pub u8);

/// Submodule of a PWM instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmModule(pub u8);

/// Output channel of a PWM submodule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmChannel(pub u8);

/// Parameters a channel is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmParams {
    pub channel: PwmChannel,
    pub frequency_hz: u32,
    /// CPU clock the frequency was computed for.
    pub cpu_frequency_mhz: CpuFrequencyMhz,
}

pub trait PwmPeripheral {
    type Channel: PwmChannelHandle;

    /// Configure `params.channel` of the given instance/module and hand out
    /// its handle. The channel is left stopped.
    fn create(
        &mut self,
        instance: PwmInstance,
        module: PwmModule,
        params: PwmParams,
    ) -> Result<Self::Channel, <Self::Channel as ErrorType>::Error>;
}

/// A configured PWM channel.
pub trait PwmChannelHandle: ErrorType {
    /// Register the translation used by [`Self::set_duty_cycle`].
    fn set_duty_cycle_mapping(&mut self, mapper: DutyCycleMapper);

    /// Set the duty cycle from a 0..=100 percentage, translated through the
    /// registered mapping. Does not start a stopped channel.
    fn set_duty_cycle(&mut self, percent: u8, channel: PwmChannel) -> Result<(), Self::Error>;

    fn start(&mut self, channel: PwmChannel) -> Result<(), Self::Error>;

    fn stop(&mut self, channel: PwmChannel) -> Result<(), Self::Error>;

    /// Retune after the CPU clock changed. Duty cycle and run state are
    /// preserved.
    fn update_clock_frequency(
        &mut self,
        cpu: CpuFrequencyMhz,
        pwm_frequency_hz: u32,
    ) -> Result<(), Self::Error>;
}
