use crate::duty_cycle::DutyCycleMapper;
use crate::frequency::CpuFrequencyMhz;
use crate::gamma::GammaCurve;
use crate::hal::{PwmChannel, PwmInstance, PwmModule};

/// Where the frontlight is wired on the board.
pub mod board {
    use super::*;

    pub const PWM_INSTANCE: PwmInstance = PwmInstance(1);
    pub const PWM_MODULE: PwmModule = PwmModule(0);
    pub const PWM_CHANNEL: PwmChannel = PwmChannel(1);
    /// Clock the core boots at, before any scaling.
    pub const BASE_CPU_FREQUENCY_MHZ: CpuFrequencyMhz = 528;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrontlightConfig {
    pub instance: PwmInstance,
    pub module: PwmModule,
    pub channel: PwmChannel,
    /// CPU clock the PWM frequency is computed from at init.
    pub base_cpu_frequency_mhz: CpuFrequencyMhz,
    pub mapper: DutyCycleMapper,
    pub curve: GammaCurve,
}

impl FrontlightConfig {
    /// Board wiring with the shipped mapping and curve.
    pub const fn new() -> Self {
        Self {
            instance: board::PWM_INSTANCE,
            module: board::PWM_MODULE,
            channel: board::PWM_CHANNEL,
            base_cpu_frequency_mhz: board::BASE_CPU_FREQUENCY_MHZ,
            mapper: DutyCycleMapper::Threshold,
            curve: GammaCurve::Identity,
        }
    }

    pub const fn with_channel(
        mut self,
        instance: PwmInstance,
        module: PwmModule,
        channel: PwmChannel,
    ) -> Self {
        self.instance = instance;
        self.module = module;
        self.channel = channel;
        self
    }

    pub const fn with_base_cpu_frequency(mut self, mhz: CpuFrequencyMhz) -> Self {
        self.base_cpu_frequency_mhz = mhz;
        self
    }

    pub const fn with_mapper(mut self, mapper: DutyCycleMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub const fn with_curve(mut self, curve: GammaCurve) -> Self {
        self.curve = curve;
        self
    }
}

impl Default for FrontlightConfig {
    fn default() -> Self {
        Self::new()
    }
}
