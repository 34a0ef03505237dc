//! Frontlight channel on top of a plain `embedded_hal` PWM output.
//!
//! `embedded_hal` has no notion of starting, stopping or retuning a PWM
//! output, so [`SimplePwm`] keeps that state itself: a stopped channel holds
//! the output fully off and remembers the reload value to apply on start.

use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};

use crate::duty_cycle::DutyCycleMapper;
use crate::frequency::CpuFrequencyMhz;
use crate::hal::{PwmChannel, PwmChannelHandle, PwmInstance, PwmModule, PwmParams, PwmPeripheral};

/// Outputs whose carrier frequency can be changed at runtime.
pub trait SetFrequency: ErrorType {
    /// Run at `pwm_frequency_hz` given the CPU now clocks at `cpu` MHz.
    fn set_frequency(&mut self, cpu: CpuFrequencyMhz, pwm_frequency_hz: u32)
        -> Result<(), Self::Error>;
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError<E> {
    /// Reload value above what the output can represent.
    DutyCycleTooLarge,
    /// Channel, instance or module that this driver does not own.
    Unavailable,
    Hardware(E),
}

impl<E: embedded_hal::pwm::Error> embedded_hal::pwm::Error for PwmError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Hardware(e) => e.kind(),
            _ => ErrorKind::Other,
        }
    }
}

pub struct SimplePwm<P> {
    pwm: P,
    channel: PwmChannel,
    mapper: DutyCycleMapper,
    reload: u16,
    running: bool,
}

impl<P> SimplePwm<P>
where
    P: SetDutyCycle + SetFrequency,
{
    /// Wrap `pwm` as `channel`. The output is forced off.
    pub fn new(mut pwm: P, channel: PwmChannel) -> Result<Self, PwmError<P::Error>> {
        pwm.set_duty_cycle_fully_off().map_err(PwmError::Hardware)?;
        Ok(Self::stopped(pwm, channel))
    }

    // `pwm` must already be fully off
    fn stopped(pwm: P, channel: PwmChannel) -> Self {
        Self {
            pwm,
            channel,
            mapper: DutyCycleMapper::default(),
            reload: 0,
            running: false,
        }
    }

    /// Reload value applied while running.
    pub fn reload_value(&self) -> u16 {
        self.reload
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Give the output back.
    pub fn free(self) -> P {
        self.pwm
    }

    fn check(&self, channel: PwmChannel) -> Result<(), PwmError<P::Error>> {
        if channel == self.channel {
            Ok(())
        } else {
            Err(PwmError::Unavailable)
        }
    }
}

impl<P> ErrorType for SimplePwm<P>
where
    P: ErrorType,
{
    type Error = PwmError<P::Error>;
}

impl<P> PwmChannelHandle for SimplePwm<P>
where
    P: SetDutyCycle + SetFrequency,
{
    fn set_duty_cycle_mapping(&mut self, mapper: DutyCycleMapper) {
        self.mapper = mapper;
    }

    fn set_duty_cycle(&mut self, percent: u8, channel: PwmChannel) -> Result<(), Self::Error> {
        self.check(channel)?;
        let reload = self.mapper.reload_value(percent);
        if reload > self.pwm.max_duty_cycle() {
            return Err(PwmError::DutyCycleTooLarge);
        }
        if self.running {
            self.pwm.set_duty_cycle(reload).map_err(PwmError::Hardware)?;
        }
        self.reload = reload;
        Ok(())
    }

    fn start(&mut self, channel: PwmChannel) -> Result<(), Self::Error> {
        self.check(channel)?;
        self.pwm
            .set_duty_cycle(self.reload)
            .map_err(PwmError::Hardware)?;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self, channel: PwmChannel) -> Result<(), Self::Error> {
        self.check(channel)?;
        self.pwm
            .set_duty_cycle_fully_off()
            .map_err(PwmError::Hardware)?;
        self.running = false;
        Ok(())
    }

    fn update_clock_frequency(
        &mut self,
        cpu: CpuFrequencyMhz,
        pwm_frequency_hz: u32,
    ) -> Result<(), Self::Error> {
        self.pwm
            .set_frequency(cpu, pwm_frequency_hz)
            .map_err(PwmError::Hardware)?;
        // Some timers reset their compare register when the prescaler changes
        if self.running {
            self.pwm
                .set_duty_cycle(self.reload)
                .map_err(PwmError::Hardware)?;
        }
        Ok(())
    }
}

/// Hands out a single output as the frontlight channel.
pub struct SimplePeripheral<P> {
    pwm: Option<P>,
    instance: PwmInstance,
    module: PwmModule,
}

impl<P> SimplePeripheral<P> {
    pub const fn new(pwm: P, instance: PwmInstance, module: PwmModule) -> Self {
        Self {
            pwm: Some(pwm),
            instance,
            module,
        }
    }
}

impl<P> PwmPeripheral for SimplePeripheral<P>
where
    P: SetDutyCycle + SetFrequency,
{
    type Channel = SimplePwm<P>;

    fn create(
        &mut self,
        instance: PwmInstance,
        module: PwmModule,
        params: PwmParams,
    ) -> Result<SimplePwm<P>, PwmError<P::Error>> {
        if instance != self.instance || module != self.module {
            return Err(PwmError::Unavailable);
        }
        // Only hand the output over once it is set up, so a failed attempt
        // can be retried
        let pwm = self.pwm.as_mut().ok_or(PwmError::Unavailable)?;
        pwm.set_frequency(params.cpu_frequency_mhz, params.frequency_hz)
            .map_err(PwmError::Hardware)?;
        pwm.set_duty_cycle_fully_off().map_err(PwmError::Hardware)?;
        let pwm = self.pwm.take().ok_or(PwmError::Unavailable)?;
        Ok(SimplePwm::stopped(pwm, params.channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::pwm_frequency_hz;

    #[derive(Debug)]
    struct Broken;

    impl embedded_hal::pwm::Error for Broken {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[derive(Default)]
    struct Output {
        duty: u16,
        frequency: Option<(CpuFrequencyMhz, u32)>,
        // Number of upcoming `set_frequency` calls that fail
        failing_retunes: usize,
    }

    impl ErrorType for Output {
        type Error = Broken;
    }

    impl SetDutyCycle for Output {
        fn max_duty_cycle(&self) -> u16 {
            u8::MAX as u16
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Broken> {
            self.duty = duty;
            Ok(())
        }
    }

    impl SetFrequency for Output {
        fn set_frequency(&mut self, cpu: CpuFrequencyMhz, hz: u32) -> Result<(), Broken> {
            if self.failing_retunes > 0 {
                self.failing_retunes -= 1;
                return Err(Broken);
            }
            self.frequency = Some((cpu, hz));
            // Retuning clears the compare value on this timer
            self.duty = 0;
            Ok(())
        }
    }

    const CHANNEL: PwmChannel = PwmChannel(1);

    fn create() -> SimplePwm<Output> {
        let mut peripheral = SimplePeripheral::new(Output::default(), PwmInstance(1), PwmModule(0));
        peripheral
            .create(
                PwmInstance(1),
                PwmModule(0),
                PwmParams {
                    channel: CHANNEL,
                    frequency_hz: pwm_frequency_hz(528),
                    cpu_frequency_mhz: 528,
                },
            )
            .unwrap()
    }

    #[test]
    fn create_tunes_and_stays_off() {
        let pwm = create();
        assert!(!pwm.is_running());
        let output = pwm.free();
        assert_eq!(output.frequency, Some((528, 16113)));
        assert_eq!(output.duty, 0);
    }

    #[test]
    fn create_hands_out_once() {
        let mut peripheral = SimplePeripheral::new(Output::default(), PwmInstance(1), PwmModule(0));
        let params = PwmParams {
            channel: CHANNEL,
            frequency_hz: 1000,
            cpu_frequency_mhz: 66,
        };
        assert!(matches!(
            peripheral.create(PwmInstance(2), PwmModule(0), params),
            Err(PwmError::Unavailable)
        ));
        assert!(peripheral.create(PwmInstance(1), PwmModule(0), params).is_ok());
        assert!(matches!(
            peripheral.create(PwmInstance(1), PwmModule(0), params),
            Err(PwmError::Unavailable)
        ));
    }

    #[test]
    fn create_can_be_retried_after_hardware_failure() {
        let output = Output {
            failing_retunes: 1,
            ..Default::default()
        };
        let mut peripheral = SimplePeripheral::new(output, PwmInstance(1), PwmModule(0));
        let params = PwmParams {
            channel: CHANNEL,
            frequency_hz: pwm_frequency_hz(528),
            cpu_frequency_mhz: 528,
        };
        assert!(matches!(
            peripheral.create(PwmInstance(1), PwmModule(0), params),
            Err(PwmError::Hardware(Broken))
        ));
        let pwm = peripheral
            .create(PwmInstance(1), PwmModule(0), params)
            .unwrap();
        assert!(!pwm.is_running());
        assert_eq!(pwm.free().frequency, Some((528, 16113)));
    }

    #[test]
    fn duty_only_reaches_output_while_running() {
        let mut pwm = create();
        pwm.set_duty_cycle(80, CHANNEL).unwrap();
        assert_eq!(pwm.reload_value(), 30);
        pwm.start(CHANNEL).unwrap();
        pwm.set_duty_cycle(90, CHANNEL).unwrap();
        pwm.stop(CHANNEL).unwrap();
        pwm.set_duty_cycle(100, CHANNEL).unwrap();
        assert_eq!(pwm.reload_value(), 50);
        assert!(!pwm.is_running());
        assert_eq!(pwm.free().duty, 0);
    }

    #[test]
    fn start_applies_stored_reload() {
        let mut pwm = create();
        pwm.set_duty_cycle(75, CHANNEL).unwrap();
        pwm.start(CHANNEL).unwrap();
        assert_eq!(pwm.free().duty, 25);
    }

    #[test]
    fn retune_restores_duty_when_running() {
        let mut pwm = create();
        pwm.set_duty_cycle(60, CHANNEL).unwrap();
        pwm.start(CHANNEL).unwrap();
        pwm.update_clock_frequency(132, pwm_frequency_hz(132)).unwrap();
        assert!(pwm.is_running());
        let output = pwm.free();
        assert_eq!(output.frequency, Some((132, pwm_frequency_hz(132))));
        assert_eq!(output.duty, 10);
    }

    #[test]
    fn reload_above_output_range_is_refused() {
        let mut pwm = create();
        pwm.set_duty_cycle_mapping(DutyCycleMapper::Interpolated);
        pwm.set_duty_cycle(1, CHANNEL).unwrap();
        assert!(matches!(
            pwm.set_duty_cycle(50, CHANNEL),
            Err(PwmError::DutyCycleTooLarge)
        ));
        assert_eq!(pwm.reload_value(), 4);
    }

    #[test]
    fn foreign_channel_is_refused() {
        let mut pwm = create();
        assert!(matches!(
            pwm.start(PwmChannel(3)),
            Err(PwmError::Unavailable)
        ));
        assert!(!pwm.is_running());
    }
}
