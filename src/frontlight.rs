//! The frontlight controller.
//!
//! [`Frontlight`] owns the PWM channel from `init` to `deinit` and is the
//! only thing touching it. All operations take `&self` and serialize on a
//! single critical section, so one `static` instance can be shared between
//! the UI and a clock scaling interrupt without a retune landing in the
//! middle of a duty-cycle write.
//!
//! Calls made while no channel is bound are ignored (and logged); hardware
//! errors are handed back to the caller untouched.

use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};
use log::{debug, info, warn};

use crate::config::FrontlightConfig;
use crate::frequency::{pwm_frequency_hz, CpuFrequencyMhz};
use crate::gamma::{self, BrightnessPercentage, Gamma, DEFAULT_GAMMA};
use crate::hal::{PwmChannelHandle, PwmParams, PwmPeripheral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// No channel bound; before `init` or after `deinit`.
    Uninitialized,
    /// Bound, output stopped.
    Off,
    /// Bound, output running.
    On,
}

struct Binding<C> {
    channel: C,
    on: bool,
    cpu_frequency_mhz: CpuFrequencyMhz,
    pwm_frequency_hz: u32,
    // Corrected percentage last written
    percent: Option<u8>,
}

pub struct Frontlight<C> {
    config: FrontlightConfig,
    gamma: Gamma,
    binding: Mutex<RefCell<Option<Binding<C>>>>,
}

impl<C: PwmChannelHandle> Frontlight<C> {
    pub const fn new(config: FrontlightConfig) -> Self {
        Self {
            config,
            gamma: Gamma::new(DEFAULT_GAMMA),
            binding: Mutex::new(RefCell::new(None)),
        }
    }

    /// Create the frontlight channel at the base CPU clock's PWM frequency
    /// and register the duty-cycle mapping. The output stays off.
    ///
    /// Ignored when a channel is already bound.
    pub fn init<P>(&self, peripheral: &mut P) -> Result<(), C::Error>
    where
        P: PwmPeripheral<Channel = C>,
    {
        critical_section::with(|cs| {
            let mut slot = self.binding.borrow_ref_mut(cs);
            if slot.is_some() {
                warn!("frontlight: init while already bound, ignoring");
                return Ok(());
            }

            let cpu = self.config.base_cpu_frequency_mhz;
            let params = PwmParams {
                channel: self.config.channel,
                frequency_hz: pwm_frequency_hz(cpu),
                cpu_frequency_mhz: cpu,
            };
            let mut channel = peripheral.create(self.config.instance, self.config.module, params)?;
            channel.set_duty_cycle_mapping(self.config.mapper);

            info!(
                "frontlight: bound channel {} at {} Hz ({} MHz cpu)",
                params.channel.0, params.frequency_hz, cpu
            );
            *slot = Some(Binding {
                channel,
                on: false,
                cpu_frequency_mhz: cpu,
                pwm_frequency_hz: params.frequency_hz,
                percent: None,
            });
            Ok(())
        })
    }

    /// Stop the output and release the channel, returning it to the caller.
    ///
    /// `Ok(None)` when nothing was bound. If stopping fails the channel stays
    /// bound.
    pub fn deinit(&self) -> Result<Option<C>, C::Error> {
        critical_section::with(|cs| {
            let mut slot = self.binding.borrow_ref_mut(cs);
            let Some(binding) = slot.as_mut() else {
                warn!("frontlight: deinit while not bound, ignoring");
                return Ok(None);
            };
            binding.channel.stop(self.config.channel)?;
            binding.on = false;
            info!("frontlight: released channel {}", self.config.channel.0);
            Ok(slot.take().map(|binding| binding.channel))
        })
    }

    /// Gamma correct `brightness` and write it to the channel. Does not
    /// change whether the output runs.
    pub fn set_brightness(&self, brightness: BrightnessPercentage) -> Result<(), C::Error> {
        self.with_binding("set_brightness", |binding, cs| {
            let percent = gamma::correct(brightness, self.gamma.load(cs), self.config.curve);
            binding.channel.set_duty_cycle(percent, self.config.channel)?;
            debug!("frontlight: brightness {} -> {}%", brightness, percent);
            binding.percent = Some(percent);
            Ok(())
        })
    }

    pub fn turn_on(&self) -> Result<(), C::Error> {
        self.with_binding("turn_on", |binding, _| {
            if binding.on {
                return Ok(());
            }
            binding.channel.start(self.config.channel)?;
            binding.on = true;
            debug!("frontlight: on");
            Ok(())
        })
    }

    /// Stop the output. Safe to repeat.
    pub fn turn_off(&self) -> Result<(), C::Error> {
        self.with_binding("turn_off", |binding, _| {
            binding.channel.stop(self.config.channel)?;
            binding.on = false;
            debug!("frontlight: off");
            Ok(())
        })
    }

    /// Change the gamma exponent used by subsequent [`Self::set_brightness`]
    /// calls. Works in any state, the value survives `deinit`.
    ///
    /// Only finite exponents above zero are taken; otherwise the previous
    /// one stays. Returns the exponent in use.
    pub fn set_gamma_factor(&self, gamma: f32) -> f32 {
        let applied = self.gamma.set(gamma);
        if applied != gamma {
            warn!("frontlight: refusing gamma {}, keeping {}", gamma, applied);
        }
        applied
    }

    pub fn gamma_factor(&self) -> f32 {
        self.gamma.get()
    }

    /// Retune the PWM carrier after the CPU clock changed to `cpu` MHz.
    /// Duty cycle and on/off state are left as they are. A zero clock is
    /// ignored.
    pub fn update_clock_frequency(&self, cpu: CpuFrequencyMhz) -> Result<(), C::Error> {
        if cpu == 0 {
            warn!("frontlight: ignoring 0 MHz clock update");
            return Ok(());
        }
        self.with_binding("update_clock_frequency", |binding, _| {
            let hz = pwm_frequency_hz(cpu);
            binding.channel.update_clock_frequency(cpu, hz)?;
            binding.cpu_frequency_mhz = cpu;
            binding.pwm_frequency_hz = hz;
            debug!("frontlight: retuned to {} Hz ({} MHz cpu)", hz, cpu);
            Ok(())
        })
    }

    pub fn state(&self) -> State {
        self.inspect(|binding| match binding {
            None => State::Uninitialized,
            Some(binding) if binding.on => State::On,
            Some(_) => State::Off,
        })
    }

    /// PWM frequency the channel currently runs at, if bound.
    pub fn pwm_frequency_hz(&self) -> Option<u32> {
        self.inspect(|binding| binding.map(|b| b.pwm_frequency_hz))
    }

    /// CPU clock the current PWM frequency was computed for, if bound.
    pub fn cpu_frequency_mhz(&self) -> Option<CpuFrequencyMhz> {
        self.inspect(|binding| binding.map(|b| b.cpu_frequency_mhz))
    }

    /// Corrected percentage last written to the channel.
    pub fn brightness(&self) -> Option<u8> {
        self.inspect(|binding| binding.and_then(|b| b.percent))
    }

    fn inspect<R>(&self, f: impl FnOnce(Option<&Binding<C>>) -> R) -> R {
        critical_section::with(|cs| f(self.binding.borrow_ref(cs).as_ref()))
    }

    fn with_binding(
        &self,
        op: &str,
        f: impl FnOnce(&mut Binding<C>, CriticalSection<'_>) -> Result<(), C::Error>,
    ) -> Result<(), C::Error> {
        critical_section::with(|cs| match self.binding.borrow_ref_mut(cs).as_mut() {
            Some(binding) => f(binding, cs),
            None => {
                warn!("frontlight: {} before init, ignoring", op);
                Ok(())
            }
        })
    }
}
