/// Lowest reload value that still gives a visible glow.
pub const MIN_DUTY_CYCLE: u16 = 2;
/// Reload value for a fully driven output.
pub const MAX_DUTY_CYCLE: u16 = 65535;
/// Percentages below this produce no discernible emission on the panel.
pub const THRESHOLD_PERCENT: u8 = 50;

/// Translation from a brightness percentage into a duty-cycle reload value.
///
/// The mapper is registered with the PWM channel at init time, the channel
/// uses it for every duty-cycle write afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DutyCycleMapper {
    /// `percent - 50` above the threshold, off below it. Only the top half
    /// of the percentage range reaches the LEDs, and then only the lowest
    /// 50 reload steps; that is how the frontlight hardware is driven.
    #[default]
    Threshold,
    /// Linear two-point interpolation of 1..=100 onto
    /// `2 * MIN_DUTY_CYCLE..=MAX_DUTY_CYCLE`, 0 stays off.
    Interpolated,
}

impl DutyCycleMapper {
    /// Reload value for `percent` (0..=100). Larger inputs are outside the
    /// contract; they do not overflow or panic.
    pub const fn reload_value(self, percent: u8) -> u16 {
        match self {
            Self::Threshold => threshold_reload_value(percent),
            Self::Interpolated => interpolated_reload_value(percent),
        }
    }
}

pub const fn threshold_reload_value(percent: u8) -> u16 {
    if percent < THRESHOLD_PERCENT {
        0
    } else {
        (percent - THRESHOLD_PERCENT) as u16
    }
}

pub const fn interpolated_reload_value(percent: u8) -> u16 {
    if percent == 0 {
        return 0;
    }
    let low = 2 * MIN_DUTY_CYCLE as u32;
    let span = MAX_DUTY_CYCLE as u32 - low;
    let value = low + (percent as u32 - 1) * span / 99;
    if value > MAX_DUTY_CYCLE as u32 {
        MAX_DUTY_CYCLE
    } else {
        value as u16
    }
}
