use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};

/// Brightness as seen by the user, 0.0 (dark) to 100.0 (full).
pub type BrightnessPercentage = f32;

pub const DEFAULT_GAMMA: f32 = 2.5;

/// Perceptual correction applied to a brightness before it is mapped to a
/// duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GammaCurve {
    /// Pass the percentage through untouched; the gamma factor is stored
    /// but not applied. This is what the frontlight ships with.
    #[default]
    Identity,
    /// `100 * (brightness / 100) ^ gamma`
    Power,
}

/// Gamma exponent shared between whoever tunes it and the brightness path.
///
/// Lives as long as its owner (normally a `static` controller) and is never
/// reset.
pub struct Gamma {
    factor: Mutex<Cell<f32>>,
}

impl Gamma {
    pub const fn new(factor: f32) -> Self {
        Self {
            factor: Mutex::new(Cell::new(factor)),
        }
    }

    pub fn get(&self) -> f32 {
        critical_section::with(|cs| self.load(cs))
    }

    pub fn load(&self, cs: CriticalSection<'_>) -> f32 {
        self.factor.borrow(cs).get()
    }

    /// Store a new exponent. Anything but a finite value above zero is
    /// refused and the previous value kept. Returns the value now in use.
    pub fn set(&self, factor: f32) -> f32 {
        critical_section::with(|cs| {
            let cell = self.factor.borrow(cs);
            if let Some(factor) = sanitize(factor) {
                cell.set(factor);
            }
            cell.get()
        })
    }
}

impl Default for Gamma {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}

fn sanitize(factor: f32) -> Option<f32> {
    if factor.is_finite() && factor > 0.0 {
        Some(factor)
    } else {
        None
    }
}

/// Clamp to 0..=100, NaN counts as dark.
pub fn clamp_percentage(brightness: BrightnessPercentage) -> BrightnessPercentage {
    if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 100.0)
    }
}

/// Corrected brightness as a whole percentage, truncated.
pub fn correct(brightness: BrightnessPercentage, gamma: f32, curve: GammaCurve) -> u8 {
    let brightness = clamp_percentage(brightness);
    let corrected = match curve {
        GammaCurve::Identity => brightness,
        GammaCurve::Power => 100.0 * libm::powf(brightness / 100.0, gamma),
    };
    clamp_percentage(corrected) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_gamma() {
        // The shipped curve does not apply the exponent at all.
        assert_eq!(correct(50.0, 2.5, GammaCurve::Identity), 50);
        assert_eq!(correct(50.0, 0.5, GammaCurve::Identity), 50);
        assert_eq!(correct(75.9, 2.5, GammaCurve::Identity), 75);
    }

    #[test]
    fn power_curve_applies_gamma() {
        assert_eq!(correct(0.0, 2.5, GammaCurve::Power), 0);
        assert_eq!(correct(50.0, 2.5, GammaCurve::Power), 17);
        assert_eq!(correct(50.0, 1.0, GammaCurve::Power), 50);
        assert_eq!(correct(100.0, 2.5, GammaCurve::Power), 100);
    }

    #[test]
    fn output_stays_in_range() {
        let inputs = [-1000.0, -0.5, 0.0, 12.3, 49.9, 50.0, 99.99, 100.0, 250.0, f32::NAN];
        let gammas = [0.05, 0.5, 1.0, DEFAULT_GAMMA, 12.0];
        for curve in [GammaCurve::Identity, GammaCurve::Power] {
            for &b in &inputs {
                for &g in &gammas {
                    let value = correct(b, g, curve);
                    assert!(value <= 100, "{b} {g} {curve:?} -> {value}");
                }
            }
        }
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(correct(-20.0, 2.5, GammaCurve::Identity), 0);
        assert_eq!(correct(180.0, 2.5, GammaCurve::Identity), 100);
        assert_eq!(correct(f32::NAN, 2.5, GammaCurve::Power), 0);
    }

    #[test]
    fn gamma_cell_keeps_positive_values() {
        let gamma = Gamma::default();
        assert_eq!(gamma.get(), DEFAULT_GAMMA);
        assert_eq!(gamma.set(12.0), 12.0);
        assert_eq!(gamma.set(0.05), 0.05);
        assert_eq!(gamma.set(1.8), 1.8);
    }

    #[test]
    fn gamma_cell_refuses_non_positive_and_non_finite() {
        let gamma = Gamma::new(1.8);
        assert_eq!(gamma.set(0.0), 1.8);
        assert_eq!(gamma.set(-3.0), 1.8);
        assert_eq!(gamma.set(f32::INFINITY), 1.8);
        assert_eq!(gamma.set(f32::NAN), 1.8);
        assert_eq!(gamma.get(), 1.8);
    }
}
