//! Frontlight brightness control for e-ink panels.
//!
//! A thin driver on top of a PWM channel: brightness percentages are gamma
//! corrected, translated into duty-cycle reload values and written to the
//! channel, while the PWM carrier frequency follows the CPU clock as it is
//! scaled.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod driver;
pub mod duty_cycle;
pub mod frequency;
pub mod frontlight;
pub mod gamma;
pub mod hal;

pub use config::FrontlightConfig;
pub use duty_cycle::DutyCycleMapper;
pub use frequency::CpuFrequencyMhz;
pub use frontlight::{Frontlight, State};
pub use gamma::{BrightnessPercentage, GammaCurve};
