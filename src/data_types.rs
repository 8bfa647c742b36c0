use crate::registers::{
    ADC_CONTROL_ADC_AVG, ADC_CONTROL_ADC_AVG_INIT, ADC_CONTROL_ADC_EN, ADC_CONTROL_ADC_RATE,
    ADC_CONTROL_ADC_SAMPLE, ADC_CONTROL_ADC_SAMPLE_SHIFT, TIMER_CONTROL_WATCHDOG,
    TIMER_CONTROL_WATCHDOG_SHIFT,
};
use crate::units::Time;
use uom::si::time::second;

/// Watchdog timer setting in TIMER_CONTROL bits 5:4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatchdogTimeout {
    Disabled = 0b00,
    Seconds40 = 0b01,
    Seconds80 = 0b10,
    Seconds160 = 0b11,
}

impl WatchdogTimeout {
    /// Picks the shortest setting that is at least `timeout`.
    ///
    /// Zero (or a negative duration) disables the watchdog; anything above
    /// 80 s selects the 160 s setting.
    pub fn from_time(timeout: Time) -> Self {
        let seconds = timeout.get::<second>();
        if seconds <= 0.0 || seconds.is_nan() {
            WatchdogTimeout::Disabled
        } else if seconds <= 40.0 {
            WatchdogTimeout::Seconds40
        } else if seconds <= 80.0 {
            WatchdogTimeout::Seconds80
        } else {
            WatchdogTimeout::Seconds160
        }
    }

    /// TIMER_CONTROL value with only the watchdog field set.
    pub fn register_value(self) -> u8 {
        (self as u8) << TIMER_CONTROL_WATCHDOG_SHIFT
    }

    pub fn from_register(value: u8) -> Self {
        match (value & TIMER_CONTROL_WATCHDOG) >> TIMER_CONTROL_WATCHDOG_SHIFT {
            0b00 => WatchdogTimeout::Disabled,
            0b01 => WatchdogTimeout::Seconds40,
            0b10 => WatchdogTimeout::Seconds80,
            _ => WatchdogTimeout::Seconds160,
        }
    }

    /// Nominal timeout, `None` when disabled.
    pub fn duration(self) -> Option<Time> {
        match self {
            WatchdogTimeout::Disabled => None,
            WatchdogTimeout::Seconds40 => Some(Time::new::<second>(40.0)),
            WatchdogTimeout::Seconds80 => Some(Time::new::<second>(80.0)),
            WatchdogTimeout::Seconds160 => Some(Time::new::<second>(160.0)),
        }
    }
}

/// ADC sample resolution, ADC_CONTROL bits 5:4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcResolution {
    Bits15 = 0b00,
    Bits14 = 0b01,
    Bits13 = 0b10,
}

impl AdcResolution {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            15 => Some(AdcResolution::Bits15),
            14 => Some(AdcResolution::Bits14),
            13 => Some(AdcResolution::Bits13),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            AdcResolution::Bits15 => 15,
            AdcResolution::Bits14 => 14,
            AdcResolution::Bits13 => 13,
        }
    }
}

/// ADC configuration written to ADC_CONTROL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Enable the ADC.
    pub enable: bool,
    /// Continuous conversion. When false the ADC performs a one-shot conversion.
    pub continuous: bool,
    /// Effective resolution in bits; must be 15, 14 or 13.
    pub resolution_bits: u8,
    /// Enable the running average.
    pub average: bool,
    /// Start the running average from a fresh conversion.
    pub average_init: bool,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            enable: true,
            continuous: true,
            resolution_bits: 15,
            average: false,
            average_init: false,
        }
    }
}

impl AdcConfig {
    /// Packs the configuration into an ADC_CONTROL byte, or returns `None`
    /// when `resolution_bits` is unsupported.
    pub fn register_value(&self) -> Option<u8> {
        let resolution = AdcResolution::from_bits(self.resolution_bits)?;

        let mut adc_control: u8 = 0;
        if self.enable {
            adc_control |= ADC_CONTROL_ADC_EN;
        }
        if !self.continuous {
            adc_control |= ADC_CONTROL_ADC_RATE;
        }
        adc_control |= (resolution as u8) << ADC_CONTROL_ADC_SAMPLE_SHIFT;
        if self.average {
            adc_control |= ADC_CONTROL_ADC_AVG;
        }
        if self.average_init {
            adc_control |= ADC_CONTROL_ADC_AVG_INIT;
        }
        Some(adc_control)
    }

    /// Decodes an ADC_CONTROL byte. The reserved sample code 0b11 is
    /// reported as 13 bits.
    pub fn from_register(value: u8) -> Self {
        let resolution = match (value & ADC_CONTROL_ADC_SAMPLE) >> ADC_CONTROL_ADC_SAMPLE_SHIFT {
            0b00 => AdcResolution::Bits15,
            0b01 => AdcResolution::Bits14,
            _ => AdcResolution::Bits13,
        };
        Self {
            enable: (value & ADC_CONTROL_ADC_EN) != 0,
            continuous: (value & ADC_CONTROL_ADC_RATE) == 0,
            resolution_bits: resolution.bits(),
            average: (value & ADC_CONTROL_ADC_AVG) != 0,
            average_init: (value & ADC_CONTROL_ADC_AVG_INIT) != 0,
        }
    }
}
