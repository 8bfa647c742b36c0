#[cfg(feature = "defmt")]
use defmt::Format;

/// Represents potential errors when interacting with the BQ25758 chip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error<E> {
    /// An error occurred during I2C communication.
    I2c(E),
    /// A register transfer was requested with an unsupported length.
    InvalidData,
    /// The part information register did not hold the BQ25758 ID.
    DeviceMismatch {
        /// The part ID the driver expects.
        expected: u8,
        /// The part ID read back from the chip.
        actual: u8,
    },
    /// The requested ADC resolution is not one of 15, 14 or 13 bits.
    /// Detected before any bus transaction is issued.
    InvalidAdcResolution(u8),
    /// The driver was constructed without a chip-enable pin.
    ChipEnableUnavailable,
    /// Driving or sampling the chip-enable pin failed.
    ChipEnablePin,
}
