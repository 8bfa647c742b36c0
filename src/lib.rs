#![no_std]

#[macro_use]
extern crate uom;

#[cfg(feature = "defmt")]
extern crate defmt;

use core::ops::Deref;

use embedded_hal::digital::{OutputPin, StatefulOutputPin};
#[cfg(not(feature = "async"))]
use embedded_hal::i2c::I2c;
#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c;

pub mod registers;
use registers::*; // Import register map, bit masks and scaled fields

pub mod data_types;
pub mod errors;
pub mod units;

pub use data_types::{AdcConfig, AdcResolution, WatchdogTimeout};
pub use errors::Error;
pub use registers::{Register, DEFAULT_ADDRESS, PART_ID};

use crate::units::{ElectricCurrent, ElectricPotential, Time};
use uom::si::electric_current::milliampere;
use uom::si::electric_potential::millivolt;

/// Longest block transfer supported by `read_registers` / `write_registers`.
/// Covers the four consecutive 16-bit ADC result registers.
pub const MAX_TRANSFER_LEN: usize = 8;

// Register address byte followed by the payload.
const MAX_FRAME_LEN: usize = MAX_TRANSFER_LEN + 1;

/// Chip-enable placeholder for boards that tie CE low in hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoChipEnable;

impl embedded_hal::digital::ErrorType for NoChipEnable {
    type Error = core::convert::Infallible;
}

impl OutputPin for NoChipEnable {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl StatefulOutputPin for NoChipEnable {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// BQ25758 driver
///
/// One handle drives one chip. The handle carries no cached register state;
/// every accessor performs its own bus transaction. Callers sharing a handle
/// between tasks must serialize access themselves.
///
/// [`Bq25758::setup`] must be called once before any other accessor.
pub struct Bq25758<I2C, CE = NoChipEnable>
where
    I2C: I2c,
{
    address: u8,
    i2c: I2C,
    chip_enable: Option<CE>,
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "RegisterAccess",),
    async(feature = "async", keep_self)
)]
#[allow(async_fn_in_trait)]
/// Trait for abstracting raw register access over the bus.
pub trait RegisterAccess<E>
where
    Self: Sized,
{
    /// The buffer type used for reading multiple registers.
    type ReadBuffer: Deref<Target = [u8]>;

    /// Reads a single byte from the specified register.
    async fn read_register(&mut self, reg: Register) -> Result<u8, Error<E>>;

    /// Reads multiple bytes starting from the specified register.
    async fn read_registers(
        &mut self,
        reg: Register,
        len: usize,
    ) -> Result<Self::ReadBuffer, Error<E>>;

    /// Writes a single byte to the specified register.
    async fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Error<E>>;

    /// Writes multiple bytes starting from the specified register.
    async fn write_registers(&mut self, reg: Register, values: &[u8]) -> Result<(), Error<E>>;
}

impl<I2C> Bq25758<I2C, NoChipEnable>
where
    I2C: I2c,
{
    /// Creates a new instance of the BQ25758 driver without a chip-enable pin.
    ///
    /// # Arguments
    ///
    /// * `i2c` - The I2C peripheral.
    /// * `address` - The 7-bit I2C address of the chip, usually [`DEFAULT_ADDRESS`].
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            address,
            i2c,
            chip_enable: None,
        }
    }
}

impl<I2C, CE> Bq25758<I2C, CE>
where
    I2C: I2c,
{
    /// Creates a new instance of the BQ25758 driver that also controls the
    /// active-low CE pin.
    ///
    /// # Arguments
    ///
    /// * `i2c` - The I2C peripheral.
    /// * `address` - The 7-bit I2C address of the chip.
    /// * `chip_enable` - Output pin wired to CE.
    pub fn new_with_chip_enable(i2c: I2C, address: u8, chip_enable: CE) -> Self {
        Self {
            address,
            i2c,
            chip_enable: Some(chip_enable),
        }
    }

    /// The I2C address this handle talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Destroys the driver, returning the bus and the chip-enable pin.
    pub fn release(self) -> (I2C, Option<CE>) {
        (self.i2c, self.chip_enable)
    }
}

impl<I2C, CE, E> Bq25758<I2C, CE>
where
    I2C: I2c<Error = E>,
    CE: OutputPin,
{
    /// Enables or disables the converter through the CE pin.
    /// CE is active low: driving it low enables the device.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let pin = self
            .chip_enable
            .as_mut()
            .ok_or(Error::ChipEnableUnavailable)?;
        let result = if enabled {
            pin.set_low()
        } else {
            pin.set_high()
        };
        result.map_err(|_| Error::ChipEnablePin)
    }
}

impl<I2C, CE, E> Bq25758<I2C, CE>
where
    I2C: I2c<Error = E>,
    CE: StatefulOutputPin,
{
    /// Returns true while the CE pin is driven low.
    pub fn is_enabled(&mut self) -> Result<bool, Error<E>> {
        let pin = self
            .chip_enable
            .as_mut()
            .ok_or(Error::ChipEnableUnavailable)?;
        pin.is_set_low().map_err(|_| Error::ChipEnablePin)
    }
}

#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Bq25758",),
    async(feature = "async", keep_self)
)]
impl<I2C, CE, E> RegisterAccess<E> for Bq25758<I2C, CE>
where
    I2C: I2c<Error = E>,
{
    type ReadBuffer = heapless::Vec<u8, MAX_TRANSFER_LEN>;

    async fn read_register(&mut self, reg: Register) -> Result<u8, Error<E>> {
        let mut data = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg as u8], &mut data)
            .await
            .map_err(Error::I2c)?;
        Ok(data[0])
    }

    async fn read_registers(
        &mut self,
        reg: Register,
        len: usize,
    ) -> Result<Self::ReadBuffer, Error<E>> {
        if len == 0 {
            return Err(Error::InvalidData);
        }
        let mut data: heapless::Vec<u8, MAX_TRANSFER_LEN> = heapless::Vec::new();
        data.resize(len, 0).map_err(|_| Error::InvalidData)?;
        self.i2c
            .write_read(self.address, &[reg as u8], &mut data)
            .await
            .map_err(Error::I2c)?;
        Ok(data)
    }

    async fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[reg as u8, value])
            .await
            .map_err(Error::I2c)
    }

    async fn write_registers(&mut self, reg: Register, values: &[u8]) -> Result<(), Error<E>> {
        if values.is_empty() {
            return Err(Error::InvalidData);
        }
        let mut data: heapless::Vec<u8, MAX_FRAME_LEN> = heapless::Vec::new();
        data.push(reg as u8).map_err(|_| Error::InvalidData)?;
        data.extend_from_slice(values)
            .map_err(|_| Error::InvalidData)?;
        self.i2c
            .write(self.address, &data)
            .await
            .map_err(Error::I2c)
    }
}

// Generic impl block for methods that use RegisterAccess
#[maybe_async_cfg::maybe(
    sync(cfg(not(feature = "async")), self = "Bq25758",),
    async(feature = "async", keep_self)
)]
impl<I2C, CE, E> Bq25758<I2C, CE>
where
    I2C: I2c<Error = E>,
    Self: RegisterAccess<E>,
{
    /// Brings the chip into a known state.
    ///
    /// 1. Verifies the part ID; a mismatch aborts before anything is written.
    /// 2. Sets REG_RST so a warm restart does not inherit stale limits.
    /// 3. Disables the watchdog.
    ///
    /// The disabled watchdog suits bench use only. When charging a battery the
    /// converter must shut down if the host stops talking to it, so call
    /// [`Self::set_watchdog_timeout`] with a nonzero timeout afterwards.
    pub async fn setup(&mut self) -> Result<(), Error<E>> {
        self.verify_part_id().await?;
        self.reset_registers().await?;
        self.set_watchdog(WatchdogTimeout::Disabled).await?;

        #[cfg(feature = "defmt")]
        defmt::info!("BQ25758 at {:02x} ready, watchdog disabled", self.address);

        Ok(())
    }

    /// Reads the part information register.
    pub async fn part_id(&mut self) -> Result<u8, Error<E>> {
        self.read_register(Register::PartInformation).await
    }

    /// Checks the part information register against [`PART_ID`].
    pub async fn verify_part_id(&mut self) -> Result<(), Error<E>> {
        let actual = self.part_id().await?;
        if actual != PART_ID {
            #[cfg(feature = "defmt")]
            defmt::error!(
                "Bad part ID: expected {:02x}, read {:02x}",
                PART_ID,
                actual
            );
            return Err(Error::DeviceMismatch {
                expected: PART_ID,
                actual,
            });
        }
        Ok(())
    }

    /// Resets every register to its power-on default.
    pub async fn reset_registers(&mut self) -> Result<(), Error<E>> {
        self.write_register(Register::PowerPathReverseModeControl, POWER_PATH_REG_RST)
            .await
    }

    async fn read_u16(&mut self, reg: Register) -> Result<u16, Error<E>> {
        let raw_data = self.read_registers(reg, 2).await?;
        Ok(u16::from_le_bytes([raw_data[0], raw_data[1]]))
    }

    async fn write_u16(&mut self, reg: Register, value: u16) -> Result<(), Error<E>> {
        self.write_registers(reg, &value.to_le_bytes()).await
    }

    async fn read_field(&mut self, field: &ScaledField) -> Result<f32, Error<E>> {
        let raw = self.read_u16(field.register).await?;
        Ok(field.decode(raw))
    }

    /// Overwrites the whole register; bits outside the field are written as zero.
    async fn write_field(&mut self, field: &ScaledField, value: f32) -> Result<(), Error<E>> {
        let raw = field.encode(value);
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "{}: value={}, raw={:04x}",
            field.register,
            value,
            raw
        );
        self.write_u16(field.register, raw).await
    }

    /// Reads a register of either width as a raw value.
    ///
    /// Status, flag, mask and fault registers have no decoding in this driver;
    /// use this to inspect them.
    pub async fn read_register_value(&mut self, reg: Register) -> Result<u16, Error<E>> {
        match reg.width() {
            2 => self.read_u16(reg).await,
            _ => Ok(self.read_register(reg).await? as u16),
        }
    }

    /// Writes a raw value to a register of either width.
    /// Values wider than an 8-bit register are rejected with `InvalidData`.
    pub async fn write_register_value(&mut self, reg: Register, value: u16) -> Result<(), Error<E>> {
        match reg.width() {
            2 => self.write_u16(reg, value).await,
            _ => {
                let value = u8::try_from(value).map_err(|_| Error::InvalidData)?;
                self.write_register(reg, value).await
            }
        }
    }

    /// Output voltage will be regulated to keep within this current limit.
    pub async fn get_output_current_limit(&mut self) -> Result<ElectricCurrent, Error<E>> {
        let ma = self.read_field(&OUTPUT_CURRENT_LIMIT).await?;
        Ok(ElectricCurrent::new::<milliampere>(ma))
    }

    /// Sets the output current limit, clamped to 0.4 A..=20 A in 50 mA steps.
    pub async fn set_output_current_limit(
        &mut self,
        limit: ElectricCurrent,
    ) -> Result<(), Error<E>> {
        self.write_field(&OUTPUT_CURRENT_LIMIT, limit.get::<milliampere>())
            .await
    }

    /// Desired output voltage if the current limit allows.
    pub async fn get_output_voltage_limit(&mut self) -> Result<ElectricPotential, Error<E>> {
        let mv = self.read_field(&OUTPUT_VOLTAGE_LIMIT).await?;
        Ok(ElectricPotential::new::<millivolt>(mv))
    }

    /// Sets the output voltage, clamped to 3.3 V..=60 V in 20 mV steps.
    pub async fn set_output_voltage_limit(
        &mut self,
        limit: ElectricPotential,
    ) -> Result<(), Error<E>> {
        self.write_field(&OUTPUT_VOLTAGE_LIMIT, limit.get::<millivolt>())
            .await
    }

    /// Output current dynamic power management (DPM) limit.
    pub async fn get_output_current_dpm_limit(&mut self) -> Result<ElectricCurrent, Error<E>> {
        let ma = self.read_field(&OUTPUT_CURRENT_DPM_LIMIT).await?;
        Ok(ElectricCurrent::new::<milliampere>(ma))
    }

    /// Clamped to 0.4 A..=20 A in 50 mA steps.
    pub async fn set_output_current_dpm_limit(
        &mut self,
        limit: ElectricCurrent,
    ) -> Result<(), Error<E>> {
        self.write_field(&OUTPUT_CURRENT_DPM_LIMIT, limit.get::<milliampere>())
            .await
    }

    /// Output voltage dynamic power management (DPM) limit.
    pub async fn get_output_voltage_dpm_limit(&mut self) -> Result<ElectricPotential, Error<E>> {
        let mv = self.read_field(&OUTPUT_VOLTAGE_DPM_LIMIT).await?;
        Ok(ElectricPotential::new::<millivolt>(mv))
    }

    /// Clamped to 4.2 V..=60 V in 20 mV steps.
    pub async fn set_output_voltage_dpm_limit(
        &mut self,
        limit: ElectricPotential,
    ) -> Result<(), Error<E>> {
        self.write_field(&OUTPUT_VOLTAGE_DPM_LIMIT, limit.get::<millivolt>())
            .await
    }

    pub async fn get_reverse_mode_input_current_limit(
        &mut self,
    ) -> Result<ElectricCurrent, Error<E>> {
        let ma = self.read_field(&REVERSE_MODE_INPUT_CURRENT_LIMIT).await?;
        Ok(ElectricCurrent::new::<milliampere>(ma))
    }

    /// Clamped to 0.4 A..=20 A in 50 mA steps.
    pub async fn set_reverse_mode_input_current_limit(
        &mut self,
        limit: ElectricCurrent,
    ) -> Result<(), Error<E>> {
        self.write_field(&REVERSE_MODE_INPUT_CURRENT_LIMIT, limit.get::<milliampere>())
            .await
    }

    pub async fn get_reverse_mode_input_voltage_limit(
        &mut self,
    ) -> Result<ElectricPotential, Error<E>> {
        let mv = self.read_field(&REVERSE_MODE_INPUT_VOLTAGE_LIMIT).await?;
        Ok(ElectricPotential::new::<millivolt>(mv))
    }

    /// Clamped to 3.3 V..=60 V in 20 mV steps.
    pub async fn set_reverse_mode_input_voltage_limit(
        &mut self,
        limit: ElectricPotential,
    ) -> Result<(), Error<E>> {
        self.write_field(&REVERSE_MODE_INPUT_VOLTAGE_LIMIT, limit.get::<millivolt>())
            .await
    }

    /// Checks the EN_REV bit.
    pub async fn get_reverse_enable(&mut self) -> Result<bool, Error<E>> {
        let power_path = self
            .read_register(Register::PowerPathReverseModeControl)
            .await?;
        Ok((power_path & POWER_PATH_EN_REV) != 0)
    }

    /// Sets or clears EN_REV.
    ///
    /// Unlike the limit setters this is a read-modify-write: every other bit
    /// of the register keeps its current value.
    pub async fn set_reverse_enable(&mut self, enable: bool) -> Result<(), Error<E>> {
        let mut power_path = self
            .read_register(Register::PowerPathReverseModeControl)
            .await?;
        if enable {
            power_path |= POWER_PATH_EN_REV;
        } else {
            power_path &= !POWER_PATH_EN_REV;
        }
        self.write_register(Register::PowerPathReverseModeControl, power_path)
            .await
    }

    /// Programs the watchdog with the shortest setting covering `timeout`
    /// (40 s, 80 s or 160 s). Zero disables it.
    pub async fn set_watchdog_timeout(&mut self, timeout: Time) -> Result<(), Error<E>> {
        self.set_watchdog(WatchdogTimeout::from_time(timeout)).await
    }

    /// Writes TIMER_CONTROL with only the watchdog field set.
    pub async fn set_watchdog(&mut self, watchdog: WatchdogTimeout) -> Result<(), Error<E>> {
        self.write_register(Register::TimerControl, watchdog.register_value())
            .await
    }

    pub async fn get_watchdog_timeout(&mut self) -> Result<WatchdogTimeout, Error<E>> {
        let timer_control = self.read_register(Register::TimerControl).await?;
        Ok(WatchdogTimeout::from_register(timer_control))
    }

    /// Configures the ADC.
    ///
    /// An unsupported resolution fails with `InvalidAdcResolution` before any
    /// bus transaction.
    pub async fn setup_adc(&mut self, config: &AdcConfig) -> Result<(), Error<E>> {
        let adc_control = config
            .register_value()
            .ok_or(Error::InvalidAdcResolution(config.resolution_bits))?;
        #[cfg(feature = "defmt")]
        defmt::debug!("ADC_CONTROL <- {:08b}", adc_control);
        self.write_register(Register::AdcControl, adc_control).await
    }

    pub async fn get_adc_config(&mut self) -> Result<AdcConfig, Error<E>> {
        let adc_control = self.read_register(Register::AdcControl).await?;
        Ok(AdcConfig::from_register(adc_control))
    }

    /// Input current ADC reading, 0.8 mA/LSB.
    pub async fn get_iac_adc(&mut self) -> Result<ElectricCurrent, Error<E>> {
        let raw = self.read_u16(Register::IacAdc).await?;
        Ok(ElectricCurrent::new::<milliampere>(raw as f32 * IAC_ADC_LSB_MA))
    }

    /// Output current ADC reading, 2 mA/LSB.
    pub async fn get_iout_adc(&mut self) -> Result<ElectricCurrent, Error<E>> {
        let raw = self.read_u16(Register::IoutAdc).await?;
        Ok(ElectricCurrent::new::<milliampere>(raw as f32 * IOUT_ADC_LSB_MA))
    }

    /// Input voltage ADC reading, 2 mV/LSB.
    pub async fn get_vac_adc(&mut self) -> Result<ElectricPotential, Error<E>> {
        let raw = self.read_u16(Register::VacAdc).await?;
        Ok(ElectricPotential::new::<millivolt>(raw as f32 * VAC_ADC_LSB_MV))
    }

    /// Output voltage ADC reading, 2 mV/LSB.
    pub async fn get_vout_adc(&mut self) -> Result<ElectricPotential, Error<E>> {
        let raw = self.read_u16(Register::VoutAdc).await?;
        Ok(ElectricPotential::new::<millivolt>(raw as f32 * VOUT_ADC_LSB_MV))
    }
}
