/// BQ25758 register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Output Current Limit (16-bit)
    OutputCurrentLimit = 0x02,
    /// Output Voltage Limit (16-bit)
    OutputVoltageLimit = 0x04,
    /// Output Current DPM Limit (16-bit)
    OutputCurrentDpmLimit = 0x06,
    /// Output Voltage DPM Limit (16-bit)
    OutputVoltageDpmLimit = 0x08,
    /// Reverse Mode Input Current Limit (16-bit)
    ReverseModeInputCurrentLimit = 0x0A,
    /// Reverse Mode Input Voltage Limit (16-bit)
    ReverseModeInputVoltageLimit = 0x0C,
    /// Timer Control
    TimerControl = 0x15,
    /// Converter Control
    ConverterControl = 0x17,
    /// Pin Control
    PinControl = 0x18,
    /// Power Path and Reverse Mode Control
    PowerPathReverseModeControl = 0x19,
    /// TS Threshold Control
    TsThresholdControl = 0x1B,
    /// TS Region Behavior Control
    TsRegionBehaviorControl = 0x1C,
    /// TS Reverse Mode Threshold Control
    TsReverseModeThresholdControl = 0x1D,
    /// Bypass and Overload Control
    BypassOverloadControl = 0x1E,
    /// Status 1
    Status1 = 0x21,
    /// Status 2
    Status2 = 0x22,
    /// Status 3
    Status3 = 0x23,
    /// Fault Status
    FaultStatus = 0x24,
    /// Flag 1
    Flag1 = 0x25,
    /// Flag 2
    Flag2 = 0x26,
    /// Fault Flag
    FaultFlag = 0x27,
    /// Mask 1
    Mask1 = 0x28,
    /// Mask 2
    Mask2 = 0x29,
    /// Fault Mask
    FaultMask = 0x2A,
    /// ADC Control
    AdcControl = 0x2B,
    /// ADC Channel Control
    AdcChannelControl = 0x2C,
    /// Input current ADC reading (16-bit)
    IacAdc = 0x2D,
    /// Output current ADC reading (16-bit)
    IoutAdc = 0x2F,
    /// Input voltage ADC reading (16-bit)
    VacAdc = 0x31,
    /// Output voltage ADC reading (16-bit)
    VoutAdc = 0x33,
    /// TS ADC reading (16-bit)
    TsAdc = 0x37,
    /// Gate Driver Strength Control
    GateDriverStrengthControl = 0x3B,
    /// Gate Driver Dead Time Control
    GateDriverDeadTimeControl = 0x3C,
    /// Part Information
    PartInformation = 0x3D,
    /// Reverse Mode Current
    ReverseModeCurrent = 0x62,
}

impl Register {
    /// Width of the register in bytes. 16-bit registers are little-endian on the bus.
    pub const fn width(self) -> usize {
        match self {
            Register::OutputCurrentLimit
            | Register::OutputVoltageLimit
            | Register::OutputCurrentDpmLimit
            | Register::OutputVoltageDpmLimit
            | Register::ReverseModeInputCurrentLimit
            | Register::ReverseModeInputVoltageLimit
            | Register::IacAdc
            | Register::IoutAdc
            | Register::VacAdc
            | Register::VoutAdc
            | Register::TsAdc => 2,
            _ => 1,
        }
    }
}

/// Default 7-bit I2C address.
pub const DEFAULT_ADDRESS: u8 = 0x6B;

/// Value of the part information register for a BQ25758.
pub const PART_ID: u8 = 0x22;

// Limit register field masks (bits 1:0 reserved)
pub const CURRENT_LIMIT_MASK: u16 = 0b0000_0111_1111_1100;
pub const VOLTAGE_LIMIT_MASK: u16 = 0b0011_1111_1111_1100;
pub const LIMIT_SHIFT: u8 = 2;

// Limit register LSB sizes (5 mOhm sense resistor)
pub const CURRENT_LSB_MA: f32 = 50.0;
pub const VOLTAGE_LSB_MV: f32 = 20.0;

// TIMER_CONTROL register bit masks
pub const TIMER_CONTROL_WATCHDOG: u8 = 0b11 << 4;
pub const TIMER_CONTROL_WATCHDOG_SHIFT: u8 = 4;

// POWER_PATH_REVERSE_MODE_CONTROL register bit masks
pub const POWER_PATH_REG_RST: u8 = 1 << 7;
pub const POWER_PATH_EN_REV: u8 = 1 << 0;

// ADC_CONTROL register bit masks
pub const ADC_CONTROL_ADC_EN: u8 = 1 << 7;
pub const ADC_CONTROL_ADC_RATE: u8 = 1 << 6;
pub const ADC_CONTROL_ADC_SAMPLE: u8 = 0b11 << 4;
pub const ADC_CONTROL_ADC_SAMPLE_SHIFT: u8 = 4;
pub const ADC_CONTROL_ADC_AVG: u8 = 1 << 3;
pub const ADC_CONTROL_ADC_AVG_INIT: u8 = 1 << 2;

// ADC reading LSB sizes
pub const IAC_ADC_LSB_MA: f32 = 0.8;
pub const IOUT_ADC_LSB_MA: f32 = 2.0;
pub const VAC_ADC_LSB_MV: f32 = 2.0;
pub const VOUT_ADC_LSB_MV: f32 = 2.0;

const CODE_EPSILON: f32 = 1e-3;

/// A multi-bit numeric field inside a 16-bit limit register.
///
/// The LSB is expressed in milli-units (mA or mV) so that whole-step values
/// divide exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledField {
    pub register: Register,
    pub mask: u16,
    pub shift: u8,
    pub min_code: u16,
    pub max_code: u16,
    pub lsb: f32,
}

impl ScaledField {
    /// Truncates `value / lsb` to a code, clamps it into `[min_code, max_code]`
    /// and shifts it into position. Reserved bits are left at zero.
    pub fn encode(&self, value: f32) -> u16 {
        // `as` saturates and maps NaN to 0, so the clamp below always applies.
        // The epsilon absorbs f32 error on whole-step values (e.g. 3.3 V).
        let code = (value / self.lsb + CODE_EPSILON) as i32;
        let code = code.clamp(self.min_code as i32, self.max_code as i32) as u16;
        (code << self.shift) & self.mask
    }

    /// Strips reserved bits and scales the field. Out-of-range hardware
    /// values are reported as-is.
    pub fn decode(&self, raw: u16) -> f32 {
        ((raw & self.mask) >> self.shift) as f32 * self.lsb
    }
}

pub const OUTPUT_CURRENT_LIMIT: ScaledField = ScaledField {
    register: Register::OutputCurrentLimit,
    mask: CURRENT_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x008,
    max_code: 0x190,
    lsb: CURRENT_LSB_MA,
};

pub const OUTPUT_VOLTAGE_LIMIT: ScaledField = ScaledField {
    register: Register::OutputVoltageLimit,
    mask: VOLTAGE_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x0A5,
    max_code: 0xBB8,
    lsb: VOLTAGE_LSB_MV,
};

pub const OUTPUT_CURRENT_DPM_LIMIT: ScaledField = ScaledField {
    register: Register::OutputCurrentDpmLimit,
    mask: CURRENT_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x008,
    max_code: 0x190,
    lsb: CURRENT_LSB_MA,
};

pub const OUTPUT_VOLTAGE_DPM_LIMIT: ScaledField = ScaledField {
    register: Register::OutputVoltageDpmLimit,
    mask: VOLTAGE_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x0D2,
    max_code: 0xBB8,
    lsb: VOLTAGE_LSB_MV,
};

pub const REVERSE_MODE_INPUT_CURRENT_LIMIT: ScaledField = ScaledField {
    register: Register::ReverseModeInputCurrentLimit,
    mask: CURRENT_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x008,
    max_code: 0x190,
    lsb: CURRENT_LSB_MA,
};

pub const REVERSE_MODE_INPUT_VOLTAGE_LIMIT: ScaledField = ScaledField {
    register: Register::ReverseModeInputVoltageLimit,
    mask: VOLTAGE_LIMIT_MASK,
    shift: LIMIT_SHIFT,
    min_code: 0x0A5,
    max_code: 0xBB8,
    lsb: VOLTAGE_LSB_MV,
};
