#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]
#![allow(non_camel_case_types)]
#![allow(clippy::upper_case_acronyms)]

// SI quantities stored as f32, base units chosen to match the register scales.
ISQ!(
    uom::si,
    f32,
    (meter, kilogram, second, ampere, kelvin, mole, candela)
);

#[cfg(test)]
mod tests {
    use super::{ElectricCurrent, ElectricPotential, Time};
    use approx::assert_relative_eq;
    use uom::si::{
        electric_current::{ampere, milliampere},
        electric_potential::{millivolt, volt},
        time::second,
    };

    #[test]
    fn test_units() {
        let current = ElectricCurrent::new::<milliampere>(400.0);
        let potential = ElectricPotential::new::<millivolt>(3300.0);
        let timeout = Time::new::<second>(40.0);

        assert_relative_eq!(current.get::<ampere>(), 0.4, epsilon = 1e-6);
        assert_relative_eq!(potential.get::<volt>(), 3.3, epsilon = 1e-6);
        assert_relative_eq!(timeout.get::<second>(), 40.0);
    }
}
