//! Fixed-point compensation, BMP280 datasheet section 3.11.3 (32-bit integer variant).
//!
//! Everything here is pure. The shift and multiply sequence matches the datasheet reference
//! exactly, including two's-complement wraparound on overflow, so results are bit-identical
//! to it for every input.

use thiserror::Error;

use crate::calibration::CalibrationCoefficients;
use crate::sample::RawSample;

/// The pressure polynomial's denominator was zero, so no pressure can be derived from these
/// coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pressure compensation denominator is zero")]
pub struct DegenerateCalibration;

/// One compensated reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompensatedSample {
    /// Hundredths of a degree Celsius, 2508 is 25.08 °C.
    pub temperature: i32,
    /// Pascals, 100656 is 1006.56 hPa. This is the integer the 32-bit routine produces with no
    /// further scaling; it is not the Q24.8 value of the 64-bit routine.
    pub pressure: u32,
}

impl CompensatedSample {
    pub fn temperature_celsius(&self) -> f32 {
        self.temperature as f32 / 100.
    }

    pub fn pressure_pa(&self) -> u32 {
        self.pressure
    }

    /// 1 hPa = 100 Pa.
    pub fn pressure_hpa(&self) -> f32 {
        self.pressure as f32 / 100.
    }

    /// Altitude in metres relative to the given sea level pressure (Pa).
    pub fn altitude_m(&self, sea_level_pa: f32) -> f32 {
        44330. * (1. - (self.pressure as f32 / sea_level_pa).powf(0.1903))
    }
}

/// Fine resolution temperature shared by both conversions.
pub fn fine_temperature(raw_temperature: i32, c: &CalibrationCoefficients) -> i32 {
    let adc_t = raw_temperature;
    let t1 = i32::from(c.dig_t1);
    let t2 = i32::from(c.dig_t2);
    let t3 = i32::from(c.dig_t3);

    let var1 = ((adc_t >> 3).wrapping_sub(t1 << 1)).wrapping_mul(t2) >> 11;
    let delta = (adc_t >> 4).wrapping_sub(t1);
    let var2 = (delta.wrapping_mul(delta) >> 12).wrapping_mul(t3) >> 14;

    var1.wrapping_add(var2)
}

/// Temperature in hundredths of a degree Celsius.
pub fn compensate_temperature(t_fine: i32) -> i32 {
    t_fine.wrapping_mul(5).wrapping_add(128) >> 8
}

/// Pressure in Pa, or `None` when the coefficients make the denominator zero.
pub fn compensate_pressure(
    raw_pressure: i32,
    t_fine: i32,
    c: &CalibrationCoefficients,
) -> Option<u32> {
    let p1 = i32::from(c.dig_p1);
    let p2 = i32::from(c.dig_p2);
    let p3 = i32::from(c.dig_p3);
    let p4 = i32::from(c.dig_p4);
    let p5 = i32::from(c.dig_p5);
    let p6 = i32::from(c.dig_p6);
    let p7 = i32::from(c.dig_p7);
    let p8 = i32::from(c.dig_p8);
    let p9 = i32::from(c.dig_p9);

    let var1 = (t_fine >> 1).wrapping_sub(64000);
    let square = (var1 >> 2).wrapping_mul(var1 >> 2);

    let var2 = (square >> 11).wrapping_mul(p6);
    let var2 = var2.wrapping_add(var1.wrapping_mul(p5) << 1);
    let var2 = (var2 >> 2).wrapping_add(p4 << 16);

    let var1 =
        (p3.wrapping_mul(square >> 13) >> 3).wrapping_add(p2.wrapping_mul(var1) >> 1) >> 18;
    let var1 = 32768i32.wrapping_add(var1).wrapping_mul(p1) >> 15;

    if var1 == 0 {
        return None;
    }

    let mut p = (1_048_576i32.wrapping_sub(raw_pressure) as u32)
        .wrapping_sub((var2 >> 12) as u32)
        .wrapping_mul(3125);

    // Stay inside 32 bits: divide first when doubling would overflow.
    if p < 0x8000_0000 {
        p = (p << 1) / var1 as u32;
    } else {
        p = (p / var1 as u32).wrapping_mul(2);
    }

    let var1 = p9.wrapping_mul((((p >> 3).wrapping_mul(p >> 3)) >> 13) as i32) >> 12;
    let var2 = ((p >> 2) as i32).wrapping_mul(p8) >> 13;

    Some((p as i32).wrapping_add(var1.wrapping_add(var2).wrapping_add(p7) >> 4) as u32)
}

/// Runs both conversions for one raw sample.
pub fn compensate(
    raw: &RawSample,
    c: &CalibrationCoefficients,
) -> Result<CompensatedSample, DegenerateCalibration> {
    let t_fine = fine_temperature(raw.temperature, c);
    let pressure = compensate_pressure(raw.pressure, t_fine, c).ok_or(DegenerateCalibration)?;

    Ok(CompensatedSample {
        temperature: compensate_temperature(t_fine),
        pressure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DATASHEET_CALIBRATION;
    use proptest::prelude::*;

    const ADC_T: i32 = 519888;
    const ADC_P: i32 = 415148;

    fn datasheet() -> CalibrationCoefficients {
        CalibrationCoefficients::from_bytes(&DATASHEET_CALIBRATION)
    }

    #[test]
    fn datasheet_fine_temperature() {
        assert_eq!(fine_temperature(ADC_T, &datasheet()), 128422);
    }

    #[test]
    fn datasheet_temperature() {
        assert_eq!(compensate_temperature(128422), 2508);
    }

    #[test]
    fn datasheet_pressure() {
        assert_eq!(compensate_pressure(ADC_P, 128422, &datasheet()), Some(100656));
    }

    #[test]
    fn datasheet_worked_example() {
        let raw = RawSample {
            pressure: ADC_P,
            temperature: ADC_T,
        };

        let sample = compensate(&raw, &datasheet()).unwrap();

        assert_eq!(
            sample,
            CompensatedSample {
                temperature: 2508,
                pressure: 100656,
            }
        );
    }

    #[test]
    fn caller_side_units() {
        let sample = CompensatedSample {
            temperature: 2508,
            pressure: 100656,
        };

        assert_eq!(sample.temperature_celsius(), 25.08);
        assert_eq!(sample.pressure_pa(), 100656);
        assert!((sample.pressure_hpa() - 1006.56).abs() < 0.001);
        // The datasheet's floating point result for the same input is 100653.27 Pa.
        assert!((sample.pressure_pa() as f32 - 100653.27).abs() < 5.);
    }

    #[test]
    fn altitude_at_reference_pressure_is_zero() {
        let sample = CompensatedSample {
            temperature: 2000,
            pressure: 101325,
        };

        assert_eq!(sample.altitude_m(101325.), 0.);
        assert!(sample.altitude_m(102000.) > 0.);
    }

    #[test]
    fn zero_p1_is_degenerate() {
        let c = CalibrationCoefficients {
            dig_p1: 0,
            ..datasheet()
        };
        let raw = RawSample {
            pressure: ADC_P,
            temperature: ADC_T,
        };

        assert_eq!(compensate_pressure(ADC_P, 128422, &c), None);
        assert_eq!(compensate(&raw, &c), Err(DegenerateCalibration));
    }

    #[test]
    fn truncated_denominator_is_degenerate() {
        // var1 = -4, so the P2 term is -2 >> 18 = -1 and (32768 - 1) * 1 >> 15 = 0.
        let c = CalibrationCoefficients {
            dig_p1: 1,
            dig_p2: 1,
            ..datasheet()
        };

        assert_eq!(compensate_pressure(ADC_P, 127992, &c), None);
    }

    #[test]
    fn extreme_inputs_do_not_panic() {
        let c = CalibrationCoefficients {
            dig_t1: u16::MAX,
            dig_t2: i16::MIN,
            dig_t3: i16::MAX,
            dig_p1: u16::MAX,
            dig_p2: i16::MIN,
            dig_p3: i16::MAX,
            dig_p4: i16::MIN,
            dig_p5: i16::MAX,
            dig_p6: i16::MIN,
            dig_p7: i16::MAX,
            dig_p8: i16::MIN,
            dig_p9: i16::MAX,
        };

        for raw in [0, 0xFFFFF] {
            let t_fine = fine_temperature(raw, &c);
            compensate_temperature(t_fine);
            compensate_pressure(raw, t_fine, &c);
        }
    }

    proptest! {
        #[test]
        fn compensation_is_deterministic(
            block in any::<[u8; 24]>(),
            pressure in 0i32..(1 << 20),
            temperature in 0i32..(1 << 20),
        ) {
            let c = CalibrationCoefficients::from_bytes(&block);
            let raw = RawSample { pressure, temperature };

            let first = compensate(&raw, &c);
            for _ in 0..3 {
                prop_assert_eq!(compensate(&raw, &c), first);
            }
        }
    }
}
