use super::{SensorError, SensorResult};
use glam::{Vec3, Vec4};
use std::str::SplitWhitespace;

/// One reading from the transmitter.
///
/// Wire form: `tacc ax ay az gra gx gy gz gyr rx ry rz lin lx ly lz rot r1 r2 r3 r4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmitterPacket {
    pub acceleration: Vec3,
    pub gravity: Vec3,
    /// Gyro rates in radians per second
    pub gyro: Vec3,
    /// Acceleration with gravity removed
    pub linear_acceleration: Vec3,
    /// Device rotation: roll, pitch, yaw in [-1, 1], then the scalar part
    pub rotation: Vec4,
}

impl TransmitterPacket {
    pub fn parse(data: &[u8]) -> SensorResult<Self> {
        let text = std::str::from_utf8(data).map_err(|_| SensorError::NotText)?;
        let mut tokens = text.split_whitespace();

        let acceleration = read_section(&mut tokens, "tacc")?;
        let gravity = read_section(&mut tokens, "gra")?;
        let gyro = read_section(&mut tokens, "gyr")?;
        let linear_acceleration = read_section(&mut tokens, "lin")?;
        let [r1, r2, r3, r4] = read_values::<4>(&mut tokens, "rot")?;

        Ok(Self {
            acceleration: Vec3::from_array(acceleration),
            gravity: Vec3::from_array(gravity),
            gyro: Vec3::from_array(gyro),
            linear_acceleration: Vec3::from_array(linear_acceleration),
            rotation: Vec4::new(r1, r2, r3, r4),
        })
    }
}

fn read_section(tokens: &mut SplitWhitespace<'_>, section: &'static str) -> SensorResult<[f32; 3]> {
    read_values::<3>(tokens, section)
}

fn read_values<const N: usize>(
    tokens: &mut SplitWhitespace<'_>,
    section: &'static str,
) -> SensorResult<[f32; N]> {
    if tokens.next() != Some(section) {
        return Err(SensorError::MissingSection { section });
    }

    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let token = tokens.next().ok_or(SensorError::MissingSection { section })?;
        let parsed: f32 = token.parse().map_err(|_| SensorError::BadNumber {
            section,
            value: token.to_string(),
        })?;
        // "nan" and "inf" parse as floats
        if !parsed.is_finite() {
            return Err(SensorError::NonFinite {
                section,
                value: token.to_string(),
            });
        }
        *value = parsed;
    }
    Ok(values)
}
