//! Head tracking from transmitter packets
//!
//! The first packet fixes the neutral rotation. Every `rate_window_packets`
//! packets the observed packet rate is measured; until a rate is known the
//! filter snaps to the absolute reading.

use super::TransmitterPacket;
use crate::config::SensorSettings;
use crate::utils::math::wrap_degrees;
use crate::world::HeadState;
use glam::Vec3;
use std::time::Instant;
use tracing::{debug, info};

/// Angles derived from one packet, all (yaw, pitch, roll)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadReading {
    /// Absolute angles in degrees relative to the first packet
    pub euler: Vec3,
    /// Degrees per second
    pub angular_velocity: Vec3,
    /// Filter step, zero until the packet rate is known
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct HeadTracker {
    settings: SensorSettings,
    packets: u64,
    initial_reading: Vec3,
    window_start: Option<Instant>,
    hz: f32,
}

impl HeadTracker {
    pub fn new(settings: SensorSettings) -> Self {
        Self {
            settings,
            packets: 0,
            initial_reading: Vec3::ZERO,
            window_start: None,
            hz: 0.0,
        }
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Last measured packet rate, zero before the first full window
    pub fn hz(&self) -> f32 {
        self.hz
    }

    pub fn process_packet(&mut self, data: &[u8], head: &mut HeadState) -> Option<HeadReading> {
        self.process_packet_at(data, Instant::now(), head)
    }

    /// Feed one packet received at `now`. Malformed packets are ignored.
    pub fn process_packet_at(
        &mut self,
        data: &[u8],
        now: Instant,
        head: &mut HeadState,
    ) -> Option<HeadReading> {
        let packet = match TransmitterPacket::parse(data) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("📡 Ignoring transmitter packet: {}", e);
                return None;
            }
        };

        if self.packets == 0 {
            self.window_start = Some(now);
            self.initial_reading =
                Vec3::new(packet.rotation.z, packet.rotation.y, packet.rotation.x);
            head.return_to_center = false;
            info!("📡 Transmitter driving head, return to center off");
        }
        self.packets += 1;

        let window = u64::from(self.settings.rate_window_packets.max(1));
        if self.packets % window == 0 {
            if let Some(start) = self.window_start {
                let elapsed = now.duration_since(start).as_secs_f32();
                if elapsed > 0.0 {
                    self.hz = window as f32 / elapsed;
                    info!("📡 Transmitter Hz: {:.1}", self.hz);
                }
            }
            self.window_start = Some(now);
        }

        let reading = self.reading_for(&packet);
        head.set_from_gyros(reading.euler, reading.angular_velocity, reading.dt, &self.settings);
        Some(reading)
    }

    fn reading_for(&self, packet: &TransmitterPacket) -> HeadReading {
        let rotation = packet.rotation;
        let initial = self.initial_reading;

        let euler = Vec3::new(
            wrap_degrees((rotation.z - initial.x) * 180.0),
            -(rotation.y - initial.y) * 180.0,
            (rotation.x - initial.z) * 180.0,
        );
        let angular_velocity = Vec3::new(
            packet.gyro.z.to_degrees(),
            (-packet.gyro.x).to_degrees(),
            packet.gyro.y.to_degrees(),
        );
        let dt = if self.hz == 0.0 { 0.0 } else { 1.0 / self.hz };

        HeadReading { euler, angular_velocity, dt }
    }
}

impl Default for HeadTracker {
    fn default() -> Self {
        Self::new(SensorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeadSettings;
    use std::time::Duration;

    fn packet(gyro: Vec3, rot: [f32; 3]) -> String {
        format!(
            "tacc 0 0 0 gra 0 0 0 gyr {} {} {} lin 0 0 0 rot {} {} {} 1",
            gyro.x, gyro.y, gyro.z, rot[0], rot[1], rot[2]
        )
    }

    fn head() -> HeadState {
        HeadState::new(&HeadSettings { return_to_center: true, ..Default::default() })
    }

    #[test]
    fn test_first_packet_is_neutral_and_disables_return() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        head.yaw = 40.0;

        let reading = tracker
            .process_packet_at(
                packet(Vec3::ZERO, [0.1, 0.2, 0.3]).as_bytes(),
                Instant::now(),
                &mut head,
            )
            .unwrap();

        assert_eq!(reading.euler, Vec3::ZERO);
        assert_eq!(reading.dt, 0.0);
        assert_eq!(head.yaw, 0.0);
        assert!(!head.return_to_center);
    }

    #[test]
    fn test_euler_mapping_before_rate_is_known() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let now = Instant::now();
        tracker.process_packet_at(packet(Vec3::ZERO, [0.0, 0.0, 0.0]).as_bytes(), now, &mut head);

        // roll 0.1, pitch 0.05, yaw 0.25 of a half turn
        let reading = tracker
            .process_packet_at(packet(Vec3::ZERO, [0.1, 0.05, 0.25]).as_bytes(), now, &mut head)
            .unwrap();
        assert!((reading.euler - Vec3::new(45.0, -9.0, 18.0)).length() < 1.0e-4);
        // no rate yet, so the head snaps
        assert!((head.yaw - 45.0).abs() < 1.0e-4);
        assert!((head.pitch + 9.0).abs() < 1.0e-4);
    }

    #[test]
    fn test_yaw_wraps_past_half_turn() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let now = Instant::now();
        tracker.process_packet_at(packet(Vec3::ZERO, [0.0, 0.0, -0.5]).as_bytes(), now, &mut head);
        let reading = tracker
            .process_packet_at(packet(Vec3::ZERO, [0.0, 0.0, 0.75]).as_bytes(), now, &mut head)
            .unwrap();
        // 1.25 half turns = 225 degrees, wrapped to -135
        assert!((reading.euler.x + 135.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_angular_velocity_axes() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let reading = tracker
            .process_packet_at(
                packet(Vec3::new(1.0, 0.5, -0.25), [0.0; 3]).as_bytes(),
                Instant::now(),
                &mut head,
            )
            .unwrap();
        let expected = Vec3::new(
            (-0.25f32).to_degrees(),
            (-1.0f32).to_degrees(),
            0.5f32.to_degrees(),
        );
        assert!((reading.angular_velocity - expected).length() < 1.0e-3);
    }

    #[test]
    fn test_rate_measured_every_window() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let start = Instant::now();
        let data = packet(Vec3::ZERO, [0.0; 3]);

        for i in 0..100u64 {
            let at = start + Duration::from_millis(10 * i);
            tracker.process_packet_at(data.as_bytes(), at, &mut head);
        }
        assert_eq!(tracker.packets(), 100);
        // 100 packets over 99 intervals of 10 ms
        assert!((tracker.hz() - 100.0 / 0.99).abs() < 0.5);

        let reading = tracker
            .process_packet_at(data.as_bytes(), start + Duration::from_millis(1000), &mut head)
            .unwrap();
        assert!((reading.dt - 1.0 / tracker.hz()).abs() < 1.0e-6);
    }

    #[test]
    fn test_filter_follows_gyro_then_clamps() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let start = Instant::now();
        let still = packet(Vec3::ZERO, [0.0; 3]);
        for i in 0..100u64 {
            let at = start + Duration::from_millis(10 * i);
            tracker.process_packet_at(still.as_bytes(), at, &mut head);
        }

        // spinning hard in yaw: gyro z drives yaw
        let spin = packet(Vec3::new(0.0, 0.0, 20.0), [0.0; 3]);
        for i in 100..400u64 {
            let at = start + Duration::from_millis(10 * i);
            tracker.process_packet_at(spin.as_bytes(), at, &mut head);
        }
        assert_eq!(head.yaw, 90.0);
        assert!(head.pitch.abs() < 1.0e-3);
    }

    #[test]
    fn test_non_finite_first_packet_does_not_become_neutral() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let now = Instant::now();

        let nan = packet(Vec3::ZERO, [f32::NAN, 0.0, 0.0]);
        assert!(tracker.process_packet_at(nan.as_bytes(), now, &mut head).is_none());
        assert_eq!(tracker.packets(), 0);

        tracker.process_packet_at(packet(Vec3::ZERO, [0.0; 3]).as_bytes(), now, &mut head);
        let reading = tracker
            .process_packet_at(packet(Vec3::ZERO, [0.1, 0.0, 0.0]).as_bytes(), now, &mut head)
            .unwrap();
        assert!((reading.euler.z - 18.0).abs() < 1.0e-4);
        assert!((head.roll - 18.0).abs() < 1.0e-4);
    }

    #[test]
    fn test_non_finite_packet_after_rate_is_known_leaves_head_finite() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        let start = Instant::now();
        let still = packet(Vec3::ZERO, [0.0; 3]);
        for i in 0..100u64 {
            let at = start + Duration::from_millis(10 * i);
            tracker.process_packet_at(still.as_bytes(), at, &mut head);
        }
        assert!(tracker.hz() > 0.0);

        let at = start + Duration::from_millis(1000);
        let nan = packet(Vec3::ZERO, [0.0, 0.0, f32::NAN]);
        let inf = packet(Vec3::new(f32::INFINITY, 0.0, 0.0), [0.0; 3]);
        assert!(tracker.process_packet_at(nan.as_bytes(), at, &mut head).is_none());
        assert!(tracker.process_packet_at(inf.as_bytes(), at, &mut head).is_none());
        assert_eq!(tracker.packets(), 100);

        for i in 101..200u64 {
            let at = start + Duration::from_millis(10 * i);
            tracker.process_packet_at(still.as_bytes(), at, &mut head);
        }
        assert!(head.yaw.is_finite() && head.pitch.is_finite() && head.roll.is_finite());
        assert!(head.roll.abs() < 1.0e-3);
    }

    #[test]
    fn test_zero_rate_window_measures_every_packet() {
        let settings = SensorSettings { rate_window_packets: 0, ..Default::default() };
        let mut tracker = HeadTracker::new(settings);
        let mut head = head();
        let start = Instant::now();
        let still = packet(Vec3::ZERO, [0.0; 3]);

        tracker.process_packet_at(still.as_bytes(), start, &mut head);
        tracker.process_packet_at(still.as_bytes(), start + Duration::from_millis(10), &mut head);
        assert!((tracker.hz() - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_malformed_packet_is_ignored() {
        let mut tracker = HeadTracker::default();
        let mut head = head();
        head.yaw = 7.0;
        assert!(tracker.process_packet_at(b"hello", Instant::now(), &mut head).is_none());
        assert_eq!(tracker.packets(), 0);
        assert_eq!(head.yaw, 7.0);
        assert!(head.return_to_center);
    }
}
