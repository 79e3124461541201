//! # Motion Generators
//!
//! Pure control laws, one per [`GeneratorType`](super::catalog::GeneratorType).
//! Each maps the decoded command targets, live sensor state and a catalog
//! entry's parameters to attitude/thrust setpoints.
//!
//! Sign convention: x error drives pitch, y error drives roll.
//!
//! The float operation order in this module is part of the contract; keep it
//! stable so that outputs stay bit-identical across builds.

use super::catalog::PatternEntry;
use crate::protocol::types::{MotorSetpoints, SensorState, Vec3};

/// Base hover thrust (of 65535)
pub const HOVER_THRUST: f32 = 37500.0;
/// Position error → attitude, degrees per meter
pub const POS_P_GAIN: f32 = 15.0;
/// Velocity error → attitude, degrees per m/s
pub const VEL_P_GAIN: f32 = 8.0;
/// Altitude error → thrust offset
pub const ALT_P_GAIN: f32 = 8000.0;
/// Max commanded roll/pitch, degrees
pub const MAX_ANGLE_DEG: f32 = 25.0;
pub const THRUST_MIN: f32 = 10000.0;
pub const THRUST_MAX: f32 = 60000.0;

/// Hover altitude used when no usable altitude is available, meters
pub const DEFAULT_HOVER_ALT: f32 = 0.5;
/// Altitude readings below this are treated as "on the ground"
pub const MIN_HOLD_ALT: f32 = 0.1;
pub const DEFAULT_MAX_SPEED: f32 = 1.0;
pub const DEFAULT_WAYPOINT_SPEED: f32 = 0.3;
pub const DEFAULT_ORBIT_RADIUS: f32 = 0.5;
pub const DEFAULT_ORBIT_OMEGA: f32 = 0.5;

/// Waypoint approach slows down linearly inside this distance, meters
const WAYPOINT_SLOWDOWN_RADIUS: f32 = 0.3;
/// Below this 2D distance the waypoint counts as reached
const WAYPOINT_ARRIVED: f32 = 0.01;
/// Speeds below this are never rescaled
const MIN_SPEED: f32 = 0.001;
/// Radial correction needs a defined outward direction
const ORBIT_MIN_RADIUS: f32 = 0.01;
/// Fraction of the position gain used for orbit radius correction
const ORBIT_RADIAL_SCALE: f32 = 0.3;

fn clamp_angle(deg: f32) -> f32 {
    deg.clamp(-MAX_ANGLE_DEG, MAX_ANGLE_DEG)
}

/// Hover thrust plus P-correction from the altitude error.
#[must_use]
pub fn altitude_thrust(current_z: f32, target_z: f32) -> f32 {
    (HOVER_THRUST + ALT_P_GAIN * (target_z - current_z)).clamp(THRUST_MIN, THRUST_MAX)
}

/// Clamp roll/pitch to ±25° and thrust to [10000, 60000].
///
/// Yaw is passed through untouched.
#[must_use]
pub fn clamp_setpoints(sp: MotorSetpoints) -> MotorSetpoints {
    MotorSetpoints {
        roll: clamp_angle(sp.roll),
        pitch: clamp_angle(sp.pitch),
        yaw: sp.yaw,
        thrust: sp.thrust.clamp(THRUST_MIN, THRUST_MAX),
    }
}

/// Level off and hold the current altitude.
///
/// Shared fallback for every error path. Near-zero altitude readings hold
/// [`DEFAULT_HOVER_ALT`] instead.
#[must_use]
pub fn emergency_hover(state: &SensorState) -> MotorSetpoints {
    let current_z = state.position.z;
    let target_z = if current_z < MIN_HOLD_ALT { DEFAULT_HOVER_ALT } else { current_z };
    MotorSetpoints {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        thrust: altitude_thrust(current_z, target_z),
    }
}

/// Hold position at `target`. Slot 0 = altitude (fallback 0.5 m); a
/// positive altitude replaces `target.z`.
#[must_use]
pub fn position_hold(state: &SensorState, target: Vec3, entry: &PatternEntry) -> MotorSetpoints {
    let alt = entry.param(0, DEFAULT_HOVER_ALT);
    let target_z = if alt > 0.0 { alt } else { target.z };
    MotorSetpoints {
        roll: clamp_angle(POS_P_GAIN * (target.y - state.position.y)),
        pitch: clamp_angle(POS_P_GAIN * (target.x - state.position.x)),
        yaw: 0.0,
        thrust: altitude_thrust(state.position.z, target_z),
    }
}

/// Track a horizontal velocity. Slot 0 = max speed (fallback 1.0 m/s).
#[must_use]
pub fn velocity_track(
    state: &SensorState,
    target_vx: f32,
    target_vy: f32,
    target_z: f32,
    entry: &PatternEntry,
) -> MotorSetpoints {
    let max_speed = entry.param(0, DEFAULT_MAX_SPEED);
    let (mut vx, mut vy) = (target_vx, target_vy);
    let speed = (vx * vx + vy * vy).sqrt();
    if speed > max_speed && speed > MIN_SPEED {
        let scale = max_speed / speed;
        vx *= scale;
        vy *= scale;
    }
    MotorSetpoints {
        roll: clamp_angle(VEL_P_GAIN * (vy - state.velocity.y)),
        pitch: clamp_angle(VEL_P_GAIN * (vx - state.velocity.x)),
        yaw: 0.0,
        thrust: altitude_thrust(state.position.z, target_z),
    }
}

/// Fly toward `target` at slot 0 speed (fallback 0.3 m/s), slowing
/// linearly inside 0.3 m.
#[must_use]
pub fn waypoint_sequence(state: &SensorState, target: Vec3, entry: &PatternEntry) -> MotorSetpoints {
    let speed = entry.param(0, DEFAULT_WAYPOINT_SPEED);
    let ex = target.x - state.position.x;
    let ey = target.y - state.position.y;
    let dist = (ex * ex + ey * ey).sqrt();

    let (mut vx, mut vy) = (0.0, 0.0);
    if dist > WAYPOINT_ARRIVED {
        let scale = if dist < WAYPOINT_SLOWDOWN_RADIUS {
            (speed * dist / WAYPOINT_SLOWDOWN_RADIUS) / dist
        } else {
            speed / dist
        };
        vx = ex * scale;
        vy = ey * scale;
    }
    velocity_track(state, vx, vy, target.z, entry)
}

/// Hold at `target` plus the slot 0/1/2 offsets (default 0).
#[must_use]
pub fn relative_offset(state: &SensorState, target: Vec3, entry: &PatternEntry) -> MotorSetpoints {
    let shifted = Vec3::new(
        target.x + entry.param(0, 0.0),
        target.y + entry.param(1, 0.0),
        target.z + entry.param(2, 0.0),
    );
    position_hold(state, shifted, entry)
}

/// Counter-clockwise orbit around `center`.
///
/// Slot 0 = radius (fallback 0.5 m), slot 1 = angular rate (fallback
/// 0.5 rad/s). A radial term pulls the drone back to the orbit radius.
#[must_use]
pub fn orbit_center(state: &SensorState, center: Vec3, entry: &PatternEntry) -> MotorSetpoints {
    let radius = entry.param(0, DEFAULT_ORBIT_RADIUS);
    let omega = entry.param(1, DEFAULT_ORBIT_OMEGA);
    let dx = state.position.x - center.x;
    let dy = state.position.y - center.y;
    let angle = dy.atan2(dx);
    let current_r = (dx * dx + dy * dy).sqrt();

    let mut vx = -angle.sin() * omega * radius;
    let mut vy = angle.cos() * omega * radius;

    if current_r > ORBIT_MIN_RADIUS {
        let radial_error = radius - current_r;
        vx += (dx / current_r) * radial_error * POS_P_GAIN * ORBIT_RADIAL_SCALE;
        vy += (dy / current_r) * radial_error * POS_P_GAIN * ORBIT_RADIAL_SCALE;
    }

    MotorSetpoints {
        roll: clamp_angle(VEL_P_GAIN * (vy - state.velocity.y)),
        pitch: clamp_angle(VEL_P_GAIN * (vx - state.velocity.x)),
        yaw: 0.0,
        thrust: altitude_thrust(state.position.z, center.z),
    }
}

/// Spline trajectories are not interpolated; this holds position.
#[must_use]
pub fn trajectory_spline(state: &SensorState, target: Vec3, entry: &PatternEntry) -> MotorSetpoints {
    position_hold(state, target, entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32, z: f32) -> SensorState {
        SensorState {
            position: Vec3::new(x, y, z),
            ..SensorState::default()
        }
    }

    fn entry_with(defaults: &[f32]) -> PatternEntry {
        let mut entry = PatternEntry::default();
        entry.defaults[..defaults.len()].copy_from_slice(defaults);
        entry
    }

    #[test]
    fn test_altitude_thrust() {
        assert_eq!(altitude_thrust(1.0, 1.0), 37500.0);
        assert_eq!(altitude_thrust(0.0, 0.5), 41500.0);
        assert_eq!(altitude_thrust(1.0, 0.5), 33500.0);
        assert_eq!(altitude_thrust(0.0, 10.0), THRUST_MAX);
        assert_eq!(altitude_thrust(10.0, 0.0), THRUST_MIN);
    }

    #[test]
    fn test_clamp_setpoints() {
        let sp = clamp_setpoints(MotorSetpoints {
            roll: 40.0,
            pitch: -90.0,
            yaw: 120.0,
            thrust: 0.0,
        });
        assert_eq!(sp.roll, 25.0);
        assert_eq!(sp.pitch, -25.0);
        assert_eq!(sp.yaw, 120.0);
        assert_eq!(sp.thrust, THRUST_MIN);
    }

    #[test]
    fn test_emergency_hover_holds_current_altitude() {
        let sp = emergency_hover(&at(3.0, -2.0, 1.2));
        assert_eq!(sp.roll, 0.0);
        assert_eq!(sp.pitch, 0.0);
        assert_eq!(sp.yaw, 0.0);
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_emergency_hover_near_ground_uses_default() {
        assert_eq!(emergency_hover(&at(0.0, 0.0, 0.0)).thrust, 41500.0);
        let low = emergency_hover(&at(0.0, 0.0, 0.05));
        assert!((low.thrust - (37500.0 + 8000.0 * 0.45)).abs() < 0.01);
        // 0.1 m is already a valid reading
        assert_eq!(emergency_hover(&at(0.0, 0.0, 0.1)).thrust, HOVER_THRUST);
    }

    #[test]
    fn test_position_hold_proportional() {
        let entry = entry_with(&[1.0]);
        let sp = position_hold(&at(0.0, 0.0, 1.0), Vec3::new(1.0, -0.5, 3.0), &entry);
        assert_eq!(sp.pitch, 15.0);
        assert_eq!(sp.roll, -7.5);
        // Slot 0 altitude overrides the command's z
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_position_hold_default_altitude() {
        let sp = position_hold(&at(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0), &PatternEntry::default());
        assert_eq!(sp.thrust, 41500.0);
    }

    #[test]
    fn test_position_hold_uses_target_z_when_altitude_not_positive() {
        let mut entry = entry_with(&[-1.0]);
        entry.bounds_min[0] = -2.0;
        entry.bounds_max[0] = 0.0;
        let sp = position_hold(&at(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.5), &entry);
        assert_eq!(sp.thrust, 41500.0);
    }

    #[test]
    fn test_position_hold_attitude_limits() {
        let sp = position_hold(&at(0.0, 0.0, 0.5), Vec3::new(10.0, -10.0, 0.0), &PatternEntry::default());
        assert_eq!(sp.pitch, MAX_ANGLE_DEG);
        assert_eq!(sp.roll, -MAX_ANGLE_DEG);
    }

    #[test]
    fn test_velocity_track_within_limit() {
        let sp = velocity_track(&at(0.0, 0.0, 1.0), 0.5, -0.25, 1.0, &PatternEntry::default());
        assert_eq!(sp.pitch, 4.0);
        assert_eq!(sp.roll, -2.0);
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_velocity_track_caps_speed_preserving_direction() {
        let entry = entry_with(&[1.0]);
        // 3-4-5 triangle: speed 5 capped to 1 → (0.6, 0.8)
        let sp = velocity_track(&at(0.0, 0.0, 1.0), 3.0, 4.0, 1.0, &entry);
        assert!((sp.pitch - 4.8).abs() < 1e-4);
        assert!((sp.roll - 6.4).abs() < 1e-4);
    }

    #[test]
    fn test_velocity_track_subtracts_current_velocity() {
        let mut state = at(0.0, 0.0, 1.0);
        state.velocity = Vec3::new(0.5, 0.5, 0.0);
        let sp = velocity_track(&state, 0.5, 0.0, 1.0, &PatternEntry::default());
        assert_eq!(sp.pitch, 0.0);
        assert_eq!(sp.roll, -4.0);
    }

    #[test]
    fn test_waypoint_far_target_full_speed() {
        let entry = entry_with(&[0.3]);
        let sp = waypoint_sequence(&at(0.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 1.0), &entry);
        // vx = 0.3 m/s → pitch 2.4°
        assert!((sp.pitch - 2.4).abs() < 1e-4);
        assert!(sp.roll.abs() < 1e-6);
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_waypoint_decelerates_near_target() {
        let entry = entry_with(&[0.3]);
        let sp = waypoint_sequence(&at(0.0, 0.0, 1.0), Vec3::new(0.0, 0.15, 1.0), &entry);
        // Half the slowdown radius → half speed: vy = 0.15 → roll 1.2°
        assert!((sp.roll - 1.2).abs() < 1e-4);
        assert!(sp.pitch.abs() < 1e-6);
    }

    #[test]
    fn test_waypoint_arrived_stops() {
        let sp = waypoint_sequence(&at(1.0, 1.0, 1.0), Vec3::new(1.005, 1.0, 1.0), &PatternEntry::default());
        assert_eq!(sp.pitch, 0.0);
        assert_eq!(sp.roll, 0.0);
    }

    #[test]
    fn test_relative_offset_shifts_target() {
        let entry = entry_with(&[0.2, 0.4]);
        let sp = relative_offset(&at(0.0, 0.0, 0.2), Vec3::new(1.0, 1.0, 0.0), &entry);
        assert!((sp.pitch - 18.0).abs() < 1e-4);
        assert!((sp.roll - 21.0).abs() < 1e-4);
        // Slot 0 doubles as the hold altitude (0.2 m here)
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_orbit_on_radius_is_pure_tangential() {
        let entry = entry_with(&[1.0, 1.0]);
        let sp = orbit_center(&at(1.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), &entry);
        // At angle 0 the CCW tangent is +y; no radial correction
        assert!(sp.pitch.abs() < 1e-5);
        assert!((sp.roll - 8.0).abs() < 1e-5);
        assert_eq!(sp.thrust, HOVER_THRUST);
    }

    #[test]
    fn test_orbit_radial_correction_pulls_inward() {
        let entry = entry_with(&[1.0, 1.0]);
        let sp = orbit_center(&at(2.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), &entry);
        // vx = (1 - 2) × 15 × 0.3 = -4.5 → pitch -36 → clamped
        assert_eq!(sp.pitch, -MAX_ANGLE_DEG);
        assert!((sp.roll - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_orbit_at_center_skips_radial_term() {
        let sp = orbit_center(&at(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), &PatternEntry::default());
        // atan2(0, 0) = 0 → tangent +y at 0.5 × 0.5
        assert!(sp.pitch.abs() < 1e-6);
        assert!((sp.roll - 8.0 * 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_trajectory_spline_matches_position_hold() {
        let entry = entry_with(&[0.8]);
        let state = at(0.3, -0.2, 0.4);
        let target = Vec3::new(1.0, 1.0, 1.0);
        assert_eq!(trajectory_spline(&state, target, &entry), position_hold(&state, target, &entry));
    }
}
