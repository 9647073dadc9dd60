//! Right-arm inverse kinematics
//!
//! Analytic two-bone approximation: the hand is placed from pointer input,
//! clamped to the arm's reach, then the elbow and wrist are derived from it.
//! The order hand -> clamp -> elbow -> wrist matters.

use super::pose::BoneStates;
use super::skeleton::{BoneId, Skeleton};
use crate::config::HandSettings;
use crate::utils::math::{direction_and_length, Orientation, MIN_DISTANCE};
use glam::{Vec2, Vec3};

/// Result of one arm solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmSolution {
    pub hand: Vec3,
    pub elbow: Vec3,
    pub wrist: Vec3,
    /// Whether the hand had to be pulled back onto the reach sphere
    pub clamped: bool,
}

/// World-space hand offset for a 2D pointer delta
pub fn hand_movement_offset(body: Orientation, movement: Vec2, settings: &HandSettings) -> Vec3 {
    body.right() * movement.x
        + body.up() * (-movement.y * settings.vertical_weight)
        + body.front() * -movement.y
}

/// Clamp the hand to `max_arm_length` around the shoulder and place elbow and wrist
pub fn solve_arm(
    shoulder: Vec3,
    hand: Vec3,
    front: Vec3,
    max_arm_length: f32,
    wrist_fraction: f32,
) -> ArmSolution {
    let mut arm = hand - shoulder;
    let mut distance = arm.length();
    let mut hand = hand;
    let mut clamped = false;

    if distance > max_arm_length {
        if let Some((direction, _)) = direction_and_length(arm) {
            arm = direction * max_arm_length;
            distance = max_arm_length;
            hand = shoulder + arm;
            clamped = true;
        }
    }

    // the elbow bows out sideways as the arm folds, and sits on the line at full reach
    let mut elbow = shoulder + arm * 0.5;
    if distance > MIN_DISTANCE {
        let perpendicular = front.cross(arm);
        elbow += perpendicular * (1.0 - max_arm_length / distance) * 0.5;
    }

    let wrist = elbow + (hand - elbow) * wrist_fraction;

    ArmSolution { hand, elbow, wrist, clamped }
}

/// Apply pointer-driven hand movement to the right hand's rigid position
pub fn apply_hand_movement(
    body: Orientation,
    movement: Vec2,
    settings: &HandSettings,
    bones: &mut BoneStates,
) {
    bones[BoneId::RightHand.index()].rigid_position +=
        hand_movement_offset(body, movement, settings);
}

/// Constrain the right arm and write hand, elbow and wrist rigid positions back
pub fn update_arm_ik_and_constraints(
    skeleton: &Skeleton,
    body: Orientation,
    settings: &HandSettings,
    bones: &mut BoneStates,
) -> ArmSolution {
    let solution = solve_arm(
        bones[BoneId::RightShoulder.index()].rigid_position,
        bones[BoneId::RightHand.index()].rigid_position,
        body.front(),
        skeleton.max_arm_length(),
        settings.wrist_fraction,
    );

    bones[BoneId::RightHand.index()].rigid_position = solution.hand;
    bones[BoneId::RightUpperArm.index()].rigid_position = solution.elbow;
    bones[BoneId::RightForearm.index()].rigid_position = solution.wrist;

    solution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::pose::propagate;
    use crate::world::skeleton::SkeletonTemplate;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1.0e-5
    }

    /// Standard skeleton with a 0.2 reach: 0.1 + 0.05 + 0.05
    fn short_arm_skeleton() -> Skeleton {
        let mut template = SkeletonTemplate::standard();
        template.bone_mut(BoneId::RightForearm).unwrap().rest_offset = Vec3::new(0.0, -0.05, 0.0);
        Skeleton::build(&template).unwrap()
    }

    #[test]
    fn test_far_target_is_clamped_to_reach() {
        let skeleton = short_arm_skeleton();
        assert!(approx(skeleton.max_arm_length(), 0.2));

        let body = Orientation::from_yaw(-90.0);
        let mut bones = BoneStates::default();
        propagate(&skeleton, Vec3::new(0.0, 0.32, 0.0), body, None, &mut bones);

        let settings = HandSettings::default();
        apply_hand_movement(body, Vec2::new(100.0, 0.0), &settings, &mut bones);
        let solution = update_arm_ik_and_constraints(&skeleton, body, &settings, &mut bones);

        assert!(solution.clamped);
        let shoulder = bones[BoneId::RightShoulder.index()].rigid_position;
        let hand = bones[BoneId::RightHand.index()].rigid_position;
        assert!(approx((hand - shoulder).length(), 0.2));
    }

    #[test]
    fn test_clamp_never_exceeds_reach_in_any_direction() {
        let shoulder = Vec3::new(0.1, 1.0, -0.3);
        for (i, target) in [
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.0, -3.0, 0.2),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(0.0, 0.0, 0.26),
        ]
        .into_iter()
        .enumerate()
        {
            let solution = solve_arm(shoulder, shoulder + target, Vec3::Z, 0.25, 0.7);
            let reach = (solution.hand - shoulder).length();
            assert!(reach <= 0.25 + 1.0e-5, "case {} reached {}", i, reach);
            assert!(approx(reach, 0.25));
        }
    }

    #[test]
    fn test_target_within_reach_is_untouched() {
        let shoulder = Vec3::ZERO;
        let hand = Vec3::new(0.0, -0.1, 0.05);
        let solution = solve_arm(shoulder, hand, Vec3::Z, 0.25, 0.7);
        assert!(!solution.clamped);
        assert_eq!(solution.hand, hand);
    }

    #[test]
    fn test_full_reach_puts_elbow_on_the_arm_line() {
        let shoulder = Vec3::new(0.0, 1.0, 0.0);
        let solution = solve_arm(shoulder, shoulder + Vec3::new(3.0, 0.0, 0.0), Vec3::Z, 0.25, 0.7);
        assert!((solution.elbow - (shoulder + Vec3::new(0.125, 0.0, 0.0))).length() < 1.0e-5);
    }

    #[test]
    fn test_folded_arm_bows_elbow_and_places_wrist() {
        let shoulder = Vec3::ZERO;
        let hand = Vec3::new(0.0, -0.125, 0.0);
        let solution = solve_arm(shoulder, hand, Vec3::Z, 0.25, 0.7);

        // half reach: perpendicular term = cross(front, arm) * (1 - 2) * 0.5
        let expected_elbow = Vec3::new(0.0, -0.0625, 0.0) + Vec3::Z.cross(hand) * -0.5;
        assert!((solution.elbow - expected_elbow).length() < 1.0e-6);

        let expected_wrist = solution.elbow + (hand - solution.elbow) * 0.7;
        assert!((solution.wrist - expected_wrist).length() < 1.0e-6);
    }

    #[test]
    fn test_hand_at_shoulder_does_not_divide_by_zero() {
        let solution = solve_arm(Vec3::ONE, Vec3::ONE, Vec3::Z, 0.25, 0.7);
        assert!(solution.elbow.is_finite());
        assert_eq!(solution.elbow, Vec3::ONE);
    }

    #[test]
    fn test_pointer_y_weights_vertical_at_half() {
        let settings = HandSettings::default();
        let offset = hand_movement_offset(Orientation::identity(), Vec2::new(0.0, 1.0), &settings);
        assert!((offset - Vec3::new(0.0, -0.5, -1.0)).length() < 1.0e-6);
    }
}
