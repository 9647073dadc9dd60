//! Skeleton model
//!
//! The avatar skeleton has a fixed set of bone slots shared by every avatar.
//! A [`SkeletonTemplate`] authors the hierarchy and rest pose as a plain data
//! table; [`Skeleton::build`] validates it into a tree, derives bone lengths
//! and body scalars, and precomputes the root-to-leaf propagation order.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

pub const BONE_COUNT: usize = 23;

const DEFAULT_SPRING_TIGHTNESS: f32 = 4.0;

/// Skeleton slot identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneId {
    PelvisSpine,
    MidSpine,
    ChestSpine,
    Neck,
    Head,
    LeftChest,
    LeftShoulder,
    LeftUpperArm,
    LeftForearm,
    LeftHand,
    RightChest,
    RightShoulder,
    RightUpperArm,
    RightForearm,
    RightHand,
    LeftPelvis,
    LeftThigh,
    LeftShin,
    LeftFoot,
    RightPelvis,
    RightThigh,
    RightShin,
    RightFoot,
}

impl BoneId {
    pub const ALL: [BoneId; BONE_COUNT] = [
        BoneId::PelvisSpine,
        BoneId::MidSpine,
        BoneId::ChestSpine,
        BoneId::Neck,
        BoneId::Head,
        BoneId::LeftChest,
        BoneId::LeftShoulder,
        BoneId::LeftUpperArm,
        BoneId::LeftForearm,
        BoneId::LeftHand,
        BoneId::RightChest,
        BoneId::RightShoulder,
        BoneId::RightUpperArm,
        BoneId::RightForearm,
        BoneId::RightHand,
        BoneId::LeftPelvis,
        BoneId::LeftThigh,
        BoneId::LeftShin,
        BoneId::LeftFoot,
        BoneId::RightPelvis,
        BoneId::RightThigh,
        BoneId::RightShin,
        BoneId::RightFoot,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BoneId::PelvisSpine => "pelvis_spine",
            BoneId::MidSpine => "mid_spine",
            BoneId::ChestSpine => "chest_spine",
            BoneId::Neck => "neck",
            BoneId::Head => "head",
            BoneId::LeftChest => "left_chest",
            BoneId::LeftShoulder => "left_shoulder",
            BoneId::LeftUpperArm => "left_upper_arm",
            BoneId::LeftForearm => "left_forearm",
            BoneId::LeftHand => "left_hand",
            BoneId::RightChest => "right_chest",
            BoneId::RightShoulder => "right_shoulder",
            BoneId::RightUpperArm => "right_upper_arm",
            BoneId::RightForearm => "right_forearm",
            BoneId::RightHand => "right_hand",
            BoneId::LeftPelvis => "left_pelvis",
            BoneId::LeftThigh => "left_thigh",
            BoneId::LeftShin => "left_shin",
            BoneId::LeftFoot => "left_foot",
            BoneId::RightPelvis => "right_pelvis",
            BoneId::RightThigh => "right_thigh",
            BoneId::RightShin => "right_shin",
            BoneId::RightFoot => "right_foot",
        }
    }
}

impl fmt::Display for BoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn default_collidable() -> bool {
    true
}

fn default_spring_tightness() -> f32 {
    DEFAULT_SPRING_TIGHTNESS
}

/// One authored row of the bone table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneDef {
    pub id: BoneId,
    pub parent: Option<BoneId>,
    /// Offset from the parent in the default pose
    pub rest_offset: Vec3,
    pub radius: f32,
    #[serde(default = "default_collidable")]
    pub collidable: bool,
    #[serde(default = "default_spring_tightness")]
    pub spring_tightness: f32,
}

impl BoneDef {
    pub fn new(id: BoneId, parent: Option<BoneId>, rest_offset: Vec3, radius: f32) -> Self {
        Self {
            id,
            parent,
            rest_offset,
            radius,
            collidable: true,
            spring_tightness: DEFAULT_SPRING_TIGHTNESS,
        }
    }

    pub fn non_collidable(mut self) -> Self {
        self.collidable = false;
        self
    }
}

/// Authored bone table, in any row order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonTemplate {
    pub bones: Vec<BoneDef>,
}

impl SkeletonTemplate {
    /// The default humanoid avatar
    pub fn standard() -> Self {
        use BoneId::*;

        let bones = vec![
            BoneDef::new(PelvisSpine, None, Vec3::new(0.0, 0.0, 0.0), 0.05),
            BoneDef::new(MidSpine, Some(PelvisSpine), Vec3::new(0.0, 0.1, 0.0), 0.06),
            BoneDef::new(ChestSpine, Some(MidSpine), Vec3::new(0.0, 0.06, 0.0), 0.03),
            BoneDef::new(Neck, Some(ChestSpine), Vec3::new(0.0, 0.06, 0.0), 0.02),
            BoneDef::new(Head, Some(Neck), Vec3::new(0.0, 0.06, 0.0), 0.02),
            BoneDef::new(LeftChest, Some(MidSpine), Vec3::new(-0.05, 0.05, 0.0), 0.025),
            BoneDef::new(LeftShoulder, Some(LeftChest), Vec3::new(-0.03, 0.0, 0.0), 0.02),
            BoneDef::new(LeftUpperArm, Some(LeftShoulder), Vec3::new(0.0, -0.1, 0.0), 0.015),
            BoneDef::new(LeftForearm, Some(LeftUpperArm), Vec3::new(0.0, -0.1, 0.0), 0.015),
            BoneDef::new(LeftHand, Some(LeftForearm), Vec3::new(0.0, -0.05, 0.0), 0.01),
            BoneDef::new(RightChest, Some(MidSpine), Vec3::new(0.05, 0.05, 0.0), 0.025),
            BoneDef::new(RightShoulder, Some(RightChest), Vec3::new(0.03, 0.0, 0.0), 0.02),
            // the right arm stays out of avatar collisions so hands can be shaken and held
            BoneDef::new(RightUpperArm, Some(RightShoulder), Vec3::new(0.0, -0.1, 0.0), 0.015)
                .non_collidable(),
            BoneDef::new(RightForearm, Some(RightUpperArm), Vec3::new(0.0, -0.1, 0.0), 0.015)
                .non_collidable(),
            BoneDef::new(RightHand, Some(RightForearm), Vec3::new(0.0, -0.05, 0.0), 0.01)
                .non_collidable(),
            BoneDef::new(LeftPelvis, Some(PelvisSpine), Vec3::new(-0.05, 0.0, 0.0), 0.02),
            BoneDef::new(LeftThigh, Some(LeftPelvis), Vec3::new(0.0, -0.15, 0.0), 0.02),
            BoneDef::new(LeftShin, Some(LeftThigh), Vec3::new(0.0, -0.15, 0.0), 0.015),
            BoneDef::new(LeftFoot, Some(LeftShin), Vec3::new(0.0, 0.0, 0.04), 0.02),
            BoneDef::new(RightPelvis, Some(PelvisSpine), Vec3::new(0.05, 0.0, 0.0), 0.02),
            BoneDef::new(RightThigh, Some(RightPelvis), Vec3::new(0.0, -0.15, 0.0), 0.02),
            BoneDef::new(RightShin, Some(RightThigh), Vec3::new(0.0, -0.15, 0.0), 0.015),
            BoneDef::new(RightFoot, Some(RightShin), Vec3::new(0.0, 0.0, 0.04), 0.02),
        ];

        Self { bones }
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut BoneDef> {
        self.bones.iter_mut().find(|b| b.id == id)
    }
}

impl Default for SkeletonTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkeletonError {
    #[error("Bone {bone} appears more than once")]
    DuplicateBone { bone: BoneId },

    #[error("Bone {bone} is missing from the template")]
    MissingBone { bone: BoneId },

    #[error("Skeleton has no root bone")]
    NoRoot,

    #[error("Skeleton has more than one root: {first} and {second}")]
    MultipleRoots { first: BoneId, second: BoneId },

    #[error("Bone {bone} is part of a parent cycle")]
    Cycle { bone: BoneId },

    #[error("Bone {bone} has a non-finite rest offset")]
    InvalidOffset { bone: BoneId },

    #[error("Bone {bone} has invalid radius {radius}")]
    InvalidRadius { bone: BoneId, radius: f32 },

    #[error("Bone {bone} has invalid spring tightness {tightness}")]
    InvalidTightness { bone: BoneId, tightness: f32 },
}

/// Validated, immutable per-bone constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneSpec {
    pub id: BoneId,
    pub parent: Option<BoneId>,
    pub rest_offset: Vec3,
    pub length: f32,
    pub radius: f32,
    pub collidable: bool,
    pub spring_tightness: f32,
}

/// Validated skeleton shared by every avatar built from the same template
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<BoneSpec>,
    order: Vec<BoneId>,
    root: BoneId,
    max_arm_length: f32,
    standing_height: f32,
    height: f32,
}

impl Skeleton {
    /// Validate a template and derive the skeleton constants
    pub fn build(template: &SkeletonTemplate) -> Result<Self, SkeletonError> {
        let mut slots: Vec<Option<BoneSpec>> = vec![None; BONE_COUNT];

        for def in &template.bones {
            if !def.rest_offset.is_finite() {
                return Err(SkeletonError::InvalidOffset { bone: def.id });
            }
            if !def.radius.is_finite() || def.radius < 0.0 {
                return Err(SkeletonError::InvalidRadius { bone: def.id, radius: def.radius });
            }
            if !def.spring_tightness.is_finite() || def.spring_tightness < 0.0 {
                return Err(SkeletonError::InvalidTightness {
                    bone: def.id,
                    tightness: def.spring_tightness,
                });
            }

            let slot = &mut slots[def.id.index()];
            if slot.is_some() {
                return Err(SkeletonError::DuplicateBone { bone: def.id });
            }
            *slot = Some(BoneSpec {
                id: def.id,
                parent: def.parent,
                rest_offset: def.rest_offset,
                length: def.rest_offset.length(),
                radius: def.radius,
                collidable: def.collidable,
                spring_tightness: def.spring_tightness,
            });
        }

        let mut bones = Vec::with_capacity(BONE_COUNT);
        for (slot, id) in slots.into_iter().zip(BoneId::ALL) {
            match slot {
                Some(spec) => bones.push(spec),
                None => return Err(SkeletonError::MissingBone { bone: id }),
            }
        }

        let mut roots = bones.iter().filter(|b| b.parent.is_none()).map(|b| b.id);
        let root = roots.next().ok_or(SkeletonError::NoRoot)?;
        if let Some(second) = roots.next() {
            return Err(SkeletonError::MultipleRoots { first: root, second });
        }

        let order = propagation_order(&bones, root)?;

        let length = |id: BoneId| bones[id.index()].length;
        let radius = |id: BoneId| bones[id.index()].radius;

        let max_arm_length = length(BoneId::RightUpperArm)
            + length(BoneId::RightForearm)
            + length(BoneId::RightHand);

        let standing_height = radius(BoneId::LeftFoot)
            + length(BoneId::LeftShin)
            + length(BoneId::LeftThigh)
            + length(BoneId::PelvisSpine);

        let height = standing_height
            + length(BoneId::MidSpine)
            + length(BoneId::ChestSpine)
            + length(BoneId::Neck)
            + length(BoneId::Head)
            + radius(BoneId::Head);

        Ok(Self {
            bones,
            order,
            root,
            max_arm_length,
            standing_height,
            height,
        })
    }

    /// The default humanoid skeleton
    pub fn standard() -> Self {
        Self::build(&SkeletonTemplate::standard()).expect("standard skeleton table is a valid tree")
    }

    pub fn bone(&self, id: BoneId) -> &BoneSpec {
        &self.bones[id.index()]
    }

    pub fn bones(&self) -> &[BoneSpec] {
        &self.bones
    }

    /// Root-to-leaf order: every parent precedes its children
    pub fn order(&self) -> &[BoneId] {
        &self.order
    }

    pub fn root(&self) -> BoneId {
        self.root
    }

    pub fn max_arm_length(&self) -> f32 {
        self.max_arm_length
    }

    /// Pelvis height above the ground when standing
    pub fn standing_height(&self) -> f32 {
        self.standing_height
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::standard()
    }
}

/// Breadth-first order from the root; any bone not reached hangs off a cycle
fn propagation_order(bones: &[BoneSpec], root: BoneId) -> Result<Vec<BoneId>, SkeletonError> {
    let mut children: Vec<Vec<BoneId>> = vec![Vec::new(); BONE_COUNT];
    for bone in bones {
        if let Some(parent) = bone.parent {
            children[parent.index()].push(bone.id);
        }
    }

    let mut order = Vec::with_capacity(BONE_COUNT);
    let mut visited = [false; BONE_COUNT];
    let mut queue = VecDeque::from([root]);
    visited[root.index()] = true;

    while let Some(id) = queue.pop_front() {
        order.push(id);
        for &child in &children[id.index()] {
            if !visited[child.index()] {
                visited[child.index()] = true;
                queue.push_back(child);
            }
        }
    }

    if let Some(bone) = BoneId::ALL.iter().copied().find(|b| !visited[b.index()]) {
        return Err(SkeletonError::Cycle { bone });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_skeleton_scalars() {
        let skeleton = Skeleton::standard();
        assert_eq!(skeleton.root(), BoneId::PelvisSpine);
        assert!((skeleton.max_arm_length() - 0.25).abs() < 1.0e-6);
        assert!((skeleton.standing_height() - 0.32).abs() < 1.0e-6);
        assert!((skeleton.height() - 0.62).abs() < 1.0e-6);
        assert!((skeleton.bone(BoneId::LeftFoot).length - 0.04).abs() < 1.0e-6);
    }

    #[test]
    fn test_right_arm_is_not_collidable() {
        let skeleton = Skeleton::standard();
        for id in [BoneId::RightUpperArm, BoneId::RightForearm, BoneId::RightHand] {
            assert!(!skeleton.bone(id).collidable, "{} should not collide", id);
        }
        assert!(skeleton.bone(BoneId::LeftHand).collidable);
        assert!(skeleton.bone(BoneId::RightShoulder).collidable);
    }

    #[test]
    fn test_order_puts_parents_first_even_when_table_is_shuffled() {
        let mut template = SkeletonTemplate::standard();
        template.bones.reverse();
        let skeleton = Skeleton::build(&template).unwrap();

        let order = skeleton.order();
        assert_eq!(order.len(), BONE_COUNT);
        assert_eq!(order[0], BoneId::PelvisSpine);
        for (position, id) in order.iter().enumerate() {
            if let Some(parent) = skeleton.bone(*id).parent {
                let parent_position = order.iter().position(|b| *b == parent).unwrap();
                assert!(parent_position < position, "{} before its parent {}", id, parent);
            }
        }
    }

    #[test]
    fn test_missing_bone_rejected() {
        let mut template = SkeletonTemplate::standard();
        template.bones.retain(|b| b.id != BoneId::LeftFoot);
        assert_eq!(
            Skeleton::build(&template).unwrap_err(),
            SkeletonError::MissingBone { bone: BoneId::LeftFoot }
        );
    }

    #[test]
    fn test_duplicate_bone_rejected() {
        let mut template = SkeletonTemplate::standard();
        let copy = template.bones[3].clone();
        template.bones.push(copy);
        assert_eq!(
            Skeleton::build(&template).unwrap_err(),
            SkeletonError::DuplicateBone { bone: BoneId::Neck }
        );
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let mut template = SkeletonTemplate::standard();
        template.bone_mut(BoneId::LeftPelvis).unwrap().parent = None;
        assert_eq!(
            Skeleton::build(&template).unwrap_err(),
            SkeletonError::MultipleRoots { first: BoneId::PelvisSpine, second: BoneId::LeftPelvis }
        );
    }

    #[test]
    fn test_no_root_rejected() {
        let mut template = SkeletonTemplate::standard();
        template.bone_mut(BoneId::PelvisSpine).unwrap().parent = Some(BoneId::Head);
        assert_eq!(Skeleton::build(&template).unwrap_err(), SkeletonError::NoRoot);
    }

    #[test]
    fn test_cycle_rejected() {
        let mut template = SkeletonTemplate::standard();
        // neck -> head -> neck, detached from the pelvis
        template.bone_mut(BoneId::Neck).unwrap().parent = Some(BoneId::Head);
        assert_eq!(
            Skeleton::build(&template).unwrap_err(),
            SkeletonError::Cycle { bone: BoneId::Neck }
        );
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut template = SkeletonTemplate::standard();
        template.bone_mut(BoneId::Head).unwrap().radius = -1.0;
        assert!(matches!(
            Skeleton::build(&template),
            Err(SkeletonError::InvalidRadius { bone: BoneId::Head, .. })
        ));
    }

    #[test]
    fn test_template_from_toml() {
        let template: SkeletonTemplate = toml::from_str(
            r#"
            [[bones]]
            id = "pelvis_spine"
            rest_offset = [0.0, 0.0, 0.0]
            radius = 0.05

            [[bones]]
            id = "right_hand"
            parent = "right_forearm"
            rest_offset = [0.0, -0.05, 0.0]
            radius = 0.01
            collidable = false
            "#,
        )
        .unwrap();
        assert_eq!(template.bones.len(), 2);
        assert_eq!(template.bones[0].parent, None);
        assert_eq!(template.bones[0].spring_tightness, 4.0);
        assert!(!template.bones[1].collidable);
        assert!(matches!(
            Skeleton::build(&template),
            Err(SkeletonError::MissingBone { .. })
        ));
    }
}
