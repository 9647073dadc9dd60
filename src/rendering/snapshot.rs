use crate::world::{AvatarId, AvatarMode, BoneId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One bone as drawn: a sphere at `position`, linked to its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRender {
    pub id: BoneId,
    pub parent: Option<BoneId>,
    /// Spring position while springs are active, rigid position otherwise
    pub position: Vec3,
    pub radius: f32,
}

/// Read-only view of one avatar after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub avatar_id: AvatarId,
    pub is_local: bool,
    pub bones: Vec<BoneRender>,
    /// World head orientation in degrees: body plus head-local angles
    pub head_yaw: f32,
    pub head_pitch: f32,
    pub head_roll: f32,
    pub grasping: bool,
    pub mode: AvatarMode,
    pub springs_active: bool,
}

impl RenderSnapshot {
    pub fn bone(&self, id: BoneId) -> Option<&BoneRender> {
        self.bones.iter().find(|b| b.id == id)
    }

    /// Parent-to-child segments for line rendering
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.bones.iter().filter_map(move |bone| {
            let parent = self.bone(bone.parent?)?;
            Some((parent.position, bone.position))
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{create_settings_handle, SimulationSettings};
    use crate::world::{Avatar, Skeleton};
    use std::sync::Arc;

    fn snapshot() -> RenderSnapshot {
        let avatar = Avatar::local(
            Arc::new(Skeleton::standard()),
            create_settings_handle(SimulationSettings::default()),
        );
        avatar.render_snapshot()
    }

    #[test]
    fn test_every_non_root_bone_has_a_segment() {
        let snapshot = snapshot();
        assert_eq!(snapshot.segments().count(), snapshot.bones.len() - 1);
    }

    #[test]
    fn test_json_export_names_bones() {
        let json = snapshot().to_json().unwrap();
        assert!(json.contains("\"right_hand\""));
        assert!(json.contains("\"mode\": \"idle\""));

        let parsed: RenderSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.bones.len(), 23);
    }
}
