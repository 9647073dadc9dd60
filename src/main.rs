use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use slv_avatar::networking::{encode_snapshot, SnapshotInbox, SnapshotScheduler, SnapshotSender};
use slv_avatar::utils::logging::{init_logging, log_system_info};
use slv_avatar::world::{Avatar, AvatarEvent, DriveKeys, Roster, Skeleton, StaticSphere};
use slv_avatar::{create_settings_handle, load_or_default, SettingsHandle, APP_NAME, VERSION};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

const FRAME_HZ: f32 = 60.0;
const DEMO_SECONDS: f32 = 6.0;
const WALK_SECONDS: f32 = 1.0;
const RENDER_EXPORT: &str = "render_snapshot.json";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging().context("Failed to initialize logging")?;
    log_system_info();
    info!("{} {} starting headless simulation", APP_NAME, VERSION);

    let mut settings = load_or_default();
    if settings.world.obstacles.is_empty() {
        // a ball resting on the floor in front of the spawn point
        settings.world.obstacles.push(StaticSphere::new(Vec3::new(0.0, 0.3, 2.0), 0.3));
    }
    let settings = create_settings_handle(settings);
    let skeleton = Arc::new(Skeleton::standard());

    let (sender, inbox) = SnapshotInbox::channel();
    let mut roster = Roster::new(skeleton.clone(), settings.clone()).with_inbox(inbox);
    let local_id = roster.spawn_local();

    let peer_id = Uuid::new_v4();
    let peer = tokio::spawn(run_peer(peer_id, skeleton, settings.clone(), sender));

    let dt = 1.0 / FRAME_HZ;
    let frames = (DEMO_SECONDS * FRAME_HZ) as u32;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    let mut scheduler = SnapshotScheduler::from_settings(&settings.network);

    for frame in 0..frames {
        ticker.tick().await;
        let elapsed = frame as f32 * dt;

        if let Some(local) = roster.local_mut() {
            if elapsed < WALK_SECONDS {
                local.set_drive_keys(DriveKeys::FORWARD);
            } else {
                local.set_drive_keys(DriveKeys::empty());
                local.set_hand_movement(Vec2::new(0.0, -0.15));
                local.set_pointer_pressed(true);
            }
        }

        roster.tick(dt);

        for event in roster.drain_events() {
            match event {
                AvatarEvent::ModeChanged(e) => info!("🚶 {} is now {}", e.avatar_id, e.to),
                AvatarEvent::SpringsActivated(e) => info!("🦴 Springs woke up on {}", e.avatar_id),
                AvatarEvent::InteractionStarted(e) => {
                    info!("🤝 {} reached for {}", e.avatar_id, e.other_id)
                }
                AvatarEvent::InteractionEnded(e) => {
                    info!("🤝 {} let go of {}", e.avatar_id, e.other_id)
                }
            }
        }

        if scheduler.advance(dt) {
            if let Some(snapshot) = roster.local_snapshot() {
                let frame_bytes =
                    encode_snapshot(&snapshot).context("Failed to encode local snapshot")?;
                debug!("📤 Local snapshot ready: {} bytes", frame_bytes.len());
            }
        }
    }

    peer.abort();

    let local = roster.local().context("Local avatar missing from roster")?;
    info!(
        "🏁 Finished {} ticks: local {} at {:?}, mode {}, interacting with {:?}",
        roster.tick_count(),
        local_id,
        local.position(),
        local.mode(),
        local.interacting_other()
    );

    let json = local
        .render_snapshot()
        .to_json()
        .context("Failed to serialize render snapshot")?;
    std::fs::write(RENDER_EXPORT, json)
        .with_context(|| format!("Failed to write {}", RENDER_EXPORT))?;
    info!("🖼️ Render snapshot written to {}", RENDER_EXPORT);

    Ok(())
}

/// A remote peer simulating its own avatar and streaming snapshots over the inbox
async fn run_peer(
    id: Uuid,
    skeleton: Arc<Skeleton>,
    settings: SettingsHandle,
    sender: SnapshotSender,
) {
    let mut avatar = Avatar::new(id, true, skeleton, settings.clone());
    avatar.set_body_yaw(90.0);
    let standing = avatar.skeleton().standing_height();
    avatar.teleport(Vec3::new(-0.45, standing, 0.0));
    avatar.set_pointer_pressed(true);

    let dt = 1.0 / settings.network.snapshot_hz;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    loop {
        ticker.tick().await;
        avatar.simulate(dt, &mut [], &settings.world.obstacles);
        if let Err(e) = sender.send_snapshot(&avatar.snapshot()) {
            warn!("📤 Peer {} stopped streaming: {}", id, e);
            break;
        }
    }
}
