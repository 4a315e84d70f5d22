//! Log-only surfaces for the headless driver and benchmarks
//!
//! The renderer models a top-down camera centred on the character, so NDC
//! maps linearly onto a square of [`VIEW_HALF_EXTENT`] around it.

use tracing::{debug, info, trace};

use crate::game::state::{EntityId, SpellKind, PLAYER_ID};
use crate::surface::{
    ActorKind, ActorPose, AnimationCue, AssetProvider, HudSnapshot, MenuContext, MenuKind,
    UiSurface, VisualHandle, VisualSender, WorldRenderer,
};
use crate::util::vec2::Vec2;

/// World units from the camera centre to the viewport edge
pub const VIEW_HALF_EXTENT: f32 = 15.0;

/// Inverse of [`HeadlessRenderer::raycast_ground_point`]
pub fn ndc_toward(camera: Vec2, point: Vec2) -> [f32; 2] {
    let offset = point - camera;
    [
        (offset.x / VIEW_HALF_EXTENT).clamp(-1.0, 1.0),
        (-offset.z / VIEW_HALF_EXTENT).clamp(-1.0, 1.0),
    ]
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    camera: Vec2,
    frames: u64,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl WorldRenderer for HeadlessRenderer {
    fn place_actor(&mut self, id: EntityId, kind: ActorKind, pose: ActorPose) {
        if id == PLAYER_ID {
            self.camera = pose.position;
        }
        trace!(id, ?kind, x = pose.position.x, z = pose.position.z, "place");
    }

    fn remove_actor(&mut self, id: EntityId) {
        trace!(id, "remove");
    }

    fn play_animation_cue(&mut self, id: EntityId, cue: AnimationCue) {
        trace!(id, ?cue, "animation cue");
    }

    fn raycast_ground_point(&self, ndc: [f32; 2]) -> Option<Vec2> {
        if !(ndc[0].is_finite() && ndc[1].is_finite()) {
            return None;
        }
        Some(self.camera + Vec2::new(ndc[0] * VIEW_HALF_EXTENT, -ndc[1] * VIEW_HALF_EXTENT))
    }

    fn advance_animations(&mut self, _dt: f32) {}

    fn present(&mut self) {
        self.frames += 1;
    }
}

/// UI that writes everything to the log
#[derive(Debug, Default)]
pub struct LogUi {
    last_hud: Option<HudSnapshot>,
}

impl UiSurface for LogUi {
    fn show_transient_message(&mut self, text: &str, duration_ms: u64) {
        info!("[message {}ms] {}", duration_ms, text);
    }

    fn show_menu(&mut self, kind: MenuKind, context: &MenuContext) {
        info!(
            "[menu] {:?} (score {}, wave {}, {} offers)",
            kind,
            context.score,
            context.wave,
            context.offers.len()
        );
    }

    fn hide_menu(&mut self) {
        debug!("[menu] hidden");
    }

    fn update_hud(&mut self, hud: &HudSnapshot) {
        // only log when something visible changed
        if self.last_hud.as_ref() != Some(hud) {
            trace!(
                health = hud.health,
                score = hud.score,
                wave = hud.wave,
                kills = hud.kills,
                required = hud.required,
                "hud"
            );
            self.last_hud = Some(*hud);
        }
    }

    fn show_cooldown(&mut self, spell: SpellKind, remaining_fraction: f32) {
        trace!(spell = spell.name(), remaining_fraction, "cooldown");
    }
}

/// Completes every request immediately with a sequential handle
#[derive(Debug)]
pub struct InstantAssets {
    sender: VisualSender,
    next_handle: u64,
}

impl InstantAssets {
    pub fn new(sender: VisualSender) -> Self {
        Self {
            sender,
            next_handle: 1,
        }
    }
}

impl AssetProvider for InstantAssets {
    fn request_visual(&mut self, entity: EntityId, kind: ActorKind) {
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        trace!(entity, ?kind, handle = handle.0, "visual ready");
        self.sender.complete(entity, handle);
    }
}
