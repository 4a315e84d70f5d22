//! Recording surface fakes shared by unit tests

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::game::state::{EntityId, SpellKind};
use crate::surface::{
    ActorKind, ActorPose, AnimationCue, AssetProvider, HudSnapshot, MenuContext, MenuKind,
    UiSurface, VisualHandle, VisualSender, WorldRenderer,
};
use crate::util::vec2::Vec2;

/// World units per NDC unit in [`RecordingRenderer::raycast_ground_point`]
pub const NDC_SCALE: f32 = 20.0;

/// NDC that the recording renderer maps back onto `point`
pub fn ndc_for(point: Vec2) -> [f32; 2] {
    [point.x / NDC_SCALE, point.z / NDC_SCALE]
}

#[derive(Debug, Default)]
pub struct RenderLog {
    pub actors: HashMap<EntityId, (ActorKind, ActorPose)>,
    pub placements: usize,
    pub removed: Vec<EntityId>,
    pub cues: Vec<(EntityId, AnimationCue)>,
    pub advanced: f32,
    pub presents: u32,
}

impl RenderLog {
    pub fn count_kind(&self, kind: ActorKind) -> usize {
        self.actors.values().filter(|(k, _)| *k == kind).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub log: Rc<RefCell<RenderLog>>,
}

impl WorldRenderer for RecordingRenderer {
    fn place_actor(&mut self, id: EntityId, kind: ActorKind, pose: ActorPose) {
        let mut log = self.log.borrow_mut();
        log.actors.insert(id, (kind, pose));
        log.placements += 1;
    }

    fn remove_actor(&mut self, id: EntityId) {
        let mut log = self.log.borrow_mut();
        log.actors.remove(&id);
        log.removed.push(id);
    }

    fn play_animation_cue(&mut self, id: EntityId, cue: AnimationCue) {
        self.log.borrow_mut().cues.push((id, cue));
    }

    fn raycast_ground_point(&self, ndc: [f32; 2]) -> Option<Vec2> {
        Some(Vec2::new(ndc[0] * NDC_SCALE, ndc[1] * NDC_SCALE))
    }

    fn advance_animations(&mut self, dt: f32) {
        self.log.borrow_mut().advanced += dt;
    }

    fn present(&mut self) {
        self.log.borrow_mut().presents += 1;
    }
}

#[derive(Debug, Default)]
pub struct UiLog {
    pub messages: Vec<String>,
    pub menus: Vec<(MenuKind, MenuContext)>,
    pub hidden: u32,
    pub hud: Option<HudSnapshot>,
    pub cooldowns: Vec<(SpellKind, f32)>,
}

impl UiLog {
    pub fn last_menu(&self) -> Option<MenuKind> {
        self.menus.last().map(|(kind, _)| *kind)
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    pub log: Rc<RefCell<UiLog>>,
}

impl UiSurface for RecordingUi {
    fn show_transient_message(&mut self, text: &str, _duration_ms: u64) {
        self.log.borrow_mut().messages.push(text.to_string());
    }

    fn show_menu(&mut self, kind: MenuKind, context: &MenuContext) {
        self.log.borrow_mut().menus.push((kind, context.clone()));
    }

    fn hide_menu(&mut self) {
        self.log.borrow_mut().hidden += 1;
    }

    fn update_hud(&mut self, hud: &HudSnapshot) {
        self.log.borrow_mut().hud = Some(*hud);
    }

    fn show_cooldown(&mut self, spell: SpellKind, remaining_fraction: f32) {
        self.log.borrow_mut().cooldowns.push((spell, remaining_fraction));
    }
}

/// Records requests; completes them at once unless `deferred` is set
#[derive(Debug, Clone)]
pub struct RecordingAssets {
    pub requests: Rc<RefCell<Vec<(EntityId, ActorKind)>>>,
    pub deferred: Rc<RefCell<bool>>,
    sender: VisualSender,
}

impl RecordingAssets {
    pub fn new(sender: VisualSender) -> Self {
        Self {
            requests: Rc::default(),
            deferred: Rc::default(),
            sender,
        }
    }

    /// Complete every recorded request (used with `deferred`)
    pub fn complete_all(&self) {
        for (entity, _) in self.requests.borrow().iter() {
            self.sender.complete(*entity, VisualHandle(*entity));
        }
    }

    pub fn complete(&self, entity: EntityId) {
        self.sender.complete(entity, VisualHandle(entity));
    }
}

impl AssetProvider for RecordingAssets {
    fn request_visual(&mut self, entity: EntityId, kind: ActorKind) {
        self.requests.borrow_mut().push((entity, kind));
        if !*self.deferred.borrow() {
            self.sender.complete(entity, VisualHandle(entity));
        }
    }
}
