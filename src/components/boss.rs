use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::engine::net::ResyncFlag;
use crate::fsm::StateId;

// ---------------------------------------------------------------------------
// Behavior states
// ---------------------------------------------------------------------------

/// Every state the boss can be in.
///
/// `Die` and `Vanish` are terminal: no transition leaves them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossState {
    Awaken,

    // Attacks.
    SequentialDashes,
    ButterflyBurstDashes,
    SwirlingStarBurst,
    TwirlingPetalSun,
    OrbitReleasedTerraprismas,

    // Intermediate states.
    Phase2Transition,
    Teleport,
    ResetCycle,

    Die,
    Vanish,
}

const ALL_STATES: [BossState; 11] = [
    BossState::Awaken,
    BossState::SequentialDashes,
    BossState::ButterflyBurstDashes,
    BossState::SwirlingStarBurst,
    BossState::TwirlingPetalSun,
    BossState::OrbitReleasedTerraprismas,
    BossState::Phase2Transition,
    BossState::Teleport,
    BossState::ResetCycle,
    BossState::Die,
    BossState::Vanish,
];

impl StateId for BossState {
    const COUNT: usize = ALL_STATES.len();

    fn index(self) -> usize {
        self as usize
    }

    fn all() -> &'static [Self] {
        &ALL_STATES
    }
}

/// Cosmetic hand pose. Replicated so observers draw the same pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandFrame {
    #[default]
    OpenHandDownwardArm,
    OutstretchedDownwardHand,
    PointingUp,
    HandPressedToChest,
    FistedOutstretchedArm,
}

// ---------------------------------------------------------------------------
// Per-state scratch
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DashScratch {
    pub direction: Vec2,
    pub dashes_done: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ButterflyScratch {
    pub direction: Vec2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StarBurstScratch {
    /// -1 hovers left of the target, +1 right.
    pub hover_direction: f32,
    /// Frames skipped by early redirect exits. Added to the machine timer to
    /// get this attack's effective clock.
    pub cycle_offset: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PetalSunScratch {
    pub petals_spawned: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TerraprismaScratch {
    pub punch_direction: f32,
}

/// Scratch data for whichever state is current. A state reading another
/// state's variant gets a fresh default instead, so slots never alias.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Scratch {
    #[default]
    Empty,
    SequentialDashes(DashScratch),
    ButterflyBurstDashes(ButterflyScratch),
    SwirlingStarBurst(StarBurstScratch),
    TwirlingPetalSun(PetalSunScratch),
    OrbitReleasedTerraprismas(TerraprismaScratch),
}

macro_rules! scratch_accessors {
    ($get:ident, $peek:ident, $variant:ident, $ty:ty) => {
        pub fn $get(&mut self) -> &mut $ty {
            if !matches!(self, Scratch::$variant(_)) {
                *self = Scratch::$variant(<$ty>::default());
            }
            match self {
                Scratch::$variant(s) => s,
                _ => unreachable!("variant was installed above"),
            }
        }

        pub fn $peek(&self) -> $ty {
            match self {
                Scratch::$variant(s) => *s,
                _ => <$ty>::default(),
            }
        }
    };
}

impl Scratch {
    scratch_accessors!(dashes, peek_dashes, SequentialDashes, DashScratch);
    scratch_accessors!(butterfly, peek_butterfly, ButterflyBurstDashes, ButterflyScratch);
    scratch_accessors!(star_burst, peek_star_burst, SwirlingStarBurst, StarBurstScratch);
    scratch_accessors!(petal_sun, peek_petal_sun, TwirlingPetalSun, PetalSunScratch);
    scratch_accessors!(terraprismas, peek_terraprismas, OrbitReleasedTerraprismas, TerraprismaScratch);

    pub fn clear(&mut self) {
        *self = Scratch::Empty;
    }
}

// ---------------------------------------------------------------------------
// Teleport
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeleportRequest {
    pub destination: Vec2,
    /// Frames the teleport takes.
    pub duration: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeleportState {
    /// Waiting for the teleport interrupt to fire on the next tick.
    pub pending: bool,
    /// Currently inside the teleport state.
    pub active: bool,
    pub request: Option<TeleportRequest>,
    /// State the teleport interrupted. Resumed from the start afterwards.
    pub resume: Option<BossState>,
    /// The current attack was re-entered straight out of a teleport.
    pub resumed: bool,
    /// 0 at the start of a teleport, 1 when it completes.
    pub completion: f32,
}

// ---------------------------------------------------------------------------
// Boss record
// ---------------------------------------------------------------------------

/// Length of the position/rotation history used for afterimages.
pub const HISTORY_LEN: usize = 10;

/// The live simulation record for one fight instance. Mutated only by
/// behaviors and transition callbacks, from the single tick thread.
#[derive(Clone, Debug)]
pub struct Boss {
    /// This fight's handle for the boss. Companions hold it instead of a
    /// global lookup; once it stops resolving they terminate.
    pub handle: Entity,

    pub center: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    /// Pseudo-depth for parallax staging. 0 is the gameplay plane.
    pub z_position: f32,
    pub opacity: f32,
    /// Render offset used to smooth replication corrections.
    pub net_offset: Vec2,

    pub life: i32,
    pub life_max: i32,
    phase: u32,
    pub dont_take_damage: bool,
    pub killed: bool,
    pub despawned: bool,

    pub dash_afterimage: f32,
    pub butterfly_scale: f32,
    pub butterfly_opacity: f32,
    pub left_hand: HandFrame,
    pub right_hand: HandFrame,

    pub old_positions: [Vec2; HISTORY_LEN],
    pub old_rotations: [f32; HISTORY_LEN],

    /// Position in the phase's attack cycle. Advanced by the selector.
    pub attack_cursor: u32,
    pub frames_without_target: u32,
    /// Companions this boss spawned that are still alive. Counted by the
    /// authority and replicated, so observers agree on when a summon ends.
    pub companions_alive: u32,

    pub teleport: TeleportState,
    pub scratch: Scratch,
    pub resync: ResyncFlag,
}

impl Boss {
    pub fn new(handle: Entity, center: Vec2, life_max: i32) -> Self {
        Self {
            handle,
            center,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            z_position: 0.0,
            opacity: 0.0,
            net_offset: Vec2::ZERO,
            life: life_max,
            life_max,
            phase: 0,
            dont_take_damage: false,
            killed: false,
            despawned: false,
            dash_afterimage: 0.0,
            butterfly_scale: 0.0,
            butterfly_opacity: 0.0,
            left_hand: HandFrame::default(),
            right_hand: HandFrame::default(),
            old_positions: [center; HISTORY_LEN],
            old_rotations: [0.0; HISTORY_LEN],
            attack_cursor: 0,
            frames_without_target: 0,
            companions_alive: 0,
            teleport: TeleportState::default(),
            scratch: Scratch::Empty,
            resync: ResyncFlag::default(),
        }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Raise the phase. Lower values are ignored, so the phase never decreases.
    pub fn promote_phase(&mut self, phase: u32) {
        self.phase = self.phase.max(phase);
    }

    pub fn life_ratio(&self) -> f32 {
        self.life as f32 / self.life_max.max(1) as f32
    }

    /// Apply incoming damage. Returns the damage actually taken.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        if self.dont_take_damage || amount <= 0 {
            return 0;
        }
        let taken = amount.min(self.life);
        self.life -= taken;
        taken
    }

    /// External kill: the death interrupt fires on the next tick.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    pub fn set_hands(&mut self, left: HandFrame, right: HandFrame) {
        self.left_hand = left;
        self.right_hand = right;
    }

    /// Push the current pose into the afterimage history.
    pub fn record_history(&mut self) {
        self.old_positions.rotate_right(1);
        self.old_rotations.rotate_right(1);
        self.old_positions[0] = self.center;
        self.old_rotations[0] = self.rotation;
    }

    pub fn clear_history(&mut self) {
        self.old_positions = [self.center; HISTORY_LEN];
        self.old_rotations = [self.rotation; HISTORY_LEN];
    }

    /// Move by one tick of velocity.
    pub fn integrate(&mut self) {
        self.center += self.velocity;
    }

    pub fn snapshot(&self, state: BossState, timer: u32) -> BossSnapshot {
        BossSnapshot {
            state,
            timer,
            center: self.center,
            velocity: self.velocity,
            rotation: self.rotation,
            z_position: self.z_position,
            opacity: self.opacity,
            life: self.life,
            phase: self.phase,
            dont_take_damage: self.dont_take_damage,
            killed: self.killed,
            attack_cursor: self.attack_cursor,
            frames_without_target: self.frames_without_target,
            companions_alive: self.companions_alive,
            left_hand: self.left_hand,
            right_hand: self.right_hand,
            teleport: self.teleport,
            scratch: self.scratch,
        }
    }

    /// Overwrite replicated fields. Local cosmetic state (history, afterimage
    /// interpolants) is left alone.
    pub fn apply_snapshot(&mut self, snapshot: &BossSnapshot) {
        self.net_offset = self.center - snapshot.center;
        self.center = snapshot.center;
        self.velocity = snapshot.velocity;
        self.rotation = snapshot.rotation;
        self.z_position = snapshot.z_position;
        self.opacity = snapshot.opacity;
        self.life = snapshot.life;
        self.promote_phase(snapshot.phase);
        self.dont_take_damage = snapshot.dont_take_damage;
        self.killed = snapshot.killed;
        self.attack_cursor = snapshot.attack_cursor;
        self.frames_without_target = snapshot.frames_without_target;
        self.companions_alive = snapshot.companions_alive;
        self.left_hand = snapshot.left_hand;
        self.right_hand = snapshot.right_hand;
        self.teleport = snapshot.teleport;
        self.scratch = snapshot.scratch;
    }
}

/// Replicated view of the boss plus the machine's state and timer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossSnapshot {
    pub state: BossState,
    pub timer: u32,
    pub center: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub z_position: f32,
    pub opacity: f32,
    pub life: i32,
    pub phase: u32,
    pub dont_take_damage: bool,
    pub killed: bool,
    pub attack_cursor: u32,
    pub frames_without_target: u32,
    pub companions_alive: u32,
    pub left_hand: HandFrame,
    pub right_hand: HandFrame,
    pub teleport: TeleportState,
    pub scratch: Scratch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss() -> Boss {
        let mut world = hecs::World::new();
        let handle = world.spawn(());
        Boss::new(handle, Vec2::new(10.0, 20.0), 1000)
    }

    #[test]
    fn state_indices_are_dense() {
        for (i, s) in BossState::all().iter().enumerate() {
            assert_eq!(s.index(), i);
        }
        assert_eq!(BossState::COUNT, 11);
    }

    #[test]
    fn scratch_access_resets_foreign_variant() {
        let mut scratch = Scratch::Empty;
        scratch.star_burst().hover_direction = 1.0;
        scratch.star_burst().cycle_offset = 7;
        assert_eq!(scratch.peek_star_burst().cycle_offset, 7);

        // Another state's view starts from its own defaults...
        assert_eq!(scratch.peek_terraprismas().punch_direction, 0.0);
        scratch.terraprismas().punch_direction = -1.0;
        // ...and replaces the previous state's data rather than reinterpreting it.
        assert_eq!(scratch.peek_star_burst(), StarBurstScratch::default());
    }

    #[test]
    fn phase_never_decreases() {
        let mut b = boss();
        b.promote_phase(1);
        b.promote_phase(0);
        assert_eq!(b.phase(), 1);
    }

    #[test]
    fn damage_saturates_and_respects_invulnerability() {
        let mut b = boss();
        assert_eq!(b.apply_damage(300), 300);
        b.dont_take_damage = true;
        assert_eq!(b.apply_damage(300), 0);
        b.dont_take_damage = false;
        assert_eq!(b.apply_damage(5000), 700);
        assert_eq!(b.life, 0);
        assert_eq!(b.apply_damage(-4), 0);
    }

    #[test]
    fn history_shifts_newest_first() {
        let mut b = boss();
        b.center = Vec2::new(1.0, 1.0);
        b.record_history();
        b.center = Vec2::new(2.0, 2.0);
        b.record_history();
        assert_eq!(b.old_positions[0], Vec2::new(2.0, 2.0));
        assert_eq!(b.old_positions[1], Vec2::new(1.0, 1.0));
        b.clear_history();
        assert!(b.old_positions.iter().all(|p| *p == b.center));
    }

    #[test]
    fn snapshot_round_trips_replicated_fields() {
        let mut a = boss();
        a.center = Vec2::new(500.0, 300.0);
        a.promote_phase(1);
        a.attack_cursor = 3;
        a.scratch.star_burst().hover_direction = -1.0;
        let snap = a.snapshot(BossState::SwirlingStarBurst, 12);

        let json = serde_json::to_string(&snap).unwrap();
        let decoded: BossSnapshot = serde_json::from_str(&json).unwrap();

        let mut b = boss();
        b.apply_snapshot(&decoded);
        assert_eq!(b.center, a.center);
        assert_eq!(b.phase(), 1);
        assert_eq!(b.attack_cursor, 3);
        assert_eq!(b.scratch, a.scratch);
        assert_eq!(b.net_offset, Vec2::new(10.0, 20.0) - a.center);
    }
}
