pub mod boss;

use glam::Vec2;
use hecs::Entity;

// ---------------------------------------------------------------------------
// Arena components (hecs)
// ---------------------------------------------------------------------------

/// World-space centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position(pub Vec2);

/// Units per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Velocity(pub Vec2);

/// Marker: something the boss can fight. Resolved once per tick.
pub struct Target;

/// Marker: the entity standing in for the boss in the arena world. Its
/// `Position` is mirrored from the boss record after every tick.
pub struct BossBody;

/// Remaining ticks before the entity despawns. Removed entities never come back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetime(pub u32);

/// Which boss spawned this entity. Used to clear the arena on phase change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OwnedBy(pub Entity);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileKind {
    StarBolt,
    PrismaticBolt,
    AcceleratingRainbow,
    ConvergingMoonlight,
    DazzlingDeathray,
    PrismaticBurst,
    ButterflyBolt,
}

impl ProjectileKind {
    /// Default time to live, in ticks.
    pub fn lifetime(self) -> u32 {
        match self {
            ProjectileKind::StarBolt => 240,
            ProjectileKind::PrismaticBolt => 180,
            ProjectileKind::AcceleratingRainbow => 150,
            ProjectileKind::ConvergingMoonlight => 90,
            ProjectileKind::DazzlingDeathray => 120,
            ProjectileKind::PrismaticBurst => 30,
            ProjectileKind::ButterflyBolt => 160,
        }
    }
}

/// A hostile projectile. `accel` scales velocity each tick (1.0 = constant
/// speed); `home` steers toward the target by that fraction per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub damage: i32,
    pub accel: f32,
    pub home: f32,
}

impl Projectile {
    pub fn new(kind: ProjectileKind, damage: i32) -> Self {
        Self {
            kind,
            damage,
            accel: 1.0,
            home: 0.0,
        }
    }

    pub fn with_accel(mut self, accel: f32) -> Self {
        self.accel = accel;
        self
    }

    pub fn with_homing(mut self, home: f32) -> Self {
        self.home = home;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompanionKind {
    DazzlingPetal,
    OrbitingTerraprisma,
}

/// An entity bound to its owner's position. It self-terminates as soon as
/// the owner handle no longer resolves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Companion {
    pub kind: CompanionKind,
    pub owner: Entity,
    pub damage: i32,
    /// Ticks since spawn.
    pub age: u32,
    /// Orbit or petal angle, in radians.
    pub angle: f32,
    /// Petal length, or orbit radius for blades.
    pub length: f32,
    /// Blade index among its siblings; staggers release.
    pub delay: u32,
}

/// Where the blades orbit, fixed when they spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCenter(pub Vec2);
