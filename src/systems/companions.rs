//! Owner-bound companions: the petals of the petal sun and the orbiting
//! terraprisma blades.
//!
//! A companion looks its owner up through the handle it was spawned with. If
//! the handle no longer resolves (boss gone, fight over) it removes itself on
//! its next update. That is the whole failure path.

use glam::Vec2;
use hecs::{Entity, World};

use crate::components::{Companion, CompanionKind, OrbitCenter, Position, Projectile, ProjectileKind, Velocity};
use crate::config::{PetalSunTuning, TerraprismaTuning};
use crate::effects::EffectSink;
use crate::systems::motion::{direction_or, from_angle, inverse_lerp, lerp};
use crate::systems::spawn::Spawner;

/// Orbit radius blades settle into before release.
const BLADE_ORBIT_RADIUS: f32 = 240.0;
const BLADE_SPIN_SPEED: f32 = 0.07;
const BLADE_RELEASE_SPEED: f32 = 30.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompanionCensus {
    pub petals: u32,
    pub blades: u32,
}

impl CompanionCensus {
    pub fn total(&self) -> u32 {
        self.petals + self.blades
    }
}

pub fn census(world: &World) -> CompanionCensus {
    let mut census = CompanionCensus::default();
    for (_entity, companion) in world.query::<&Companion>().iter() {
        match companion.kind {
            CompanionKind::DazzlingPetal => census.petals += 1,
            CompanionKind::OrbitingTerraprisma => census.blades += 1,
        }
    }
    census
}

enum Step {
    Keep { position: Vec2, velocity: Vec2 },
    Die,
}

/// Advance every companion by one tick and return what is still alive.
pub fn companion_step(
    world: &mut World,
    spawner: &Spawner,
    effects: &mut dyn EffectSink,
    petal_tuning: &PetalSunTuning,
    blade_tuning: &TerraprismaTuning,
    target: Option<Vec2>,
) -> CompanionCensus {
    let entries: Vec<(Entity, Companion, Vec2, Vec2, Option<Vec2>)> = world
        .query::<(&Companion, &Position, &Velocity, Option<&OrbitCenter>)>()
        .iter()
        .map(|(e, (c, p, v, o))| (e, *c, p.0, v.0, o.map(|o| o.0)))
        .collect();

    for (entity, mut companion, position, velocity, orbit) in entries {
        let owner = world.get::<&Position>(companion.owner).ok().map(|p| p.0);
        let Some(owner) = owner else {
            tracing::trace!(?entity, "companion owner gone, despawning");
            let _ = world.despawn(entity);
            continue;
        };

        let step = match companion.kind {
            CompanionKind::DazzlingPetal => {
                update_petal(world, spawner, effects, petal_tuning, &mut companion, owner)
            }
            CompanionKind::OrbitingTerraprisma => {
                let mut center = orbit.unwrap_or(owner);
                let step = update_blade(blade_tuning, &mut companion, &mut center, position, velocity, target);
                if let Ok(mut slot) = world.get::<&mut OrbitCenter>(entity) {
                    slot.0 = center;
                }
                step
            }
        };

        match step {
            Step::Keep { position, velocity } => {
                if let Ok((c, p, v)) = world.query_one_mut::<(&mut Companion, &mut Position, &mut Velocity)>(entity) {
                    *c = companion;
                    p.0 = position;
                    v.0 = velocity;
                }
            }
            Step::Die => {
                let _ = world.despawn(entity);
            }
        }
    }

    census(world)
}

/// Petals ride on the owner, twirl, flare out, retract, then burst once and fade.
fn update_petal(
    world: &mut World,
    spawner: &Spawner,
    effects: &mut dyn EffectSink,
    tuning: &PetalSunTuning,
    petal: &mut Companion,
    owner: Vec2,
) -> Step {
    let age = petal.age as f32;
    let twirl = tuning.twirl_time as f32;
    let flare_time = tuning.flare_transform_time as f32;
    let retract_time = tuning.flare_retract_time as f32;
    let burst_time = tuning.burst_time as f32;

    let opacity = inverse_lerp(0.0, 90.0, age).powi(3);
    let flare = inverse_lerp(0.0, flare_time, age - twirl).powf(0.85);
    let spin = (1.0 - flare).sqrt() * inverse_lerp(0.0, twirl, age) * tuning.spin_speed;
    petal.angle += spin;

    let retract = inverse_lerp(0.0, retract_time, age - twirl - flare_time);
    let burst = inverse_lerp(0.0, burst_time, age - twirl - flare_time - retract_time);
    let ideal_length = opacity * 1000.0 - retract * retract * 500.0 + burst * burst * 4000.0;
    petal.length = lerp(petal.length, ideal_length, 0.2);

    let vanish = inverse_lerp(0.0, tuning.vanish_time as f32, age - tuning.burst_frame() as f32);

    let direction = from_angle(petal.angle);
    let center = owner - direction;

    if petal.age == tuning.burst_frame() {
        effects.screen_shake(Some(center), 7.0);
        for i in 0..3 {
            let spread = lerp(-0.09, 0.09, i as f32 / 2.0);
            let velocity = Vec2::from_angle(spread).rotate(direction) * 4.0;
            let rainbow = Projectile::new(ProjectileKind::AcceleratingRainbow, petal.damage).with_accel(1.045);
            spawner.spawn_projectile(
                world,
                rainbow,
                center + velocity * 3.0,
                velocity,
                ProjectileKind::AcceleratingRainbow.lifetime(),
            );
        }
    }

    petal.age += 1;
    if vanish * vanish >= 1.0 {
        return Step::Die;
    }
    Step::Keep {
        position: center,
        velocity: direction,
    }
}

/// Blades circle their orbit centre (which drifts after the target), then
/// fire off one at a time in index order and expire after their flight.
fn update_blade(
    tuning: &TerraprismaTuning,
    blade: &mut Companion,
    center: &mut Vec2,
    position: Vec2,
    velocity: Vec2,
    target: Option<Vec2>,
) -> Step {
    let release = tuning.spin_time + blade.delay;
    let step = if blade.age < release {
        if let Some(target) = target {
            *center = center.lerp(target, 0.1);
        }
        blade.angle += BLADE_SPIN_SPEED;
        blade.length = BLADE_ORBIT_RADIUS * inverse_lerp(0.0, 30.0, blade.age as f32);
        Step::Keep {
            position: *center + from_angle(blade.angle) * blade.length,
            velocity: Vec2::ZERO,
        }
    } else if blade.age == release {
        let aim = target.unwrap_or(*center);
        let outward = from_angle(blade.angle);
        let velocity = direction_or(aim - position, outward) * BLADE_RELEASE_SPEED;
        Step::Keep {
            position: position + velocity,
            velocity,
        }
    } else if blade.age >= release + tuning.flight_time {
        Step::Die
    } else {
        let velocity = velocity * 1.02;
        Step::Keep {
            position: position + velocity,
            velocity,
        }
    };

    blade.age += 1;
    step
}
