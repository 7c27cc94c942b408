//! Fight tuning.
//!
//! Every frame count, ratio and speed the behaviors use lives in [`Tuning`].
//! Defaults reproduce the shipped fight; a YAML file may override any subset.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Simulation rate the frame counts below are authored against.
pub const TICKS_PER_SECOND: u32 = 60;

pub fn seconds_to_frames(seconds: f32) -> u32 {
    (seconds * TICKS_PER_SECOND as f32).round() as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub life_max: i32,
    /// Life fraction at or below which phase 2 begins.
    pub phase2_life_ratio: f32,

    pub awaken_time: u32,
    pub reset_cycle_time: u32,
    /// Frames without a target before the boss gives up and vanishes.
    pub vanish_delay: u32,

    pub teleport: TeleportTuning,
    pub phase2: Phase2Tuning,
    pub sequential_dashes: DashTuning,
    pub butterfly_dashes: ButterflyTuning,
    pub star_burst: StarBurstTuning,
    pub petal_sun: PetalSunTuning,
    pub terraprismas: TerraprismaTuning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportTuning {
    pub default_duration: u32,
    /// Extra frames observers wait before finishing a teleport, to hide latency.
    pub observer_latency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase2Tuning {
    pub charge_up_time: u32,
    pub shoot_cycle_delay: u32,
    pub fly_around_time: u32,
    pub deathray_time: u32,
    pub shoot_cycle_count: u32,
    pub tail_delay: u32,
    pub deathray_damage: i32,
    pub rainbow_damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTuning {
    pub redirect_time: u32,
    pub dash_time: u32,
    pub recover_time: u32,
    pub dash_count: u32,
    pub dash_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButterflyTuning {
    pub hover_time: u32,
    pub dash_time: u32,
    pub burst_time: u32,
    pub cycle_count: u32,
    pub bolt_count: u32,
    pub bolt_damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarBurstTuning {
    pub redirect_time: u32,
    pub burst_delay: u32,
    pub restart_delay: u32,
    pub burst_count: u32,
    pub bolt_damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetalSunTuning {
    pub petal_count: u32,
    pub twirl_time: u32,
    pub flare_transform_time: u32,
    pub flare_retract_time: u32,
    pub burst_time: u32,
    pub vanish_time: u32,
    /// Radians per frame at full twirl speed.
    pub spin_speed: f32,
    pub rainbow_damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraprismaTuning {
    pub count: u32,
    pub spin_time: u32,
    /// Frames a released blade keeps flying before it expires.
    pub flight_time: u32,
    pub damage: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            life_max: 70_000,
            phase2_life_ratio: 0.65,
            awaken_time: seconds_to_frames(2.0),
            reset_cycle_time: 24,
            vanish_delay: seconds_to_frames(10.0),
            teleport: TeleportTuning::default(),
            phase2: Phase2Tuning::default(),
            sequential_dashes: DashTuning::default(),
            butterfly_dashes: ButterflyTuning::default(),
            star_burst: StarBurstTuning::default(),
            petal_sun: PetalSunTuning::default(),
            terraprismas: TerraprismaTuning::default(),
        }
    }
}

impl Default for TeleportTuning {
    fn default() -> Self {
        Self {
            default_duration: seconds_to_frames(0.5),
            observer_latency: 6,
        }
    }
}

impl Default for Phase2Tuning {
    fn default() -> Self {
        Self {
            charge_up_time: seconds_to_frames(6.7),
            shoot_cycle_delay: seconds_to_frames(1.5),
            fly_around_time: seconds_to_frames(2.0),
            deathray_time: seconds_to_frames(3.0),
            shoot_cycle_count: 2,
            tail_delay: 90,
            deathray_damage: 300,
            rainbow_damage: 190,
        }
    }
}

impl Default for DashTuning {
    fn default() -> Self {
        Self {
            redirect_time: 30,
            dash_time: 24,
            recover_time: 16,
            dash_count: 3,
            dash_speed: 42.0,
        }
    }
}

impl Default for ButterflyTuning {
    fn default() -> Self {
        Self {
            hover_time: 40,
            dash_time: 30,
            burst_time: 20,
            cycle_count: 2,
            bolt_count: 8,
            bolt_damage: 180,
        }
    }
}

impl Default for StarBurstTuning {
    fn default() -> Self {
        Self {
            redirect_time: seconds_to_frames(0.583),
            burst_delay: seconds_to_frames(0.5),
            restart_delay: seconds_to_frames(0.75),
            burst_count: 2,
            bolt_damage: 200,
        }
    }
}

impl Default for PetalSunTuning {
    fn default() -> Self {
        Self {
            petal_count: 6,
            twirl_time: 120,
            flare_transform_time: 30,
            flare_retract_time: 40,
            burst_time: 20,
            vanish_time: 24,
            spin_speed: 0.06,
            rainbow_damage: 190,
        }
    }
}

impl Default for TerraprismaTuning {
    fn default() -> Self {
        Self {
            count: 9,
            spin_time: seconds_to_frames(1.7),
            flight_time: 75,
            damage: 210,
        }
    }
}

impl Phase2Tuning {
    /// Frames from the start of the avatar sub-cycle to its end.
    pub fn avatar_cycle_time(&self) -> u32 {
        (self.fly_around_time + self.deathray_time) * self.shoot_cycle_count
    }

    /// Total length of the phase transition, tail delay included.
    pub fn total_time(&self) -> u32 {
        self.charge_up_time + self.shoot_cycle_delay + self.avatar_cycle_time() + self.tail_delay
    }
}

impl DashTuning {
    pub fn cycle_time(&self) -> u32 {
        self.redirect_time + self.dash_time + self.recover_time
    }
}

impl ButterflyTuning {
    pub fn cycle_time(&self) -> u32 {
        self.hover_time + self.dash_time + self.burst_time
    }
}

impl StarBurstTuning {
    pub fn cycle_time(&self) -> u32 {
        self.redirect_time + self.burst_delay + self.restart_delay
    }
}

impl PetalSunTuning {
    /// Age at which a petal releases its rainbows.
    pub fn burst_frame(&self) -> u32 {
        self.twirl_time + self.flare_transform_time + self.flare_retract_time + self.burst_time
    }
}

impl Tuning {
    /// Load a YAML tuning file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning: Tuning = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.life_max <= 0 {
            return Err(invalid("life_max", "must be positive"));
        }
        if !(self.phase2_life_ratio > 0.0 && self.phase2_life_ratio <= 1.0) {
            return Err(invalid("phase2_life_ratio", "must be in (0, 1]"));
        }
        let cycles = [
            ("sequential_dashes", self.sequential_dashes.cycle_time()),
            ("butterfly_dashes", self.butterfly_dashes.cycle_time()),
            ("star_burst", self.star_burst.cycle_time()),
            ("phase2.fly_around_time + deathray_time", self.phase2.fly_around_time + self.phase2.deathray_time),
        ];
        for (field, cycle) in cycles {
            if cycle == 0 {
                return Err(invalid(field, "cycle length must be non-zero"));
            }
        }
        if self.teleport.default_duration == 0 {
            return Err(invalid("teleport.default_duration", "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_authored_timings() {
        let t = Tuning::default();
        assert_eq!(t.phase2.charge_up_time, 402);
        assert_eq!(t.phase2.shoot_cycle_delay, 90);
        assert_eq!(t.phase2.total_time(), 402 + 90 + (120 + 180) * 2 + 90);
        assert_eq!(t.teleport.default_duration, 30);
        assert_eq!(t.star_burst.redirect_time, 35);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "phase2_life_ratio: 0.6\nteleport:\n  default_duration: 12\n";
        let t: Tuning = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(t.phase2_life_ratio, 0.6);
        assert_eq!(t.teleport.default_duration, 12);
        assert_eq!(t.teleport.observer_latency, 6);
        assert_eq!(t.life_max, 70_000);
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let t = Tuning {
            phase2_life_ratio: 1.5,
            ..Tuning::default()
        };
        assert!(matches!(
            t.validate(),
            Err(ConfigError::Invalid {
                field: "phase2_life_ratio",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_cycles() {
        let mut t = Tuning::default();
        t.star_burst.redirect_time = 0;
        t.star_burst.burst_delay = 0;
        t.star_burst.restart_delay = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Tuning::load(Path::new("/nonexistent/empress.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
