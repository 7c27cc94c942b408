pub mod boss;
pub mod companions;
pub mod motion;
pub mod projectiles;
pub mod spawn;
pub mod target;
