use crate::types::FactionColor;

pub const TICK_RATE: u32 = 20;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Length of the 60 Hz frame the per-frame AI probabilities are expressed in.
pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

pub const TURN_TIME_MS: u64 = 10 * 1000;
pub const START_YEAR: i32 = 2100;

pub const BOARD_WIDTH: f32 = 800.0;
pub const BOARD_HEIGHT: f32 = 1400.0 - 100.0 - 240.0;
pub const PLANET_RADIUS: f32 = 60.0;
pub const CONNECTION_CLICK_WIDTH: f32 = 10.0;
pub const PLACEMENT_ATTEMPTS: usize = 4_000;
/// Upper bound on planets per board, well under what random placement can fit.
pub const MAX_BOARD_PLANETS: usize = 20;
/// Highest level a match can reach or be loaded at.
pub const MAX_LEVEL: u32 = 10;

pub const START_VALUE: i32 = 10;
pub const NEUTRAL_VALUE_RANGE: (i32, i32) = (5, 15);
pub const ADD_VALUE_EVERY_MS: u64 = 1_000;
pub const SEND_ROCKET_EVERY_MS: u64 = 500;

/// Rocket travel speed in board pixels per simulated millisecond.
pub const ROCKET_SPEED: f32 = 0.6;

pub const ROCKET_COST: i32 = 5;
pub const SATELLITE_COST: i32 = 10;
pub const MIN_ROCKET_UPGRADE: u8 = 1;
pub const MAX_ROCKET_UPGRADE: u8 = 4;
pub const MAX_SATELLITE_UPGRADE: u8 = 6;
pub const TEXTURE_VARIANTS: u8 = 8;

pub const AI_UPGRADE_CHANCE: f32 = 0.9;
pub const AI_CONNECT_CHANCE: f32 = 0.005;

pub const TICK_SYNC_INTERVAL_MS: u64 = 1_000;
pub const FULL_SYNC_INTERVAL_MS: u64 = 15_000;
pub const NOTICE_DURATION_MS: u64 = 2_500;

pub const PLAYER_COLOR: FactionColor = FactionColor(0, 0x78, 0x48);
pub const PLAYER2_COLOR: FactionColor = FactionColor(0x78, 0, 0);
pub const NEUTRAL_COLOR: FactionColor = FactionColor(0x81, 0x83, 0x80);

pub fn factions_for_level(level: u32) -> usize {
    (1.5f64.powi(level.min(32) as i32) - 0.5).round().max(1.0) as usize
}

pub fn planets_per_faction(level: u32) -> usize {
    factions_for_level(level)
}

pub fn ai_connect_chance(dt_ms: u64) -> f32 {
    (AI_CONNECT_CHANCE * dt_ms as f32 / REFERENCE_FRAME_MS).min(1.0)
}
