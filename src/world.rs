use crate::constants::{
    factions_for_level, planets_per_faction, ADD_VALUE_EVERY_MS, BOARD_HEIGHT, BOARD_WIDTH,
    CONNECTION_CLICK_WIDTH, MAX_BOARD_PLANETS, MIN_ROCKET_UPGRADE, NEUTRAL_COLOR,
    NEUTRAL_VALUE_RANGE, PLACEMENT_ATTEMPTS, PLANET_RADIUS, ROCKET_SPEED, SEND_ROCKET_EVERY_MS,
    START_VALUE, TEXTURE_VARIANTS,
};
use crate::geometry::{distance, lerp_over, point_segment_distance};
use crate::rng::Rng;
use crate::types::{FactionColor, PlanetId, PlanetTextures, PlanetView, RocketView};

#[derive(Clone, Debug)]
pub struct Planet {
    pub id: PlanetId,
    /// Top-left corner; the center is offset by `radius` on both axes.
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: FactionColor,
    pub value: i32,
    pub rocket_upgrade: u8,
    pub satellite_upgrade: u8,
    pub value_start: u64,
    pub add_value_every: u64,
    pub send_rocket_every: u64,
    pub selected: bool,
    pub apply_black_surface: bool,
    pub textures: PlanetTextures,
}

impl Planet {
    pub fn new(id: PlanetId, x: f32, y: f32, color: FactionColor, value: i32) -> Self {
        Self {
            id,
            x,
            y,
            radius: PLANET_RADIUS,
            color,
            value,
            rocket_upgrade: MIN_ROCKET_UPGRADE,
            satellite_upgrade: 0,
            value_start: 0,
            add_value_every: ADD_VALUE_EVERY_MS,
            send_rocket_every: SEND_ROCKET_EVERY_MS,
            selected: false,
            apply_black_surface: false,
            textures: PlanetTextures {
                base: 0,
                noise: 0,
                light: 0,
            },
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.radius, self.y + self.radius)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        let (cx, cy) = self.center();
        distance(px, py, cx, cy) <= self.radius
    }

    pub fn is_neutral(&self) -> bool {
        self.color == NEUTRAL_COLOR
    }

    pub fn view(&self) -> PlanetView {
        PlanetView {
            id: self.id,
            x: self.x,
            y: self.y,
            radius: self.radius,
            color: self.color,
            value: self.value,
            rocket_upgrade: self.rocket_upgrade,
            satellite_upgrade: self.satellite_upgrade,
            selected: self.selected,
            apply_black_surface: self.apply_black_surface,
            textures: self.textures,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Rocket {
    pub payload: i32,
    pub elapsed_ms: u64,
    pub target_ms: f32,
    pub x: f32,
    pub y: f32,
}

impl Rocket {
    pub fn launch(from: &Planet, to: &Planet, payload: i32) -> Self {
        Self::resume(from, to, payload, 0)
    }

    pub fn resume(from: &Planet, to: &Planet, payload: i32, elapsed_ms: u64) -> Self {
        let (fx, fy) = from.center();
        let (tx, ty) = to.center();
        let mut rocket = Self {
            payload,
            elapsed_ms,
            target_ms: distance(fx, fy, tx, ty) / ROCKET_SPEED,
            x: fx,
            y: fy,
        };
        rocket.place(from.center(), to.center());
        rocket
    }

    pub fn has_arrived(&self) -> bool {
        self.elapsed_ms as f32 >= self.target_ms
    }

    /// Moves the rocket along its line; returns true once it has arrived.
    pub fn advance(&mut self, dt_ms: u64, from: (f32, f32), to: (f32, f32)) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        self.place(from, to);
        self.has_arrived()
    }

    fn place(&mut self, from: (f32, f32), to: (f32, f32)) {
        let elapsed = (self.elapsed_ms as f32).min(self.target_ms);
        self.x = lerp_over(from.0, to.0, elapsed, self.target_ms);
        self.y = lerp_over(from.1, to.1, elapsed, self.target_ms);
    }

    pub fn view(&self) -> RocketView {
        RocketView {
            x: self.x,
            y: self.y,
            payload: self.payload,
        }
    }
}

/// Directed link: only `from` spends value to launch rockets toward `to`.
#[derive(Clone, Debug)]
pub struct Connection {
    pub from: PlanetId,
    pub to: PlanetId,
    pub last_ticks: u64,
    pub send_rocket_every: u64,
    pub rockets: Vec<Rocket>,
}

impl Connection {
    pub fn new(source: &Planet, to: PlanetId) -> Self {
        Self {
            from: source.id,
            to,
            last_ticks: 0,
            send_rocket_every: source.send_rocket_every,
            rockets: Vec::new(),
        }
    }

    pub fn links(&self, a: PlanetId, b: PlanetId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    pub fn is_hit(&self, from: (f32, f32), to: (f32, f32), px: f32, py: f32) -> bool {
        point_segment_distance(px, py, from.0, from.1, to.0, to.1) <= CONNECTION_CLICK_WIDTH
    }
}

pub fn random_textures(rng: &mut Rng) -> PlanetTextures {
    let max = i32::from(TEXTURE_VARIANTS) - 1;
    PlanetTextures {
        base: rng.int(0, max) as u8,
        noise: rng.int(0, max) as u8,
        light: rng.int(0, max) as u8,
    }
}

/// Lays out a fresh board for the neutral group, player 1 and the enemy
/// groups (the first of which is player 2 when present). Planets are dealt
/// one per group per round, so every group is seated before any gets a
/// second planet; dealing stops at `MAX_BOARD_PLANETS` or at the first
/// planet that finds no room.
pub fn generate_board(
    level: u32,
    p1: FactionColor,
    p2: Option<FactionColor>,
    rng: &mut Rng,
) -> Vec<Planet> {
    let enemy_count = factions_for_level(level).min(MAX_BOARD_PLANETS - 2);
    let per_faction = planets_per_faction(level);
    tracing::info!(level, enemy_count, per_faction, "generating board");

    let mut taken = vec![NEUTRAL_COLOR, p1];
    if let Some(p2) = p2 {
        taken.push(p2);
    }

    let mut groups = vec![NEUTRAL_COLOR, p1];
    for idx in 0..enemy_count {
        match p2 {
            Some(p2) if idx == 0 => groups.push(p2),
            _ => {
                let color = pick_enemy_color(rng, &taken);
                taken.push(color);
                groups.push(color);
            }
        }
    }

    let target = (groups.len() * per_faction).min(MAX_BOARD_PLANETS);
    let mut planets: Vec<Planet> = Vec::with_capacity(target);
    'deal: for _ in 0..per_faction {
        for &color in &groups {
            if planets.len() >= target {
                break 'deal;
            }
            let Some((x, y)) = find_free_spot(&planets, rng) else {
                tracing::warn!(%color, placed = planets.len(), "no room left for planet");
                break 'deal;
            };
            let value = if color == NEUTRAL_COLOR {
                rng.int(NEUTRAL_VALUE_RANGE.0, NEUTRAL_VALUE_RANGE.1)
            } else {
                START_VALUE
            };
            let mut planet = Planet::new(PlanetId(planets.len() as u32), x, y, color, value);
            planet.textures = random_textures(rng);
            planets.push(planet);
        }
    }
    planets
}

fn find_free_spot(planets: &[Planet], rng: &mut Rng) -> Option<(f32, f32)> {
    let margin = PLANET_RADIUS * 2.0;
    for _ in 0..PLACEMENT_ATTEMPTS {
        let x = rng.uniform(margin, BOARD_WIDTH - margin);
        let y = rng.uniform(margin, BOARD_HEIGHT - margin);
        let cx = x + PLANET_RADIUS;
        let cy = y + PLANET_RADIUS;
        let overlaps = planets.iter().any(|planet| {
            let (px, py) = planet.center();
            distance(cx, cy, px, py) < 2.0 * PLANET_RADIUS
        });
        if !overlaps {
            return Some((x, y));
        }
    }
    None
}

fn pick_enemy_color(rng: &mut Rng, taken: &[FactionColor]) -> FactionColor {
    loop {
        let color = FactionColor(
            rng.int(50, 255) as u8,
            rng.int(50, 255) as u8,
            rng.int(50, 255) as u8,
        );
        if !taken.contains(&color) {
            return color;
        }
    }
}
