use super::*;

impl GameEngine {
    pub(super) fn grow_planets(&mut self) {
        let now = self.current_ticks;
        for planet in &mut self.planets {
            if planet.is_neutral() {
                continue;
            }
            if now.saturating_sub(planet.value_start) > planet.add_value_every {
                planet.value += 1 + i32::from(planet.satellite_upgrade);
                planet.value_start = now;
            }
        }
    }

    pub(super) fn launch_rockets(&mut self) {
        let now = self.current_ticks;
        for conn_idx in 0..self.connections.len() {
            let (from, to) = (self.connections[conn_idx].from, self.connections[conn_idx].to);
            let (Some(src), Some(dst)) = (self.planet_index(from), self.planet_index(to)) else {
                continue;
            };
            let payload = i32::from(self.planets[src].rocket_upgrade);
            if self.planets[src].value <= payload {
                continue;
            }
            let connection = &self.connections[conn_idx];
            if now.saturating_sub(connection.last_ticks) <= connection.send_rocket_every {
                continue;
            }

            let rocket = Rocket::launch(&self.planets[src], &self.planets[dst], payload);
            self.planets[src].value -= payload;
            self.connections[conn_idx].last_ticks = now;
            self.connections[conn_idx].rockets.push(rocket);
        }
    }

    pub(super) fn advance_rockets(&mut self, dt_ms: u64) {
        for conn_idx in 0..self.connections.len() {
            let (from, to) = (self.connections[conn_idx].from, self.connections[conn_idx].to);
            let (Some(src), Some(dst)) = (self.planet_index(from), self.planet_index(to)) else {
                continue;
            };
            let from_center = self.planets[src].center();
            let to_center = self.planets[dst].center();

            let mut arrived = Vec::new();
            self.connections[conn_idx].rockets.retain_mut(|rocket| {
                if rocket.advance(dt_ms, from_center, to_center) {
                    arrived.push(rocket.payload);
                    false
                } else {
                    true
                }
            });
            for payload in arrived {
                self.resolve_arrival(src, dst, payload);
            }
        }
    }

    /// The attacker is whoever owns the source planet at arrival time.
    pub(super) fn resolve_arrival(&mut self, src: usize, dst: usize, payload: i32) {
        let attacker = self.planets[src].color;
        let target = &mut self.planets[dst];
        if target.color == attacker {
            target.value += payload;
            return;
        }

        target.value -= payload;
        if target.value > 0 {
            return;
        }
        let previous = target.color;
        let planet = target.id;
        target.color = attacker;
        target.value = payload;
        self.events.push(GameEvent::PlanetCaptured {
            planet,
            previous,
            owner: attacker,
        });
        tracing::info!(%planet, %previous, owner = %attacker, "planet captured");
    }
}
