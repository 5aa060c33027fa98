use super::*;

impl GameEngine {
    /// One upgrade attempt at the start of each AI faction's turn.
    pub(super) fn run_ai_turn(&mut self) {
        let faction = self.current_turn_color;
        if self.ai_turn_done || !self.is_ai_faction(faction) {
            return;
        }
        self.ai_turn_done = true;

        let owned = self.owned_indices(faction);
        if owned.is_empty() || !self.rng.chance(AI_UPGRADE_CHANCE) {
            return;
        }
        let chosen = match self.options.ai.upgrade_pick {
            UpgradePick::Uniform => self.rng.pick(&owned),
            UpgradePick::Strongest => owned
                .iter()
                .copied()
                .max_by_key(|&idx| (self.planets[idx].value, std::cmp::Reverse(idx))),
        };
        let Some(chosen) = chosen else {
            return;
        };
        if !self.apply_upgrade(chosen, CardKind::Satellite, true) {
            self.apply_upgrade(chosen, CardKind::Rocket, true);
        }
    }

    /// Every AI faction may open a connection on any step, turn or not.
    pub(super) fn run_ai_continuous(&mut self, dt_ms: u64) {
        let chance = ai_connect_chance(dt_ms);
        for faction in self.live_factions() {
            if !self.is_ai_faction(faction) || !self.rng.chance(chance) {
                continue;
            }
            self.try_ai_connection(faction);
        }
    }

    pub(super) fn try_ai_connection(&mut self, faction: FactionColor) -> bool {
        let owned = self.owned_indices(faction);
        let Some(source) = self.rng.pick(&owned) else {
            return false;
        };
        let source_id = self.planets[source].id;
        let spare_allies = self.options.ai.spare_allies;

        let candidates: Vec<usize> = (0..self.planets.len())
            .filter(|&idx| idx != source)
            .filter(|&idx| !(spare_allies && self.planets[idx].color == faction))
            .filter(|&idx| {
                let target = self.planets[idx].id;
                !self
                    .connections
                    .iter()
                    .any(|connection| connection.links(source_id, target))
            })
            .collect();
        let target = match self.options.ai.target_pick {
            TargetPick::Uniform => self.rng.pick(&candidates),
            TargetPick::Weakest => candidates
                .iter()
                .copied()
                .min_by_key(|&idx| self.planets[idx].value),
        };
        let Some(target) = target else {
            return false;
        };
        self.insert_connection(source, self.planets[target].id, true)
    }

    /// Shared by human card drops and AI upgrades.
    pub(super) fn apply_upgrade(&mut self, idx: usize, card: CardKind, by_ai: bool) -> bool {
        let planet = &mut self.planets[idx];
        let cost = card.cost();
        if planet.value <= cost {
            return false;
        }
        let level = match card {
            CardKind::Satellite if planet.satellite_upgrade < MAX_SATELLITE_UPGRADE => {
                planet.satellite_upgrade += 1;
                planet.satellite_upgrade
            }
            CardKind::Rocket if planet.rocket_upgrade < MAX_ROCKET_UPGRADE => {
                planet.rocket_upgrade += 1;
                planet.rocket_upgrade
            }
            _ => return false,
        };
        planet.value -= cost;
        let id = planet.id;
        self.events.push(GameEvent::UpgradeApplied {
            planet: id,
            card,
            level,
            by_ai,
        });
        tracing::info!(planet = %id, ?card, level, by_ai, "upgrade applied");
        true
    }

    fn owned_indices(&self, faction: FactionColor) -> Vec<usize> {
        (0..self.planets.len())
            .filter(|&idx| self.planets[idx].color == faction)
            .collect()
    }
}
