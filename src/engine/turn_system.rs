use super::*;

impl GameEngine {
    /// Non-neutral owners in rotation order.
    pub fn live_factions(&self) -> Vec<FactionColor> {
        self.planets
            .iter()
            .filter(|planet| !planet.is_neutral())
            .map(|planet| planet.color)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub(super) fn check_match_end(&mut self) -> bool {
        let owners = self.owner_set();
        if owners.len() != 1 {
            return false;
        }
        let Some(&faction) = owners.iter().next() else {
            return false;
        };

        let outcome = if self.is_human(faction) {
            MatchOutcome::Won { faction }
        } else {
            MatchOutcome::Lost { faction }
        };
        self.outcome = Some(outcome);
        self.dragging_card = None;
        self.events.push(GameEvent::MatchEnded { outcome });
        tracing::info!(
            level = self.level,
            year = self.year,
            %faction,
            ?outcome,
            "match ended"
        );
        true
    }

    pub(super) fn rotate_turn_if_due(&mut self) {
        let playing = self.live_factions();
        if playing.is_empty() {
            return;
        }
        let expired = self.current_ticks.saturating_sub(self.current_turn_start) > TURN_TIME_MS;
        if !expired && playing.contains(&self.current_turn_color) {
            return;
        }
        self.advance_turn(&playing);
    }

    /// An eliminated turn holder counts as sorted index 0, so the turn goes
    /// to index 1, wrapping the year when only one faction is left.
    fn advance_turn(&mut self, playing: &[FactionColor]) {
        let current_idx = playing
            .iter()
            .position(|color| *color == self.current_turn_color)
            .unwrap_or(0);
        let next_idx = current_idx + 1;
        if next_idx >= playing.len() {
            self.year += 1;
        }
        self.current_turn_color = playing[next_idx % playing.len()];
        self.current_turn_start = self.current_ticks;
        self.ai_turn_done = false;
        if self.dragging_card.take().is_some() {
            self.events.push(GameEvent::CardDragCancelled);
        }
        self.events.push(GameEvent::TurnChanged {
            color: self.current_turn_color,
            year: self.year,
        });
        tracing::debug!(color = %self.current_turn_color, year = self.year, "turn changed");
    }
}
