use std::path::PathBuf;

use crate::constants::NOTICE_DURATION_MS;
use crate::engine::GameEngineOptions;
use crate::save_store::{SaveStore, StoreError};
use crate::session::{Session, SessionMode, TickOutcome, TickReport};
use crate::types::MatchOutcome;

pub enum AfterNotice {
    Menu,
    Resume(Box<Session>),
}

pub enum Screen {
    Menu,
    Playing(Box<Session>),
    Notice {
        message: String,
        remaining_ms: u64,
        then: AfterNotice,
    },
}

impl Screen {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Playing(session)
            | Self::Notice {
                then: AfterNotice::Resume(session),
                ..
            } => Some(&**session),
            Self::Menu | Self::Notice { .. } => None,
        }
    }
}

/// Owns the one active screen; sessions are created and dropped only here.
pub struct App {
    screen: Screen,
    saves: SaveStore,
    next_seed: u32,
}

impl App {
    pub fn new(saves: SaveStore, seed: u32) -> Self {
        Self {
            screen: Screen::Menu,
            saves,
            next_seed: seed,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.screen {
            Screen::Playing(session) => Some(&mut **session),
            _ => None,
        }
    }

    pub fn start(&mut self, mode: SessionMode) {
        let seed = self.take_seed();
        self.screen = Screen::Playing(Box::new(Session::new_match(mode, 1, seed)));
    }

    pub fn quit_to_menu(&mut self) {
        self.screen = Screen::Menu;
    }

    pub fn save(&self, slot: &str) -> Result<PathBuf, StoreError> {
        match self.screen.session() {
            Some(session) => self.saves.save(slot, session.engine()),
            None => Err(StoreError::NoMatch),
        }
    }

    /// Replaces the playing session only when the slot loads cleanly.
    pub fn load(&mut self, slot: &str, mode: SessionMode) -> bool {
        let options = GameEngineOptions {
            seed: self.take_seed(),
            ..GameEngineOptions::default()
        };
        match self.saves.load(slot, options) {
            Ok(engine) => {
                self.screen = Screen::Playing(Box::new(Session::new(mode, engine)));
                true
            }
            Err(error) => {
                tracing::warn!(slot, error = %error, "load failed");
                let then = match std::mem::replace(&mut self.screen, Screen::Menu) {
                    Screen::Playing(session) => AfterNotice::Resume(session),
                    Screen::Notice { then, .. } => then,
                    Screen::Menu => AfterNotice::Menu,
                };
                self.screen = Screen::Notice {
                    message: "Load failed".to_string(),
                    remaining_ms: NOTICE_DURATION_MS,
                    then,
                };
                false
            }
        }
    }

    pub fn update(&mut self, dt_ms: u64) -> Option<TickReport> {
        let (screen, report) = match std::mem::replace(&mut self.screen, Screen::Menu) {
            Screen::Menu => (Screen::Menu, None),
            Screen::Playing(mut session) => {
                let report = session.tick(dt_ms);
                let next = match report.outcome {
                    TickOutcome::Running => Screen::Playing(session),
                    TickOutcome::LevelCleared { level } => Screen::Notice {
                        message: format!("Level {level}"),
                        remaining_ms: NOTICE_DURATION_MS,
                        then: AfterNotice::Resume(session),
                    },
                    TickOutcome::Ended(outcome) => Screen::Notice {
                        message: outcome_message(session.mode(), outcome),
                        remaining_ms: NOTICE_DURATION_MS,
                        then: AfterNotice::Menu,
                    },
                };
                (next, Some(report))
            }
            Screen::Notice {
                message,
                remaining_ms,
                then,
            } => {
                if remaining_ms <= dt_ms {
                    let next = match then {
                        AfterNotice::Menu => Screen::Menu,
                        AfterNotice::Resume(session) => Screen::Playing(session),
                    };
                    (next, None)
                } else {
                    let notice = Screen::Notice {
                        message,
                        remaining_ms: remaining_ms - dt_ms,
                        then,
                    };
                    (notice, None)
                }
            }
        };
        self.screen = screen;
        report
    }

    fn take_seed(&mut self) -> u32 {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        seed
    }
}

fn outcome_message(mode: SessionMode, outcome: MatchOutcome) -> String {
    match (mode, outcome) {
        (SessionMode::LocalTwoPlayer, _) => format!("{} wins", outcome.faction()),
        (_, MatchOutcome::Won { .. }) => "You win".to_string(),
        (_, MatchOutcome::Lost { .. }) => "Game over".to_string(),
    }
}
