use serde::Serialize;
use serde_json::Value;

use crate::save::SavedMatch;
use crate::types::{CardKind, FactionColor, PlanetId};

/// Action messages exchanged between host and client. `request` marks a
/// client proposal; host broadcasts carry `request: false` and are
/// authoritative.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    CardDropped {
        request: bool,
        card: CardKind,
        planet: PlanetId,
    },
    ConnectionCreated {
        request: bool,
        from: PlanetId,
        to: PlanetId,
    },
    ConnectionDeleted {
        request: bool,
        from: PlanetId,
        to: PlanetId,
    },
    /// A request carries no state; the host answers with the full match.
    FullSync {
        request: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<Box<SavedMatch>>,
    },
    TickSync {
        request: bool,
        ticks: u64,
        #[serde(rename = "sentAt")]
        sent_at: u64,
    },
    /// Host tells a freshly connected peer which faction it plays, if any.
    SeatAssigned {
        faction: Option<FactionColor>,
    },
}

impl NetMessage {
    pub fn is_request(&self) -> bool {
        match self {
            Self::CardDropped { request, .. }
            | Self::ConnectionCreated { request, .. }
            | Self::ConnectionDeleted { request, .. }
            | Self::FullSync { request, .. }
            | Self::TickSync { request, .. } => *request,
            Self::SeatAssigned { .. } => false,
        }
    }

    /// Same action, re-issued by the host as an authoritative update.
    pub fn into_update(self) -> Self {
        match self {
            Self::CardDropped { card, planet, .. } => Self::CardDropped {
                request: false,
                card,
                planet,
            },
            Self::ConnectionCreated { from, to, .. } => Self::ConnectionCreated {
                request: false,
                from,
                to,
            },
            Self::ConnectionDeleted { from, to, .. } => Self::ConnectionDeleted {
                request: false,
                from,
                to,
            },
            other => other,
        }
    }
}

pub fn encode_net_message(message: &NetMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

pub fn parse_net_message(raw: &str) -> Option<NetMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;
    let request = match object.get("request") {
        None => false,
        Some(value) => value.as_bool()?,
    };

    match message_type {
        "card_dropped" => {
            let card = parse_card(object.get("card")?)?;
            let planet = parse_planet_id(object.get("planet")?)?;
            Some(NetMessage::CardDropped {
                request,
                card,
                planet,
            })
        }
        "connection_created" | "connection_deleted" => {
            let from = parse_planet_id(object.get("from")?)?;
            let to = parse_planet_id(object.get("to")?)?;
            if message_type == "connection_created" {
                Some(NetMessage::ConnectionCreated { request, from, to })
            } else {
                Some(NetMessage::ConnectionDeleted { request, from, to })
            }
        }
        "full_sync" => {
            let state = match object.get("state") {
                None | Some(Value::Null) => None,
                Some(value) => Some(Box::new(
                    serde_json::from_value::<SavedMatch>(value.clone()).ok()?,
                )),
            };
            if !request && state.is_none() {
                return None;
            }
            Some(NetMessage::FullSync { request, state })
        }
        "tick_sync" => {
            let ticks = object.get("ticks")?.as_u64()?;
            let sent_at = object.get("sentAt")?.as_u64()?;
            Some(NetMessage::TickSync {
                request,
                ticks,
                sent_at,
            })
        }
        "seat_assigned" => {
            let faction = match object.get("faction") {
                None | Some(Value::Null) => None,
                Some(value) => Some(serde_json::from_value::<FactionColor>(value.clone()).ok()?),
            };
            Some(NetMessage::SeatAssigned { faction })
        }
        _ => None,
    }
}

/// Cards travel either by name or by card-bar slot index.
fn parse_card(value: &Value) -> Option<CardKind> {
    if let Some(slot) = value.as_u64() {
        return CardKind::from_slot(usize::try_from(slot).ok()?);
    }
    match value.as_str()? {
        "satellite" => Some(CardKind::Satellite),
        "rocket" => Some(CardKind::Rocket),
        _ => None,
    }
}

fn parse_planet_id(value: &Value) -> Option<PlanetId> {
    let raw = value.as_u64()?;
    u32::try_from(raw).ok().map(PlanetId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLAYER_COLOR;
    use crate::engine::{GameEngine, GameEngineOptions};

    #[test]
    fn parse_card_dropped_by_name_and_slot() {
        let parsed =
            parse_net_message(r#"{"type":"card_dropped","request":true,"card":"rocket","planet":4}"#)
                .expect("card message should parse");
        match parsed {
            NetMessage::CardDropped {
                request,
                card,
                planet,
            } => {
                assert!(request);
                assert_eq!(card, CardKind::Rocket);
                assert_eq!(planet, PlanetId(4));
            }
            _ => panic!("expected card_dropped message"),
        }

        let parsed = parse_net_message(r#"{"type":"card_dropped","card":0,"planet":1}"#);
        assert!(matches!(
            parsed,
            Some(NetMessage::CardDropped {
                request: false,
                card: CardKind::Satellite,
                ..
            })
        ));
    }

    #[test]
    fn parse_rejects_bad_payloads() {
        assert!(parse_net_message(r#"{"type":"card_dropped","card":"laser","planet":1}"#).is_none());
        assert!(parse_net_message(r#"{"type":"card_dropped","card":2,"planet":1}"#).is_none());
        assert!(parse_net_message(r#"{"type":"connection_created","from":-1,"to":2}"#).is_none());
        assert!(
            parse_net_message(r#"{"type":"connection_created","from":1,"to":4294967296}"#).is_none()
        );
        assert!(parse_net_message(r#"{"type":"tick_sync","ticks":5}"#).is_none());
        assert!(parse_net_message(r#"{"type":"connection_deleted","request":"yes","from":1,"to":2}"#).is_none());
        assert!(parse_net_message(r#"{"type":"unknown"}"#).is_none());
        assert!(parse_net_message("not json").is_none());
    }

    #[test]
    fn full_sync_update_needs_state() {
        assert!(parse_net_message(r#"{"type":"full_sync","request":false}"#).is_none());
        assert!(matches!(
            parse_net_message(r#"{"type":"full_sync","request":true}"#),
            Some(NetMessage::FullSync {
                request: true,
                state: None
            })
        ));
    }

    #[test]
    fn encoded_updates_parse_back() {
        let engine = GameEngine::new(PLAYER_COLOR, None, 1, GameEngineOptions::default());
        let message = NetMessage::FullSync {
            request: false,
            state: Some(Box::new(SavedMatch::from_engine(&engine))),
        };
        let text = encode_net_message(&message).expect("full sync should encode");
        match parse_net_message(&text) {
            Some(NetMessage::FullSync {
                request: false,
                state: Some(state),
            }) => assert_eq!(state.planets.len(), engine.planets().len()),
            other => panic!("unexpected parse result: {other:?}"),
        }

        let text = encode_net_message(&NetMessage::TickSync {
            request: false,
            ticks: 1_500,
            sent_at: 99,
        })
        .expect("tick sync should encode");
        assert_eq!(text, r#"{"type":"tick_sync","request":false,"ticks":1500,"sentAt":99}"#);
    }

    #[test]
    fn request_becomes_update() {
        let update = NetMessage::ConnectionCreated {
            request: true,
            from: PlanetId(1),
            to: PlanetId(2),
        }
        .into_update();
        assert!(!update.is_request());
        assert!(matches!(
            update,
            NetMessage::ConnectionCreated {
                from: PlanetId(1),
                to: PlanetId(2),
                ..
            }
        ));
    }
}
