//! Render request payloads.
//!
//! A payload is a tagged union keyed by the JSON `type` field. Parsing happens
//! in two steps so that an unrecognized tag and a malformed body surface as
//! different errors.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The card template a payload asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Profile,
    Share,
    Cleanup,
}

impl CardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardKind::Profile => "profile",
            CardKind::Share => "share",
            CardKind::Cleanup => "cleanup",
        }
    }

    /// Resolve a payload tag, failing with `UnknownCardType` for anything else.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "profile" => Ok(CardKind::Profile),
            "share" => Ok(CardKind::Share),
            "cleanup" => Ok(CardKind::Cleanup),
            other => Err(Error::UnknownCardType(other.to_string())),
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and team shown in the chrome of every card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub team: String,
}

/// Profile of the player card, which additionally shows the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub team: String,
    pub level: i64,
}

/// Lifetime statistics of a player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareStats {
    pub area: f64,
    pub volume: f64,
}

/// Results of a single cleanup event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupStats {
    pub name: String,
    pub area: f64,
    pub volume: f64,
    pub impact: f64,
    pub participants: i64,
}

/// A render request, one variant per card template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SharePayload {
    Profile {
        /// 1-based index into the mascot set
        #[serde(alias = "monsterIndex")]
        monster: i64,
        profile: PlayerProfile,
        share: ShareStats,
    },
    Share {
        profile: Profile,
        share: ShareStats,
    },
    Cleanup {
        /// Accepted for compatibility with the web client; not drawn
        #[serde(default, alias = "monsterIndex")]
        monster: Option<i64>,
        profile: Profile,
        cleanup: CleanupStats,
    },
}

impl SharePayload {
    /// Parse a payload from its JSON message form.
    ///
    /// Unknown extra fields are ignored. A missing `type` or a body that does
    /// not match the declared tag yields `InvalidPayload`; an unrecognized tag
    /// yields `UnknownCardType`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::InvalidPayload("missing string field `type`".into()))?;
        let kind = CardKind::from_tag(tag)?;
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidPayload(format!("{} payload: {}", kind, e)))
    }

    pub fn kind(&self) -> CardKind {
        match self {
            SharePayload::Profile { .. } => CardKind::Profile,
            SharePayload::Share { .. } => CardKind::Share,
            SharePayload::Cleanup { .. } => CardKind::Cleanup,
        }
    }

    /// Name and team, present on every variant
    pub fn chrome(&self) -> (&str, &str) {
        match self {
            SharePayload::Profile { profile, .. } => (&profile.name, &profile.team),
            SharePayload::Share { profile, .. } | SharePayload::Cleanup { profile, .. } => {
                (&profile.name, &profile.team)
            }
        }
    }

    /// Fail with `InvalidPayload` unless the payload carries the `expected` tag.
    pub fn expect_kind(&self, expected: CardKind) -> Result<()> {
        if self.kind() == expected {
            Ok(())
        } else {
            Err(Error::InvalidPayload(format!(
                "expected a {} payload, got {}",
                expected,
                self.kind()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_payload() {
        let p = SharePayload::from_json(
            r#"{"type":"profile","monster":2,"profile":{"name":"Ana","team":"Blue","level":5},"share":{"area":12.5,"volume":3.2}}"#,
        )
        .unwrap();
        assert_eq!(p.kind(), CardKind::Profile);
        assert_eq!(p.chrome(), ("Ana", "Blue"));
        match p {
            SharePayload::Profile { monster, profile, share } => {
                assert_eq!(monster, 2);
                assert_eq!(profile.level, 5);
                assert_eq!(share.area, 12.5);
            }
            _ => panic!("unexpected variant"),
        }
    }

    #[test]
    fn accepts_monster_index_alias_and_ignores_extra_fields() {
        let p = SharePayload::from_json(
            r#"{"type":"profile","monsterIndex":4,"extra":true,"profile":{"name":"A","team":"B","level":1,"avatar":"x"},"share":{"area":1,"volume":2}}"#,
        )
        .unwrap();
        assert!(matches!(p, SharePayload::Profile { monster: 4, .. }));
    }

    #[test]
    fn unknown_tag_is_unknown_card_type() {
        let err = SharePayload::from_json(r#"{"type":"poster","profile":{"name":"A","team":"B"}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCardType(t) if t == "poster"));
    }

    #[test]
    fn missing_field_is_invalid_payload() {
        let err = SharePayload::from_json(r#"{"type":"cleanup","profile":{"name":"A","team":"B"}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));

        let err = SharePayload::from_json(r#"{"profile":{"name":"A","team":"B"}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn expect_kind_rejects_mismatch() {
        let p = SharePayload::Share {
            profile: Profile { name: "A".into(), team: "B".into() },
            share: ShareStats { area: 1.0, volume: 1.0 },
        };
        assert!(p.expect_kind(CardKind::Share).is_ok());
        assert!(matches!(p.expect_kind(CardKind::Cleanup), Err(Error::InvalidPayload(_))));
    }
}
