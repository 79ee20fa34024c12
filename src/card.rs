//! Card metadata as seen by the compositor.
//!
//! The card type is a tagged variant: stats only exist on creatures, so
//! whether a stat badge is drawn is decided by a pattern match rather than by
//! comparing type strings.

use std::fmt;

use serde::Deserialize;

use crate::source::ImageSource;

/// Shown in the footer when no usable creator name was supplied.
pub const ANONYMOUS_CREATOR: &str = "Anonymous";

/// Attack and defense of a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub attack: i64,
    pub defense: i64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.attack, self.defense)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardKind {
    /// `stats` is `None` when attack or defense was not supplied.
    Creature { stats: Option<Stats> },
    Spell,
    Artifact,
    Other(String),
}

impl CardKind {
    /// Build the kind from the raw type string. Matching is exact: only
    /// `"Creature"` carries stats, and only when both values are present.
    pub fn from_parts(card_type: &str, attack: Option<i64>, defense: Option<i64>) -> Self {
        match card_type {
            "Creature" => CardKind::Creature {
                stats: attack
                    .zip(defense)
                    .map(|(attack, defense)| Stats { attack, defense }),
            },
            "Spell" => CardKind::Spell,
            "Artifact" => CardKind::Artifact,
            other => CardKind::Other(other.to_string()),
        }
    }

    /// Text printed in the type band.
    pub fn label(&self) -> &str {
        match self {
            CardKind::Creature { .. } => "Creature",
            CardKind::Spell => "Spell",
            CardKind::Artifact => "Artifact",
            CardKind::Other(s) => s,
        }
    }

    pub fn stats(&self) -> Option<Stats> {
        match self {
            CardKind::Creature { stats } => *stats,
            _ => None,
        }
    }
}

/// Everything printed on the card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardFace {
    pub title: String,
    pub kind: CardKind,
    /// Rendered as-is; not clamped.
    pub cost: i64,
    pub description: String,
    pub frame_color: String,
    /// Raw creator name; see [`sanitize_creator`].
    pub creator: Option<String>,
}

/// Raw card row as accepted from JSON (CLI, manifests).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFields {
    pub title: String,
    #[serde(rename = "type")]
    pub card_type: String,
    pub cost: i64,
    pub description: String,
    pub frame_color: String,
    #[serde(default)]
    pub attack: Option<i64>,
    #[serde(default)]
    pub defense: Option<i64>,
    #[serde(default)]
    pub creator: Option<String>,
}

impl From<CardFields> for CardFace {
    fn from(f: CardFields) -> Self {
        CardFace {
            kind: CardKind::from_parts(&f.card_type, f.attack, f.defense),
            title: f.title,
            cost: f.cost,
            description: f.description,
            frame_color: f.frame_color,
            creator: f.creator,
        }
    }
}

/// Input of one render: where the photo comes from and what to print.
#[derive(Debug, Clone)]
pub struct CardRequest {
    pub source: ImageSource,
    pub face: CardFace,
}

/// Trim the creator name, replacing absent, blank or literal `"undefined"`
/// values with [`ANONYMOUS_CREATOR`].
pub fn sanitize_creator(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") | Some("undefined") => ANONYMOUS_CREATOR.to_string(),
        Some(name) => name.to_string(),
    }
}
