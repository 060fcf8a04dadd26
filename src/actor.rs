//! Actor-side contracts for the dialogue engine.
//!
//! The engine never owns actor state. Mood, memory, personality, faction
//! standings, and shared systems (currency, quests, rumors) live in the host;
//! the engine reaches them through the [`Actor`] trait, which leaf conditions
//! and actions close over.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for conversation initiators (players).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InitiatorId(pub Uuid);

impl InitiatorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InitiatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InitiatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for autonomous actors (NPCs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lightweight handle for the human side of a conversation.
///
/// The engine only needs a stable id and a display name for text
/// interpolation; everything else about the player stays in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiator {
    pub id: InitiatorId,
    pub name: String,
}

impl Initiator {
    /// Create an initiator with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: InitiatorId::new(),
            name: name.into(),
        }
    }

    /// Create an initiator with a known id.
    pub fn with_id(id: InitiatorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The discrete moods an actor can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodKind {
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Suspicious,
}

impl MoodKind {
    /// Human-readable label, used by the `{mood}` text placeholder.
    pub fn label(&self) -> &'static str {
        match self {
            MoodKind::Calm => "calm",
            MoodKind::Happy => "happy",
            MoodKind::Sad => "sad",
            MoodKind::Angry => "angry",
            MoodKind::Fearful => "fearful",
            MoodKind::Suspicious => "suspicious",
        }
    }
}

impl fmt::Display for MoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// An actor's current mood with its intensity (0.0 to 100.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub kind: MoodKind,
    pub intensity: f32,
}

impl Mood {
    pub fn new(kind: MoodKind, intensity: f32) -> Self {
        Self {
            kind,
            intensity: intensity.clamp(0.0, 100.0),
        }
    }

    /// A neutral resting mood.
    pub fn calm() -> Self {
        Self::new(MoodKind::Calm, 0.0)
    }

    /// Check the mood against a kind and minimum intensity.
    pub fn is_at_least(&self, kind: MoodKind, min_intensity: f32) -> bool {
        self.kind == kind && self.intensity >= min_intensity
    }
}

/// Personality traits that conditions can query as numeric scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalityTrait {
    Courage,
    Honesty,
    Greed,
    Sociability,
}

impl PersonalityTrait {
    pub fn name(&self) -> &'static str {
        match self {
            PersonalityTrait::Courage => "courage",
            PersonalityTrait::Honesty => "honesty",
            PersonalityTrait::Greed => "greed",
            PersonalityTrait::Sociability => "sociability",
        }
    }
}

impl fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The engine's view of an autonomous actor and the systems behind it.
///
/// Hosts implement this once per actor kind. All methods are synchronous and
/// must not block: a host wrapping an asynchronous backend should expose
/// cached values here. Read methods are called from conditions, mutating
/// methods from actions; the engine itself only calls [`Actor::record_event`]
/// when a conversation starts.
///
/// The shared-subsystem methods (currency, quests, rumors) have no-op
/// defaults so minimal hosts only wire what their content uses.
pub trait Actor {
    /// Stable identifier, used for tree assignment and session bookkeeping.
    fn id(&self) -> ActorId;

    /// Display name, used by the `{actor}` text placeholder.
    fn display_name(&self) -> &str;

    /// Coarse category (e.g. "merchant", "guard") used to pick a fallback
    /// tree when no registered tree applies.
    fn category(&self) -> &str {
        "generic"
    }

    /// Current mood and intensity.
    fn mood(&self) -> Mood;

    /// Push the actor toward a mood. How triggers combine or decay is the
    /// host's business.
    fn trigger_mood(&mut self, kind: MoodKind, intensity: f32);

    /// Whether the actor has any memory of this initiator.
    fn remembers(&self, initiator: InitiatorId) -> bool;

    /// Whether the actor's memory of this initiator carries a tag.
    fn has_memory_tag(&self, initiator: InitiatorId, tag: &str) -> bool;

    /// Attach a memory tag for this initiator.
    fn add_memory_tag(&mut self, initiator: InitiatorId, tag: &str);

    /// Remove a memory tag for this initiator.
    fn remove_memory_tag(&mut self, initiator: InitiatorId, tag: &str);

    /// Record a noteworthy event in the actor's memory of this initiator.
    /// Importance is host-defined (the stock content uses 1..=6).
    fn record_event(&mut self, initiator: InitiatorId, description: &str, importance: u8);

    /// Numeric score for a personality trait.
    fn trait_score(&self, kind: PersonalityTrait) -> i32;

    /// The initiator's standing with a named faction.
    fn faction_standing(&self, initiator: InitiatorId, faction: &str) -> i32;

    /// Adjust the initiator's standing with a named faction.
    fn adjust_faction_standing(&mut self, initiator: InitiatorId, faction: &str, delta: i32);

    /// Deposit currency into the initiator's funds.
    fn deposit(&mut self, _initiator: InitiatorId, _amount: i64) {}

    /// Withdraw currency from the initiator's funds. Returns false when the
    /// initiator cannot pay; the calling action decides how to proceed.
    fn withdraw(&mut self, _initiator: InitiatorId, _amount: i64) -> bool {
        false
    }

    /// Offer a quest to the initiator.
    fn offer_quest(&mut self, _initiator: InitiatorId, _quest_id: &str) {}

    /// Advance a quest the initiator is on.
    fn advance_quest(&mut self, _initiator: InitiatorId, _quest_id: &str) {}

    /// Put a rumor about the initiator into circulation.
    fn broadcast_rumor(&mut self, _initiator: InitiatorId, _topic: &str) {}
}
