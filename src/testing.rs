//! Test support: a scripted, fully in-memory [`Actor`] implementation.
//!
//! `ScriptedActor` backs every host-side system with plain collections so
//! tests can observe exactly what conditions read and actions wrote. It is
//! also a reasonable starting point for hosts wiring up their first real
//! actor type.

use crate::actor::{Actor, ActorId, InitiatorId, Mood, MoodKind, PersonalityTrait};
use std::collections::{HashMap, HashSet};

/// A recorded memory event, kept verbatim for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub initiator: InitiatorId,
    pub description: String,
    pub importance: u8,
}

/// An in-memory actor with observable state.
///
/// Every [`Actor`] method is backed by a field tests can inspect; nothing
/// decays or persists between instances.
#[derive(Debug, Clone)]
pub struct ScriptedActor {
    id: ActorId,
    name: String,
    category: String,
    mood: Mood,
    traits: HashMap<PersonalityTrait, i32>,
    memory_tags: HashSet<(InitiatorId, String)>,
    known_initiators: HashSet<InitiatorId>,
    events: Vec<RecordedEvent>,
    standings: HashMap<(InitiatorId, String), i32>,
    purse: i64,
    quests_offered: Vec<String>,
    quests_advanced: Vec<String>,
    rumors: Vec<String>,
}

impl ScriptedActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            category: "generic".to_string(),
            mood: Mood::calm(),
            traits: HashMap::new(),
            memory_tags: HashSet::new(),
            known_initiators: HashSet::new(),
            events: Vec::new(),
            standings: HashMap::new(),
            purse: 0,
            quests_offered: Vec::new(),
            quests_advanced: Vec::new(),
            rumors: Vec::new(),
        }
    }

    /// Set the fallback-selection category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the starting mood.
    pub fn with_mood(mut self, kind: MoodKind, intensity: f32) -> Self {
        self.mood = Mood::new(kind, intensity);
        self
    }

    /// Set a personality trait score.
    pub fn set_trait(&mut self, kind: PersonalityTrait, score: i32) {
        self.traits.insert(kind, score);
    }

    /// Set the initiator-side currency balance used by `withdraw`/`deposit`.
    pub fn set_purse(&mut self, amount: i64) {
        self.purse = amount;
    }

    pub fn purse(&self) -> i64 {
        self.purse
    }

    /// Events recorded via [`Actor::record_event`], oldest first.
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    pub fn quests_offered(&self) -> Vec<String> {
        self.quests_offered.clone()
    }

    pub fn quests_advanced(&self) -> Vec<String> {
        self.quests_advanced.clone()
    }

    pub fn rumors(&self) -> Vec<String> {
        self.rumors.clone()
    }
}

impl Actor for ScriptedActor {
    fn id(&self) -> ActorId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn mood(&self) -> Mood {
        self.mood
    }

    fn trigger_mood(&mut self, kind: MoodKind, intensity: f32) {
        self.mood = Mood::new(kind, intensity);
    }

    fn remembers(&self, initiator: InitiatorId) -> bool {
        self.known_initiators.contains(&initiator)
    }

    fn has_memory_tag(&self, initiator: InitiatorId, tag: &str) -> bool {
        self.memory_tags.contains(&(initiator, tag.to_string()))
    }

    fn add_memory_tag(&mut self, initiator: InitiatorId, tag: &str) {
        self.known_initiators.insert(initiator);
        self.memory_tags.insert((initiator, tag.to_string()));
    }

    fn remove_memory_tag(&mut self, initiator: InitiatorId, tag: &str) {
        self.memory_tags.remove(&(initiator, tag.to_string()));
    }

    fn record_event(&mut self, initiator: InitiatorId, description: &str, importance: u8) {
        self.known_initiators.insert(initiator);
        self.events.push(RecordedEvent {
            initiator,
            description: description.to_string(),
            importance,
        });
    }

    fn trait_score(&self, kind: PersonalityTrait) -> i32 {
        self.traits.get(&kind).copied().unwrap_or(0)
    }

    fn faction_standing(&self, initiator: InitiatorId, faction: &str) -> i32 {
        self.standings
            .get(&(initiator, faction.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn adjust_faction_standing(&mut self, initiator: InitiatorId, faction: &str, delta: i32) {
        *self
            .standings
            .entry((initiator, faction.to_string()))
            .or_insert(0) += delta;
    }

    fn deposit(&mut self, _initiator: InitiatorId, amount: i64) {
        self.purse += amount;
    }

    fn withdraw(&mut self, _initiator: InitiatorId, amount: i64) -> bool {
        if self.purse >= amount {
            self.purse -= amount;
            true
        } else {
            false
        }
    }

    fn offer_quest(&mut self, _initiator: InitiatorId, quest_id: &str) {
        self.quests_offered.push(quest_id.to_string());
    }

    fn advance_quest(&mut self, _initiator: InitiatorId, quest_id: &str) {
        self.quests_advanced.push(quest_id.to_string());
    }

    fn broadcast_rumor(&mut self, _initiator: InitiatorId, topic: &str) {
        self.rumors.push(topic.to_string());
    }
}
