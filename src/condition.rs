//! Composable predicates over conversation and actor state.
//!
//! A [`Condition`] gates option visibility and enablement, node entry, tree
//! starts, and conditional text. Leaf conditions wrap a host-supplied
//! closure; the combinators stay a closed set so evaluation is exhaustive.
//! Conditions read state but never mutate it.

use crate::actor::{Actor, MoodKind, PersonalityTrait};
use crate::context::{DialogueContext, Value};
use rand::Rng;
use std::fmt;
use std::sync::{Arc, Mutex};

type LeafFn = dyn Fn(&DialogueContext, &dyn Actor) -> bool + Send + Sync;

#[derive(Clone)]
enum Kind {
    Always,
    Never,
    Leaf(Arc<LeafFn>),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

/// A named, describable predicate over `(context, actor)`.
///
/// Identity is by description only, for diagnostics; two structurally equal
/// conditions are interchangeable.
#[derive(Clone)]
pub struct Condition {
    id: String,
    description: String,
    kind: Kind,
}

impl Condition {
    /// Wrap a host-supplied predicate as a leaf condition.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        predicate: impl Fn(&DialogueContext, &dyn Actor) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind: Kind::Leaf(Arc::new(predicate)),
        }
    }

    /// A condition that always holds.
    pub fn always() -> Self {
        Self {
            id: "always".to_string(),
            description: "always".to_string(),
            kind: Kind::Always,
        }
    }

    /// A condition that never holds.
    pub fn never() -> Self {
        Self {
            id: "never".to_string(),
            description: "never".to_string(),
            kind: Kind::Never,
        }
    }

    /// All children must hold. Evaluates left to right and stops at the
    /// first failure; the empty conjunction holds.
    pub fn and(conditions: Vec<Condition>) -> Self {
        Self {
            id: "and".to_string(),
            description: format!(
                "all of [{}]",
                conditions
                    .iter()
                    .map(|c| c.description.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            kind: Kind::And(conditions),
        }
    }

    /// Any child must hold. Evaluates left to right and stops at the first
    /// success; the empty disjunction fails.
    pub fn or(conditions: Vec<Condition>) -> Self {
        Self {
            id: "or".to_string(),
            description: format!(
                "any of [{}]",
                conditions
                    .iter()
                    .map(|c| c.description.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            kind: Kind::Or(conditions),
        }
    }

    /// Negate a condition.
    pub fn not(condition: Condition) -> Self {
        Self {
            id: format!("not_{}", condition.id),
            description: format!("not ({})", condition.description),
            kind: Kind::Not(Box::new(condition)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate against the current session and actor.
    ///
    /// Combinator children are evaluated strictly left to right with
    /// short-circuiting. That ordering is a contract: leaf conditions may
    /// have observable cost, and content authors order cheap checks first.
    pub fn evaluate(&self, ctx: &DialogueContext, actor: &dyn Actor) -> bool {
        match &self.kind {
            Kind::Always => true,
            Kind::Never => false,
            Kind::Leaf(predicate) => predicate(ctx, actor),
            Kind::And(children) => children.iter().all(|c| c.evaluate(ctx, actor)),
            Kind::Or(children) => children.iter().any(|c| c.evaluate(ctx, actor)),
            Kind::Not(child) => !child.evaluate(ctx, actor),
        }
    }

    // ------------------------------------------------------------------
    // Standard leaf conditions
    // ------------------------------------------------------------------

    /// Actor is in the given mood with at least this intensity.
    pub fn mood_is(kind: MoodKind, min_intensity: f32) -> Self {
        Self::new(
            format!("mood_{}_{}", kind.label(), min_intensity as i32),
            format!("actor is {} (intensity >= {min_intensity})", kind.label()),
            move |_, actor| actor.mood().is_at_least(kind, min_intensity),
        )
    }

    /// Actor remembers this initiator with the given tag.
    pub fn memory_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(
            format!("memory_tag_{tag}"),
            format!("initiator is tagged '{tag}'"),
            {
                let tag = tag.clone();
                move |ctx, actor| actor.has_memory_tag(ctx.initiator(), &tag)
            },
        )
    }

    /// Actor does not remember this initiator with the given tag.
    pub fn no_memory_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(
            format!("no_memory_tag_{tag}"),
            format!("initiator is not tagged '{tag}'"),
            {
                let tag = tag.clone();
                move |ctx, actor| !actor.has_memory_tag(ctx.initiator(), &tag)
            },
        )
    }

    /// Initiator's standing with a faction is at least the threshold.
    pub fn faction_standing_at_least(faction: impl Into<String>, min: i32) -> Self {
        let faction = faction.into();
        Self::new(
            format!("faction_{faction}_{min}"),
            format!("standing with {faction} >= {min}"),
            {
                let faction = faction.clone();
                move |ctx, actor| actor.faction_standing(ctx.initiator(), &faction) >= min
            },
        )
    }

    /// Actor's personality trait score is at least the threshold.
    pub fn trait_at_least(kind: PersonalityTrait, min: i32) -> Self {
        Self::new(
            format!("trait_{}_{min}", kind.name()),
            format!("actor {} >= {min}", kind.name()),
            move |_, actor| actor.trait_score(kind) >= min,
        )
    }

    /// Actor's personality trait score is below the threshold.
    pub fn trait_below(kind: PersonalityTrait, max: i32) -> Self {
        Self::new(
            format!("trait_{}_below_{max}", kind.name()),
            format!("actor {} < {max}", kind.name()),
            move |_, actor| actor.trait_score(kind) < max,
        )
    }

    /// The given node was entered earlier in this conversation.
    pub fn visited(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::new(
            format!("visited_{node_id}"),
            format!("node '{node_id}' visited"),
            {
                let node_id = node_id.clone();
                move |ctx, _| ctx.has_visited(&node_id)
            },
        )
    }

    /// The given node was not entered in this conversation.
    pub fn not_visited(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::new(
            format!("not_visited_{node_id}"),
            format!("node '{node_id}' not visited"),
            {
                let node_id = node_id.clone();
                move |ctx, _| !ctx.has_visited(&node_id)
            },
        )
    }

    /// A session flag is set.
    pub fn flag_set(flag: impl Into<String>) -> Self {
        let flag = flag.into();
        Self::new(format!("flag_{flag}"), format!("flag '{flag}' set"), {
            let flag = flag.clone();
            move |ctx, _| ctx.has_flag(&flag)
        })
    }

    /// A session variable equals the given value.
    pub fn variable_equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::new(
            format!("var_{key}"),
            format!("variable '{key}' == {value}"),
            {
                let key = key.clone();
                move |ctx, _| ctx.variable(&key) == Some(&value)
            },
        )
    }

    /// The actor has no memory of this initiator yet.
    pub fn first_meeting() -> Self {
        Self::new(
            "first_meeting",
            "actor does not remember the initiator",
            |ctx, actor| !actor.remembers(ctx.initiator()),
        )
    }

    /// Holds with the given probability on every evaluation.
    ///
    /// Draws from the thread-local rng; content that needs reproducible
    /// draws uses [`Condition::chance_with_rng`] instead.
    pub fn chance(probability: f64) -> Self {
        let probability = clamp_probability(probability);
        Self::new(
            format!("chance_{}", (probability * 100.0) as i32),
            format!("random chance {probability}"),
            move |_, _| rand::thread_rng().gen_bool(probability),
        )
    }

    /// Holds with the given probability, drawing from the supplied rng.
    ///
    /// A seeded rng makes the draw sequence reproducible, so tests can
    /// exercise probabilistic branches deterministically.
    pub fn chance_with_rng<R>(probability: f64, rng: R) -> Self
    where
        R: Rng + Send + 'static,
    {
        let probability = clamp_probability(probability);
        let rng = Mutex::new(rng);
        Self::new(
            format!("chance_{}", (probability * 100.0) as i32),
            format!("random chance {probability} (seeded)"),
            move |_, _| match rng.lock() {
                Ok(mut rng) => rng.gen_bool(probability),
                Err(_) => false,
            },
        )
    }
}

// gen_bool panics outside [0, 1]; NaN maps to "never".
fn clamp_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Initiator;
    use crate::testing::ScriptedActor;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context() -> (DialogueContext, ScriptedActor) {
        let actor = ScriptedActor::new("Greta");
        let initiator = Initiator::new("Ash");
        let ctx = DialogueContext::new(&initiator, actor.id(), "test_tree");
        (ctx, actor)
    }

    /// Leaf condition that counts its evaluations.
    fn counting(result: bool, counter: Arc<AtomicUsize>) -> Condition {
        Condition::new("counting", "counting leaf", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    #[test]
    fn test_empty_combinators() {
        let (ctx, actor) = context();
        assert!(Condition::and(vec![]).evaluate(&ctx, &actor));
        assert!(!Condition::or(vec![]).evaluate(&ctx, &actor));
    }

    #[test]
    fn test_double_negation() {
        let (ctx, actor) = context();
        let c = Condition::not(Condition::not(Condition::always()));
        assert!(c.evaluate(&ctx, &actor));
        let c = Condition::not(Condition::not(Condition::never()));
        assert!(!c.evaluate(&ctx, &actor));
    }

    #[test]
    fn test_and_short_circuits_left_to_right() {
        let (ctx, actor) = context();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let c = Condition::and(vec![
            counting(false, first.clone()),
            counting(true, second.clone()),
        ]);
        assert!(!c.evaluate(&ctx, &actor));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_or_short_circuits_left_to_right() {
        let (ctx, actor) = context();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let c = Condition::or(vec![
            counting(true, first.clone()),
            counting(false, second.clone()),
        ]);
        assert!(c.evaluate(&ctx, &actor));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_flag_and_visited_conditions() {
        let (mut ctx, actor) = context();
        assert!(!Condition::flag_set("angry").evaluate(&ctx, &actor));
        ctx.set_flag("angry");
        assert!(Condition::flag_set("angry").evaluate(&ctx, &actor));

        assert!(Condition::not_visited("lair").evaluate(&ctx, &actor));
        ctx.enter_node("lair");
        assert!(Condition::visited("lair").evaluate(&ctx, &actor));
    }

    #[test]
    fn test_memory_tag_condition() {
        let (ctx, mut actor) = context();
        assert!(!Condition::memory_tag("friend").evaluate(&ctx, &actor));
        actor.add_memory_tag(ctx.initiator(), "friend");
        assert!(Condition::memory_tag("friend").evaluate(&ctx, &actor));
        assert!(!Condition::no_memory_tag("friend").evaluate(&ctx, &actor));
    }

    #[test]
    fn test_trait_and_faction_conditions() {
        let (ctx, mut actor) = context();
        actor.set_trait(PersonalityTrait::Greed, 40);
        assert!(Condition::trait_at_least(PersonalityTrait::Greed, 30).evaluate(&ctx, &actor));
        assert!(!Condition::trait_below(PersonalityTrait::Greed, 30).evaluate(&ctx, &actor));

        actor.adjust_faction_standing(ctx.initiator(), "merchants", 25);
        assert!(
            Condition::faction_standing_at_least("merchants", 20).evaluate(&ctx, &actor)
        );
        assert!(
            !Condition::faction_standing_at_least("merchants", 30).evaluate(&ctx, &actor)
        );
    }

    #[test]
    fn test_variable_equals() {
        let (mut ctx, actor) = context();
        ctx.set_variable("tactic", "friendly");
        assert!(Condition::variable_equals("tactic", "friendly").evaluate(&ctx, &actor));
        assert!(!Condition::variable_equals("tactic", "pressure").evaluate(&ctx, &actor));
    }

    #[test]
    fn test_chance_extremes() {
        let (ctx, actor) = context();
        assert!(Condition::chance(1.0).evaluate(&ctx, &actor));
        assert!(!Condition::chance(0.0).evaluate(&ctx, &actor));
    }

    #[test]
    fn test_chance_tolerates_bad_probabilities() {
        let (ctx, actor) = context();
        assert!(!Condition::chance(f64::NAN).evaluate(&ctx, &actor));
        assert!(!Condition::chance(f64::NEG_INFINITY).evaluate(&ctx, &actor));
        assert!(Condition::chance(f64::INFINITY).evaluate(&ctx, &actor));
    }

    #[test]
    fn test_seeded_chance_is_reproducible() {
        let (ctx, actor) = context();
        let first = Condition::chance_with_rng(0.5, StdRng::seed_from_u64(7));
        let second = Condition::chance_with_rng(0.5, StdRng::seed_from_u64(7));

        let draws = |c: &Condition| (0..32).map(|_| c.evaluate(&ctx, &actor)).collect::<Vec<_>>();
        assert_eq!(draws(&first), draws(&second));

        let always = Condition::chance_with_rng(1.0, StdRng::seed_from_u64(7));
        assert!(always.evaluate(&ctx, &actor));
    }

    #[test]
    fn test_first_meeting() {
        let (ctx, mut actor) = context();
        assert!(Condition::first_meeting().evaluate(&ctx, &actor));
        actor.record_event(ctx.initiator(), "met", 1);
        assert!(!Condition::first_meeting().evaluate(&ctx, &actor));
    }
}
