//! Composable side effects triggered by conversations.
//!
//! An [`Action`] runs when a node is entered or an option is selected. Leaf
//! actions wrap a host-supplied closure and may mutate the session, the
//! actor's background state, or shared systems reachable through the actor.
//! All effects are synchronous; an action must never block.

use crate::actor::{Actor, MoodKind};
use crate::condition::Condition;
use crate::context::{DialogueContext, Value};
use std::fmt;
use std::sync::Arc;

type LeafFn = dyn Fn(&mut DialogueContext, &mut dyn Actor) + Send + Sync;

#[derive(Clone)]
enum Kind {
    Leaf(Arc<LeafFn>),
    Sequence(Vec<Action>),
    Conditional {
        when: Condition,
        then_run: Box<Action>,
        otherwise: Option<Box<Action>>,
    },
}

/// A named, describable effect over `(context, actor)`.
#[derive(Clone)]
pub struct Action {
    id: String,
    description: String,
    kind: Kind,
}

impl Action {
    /// Wrap a host-supplied effect as a leaf action.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        effect: impl Fn(&mut DialogueContext, &mut dyn Actor) + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            kind: Kind::Leaf(Arc::new(effect)),
        }
    }

    /// Run every child in order.
    ///
    /// Deliberately runs all children even if an earlier one ends the
    /// conversation, so cleanup effects composed after an `end` still fire.
    pub fn sequence(actions: Vec<Action>) -> Self {
        Self {
            id: "sequence".to_string(),
            description: format!("sequence of {} actions", actions.len()),
            kind: Kind::Sequence(actions),
        }
    }

    /// Run one of two branches depending on a condition.
    pub fn when(condition: Condition, then_run: Action, otherwise: Option<Action>) -> Self {
        Self {
            id: "conditional".to_string(),
            description: format!("if {} then {}", condition.description(), then_run.description),
            kind: Kind::Conditional {
                when: condition,
                then_run: Box::new(then_run),
                otherwise: otherwise.map(Box::new),
            },
        }
    }

    /// An action with no effect.
    pub fn none() -> Self {
        Self::new("none", "no effect", |_, _| {})
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Execute against the current session and actor.
    pub fn execute(&self, ctx: &mut DialogueContext, actor: &mut dyn Actor) {
        match &self.kind {
            Kind::Leaf(effect) => effect(ctx, actor),
            Kind::Sequence(children) => {
                for child in children {
                    child.execute(ctx, actor);
                }
            }
            Kind::Conditional {
                when,
                then_run,
                otherwise,
            } => {
                if when.evaluate(ctx, actor) {
                    then_run.execute(ctx, actor);
                } else if let Some(action) = otherwise {
                    action.execute(ctx, actor);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Standard leaf actions
    // ------------------------------------------------------------------

    /// Push the actor toward a mood.
    pub fn trigger_mood(kind: MoodKind, intensity: f32) -> Self {
        Self::new(
            format!("mood_{}", kind.label()),
            format!("trigger {} ({intensity})", kind.label()),
            move |_, actor| actor.trigger_mood(kind, intensity),
        )
    }

    /// Tag the actor's memory of the initiator.
    pub fn add_memory_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(format!("add_tag_{tag}"), format!("add tag '{tag}'"), {
            let tag = tag.clone();
            move |ctx, actor| actor.add_memory_tag(ctx.initiator(), &tag)
        })
    }

    /// Remove a tag from the actor's memory of the initiator.
    pub fn remove_memory_tag(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::new(format!("remove_tag_{tag}"), format!("remove tag '{tag}'"), {
            let tag = tag.clone();
            move |ctx, actor| actor.remove_memory_tag(ctx.initiator(), &tag)
        })
    }

    /// Record an event in the actor's memory of the initiator.
    pub fn record_event(description: impl Into<String>, importance: u8) -> Self {
        let description = description.into();
        Self::new(
            "record_event",
            format!("remember '{description}'"),
            {
                let description = description.clone();
                move |ctx, actor| actor.record_event(ctx.initiator(), &description, importance)
            },
        )
    }

    /// Adjust the initiator's standing with a faction.
    pub fn adjust_faction(faction: impl Into<String>, delta: i32) -> Self {
        let faction = faction.into();
        Self::new(
            format!("faction_{faction}_{delta}"),
            format!("standing with {faction} {delta:+}"),
            {
                let faction = faction.clone();
                move |ctx, actor| actor.adjust_faction_standing(ctx.initiator(), &faction, delta)
            },
        )
    }

    /// Set a session flag.
    pub fn set_flag(flag: impl Into<String>) -> Self {
        let flag = flag.into();
        Self::new(format!("set_flag_{flag}"), format!("set flag '{flag}'"), {
            let flag = flag.clone();
            move |ctx, _| ctx.set_flag(flag.clone())
        })
    }

    /// Clear a session flag.
    pub fn clear_flag(flag: impl Into<String>) -> Self {
        let flag = flag.into();
        Self::new(
            format!("clear_flag_{flag}"),
            format!("clear flag '{flag}'"),
            {
                let flag = flag.clone();
                move |ctx, _| ctx.clear_flag(&flag)
            },
        )
    }

    /// Set a session variable.
    pub fn set_variable(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::new(
            format!("set_var_{key}"),
            format!("set variable '{key}' = {value}"),
            {
                let key = key.clone();
                move |ctx, _| ctx.set_variable(key.clone(), value.clone())
            },
        )
    }

    /// Jump to an explicit node, overriding the option's static target.
    pub fn jump_to(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self::new(format!("jump_to_{node_id}"), format!("jump to '{node_id}'"), {
            let node_id = node_id.clone();
            move |ctx, _| ctx.request_jump(node_id.clone())
        })
    }

    /// End the conversation.
    pub fn end_conversation() -> Self {
        Self::new("end_conversation", "end the conversation", |ctx, _| {
            ctx.end()
        })
    }

    /// Signal the host to open its trade surface and end the conversation.
    pub fn open_trade() -> Self {
        Self::new("open_trade", "open trade and end", |ctx, _| {
            ctx.set_flag("open_trade");
            ctx.end();
        })
    }

    /// Withdraw currency from the initiator. Sets `payment_ok` on success
    /// or `payment_failed` when the initiator cannot pay.
    pub fn pay(amount: i64) -> Self {
        Self::new(
            format!("pay_{amount}"),
            format!("pay {amount} coins"),
            move |ctx, actor| {
                if actor.withdraw(ctx.initiator(), amount) {
                    ctx.set_flag("payment_ok");
                } else {
                    ctx.set_flag("payment_failed");
                }
            },
        )
    }

    /// Deposit currency to the initiator.
    pub fn reward(amount: i64) -> Self {
        Self::new(
            format!("reward_{amount}"),
            format!("reward {amount} coins"),
            move |ctx, actor| actor.deposit(ctx.initiator(), amount),
        )
    }

    /// Offer a quest to the initiator.
    pub fn offer_quest(quest_id: impl Into<String>) -> Self {
        let quest_id = quest_id.into();
        Self::new(
            format!("offer_quest_{quest_id}"),
            format!("offer quest '{quest_id}'"),
            {
                let quest_id = quest_id.clone();
                move |ctx, actor| actor.offer_quest(ctx.initiator(), &quest_id)
            },
        )
    }

    /// Advance a quest the initiator is on.
    pub fn advance_quest(quest_id: impl Into<String>) -> Self {
        let quest_id = quest_id.into();
        Self::new(
            format!("advance_quest_{quest_id}"),
            format!("advance quest '{quest_id}'"),
            {
                let quest_id = quest_id.clone();
                move |ctx, actor| actor.advance_quest(ctx.initiator(), &quest_id)
            },
        )
    }

    /// Put a rumor about the initiator into circulation.
    pub fn broadcast_rumor(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self::new(format!("rumor_{topic}"), format!("spread rumor '{topic}'"), {
            let topic = topic.clone();
            move |ctx, actor| actor.broadcast_rumor(ctx.initiator(), &topic)
        })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("description", &self.description)
            .finish()
    }
}
