//! A branching dialogue engine for games with autonomous actors.
//!
//! Conversations are authored as [`DialogueTree`]s: graphs of [`Node`]s
//! connected by [`DialogueOption`]s, gated by composable [`Condition`]s and
//! driven by composable [`Action`]s. The [`DialogueEngine`] owns the trees
//! and the per-initiator sessions; the host owns the actors behind the
//! [`Actor`] trait and the clock for auto-advancing nodes.
//!
//! ```
//! use dialogue_core::{
//!     Actor, DialogueEngine, DialogueOption, DialogueTree, Initiator, Node,
//! };
//! use dialogue_core::testing::ScriptedActor;
//!
//! let mut engine = DialogueEngine::new();
//! engine.register_tree(
//!     DialogueTree::builder("greeting")
//!         .node(
//!             Node::builder("start", "Well met, {initiator}.")
//!                 .option(DialogueOption::simple("ask", "Who are you?", "who"))
//!                 .option(DialogueOption::exit("Farewell."))
//!                 .build(),
//!         )
//!         .node(Node::farewell("who", "Nobody of consequence."))
//!         .build(),
//! );
//!
//! let mut actor = ScriptedActor::new("Greta");
//! engine.assign_tree(actor.id(), "greeting");
//! let player = Initiator::new("Ash");
//!
//! let view = engine.start(&player, &mut actor).unwrap();
//! assert_eq!(view.text, "Well met, Ash.");
//! let view = engine.select_option(player.id, &mut actor, "ask").unwrap();
//! assert_eq!(view.node_id, "who");
//! ```

pub mod action;
pub mod actor;
pub mod condition;
pub mod context;
pub mod engine;
pub mod node;
pub mod option;
pub mod provider;
pub mod testing;
pub mod tree;

pub use action::Action;
pub use actor::{Actor, ActorId, Initiator, InitiatorId, Mood, MoodKind, PersonalityTrait};
pub use condition::Condition;
pub use context::{DialogueContext, Value, MAX_NODES};
pub use engine::{AssignmentSnapshot, DialogueEngine, NodeView, OptionView, SnapshotError};
pub use node::{AutoNext, Node, NodeBuilder};
pub use option::{DialogueOption, OptionBuilder};
pub use tree::{DialogueTree, TreeBuilder, ValidationIssue};
