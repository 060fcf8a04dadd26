//! The dialogue engine: tree registry, selection, and conversation driving.
//!
//! Hosts own the actors and the clock; the engine owns the trees and the
//! per-initiator sessions. Everything here degrades gracefully: malformed
//! content and protocol mistakes (stale ids, double starts, picking a
//! disabled option) come back as `None`, never a panic, so a content bug
//! cannot take the host down.

use crate::actor::{Actor, ActorId, Initiator, InitiatorId};
use crate::context::{DialogueContext, MAX_NODES};
use crate::node::Node;
use crate::tree::DialogueTree;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Snapshot format version for persisted tree assignments.
const ASSIGNMENT_VERSION: u32 = 1;

/// One selectable choice as presented to the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub id: String,
    pub text: String,
    pub enabled: bool,
    /// Present only when the option is visible but disabled.
    pub disabled_reason: Option<String>,
    pub tooltip: Option<String>,
}

/// One beat of conversation as presented to the host UI.
///
/// All text has had placeholders substituted already; the host renders it
/// as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    pub node_id: String,
    pub speaker: String,
    pub text: String,
    pub options: Vec<OptionView>,
    /// When set, the node has no options and the host should wait this many
    /// of its own time units before calling [`DialogueEngine::advance`].
    pub auto_next_delay: Option<u32>,
    pub image: Option<String>,
}

impl NodeView {
    fn render(node: &Node, ctx: &DialogueContext, actor: &dyn Actor) -> Self {
        let options = node
            .visible_options(ctx, actor)
            .into_iter()
            .map(|opt| {
                let enabled = opt.is_enabled(ctx, actor);
                OptionView {
                    id: opt.id().to_string(),
                    text: ctx.interpolate(opt.text(), actor),
                    enabled,
                    disabled_reason: if enabled {
                        None
                    } else {
                        opt.disabled_reason().map(|r| ctx.interpolate(r, actor))
                    },
                    tooltip: opt.tooltip().map(|t| ctx.interpolate(t, actor)),
                }
            })
            .collect();
        NodeView {
            node_id: node.id().to_string(),
            speaker: node.speaker_name(actor).to_string(),
            text: node.display_text(ctx, actor),
            options,
            auto_next_delay: node.auto_next().map(|auto| auto.delay),
            image: node.image().map(str::to_string),
        }
    }
}

/// Persisted form of the actor-to-tree assignment table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    pub version: u32,
    pub assignments: HashMap<ActorId, Vec<String>>,
}

/// Failure to save or restore an [`AssignmentSnapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Registry of dialogue trees plus all in-progress conversations.
///
/// One engine serves many actors and initiators; each initiator has at most
/// one active conversation at a time.
#[derive(Debug, Default)]
pub struct DialogueEngine {
    trees: HashMap<String, Arc<DialogueTree>>,
    registration_order: Vec<String>,
    actor_trees: HashMap<ActorId, Vec<String>>,
    fallback_trees: HashMap<String, String>,
    active: HashMap<InitiatorId, DialogueContext>,
    finished: HashMap<InitiatorId, DialogueContext>,
}

impl DialogueEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tree, replacing any earlier tree with the same id.
    ///
    /// Authoring issues are logged but never reject the tree; runtime
    /// lookups degrade gracefully around broken links.
    pub fn register_tree(&mut self, tree: DialogueTree) {
        for issue in tree.validate() {
            warn!(tree = %tree.id(), %issue, "dialogue tree has authoring issues");
        }
        let id = tree.id().to_string();
        if self.trees.insert(id.clone(), Arc::new(tree)).is_none() {
            self.registration_order.push(id);
        }
    }

    /// Remove a tree and every assignment pointing at it. Conversations
    /// already running on the tree end on their next interaction.
    pub fn unregister_tree(&mut self, tree_id: &str) {
        self.trees.remove(tree_id);
        self.registration_order.retain(|id| id != tree_id);
        for assigned in self.actor_trees.values_mut() {
            assigned.retain(|id| id != tree_id);
        }
        self.fallback_trees.retain(|_, id| id != tree_id);
    }

    pub fn tree(&self, tree_id: &str) -> Option<&DialogueTree> {
        self.trees.get(tree_id).map(Arc::as_ref)
    }

    /// Assign a tree to an actor. Assignment order is selection order for
    /// equal priorities.
    pub fn assign_tree(&mut self, actor: ActorId, tree_id: impl Into<String>) {
        let tree_id = tree_id.into();
        let assigned = self.actor_trees.entry(actor).or_default();
        if !assigned.contains(&tree_id) {
            assigned.push(tree_id);
        }
    }

    pub fn unassign_tree(&mut self, actor: ActorId, tree_id: &str) {
        if let Some(assigned) = self.actor_trees.get_mut(&actor) {
            assigned.retain(|id| id != tree_id);
        }
    }

    /// Register the tree to use for a whole actor category when no assigned
    /// or global tree applies.
    pub fn set_fallback_tree(&mut self, category: impl Into<String>, tree_id: impl Into<String>) {
        self.fallback_trees.insert(category.into(), tree_id.into());
    }

    /// Pick the tree a conversation with this actor would use right now.
    ///
    /// Candidates are the actor's assigned trees (in assignment order)
    /// followed by `"global"`-tagged trees (in registration order). Among
    /// candidates whose start condition holds, the highest priority wins;
    /// ties go to the earliest candidate. Falls back to the actor
    /// category's fallback tree when nothing applies.
    pub fn select_tree(&self, initiator: &Initiator, actor: &dyn Actor) -> Option<&str> {
        let mut candidates: Vec<&str> = Vec::new();
        if let Some(assigned) = self.actor_trees.get(&actor.id()) {
            candidates.extend(assigned.iter().map(String::as_str));
        }
        for id in &self.registration_order {
            if self.trees[id].has_tag("global") && !candidates.contains(&id.as_str()) {
                candidates.push(id);
            }
        }

        let mut best: Option<&str> = None;
        let mut best_priority = i32::MIN;
        for id in candidates {
            let Some(tree) = self.trees.get(id) else {
                continue;
            };
            let synthetic = DialogueContext::new(initiator, actor.id(), id);
            if tree.can_start(&synthetic, actor) && tree.priority() > best_priority {
                best = Some(tree.id());
                best_priority = tree.priority();
            }
        }
        best.or_else(|| {
            self.fallback_trees
                .get(actor.category())
                .filter(|id| self.trees.contains_key(*id))
                .map(String::as_str)
        })
    }

    /// Start a conversation, selecting the tree automatically.
    ///
    /// Returns `None` when the initiator is already in a conversation or no
    /// tree applies.
    pub fn start(&mut self, initiator: &Initiator, actor: &mut dyn Actor) -> Option<NodeView> {
        let tree_id = self.select_tree(initiator, actor)?.to_string();
        self.start_with(initiator, actor, &tree_id)
    }

    /// Start a conversation on an explicit tree, bypassing selection and
    /// the tree's start condition.
    pub fn start_with(
        &mut self,
        initiator: &Initiator,
        actor: &mut dyn Actor,
        tree_id: &str,
    ) -> Option<NodeView> {
        if self.active.contains_key(&initiator.id) {
            debug!(initiator = %initiator.id, "start refused, conversation already active");
            return None;
        }
        let tree = self.trees.get(tree_id)?.clone();
        let mut ctx = DialogueContext::new(initiator, actor.id(), tree_id);

        let start_id = match tree.resolve_start_node(&ctx, actor) {
            Some(id) => id.to_string(),
            None => {
                warn!(tree = %tree_id, "start node missing, conversation not started");
                return None;
            }
        };
        let Some(node) = tree.find_next_valid_node(&start_id, &ctx, actor) else {
            warn!(tree = %tree_id, node = %start_id, "no enterable start node");
            return None;
        };

        node.run_entry_actions(&mut ctx, actor);
        if ctx.is_ended() {
            debug!(initiator = %initiator.id, tree = %tree_id, "conversation ended by start entry action");
            return self.finish(initiator.id, ctx);
        }
        ctx.enter_node(node.id());
        let view = NodeView::render(node, &ctx, actor);
        actor.record_event(
            initiator.id,
            &format!("{} started a conversation", initiator.name),
            2,
        );
        debug!(initiator = %initiator.id, tree = %tree_id, node = %node.id(), "conversation started");
        self.active.insert(initiator.id, ctx);
        Some(view)
    }

    /// Retire a conversation that ended on its own. The final context stays
    /// retrievable through [`DialogueEngine::end`] until the host collects
    /// it; a later conversation by the same initiator replaces it.
    fn finish(&mut self, initiator: InitiatorId, mut ctx: DialogueContext) -> Option<NodeView> {
        ctx.end();
        self.finished.insert(initiator, ctx);
        None
    }

    /// Select an option on the initiator's current node.
    ///
    /// Returns the next node to present, or `None` when the conversation is
    /// over (or the selection was invalid, in which case the conversation
    /// keeps its current node and no side effects run). When this call ends
    /// the conversation, the final context is retrievable once through
    /// [`DialogueEngine::end`].
    pub fn select_option(
        &mut self,
        initiator: InitiatorId,
        actor: &mut dyn Actor,
        option_id: &str,
    ) -> Option<NodeView> {
        let mut ctx = self.active.remove(&initiator)?;
        if ctx.actor() != actor.id() {
            warn!(%initiator, "option selected with the wrong actor, ignoring");
            self.active.insert(initiator, ctx);
            return None;
        }
        let Some(tree) = self.trees.get(ctx.tree_id()).cloned() else {
            debug!(%initiator, tree = %ctx.tree_id(), "tree unregistered mid-conversation, ending");
            return self.finish(initiator, ctx);
        };
        let Some(current_id) = ctx.current_node().map(str::to_string) else {
            warn!(%initiator, "conversation has no current node, ending");
            return self.finish(initiator, ctx);
        };
        let Some(node) = tree.node(&current_id) else {
            warn!(%initiator, node = %current_id, "current node vanished, ending");
            return self.finish(initiator, ctx);
        };

        let Some(option) = node.option(option_id) else {
            debug!(%initiator, option = %option_id, "unknown option, ignoring");
            self.active.insert(initiator, ctx);
            return None;
        };
        if !option.is_visible(&ctx, actor) || !option.is_enabled(&ctx, actor) {
            debug!(%initiator, option = %option_id, "option not selectable, ignoring");
            self.active.insert(initiator, ctx);
            return None;
        }

        option.run_actions(&mut ctx, actor);
        if ctx.is_ended() {
            debug!(%initiator, "conversation ended by option action");
            return self.finish(initiator, ctx);
        }
        if ctx.node_count() >= MAX_NODES {
            warn!(%initiator, tree = %ctx.tree_id(), "node budget exhausted, ending conversation");
            return self.finish(initiator, ctx);
        }

        let target = match ctx.consume_jump().or_else(|| option.target().map(String::from)) {
            Some(target) => target,
            None => {
                debug!(%initiator, "conversation ended by option without target");
                return self.finish(initiator, ctx);
            }
        };
        let Some(next) = tree.find_next_valid_node(&target, &ctx, actor) else {
            warn!(%initiator, node = %target, "no enterable node at option target, ending");
            return self.finish(initiator, ctx);
        };

        next.run_entry_actions(&mut ctx, actor);
        if ctx.is_ended() {
            debug!(%initiator, "conversation ended by entry action");
            return self.finish(initiator, ctx);
        }
        ctx.enter_node(next.id());
        let view = NodeView::render(next, &ctx, actor);
        self.active.insert(initiator, ctx);
        Some(view)
    }

    /// Take the current node's auto-next transition. The host calls this
    /// after waiting out the delay reported in the last [`NodeView`].
    ///
    /// Chains through zero-delay transitions in a single call, under the
    /// same node budget as the rest of the conversation.
    pub fn advance(&mut self, initiator: InitiatorId, actor: &mut dyn Actor) -> Option<NodeView> {
        let mut ctx = self.active.remove(&initiator)?;
        if ctx.actor() != actor.id() {
            warn!(%initiator, "advance with the wrong actor, ignoring");
            self.active.insert(initiator, ctx);
            return None;
        }
        let Some(tree) = self.trees.get(ctx.tree_id()).cloned() else {
            debug!(%initiator, tree = %ctx.tree_id(), "tree unregistered mid-conversation, ending");
            return self.finish(initiator, ctx);
        };
        let auto_target = ctx
            .current_node()
            .and_then(|id| tree.node(id))
            .and_then(|node| node.auto_next())
            .map(|auto| auto.target.clone());
        let Some(auto_target) = auto_target else {
            debug!(%initiator, "advance on a node without auto-next, ignoring");
            self.active.insert(initiator, ctx);
            return None;
        };

        let mut target = ctx.consume_jump().unwrap_or(auto_target);
        loop {
            if ctx.node_count() >= MAX_NODES {
                warn!(%initiator, tree = %ctx.tree_id(), "node budget exhausted, ending conversation");
                return self.finish(initiator, ctx);
            }
            let Some(next) = tree.find_next_valid_node(&target, &ctx, actor) else {
                warn!(%initiator, node = %target, "no enterable node on auto-advance, ending");
                return self.finish(initiator, ctx);
            };
            next.run_entry_actions(&mut ctx, actor);
            if ctx.is_ended() {
                debug!(%initiator, "conversation ended by entry action");
                return self.finish(initiator, ctx);
            }
            ctx.enter_node(next.id());
            match next.auto_next() {
                Some(auto) if auto.delay == 0 => {
                    target = ctx.consume_jump().unwrap_or_else(|| auto.target.clone());
                }
                _ => {
                    let view = NodeView::render(next, &ctx, actor);
                    self.active.insert(initiator, ctx);
                    return Some(view);
                }
            }
        }
    }

    /// Re-render the initiator's current node without changing any state.
    pub fn current_view(&self, initiator: InitiatorId, actor: &dyn Actor) -> Option<NodeView> {
        let ctx = self.active.get(&initiator)?;
        let tree = self.trees.get(ctx.tree_id())?;
        let node = tree.node(ctx.current_node()?)?;
        Some(NodeView::render(node, ctx, actor))
    }

    /// End the initiator's conversation, returning its final state.
    ///
    /// Also collects the final context of a conversation that already ended
    /// on its own (option with no target, an `end` action, budget
    /// exhaustion) so the host can read flags like `open_trade` and do its
    /// closing bookkeeping. Each final context is returned at most once.
    pub fn end(&mut self, initiator: InitiatorId) -> Option<DialogueContext> {
        if let Some(mut ctx) = self.active.remove(&initiator) {
            ctx.end();
            debug!(%initiator, tree = %ctx.tree_id(), "conversation ended by host");
            return Some(ctx);
        }
        self.finished.remove(&initiator)
    }

    /// The initiator's in-progress conversation state, if any.
    pub fn session(&self, initiator: InitiatorId) -> Option<&DialogueContext> {
        self.active.get(&initiator)
    }

    pub fn is_active(&self, initiator: InitiatorId) -> bool {
        self.active.contains_key(&initiator)
    }

    /// Snapshot the actor-to-tree assignment table.
    pub fn assignments(&self) -> AssignmentSnapshot {
        AssignmentSnapshot {
            version: ASSIGNMENT_VERSION,
            assignments: self.actor_trees.clone(),
        }
    }

    /// Replace the assignment table from a snapshot.
    pub fn load_assignments(&mut self, snapshot: AssignmentSnapshot) -> Result<(), SnapshotError> {
        if snapshot.version != ASSIGNMENT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: ASSIGNMENT_VERSION,
                found: snapshot.version,
            });
        }
        self.actor_trees = snapshot.assignments;
        Ok(())
    }

    /// Serialize the actor-to-tree assignment table.
    pub fn assignments_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(&self.assignments())?)
    }

    /// Replace the assignment table from a serialized snapshot.
    pub fn load_assignments_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        self.load_assignments(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::condition::Condition;
    use crate::node::Node;
    use crate::option::DialogueOption;
    use crate::testing::ScriptedActor;

    fn greeting_tree(id: &str) -> DialogueTree {
        DialogueTree::builder(id)
            .node(
                Node::builder("start", "Hello, {initiator}.")
                    .option(DialogueOption::simple("more", "Tell me more.", "detail"))
                    .option(DialogueOption::exit("Goodbye."))
                    .build(),
            )
            .node(Node::farewell("detail", "There is little to tell."))
            .build()
    }

    #[test]
    fn test_start_and_walk() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");

        let view = engine.start(&initiator, &mut actor).unwrap();
        assert_eq!(view.node_id, "start");
        assert_eq!(view.text, "Hello, Ash.");
        assert_eq!(view.options.len(), 2);
        assert_eq!(view.options[0].id, "more");
        assert!(engine.is_active(initiator.id));

        let view = engine
            .select_option(initiator.id, &mut actor, "more")
            .unwrap();
        assert_eq!(view.node_id, "detail");

        assert!(engine
            .select_option(initiator.id, &mut actor, "exit")
            .is_none());
        assert!(!engine.is_active(initiator.id));
    }

    #[test]
    fn test_start_is_exclusive_per_initiator() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");

        assert!(engine.start(&initiator, &mut actor).is_some());
        assert!(engine.start(&initiator, &mut actor).is_none());

        let other = Initiator::new("Brin");
        assert!(engine.start(&other, &mut actor).is_some());
    }

    #[test]
    fn test_start_records_memory() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");

        assert!(!actor.remembers(initiator.id));
        engine.start(&initiator, &mut actor);
        assert!(actor.remembers(initiator.id));
    }

    #[test]
    fn test_unknown_option_keeps_session() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");
        engine.start(&initiator, &mut actor);

        assert!(engine
            .select_option(initiator.id, &mut actor, "no_such")
            .is_none());
        assert!(engine.is_active(initiator.id));
        assert_eq!(
            engine.session(initiator.id).unwrap().current_node(),
            Some("start")
        );
    }

    #[test]
    fn test_disabled_option_runs_no_side_effects() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(
            DialogueTree::builder("bribe")
                .node(
                    Node::builder("start", "What do you want?")
                        .option(
                            DialogueOption::builder("bribe", "[Offer coin]")
                                .target("bought")
                                .enabled_when(Condition::flag_set("rich"))
                                .action(Action::set_flag("bribed"))
                                .disabled_reason("Not enough coin.")
                                .build(),
                        )
                        .option(DialogueOption::exit("Never mind."))
                        .build(),
                )
                .node(Node::farewell("bought", "Pleasure doing business."))
                .build(),
        );
        let mut actor = ScriptedActor::new("Guard");
        engine.assign_tree(actor.id(), "bribe");
        let initiator = Initiator::new("Ash");

        let view = engine.start(&initiator, &mut actor).unwrap();
        let bribe = view.options.iter().find(|o| o.id == "bribe").unwrap();
        assert!(!bribe.enabled);
        assert_eq!(bribe.disabled_reason.as_deref(), Some("Not enough coin."));

        assert!(engine
            .select_option(initiator.id, &mut actor, "bribe")
            .is_none());
        let ctx = engine.session(initiator.id).unwrap();
        assert!(!ctx.has_flag("bribed"));
        assert_eq!(ctx.current_node(), Some("start"));
    }

    #[test]
    fn test_jump_action_overrides_static_target() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(
            DialogueTree::builder("t")
                .node(
                    Node::builder("start", "Hm?")
                        .option(
                            DialogueOption::builder("go", "Onward.")
                                .target("static_next")
                                .action(Action::jump_to("jumped"))
                                .build(),
                        )
                        .build(),
                )
                .node(Node::farewell("static_next", "Static."))
                .node(Node::farewell("jumped", "Jumped."))
                .build(),
        );
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "t");
        let initiator = Initiator::new("Ash");
        engine.start(&initiator, &mut actor);

        let view = engine.select_option(initiator.id, &mut actor, "go").unwrap();
        assert_eq!(view.node_id, "jumped");
    }

    #[test]
    fn test_select_tree_priority_and_tie_break() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("first"));
        engine.register_tree(greeting_tree("second"));
        engine.register_tree(
            DialogueTree::builder("urgent")
                .priority(10)
                .start_condition(Condition::flag_set("never_set"))
                .node(Node::farewell("start", "..."))
                .build(),
        );
        let actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "first");
        engine.assign_tree(actor.id(), "second");
        engine.assign_tree(actor.id(), "urgent");
        let initiator = Initiator::new("Ash");

        // urgent cannot start (the synthetic start context has no flags), tie between the
        // rest goes to the first assigned.
        assert_eq!(engine.select_tree(&initiator, &actor), Some("first"));
    }

    #[test]
    fn test_global_trees_and_fallback() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(
            DialogueTree::builder("town_crier")
                .tag("global")
                .node(Node::farewell("start", "Hear ye!"))
                .build(),
        );
        engine.register_tree(
            DialogueTree::builder("small_talk")
                .node(Node::farewell("start", "Nice weather."))
                .build(),
        );
        engine.set_fallback_tree("generic", "small_talk");
        let actor = ScriptedActor::new("Stranger");
        let initiator = Initiator::new("Ash");

        // No assignment needed for global trees.
        assert_eq!(engine.select_tree(&initiator, &actor), Some("town_crier"));

        engine.unregister_tree("town_crier");
        assert_eq!(engine.select_tree(&initiator, &actor), Some("small_talk"));

        engine.unregister_tree("small_talk");
        assert_eq!(engine.select_tree(&initiator, &actor), None);
    }

    #[test]
    fn test_open_trade_flag_readable_after_conversation_ends() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(
            DialogueTree::builder("shop")
                .node(
                    Node::builder("start", "Looking to buy?")
                        .option(
                            DialogueOption::builder("browse", "Show me your wares.")
                                .action(Action::open_trade())
                                .build(),
                        )
                        .build(),
                )
                .build(),
        );
        let mut actor = ScriptedActor::new("Shopkeep");
        engine.assign_tree(actor.id(), "shop");
        let initiator = Initiator::new("Ash");
        engine.start(&initiator, &mut actor);

        assert!(engine
            .select_option(initiator.id, &mut actor, "browse")
            .is_none());
        assert!(!engine.is_active(initiator.id));

        // The final context is still collectable, exactly once.
        let ctx = engine.end(initiator.id).unwrap();
        assert!(ctx.is_ended());
        assert!(ctx.has_flag("open_trade"));
        assert!(engine.end(initiator.id).is_none());
    }

    #[test]
    fn test_terminal_option_context_readable_then_replaced() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");

        engine.start(&initiator, &mut actor);
        engine.select_option(initiator.id, &mut actor, "more");
        assert!(engine
            .select_option(initiator.id, &mut actor, "exit")
            .is_none());

        // An uncollected final context does not block the next conversation,
        // and that conversation's end replaces it.
        engine.start(&initiator, &mut actor);
        assert!(engine
            .select_option(initiator.id, &mut actor, "exit")
            .is_none());
        let ctx = engine.end(initiator.id).unwrap();
        assert!(!ctx.has_visited("detail"));
        assert!(engine.end(initiator.id).is_none());
    }

    #[test]
    fn test_end_returns_final_context() {
        let mut engine = DialogueEngine::new();
        engine.register_tree(greeting_tree("chat"));
        let mut actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        let initiator = Initiator::new("Ash");
        engine.start(&initiator, &mut actor);

        let ctx = engine.end(initiator.id).unwrap();
        assert!(ctx.is_ended());
        assert!(ctx.has_visited("start"));
        assert!(engine.end(initiator.id).is_none());
    }

    #[test]
    fn test_assignment_snapshot_round_trip() {
        let mut engine = DialogueEngine::new();
        let actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");
        engine.assign_tree(actor.id(), "rumors");

        let json = engine.assignments_json().unwrap();
        let mut restored = DialogueEngine::new();
        restored.load_assignments_json(&json).unwrap();
        assert_eq!(
            restored.actor_trees.get(&actor.id()),
            Some(&vec!["chat".to_string(), "rumors".to_string()])
        );
    }

    #[test]
    fn test_assignment_snapshot_struct_round_trip() {
        let mut engine = DialogueEngine::new();
        let actor = ScriptedActor::new("Greta");
        engine.assign_tree(actor.id(), "chat");

        let snapshot = engine.assignments();
        let mut restored = DialogueEngine::new();
        restored.load_assignments(snapshot).unwrap();
        assert_eq!(
            restored.actor_trees.get(&actor.id()),
            Some(&vec!["chat".to_string()])
        );

        let stale = AssignmentSnapshot {
            version: 0,
            assignments: HashMap::new(),
        };
        assert!(matches!(
            restored.load_assignments(stale),
            Err(SnapshotError::VersionMismatch { found: 0, .. })
        ));
    }

    #[test]
    fn test_assignment_snapshot_version_check() {
        let mut engine = DialogueEngine::new();
        let err = engine
            .load_assignments_json(r#"{"version":99,"assignments":{}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::VersionMismatch { found: 99, .. }
        ));
    }
}
