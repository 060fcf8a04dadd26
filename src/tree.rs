//! Dialogue trees: a named graph of nodes with start selection rules.

use crate::actor::Actor;
use crate::condition::Condition;
use crate::context::{DialogueContext, MAX_NODES};
use crate::node::Node;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

/// An authoring mistake found by [`DialogueTree::validate`].
///
/// Issues never stop a tree from being registered or run; the engine
/// degrades gracefully around them at runtime. They exist so content
/// authors can catch broken links in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("start node '{0}' does not exist")]
    MissingStartNode(String),
    #[error("node '{node}' auto-advances to missing node '{target}'")]
    DanglingAutoNext { node: String, target: String },
    #[error("option '{option}' on node '{node}' targets missing node '{target}'")]
    DanglingOptionTarget {
        node: String,
        option: String,
        target: String,
    },
    #[error("conditional start targets missing node '{0}'")]
    DanglingConditionalStart(String),
}

/// A complete conversation graph for one topic or role.
///
/// Trees are immutable once built and shared across conversations; all
/// per-conversation state lives in [`DialogueContext`].
#[derive(Clone)]
pub struct DialogueTree {
    id: String,
    name: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    start_node: String,
    conditional_starts: Vec<(Condition, String)>,
    start_condition: Condition,
    priority: i32,
    tags: HashSet<String>,
}

impl DialogueTree {
    /// Start building a tree. The start node defaults to `"start"`.
    pub fn builder(id: impl Into<String>) -> TreeBuilder {
        let id = id.into();
        TreeBuilder {
            name: id.clone(),
            id,
            nodes: Vec::new(),
            index: HashMap::new(),
            start_node: "start".to_string(),
            conditional_starts: Vec::new(),
            start_condition: Condition::always(),
            priority: 0,
            tags: HashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Selection priority among candidate trees; higher wins.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.index.get(node_id).map(|&i| &self.nodes[i])
    }

    /// Whether this tree may start a conversation right now.
    pub fn can_start(&self, ctx: &DialogueContext, actor: &dyn Actor) -> bool {
        self.start_condition.evaluate(ctx, actor)
    }

    /// Pick the entry node id: the first conditional start whose condition
    /// holds, else the default start node. Returns `None` when the chosen
    /// id does not exist in the tree.
    pub fn resolve_start_node(&self, ctx: &DialogueContext, actor: &dyn Actor) -> Option<&str> {
        let chosen = self
            .conditional_starts
            .iter()
            .find(|(condition, _)| condition.evaluate(ctx, actor))
            .map(|(_, target)| target.as_str())
            .unwrap_or(&self.start_node);
        self.index.contains_key(chosen).then_some(chosen)
    }

    /// Resolve where the conversation actually lands when asked to move to
    /// `node_id`: if that node's entry condition fails, follow its auto-next
    /// chain until an enterable node is found.
    ///
    /// Returns `None` when the id is missing, when a non-enterable node has
    /// no auto-next to fall through to, or when the chain exceeds the hop
    /// budget (a non-enterable cycle).
    pub fn find_next_valid_node(
        &self,
        node_id: &str,
        ctx: &DialogueContext,
        actor: &dyn Actor,
    ) -> Option<&Node> {
        let mut current = node_id;
        for _ in 0..MAX_NODES {
            let node = self.node(current)?;
            if node.can_enter(ctx, actor) {
                return Some(node);
            }
            current = &node.auto_next()?.target;
        }
        None
    }

    /// Check every node and option target against the node index.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if !self.index.contains_key(&self.start_node) {
            issues.push(ValidationIssue::MissingStartNode(self.start_node.clone()));
        }
        for (_, target) in &self.conditional_starts {
            if !self.index.contains_key(target) {
                issues.push(ValidationIssue::DanglingConditionalStart(target.clone()));
            }
        }
        for node in &self.nodes {
            if let Some(auto) = node.authored_auto_next() {
                if !self.index.contains_key(&auto.target) {
                    issues.push(ValidationIssue::DanglingAutoNext {
                        node: node.id().to_string(),
                        target: auto.target.clone(),
                    });
                }
            }
            for option in node.options() {
                if let Some(target) = option.target() {
                    if !self.index.contains_key(target) {
                        issues.push(ValidationIssue::DanglingOptionTarget {
                            node: node.id().to_string(),
                            option: option.id().to_string(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        issues
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Render a plain-text outline of the graph for debugging.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "tree '{}' (priority {})", self.id, self.priority);
        for node in &self.nodes {
            let marker = if node.id() == self.start_node { "*" } else { " " };
            let _ = writeln!(out, " {marker} [{}]", node.id());
            if let Some(auto) = node.authored_auto_next() {
                let _ = writeln!(out, "     ~> {} (delay {})", auto.target, auto.delay);
            }
            for option in node.options() {
                let target = option.target().unwrap_or("(end)");
                let _ = writeln!(out, "     -> {} ({})", target, option.id());
            }
        }
        out
    }
}

impl fmt::Debug for DialogueTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueTree")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("start_node", &self.start_node)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Builder for [`DialogueTree`].
#[derive(Debug)]
pub struct TreeBuilder {
    id: String,
    name: String,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    start_node: String,
    conditional_starts: Vec<(Condition, String)>,
    start_condition: Condition,
    priority: i32,
    tags: HashSet<String>,
}

impl TreeBuilder {
    /// Human-readable name; defaults to the tree id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a node. Re-adding an id replaces the earlier node in place, so
    /// content layers can override single beats of a stock tree.
    pub fn node(mut self, node: Node) -> Self {
        match self.index.get(node.id()) {
            Some(&i) => self.nodes[i] = node,
            None => {
                self.index.insert(node.id().to_string(), self.nodes.len());
                self.nodes.push(node);
            }
        }
        self
    }

    /// Override the default start node id.
    pub fn start_node(mut self, node_id: impl Into<String>) -> Self {
        self.start_node = node_id.into();
        self
    }

    /// Add a conditional entry point, tried in authored order before the
    /// default start node.
    pub fn start_when(mut self, condition: Condition, node_id: impl Into<String>) -> Self {
        self.conditional_starts.push((condition, node_id.into()));
        self
    }

    /// Gate whether the tree can start a conversation at all.
    pub fn start_condition(mut self, condition: Condition) -> Self {
        self.start_condition = condition;
        self
    }

    /// Selection priority among candidate trees; higher wins.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Tag the tree. The `"global"` tag makes it a candidate for every
    /// actor, not just those it is assigned to.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn build(self) -> DialogueTree {
        DialogueTree {
            id: self.id,
            name: self.name,
            nodes: self.nodes,
            index: self.index,
            start_node: self.start_node,
            conditional_starts: self.conditional_starts,
            start_condition: self.start_condition,
            priority: self.priority,
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Initiator;
    use crate::option::DialogueOption;
    use crate::testing::ScriptedActor;

    fn context() -> (DialogueContext, ScriptedActor) {
        let actor = ScriptedActor::new("Greta");
        let initiator = Initiator::new("Ash");
        let ctx = DialogueContext::new(&initiator, actor.id(), "test_tree");
        (ctx, actor)
    }

    #[test]
    fn test_duplicate_node_id_replaces() {
        let tree = DialogueTree::builder("t")
            .node(Node::builder("start", "First version.").build())
            .node(Node::builder("other", "Unrelated.").build())
            .node(Node::builder("start", "Second version.").build())
            .build();
        let (ctx, actor) = context();

        assert_eq!(tree.node_count(), 2);
        let text = tree.node("start").unwrap().display_text(&ctx, &actor);
        assert_eq!(text, "Second version.");
    }

    #[test]
    fn test_conditional_start_first_match() {
        let tree = DialogueTree::builder("t")
            .node(Node::builder("start", "Hello.").build())
            .node(Node::builder("warned", "You again.").build())
            .node(Node::builder("friendly", "Welcome back!").build())
            .start_when(Condition::flag_set("warned"), "warned")
            .start_when(Condition::flag_set("friend"), "friendly")
            .build();
        let (mut ctx, actor) = context();

        assert_eq!(tree.resolve_start_node(&ctx, &actor), Some("start"));
        ctx.set_flag("friend");
        assert_eq!(tree.resolve_start_node(&ctx, &actor), Some("friendly"));
        ctx.set_flag("warned");
        assert_eq!(tree.resolve_start_node(&ctx, &actor), Some("warned"));
    }

    #[test]
    fn test_resolve_start_missing_node_is_none() {
        let tree = DialogueTree::builder("t")
            .node(Node::builder("other", "...").build())
            .build();
        let (ctx, actor) = context();
        assert_eq!(tree.resolve_start_node(&ctx, &actor), None);
    }

    #[test]
    fn test_find_next_valid_skips_gated_nodes() {
        let tree = DialogueTree::builder("t")
            .node(
                Node::builder("gated", "Members only.")
                    .entry_condition(Condition::flag_set("member"))
                    .auto_next("open", 0)
                    .build(),
            )
            .node(Node::builder("open", "Come in.").build())
            .build();
        let (mut ctx, actor) = context();

        let landed = tree.find_next_valid_node("gated", &ctx, &actor).unwrap();
        assert_eq!(landed.id(), "open");

        ctx.set_flag("member");
        let landed = tree.find_next_valid_node("gated", &ctx, &actor).unwrap();
        assert_eq!(landed.id(), "gated");
    }

    #[test]
    fn test_find_next_valid_dead_ends() {
        let tree = DialogueTree::builder("t")
            .node(
                Node::builder("gated", "Members only.")
                    .entry_condition(Condition::never())
                    .build(),
            )
            .node(
                Node::builder("cycle_a", "...")
                    .entry_condition(Condition::never())
                    .auto_next("cycle_b", 0)
                    .build(),
            )
            .node(
                Node::builder("cycle_b", "...")
                    .entry_condition(Condition::never())
                    .auto_next("cycle_a", 0)
                    .build(),
            )
            .build();
        let (ctx, actor) = context();

        assert!(tree.find_next_valid_node("missing", &ctx, &actor).is_none());
        assert!(tree.find_next_valid_node("gated", &ctx, &actor).is_none());
        assert!(tree.find_next_valid_node("cycle_a", &ctx, &actor).is_none());
    }

    #[test]
    fn test_validate_reports_broken_links() {
        let tree = DialogueTree::builder("t")
            .start_node("nowhere")
            .start_when(Condition::always(), "also_nowhere")
            .node(
                Node::builder("a", "...")
                    .option(DialogueOption::simple("go", "Go.", "missing"))
                    .build(),
            )
            .node(Node::builder("b", "...").auto_next("missing_too", 0).build())
            .build();

        let issues = tree.validate();
        assert!(issues.contains(&ValidationIssue::MissingStartNode("nowhere".into())));
        assert!(issues.contains(&ValidationIssue::DanglingConditionalStart(
            "also_nowhere".into()
        )));
        assert!(issues.contains(&ValidationIssue::DanglingAutoNext {
            node: "b".into(),
            target: "missing_too".into(),
        }));
        assert!(issues.contains(&ValidationIssue::DanglingOptionTarget {
            node: "a".into(),
            option: "go".into(),
            target: "missing".into(),
        }));
        assert!(!tree.is_valid());
    }

    #[test]
    fn test_valid_tree() {
        let tree = DialogueTree::builder("t")
            .node(Node::say("start", "Hello.", "bye"))
            .node(Node::farewell("bye", "Goodbye."))
            .build();
        assert!(tree.is_valid());
        assert!(tree.outline().contains("[start]"));
    }
}
