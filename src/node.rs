//! Dialogue nodes: one actor utterance plus the choices leading out of it.

use crate::action::Action;
use crate::actor::Actor;
use crate::condition::Condition;
use crate::context::DialogueContext;
use crate::option::DialogueOption;
use std::fmt;

/// A text variant shown instead of the node's default text when its
/// condition holds. Variants are checked in authored order, first match wins.
#[derive(Clone)]
pub struct ConditionalText {
    pub(crate) condition: Condition,
    pub(crate) text: String,
}

impl fmt::Debug for ConditionalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionalText")
            .field("condition", &self.condition)
            .field("text", &self.text)
            .finish()
    }
}

/// An automatic transition taken without player input.
///
/// Only honored when the node has no options. The delay is advisory: the
/// host schedules it (in its own time units) and then calls
/// `DialogueEngine::advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoNext {
    pub target: String,
    pub delay: u32,
}

/// A single beat of conversation.
///
/// Nodes are immutable once built. The engine decides enterability via
/// [`Node::can_enter`] and, for non-enterable nodes, follows the auto-next
/// chain instead.
#[derive(Clone)]
pub struct Node {
    id: String,
    text: String,
    conditional_texts: Vec<ConditionalText>,
    entry_condition: Condition,
    entry_actions: Vec<Action>,
    options: Vec<DialogueOption>,
    auto_next: Option<AutoNext>,
    speaker: Option<String>,
    image: Option<String>,
}

impl Node {
    /// Start building a node.
    pub fn builder(id: impl Into<String>, text: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            id: id.into(),
            text: text.into(),
            conditional_texts: Vec::new(),
            entry_condition: Condition::always(),
            entry_actions: Vec::new(),
            options: Vec::new(),
            auto_next: None,
            speaker: None,
            image: None,
        }
    }

    /// A line followed by a single "continue" option.
    pub fn say(
        id: impl Into<String>,
        text: impl Into<String>,
        next: impl Into<String>,
    ) -> Self {
        Self::builder(id, text)
            .option(DialogueOption::simple("continue", "[Continue]", next))
            .build()
    }

    /// A line that auto-advances after a delay, with no options.
    pub fn transition(
        id: impl Into<String>,
        text: impl Into<String>,
        next: impl Into<String>,
        delay: u32,
    ) -> Self {
        Self::builder(id, text).auto_next(next, delay).build()
    }

    /// A closing line with a single option that ends the conversation.
    pub fn farewell(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::builder(id, text)
            .option(DialogueOption::exit("[Leave]"))
            .build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name shown as the speaker, falling back to the actor's display name.
    pub fn speaker_name<'a>(&'a self, actor: &'a dyn Actor) -> &'a str {
        self.speaker.as_deref().unwrap_or_else(|| actor.display_name())
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Options in authored order, before any visibility filtering.
    pub fn options(&self) -> &[DialogueOption] {
        &self.options
    }

    /// Auto-next transition, if this node has one and no options.
    ///
    /// A node with options never auto-advances even if a target was
    /// authored; options take precedence.
    pub fn auto_next(&self) -> Option<&AutoNext> {
        if self.options.is_empty() {
            self.auto_next.as_ref()
        } else {
            None
        }
    }

    /// Raw authored auto-next, ignoring the options-take-precedence rule.
    /// Used by validation so dangling targets are reported even on nodes
    /// where options mask the transition.
    pub(crate) fn authored_auto_next(&self) -> Option<&AutoNext> {
        self.auto_next.as_ref()
    }

    /// Whether the conversation may land on this node right now.
    pub fn can_enter(&self, ctx: &DialogueContext, actor: &dyn Actor) -> bool {
        self.entry_condition.evaluate(ctx, actor)
    }

    /// Run the node's entry actions in order.
    pub fn run_entry_actions(&self, ctx: &mut DialogueContext, actor: &mut dyn Actor) {
        for action in &self.entry_actions {
            action.execute(ctx, actor);
        }
    }

    /// The text to present: the first conditional variant whose condition
    /// holds, or the default text, with placeholders substituted.
    pub fn display_text(&self, ctx: &DialogueContext, actor: &dyn Actor) -> String {
        let raw = self
            .conditional_texts
            .iter()
            .find(|variant| variant.condition.evaluate(ctx, actor))
            .map(|variant| variant.text.as_str())
            .unwrap_or(&self.text);
        ctx.interpolate(raw, actor)
    }

    /// Visible options, sorted by descending priority. Ties keep authored
    /// order, so presentation is stable across calls.
    pub fn visible_options(
        &self,
        ctx: &DialogueContext,
        actor: &dyn Actor,
    ) -> Vec<&DialogueOption> {
        let mut visible: Vec<&DialogueOption> = self
            .options
            .iter()
            .filter(|opt| opt.is_visible(ctx, actor))
            .collect();
        visible.sort_by_key(|opt| std::cmp::Reverse(opt.priority()));
        visible
    }

    /// Look up an option by id, visible or not.
    pub fn option(&self, option_id: &str) -> Option<&DialogueOption> {
        self.options.iter().find(|opt| opt.id() == option_id)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("options", &self.options.len())
            .field("auto_next", &self.auto_next)
            .finish()
    }
}

/// Builder for [`Node`].
#[derive(Debug)]
pub struct NodeBuilder {
    id: String,
    text: String,
    conditional_texts: Vec<ConditionalText>,
    entry_condition: Condition,
    entry_actions: Vec<Action>,
    options: Vec<DialogueOption>,
    auto_next: Option<AutoNext>,
    speaker: Option<String>,
    image: Option<String>,
}

impl NodeBuilder {
    /// Add a conditional text variant. Variants are tried in the order
    /// added; the first whose condition holds replaces the default text.
    pub fn text_when(mut self, condition: Condition, text: impl Into<String>) -> Self {
        self.conditional_texts.push(ConditionalText {
            condition,
            text: text.into(),
        });
        self
    }

    /// Gate entry to this node. Non-enterable nodes are skipped along the
    /// auto-next chain.
    pub fn entry_condition(mut self, condition: Condition) -> Self {
        self.entry_condition = condition;
        self
    }

    /// Append an action to run when the node is entered.
    pub fn entry_action(mut self, action: Action) -> Self {
        self.entry_actions.push(action);
        self
    }

    /// Append an option.
    pub fn option(mut self, option: DialogueOption) -> Self {
        self.options.push(option);
        self
    }

    /// Auto-advance to a node after a host-scheduled delay. Ignored if the
    /// node also has options.
    pub fn auto_next(mut self, target: impl Into<String>, delay: u32) -> Self {
        self.auto_next = Some(AutoNext {
            target: target.into(),
            delay,
        });
        self
    }

    /// Override the displayed speaker name.
    pub fn speaker(mut self, name: impl Into<String>) -> Self {
        self.speaker = Some(name.into());
        self
    }

    /// Portrait or illustration hint for the host UI.
    pub fn image(mut self, path: impl Into<String>) -> Self {
        self.image = Some(path.into());
        self
    }

    pub fn build(self) -> Node {
        Node {
            id: self.id,
            text: self.text,
            conditional_texts: self.conditional_texts,
            entry_condition: self.entry_condition,
            entry_actions: self.entry_actions,
            options: self.options,
            auto_next: self.auto_next,
            speaker: self.speaker,
            image: self.image,
        }
    }
}
