//! Player-facing choices leading out of a node.

use crate::action::Action;
use crate::actor::Actor;
use crate::condition::Condition;
use crate::context::DialogueContext;
use std::fmt;

/// A selectable edge from a node to another node, or to conversation end.
///
/// Immutable once built; construct with [`DialogueOption::builder`] or the
/// shorthands. Option ids only need to be unique within their node.
#[derive(Clone)]
pub struct DialogueOption {
    id: String,
    text: String,
    target: Option<String>,
    visible_when: Condition,
    enabled_when: Condition,
    disabled_reason: Option<String>,
    actions: Vec<Action>,
    priority: i32,
    tooltip: Option<String>,
}

impl DialogueOption {
    /// Start building an option.
    pub fn builder(id: impl Into<String>, text: impl Into<String>) -> OptionBuilder {
        OptionBuilder {
            id: id.into(),
            text: text.into(),
            target: None,
            visible_when: Condition::always(),
            enabled_when: Condition::always(),
            disabled_reason: None,
            actions: Vec::new(),
            priority: 0,
            tooltip: None,
        }
    }

    /// An always-available option leading to a target node.
    pub fn simple(
        id: impl Into<String>,
        text: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::builder(id, text).target(target).build()
    }

    /// A farewell option that ends the conversation. Sorts below
    /// zero-priority options so it lands last in the presented list.
    pub fn exit(text: impl Into<String>) -> Self {
        Self::builder("exit", text).priority(-100).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Target node id; `None` means selecting this option ends the
    /// conversation.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.tooltip.as_deref()
    }

    /// Why the option cannot be chosen, shown when visible but disabled.
    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    /// Whether the option should be shown at all.
    pub fn is_visible(&self, ctx: &DialogueContext, actor: &dyn Actor) -> bool {
        self.visible_when.evaluate(ctx, actor)
    }

    /// Whether the option may be selected.
    pub fn is_enabled(&self, ctx: &DialogueContext, actor: &dyn Actor) -> bool {
        self.enabled_when.evaluate(ctx, actor)
    }

    /// Run the option's actions in order.
    pub fn run_actions(&self, ctx: &mut DialogueContext, actor: &mut dyn Actor) {
        for action in &self.actions {
            action.execute(ctx, actor);
        }
    }
}

impl fmt::Debug for DialogueOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogueOption")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Builder for [`DialogueOption`].
#[derive(Debug)]
pub struct OptionBuilder {
    id: String,
    text: String,
    target: Option<String>,
    visible_when: Condition,
    enabled_when: Condition,
    disabled_reason: Option<String>,
    actions: Vec<Action>,
    priority: i32,
    tooltip: Option<String>,
}

impl OptionBuilder {
    /// Set the node this option leads to. Unset means the option ends the
    /// conversation.
    pub fn target(mut self, node_id: impl Into<String>) -> Self {
        self.target = Some(node_id.into());
        self
    }

    /// Condition controlling whether the option is listed at all.
    pub fn visible_when(mut self, condition: Condition) -> Self {
        self.visible_when = condition;
        self
    }

    /// Condition controlling whether a listed option may be selected.
    pub fn enabled_when(mut self, condition: Condition) -> Self {
        self.enabled_when = condition;
        self
    }

    /// Text shown when the option is visible but disabled.
    pub fn disabled_reason(mut self, reason: impl Into<String>) -> Self {
        self.disabled_reason = Some(reason.into());
        self
    }

    /// Append an action to run when the option is selected.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Sort priority; higher sorts first, ties keep authored order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Hover text for the host UI.
    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn build(self) -> DialogueOption {
        DialogueOption {
            id: self.id,
            text: self.text,
            target: self.target,
            visible_when: self.visible_when,
            enabled_when: self.enabled_when,
            disabled_reason: self.disabled_reason,
            actions: self.actions,
            priority: self.priority,
            tooltip: self.tooltip,
        }
    }
}
