//! Stock dialogue trees for common actor roles.
//!
//! Hosts can register these as-is for instant coverage, use them as
//! fallbacks, or treat them as worked examples of the builder API. All
//! faction names used here ("merchants", "order", "citizens", "underworld")
//! are plain strings the host is free to reuse or ignore.

use crate::action::Action;
use crate::actor::{MoodKind, PersonalityTrait};
use crate::condition::Condition;
use crate::engine::DialogueEngine;
use crate::node::Node;
use crate::option::DialogueOption;
use crate::tree::DialogueTree;

/// Register every stock tree plus category fallbacks.
///
/// The citizen gossip tree is tagged global at priority 5, the underworld
/// tree at priority 10, so known underworld contacts get the shadier line
/// of conversation from any actor.
pub fn register_stock_trees(engine: &mut DialogueEngine) {
    engine.register_tree(merchant_tree());
    engine.register_tree(guard_tree());
    engine.register_tree(citizen_tree());
    engine.register_tree(underworld_tree());
    engine.register_tree(small_talk_tree());

    engine.set_fallback_tree("merchant", "merchant_trade");
    engine.set_fallback_tree("guard", "guard_watch");
    engine.set_fallback_tree("citizen", "citizen_gossip");
    engine.set_fallback_tree("generic", "small_talk");
}

/// A shop conversation: browse, haggle, or make small talk.
pub fn merchant_tree() -> DialogueTree {
    DialogueTree::builder("merchant_trade")
        .name("Merchant")
        .priority(5)
        .node(
            Node::builder("start", "Welcome, {initiator}. Looking for anything in particular?")
                .text_when(
                    Condition::memory_tag("regular"),
                    "Back again, {initiator}! Always good to see a regular.",
                )
                .text_when(
                    Condition::faction_standing_at_least("merchants", 50),
                    "An honored friend of the guild! What can I get you?",
                )
                .option(
                    DialogueOption::builder("browse", "Show me your wares.")
                        .priority(10)
                        .action(Action::open_trade())
                        .build(),
                )
                .option(
                    DialogueOption::builder("haggle", "Surely we can talk prices.")
                        .target("haggle")
                        .visible_when(Condition::trait_at_least(PersonalityTrait::Greed, 30))
                        .build(),
                )
                .option(DialogueOption::simple("chat", "How is business?", "business"))
                .option(DialogueOption::exit("Just passing through."))
                .build(),
        )
        .node(
            Node::builder("haggle", "Hm. For a friend of the guild, maybe. For you...")
                .option(
                    DialogueOption::builder("press", "Ten percent off and I buy today.")
                        .target("haggle_win")
                        .enabled_when(Condition::faction_standing_at_least("merchants", 20))
                        .disabled_reason("The guild does not know you.")
                        .build(),
                )
                .option(DialogueOption::simple("relent", "Fine, full price.", "start"))
                .build(),
        )
        .node(
            Node::builder("haggle_win", "You drive a hard bargain. Done.")
                .entry_action(Action::set_flag("discount"))
                .entry_action(Action::record_event("haggled a discount", 2))
                .option(
                    DialogueOption::builder("deal", "[Shake on it]")
                        .action(Action::add_memory_tag("regular"))
                        .action(Action::open_trade())
                        .build(),
                )
                .build(),
        )
        .node(
            Node::builder("business", "Slow season. The roads being what they are.")
                .option(DialogueOption::simple("back", "Let me see the goods after all.", "start"))
                .option(DialogueOption::exit("Good luck out there."))
                .build(),
        )
        .build()
}

/// A watch post conversation: reports, directions, and the occasional bribe.
pub fn guard_tree() -> DialogueTree {
    DialogueTree::builder("guard_watch")
        .name("Guard")
        .priority(5)
        .start_when(
            Condition::not(Condition::faction_standing_at_least("order", -49)),
            "hostile",
        )
        .node(
            Node::builder("hostile", "That is far enough. You are wanted by the watch.")
                .entry_action(Action::record_event("confronted by the watch", 4))
                .option(DialogueOption::exit("[Back away slowly]"))
                .build(),
        )
        .node(
            Node::builder("start", "Move along, citizen.")
                .text_when(
                    Condition::memory_tag("troublemaker"),
                    "You. I remember you. Keep your hands where I can see them.",
                )
                .option(DialogueOption::simple("report", "I want to report a crime.", "report"))
                .option(DialogueOption::simple("directions", "Which way to the market?", "directions"))
                .option(
                    DialogueOption::builder("bribe", "[Slip the guard a few coins]")
                        .target("bribed")
                        .visible_when(Condition::memory_tag("troublemaker"))
                        .action(Action::pay(50))
                        .build(),
                )
                .option(DialogueOption::exit("Moving along."))
                .build(),
        )
        .node(
            Node::builder("report", "Go on. I am listening.")
                .entry_action(Action::record_event("reported a crime", 3))
                .option(
                    DialogueOption::builder("finish", "That is everything I saw.")
                        .action(Action::adjust_faction("order", 5))
                        .build(),
                )
                .build(),
        )
        .node(Node::farewell(
            "directions",
            "Down the hill, past the well. You cannot miss it.",
        ))
        .node(
            Node::builder("bribed", "...")
                .text_when(
                    Condition::flag_set("payment_ok"),
                    "I saw nothing. Keep it that way.",
                )
                .text_when(
                    Condition::flag_set("payment_failed"),
                    "Not even enough coin to insult me properly. Move along.",
                )
                .entry_action(Action::when(
                    Condition::flag_set("payment_ok"),
                    Action::remove_memory_tag("troublemaker"),
                    Some(Action::trigger_mood(MoodKind::Suspicious, 40.0)),
                ))
                .option(DialogueOption::exit("[Leave quickly]"))
                .build(),
        )
        .build()
}

/// Everyday gossip, available from any actor.
pub fn citizen_tree() -> DialogueTree {
    DialogueTree::builder("citizen_gossip")
        .name("Gossip")
        .tag("global")
        .priority(5)
        .node(
            Node::builder("start", "Oh, hello there. Lovely day, is it not?")
                .text_when(
                    Condition::mood_is(MoodKind::Fearful, 30.0),
                    "Please, I do not want any trouble.",
                )
                .option(DialogueOption::simple("news", "Heard anything interesting?", "news"))
                .option(DialogueOption::exit("Good day."))
                .build(),
        )
        .node(
            Node::builder(
                "news",
                "They say strange lights were seen over the old mill last night...",
            )
            .option(
                DialogueOption::builder("spread", "Fascinating. Do tell the others I asked.")
                    .action(Action::broadcast_rumor("curious_stranger"))
                    .build(),
            )
            .option(DialogueOption::exit("Just idle talk, then."))
            .build(),
        )
        .build()
}

/// Shadier conversation for initiators the underworld already knows.
/// Outranks the gossip tree wherever both apply.
pub fn underworld_tree() -> DialogueTree {
    DialogueTree::builder("underworld_contacts")
        .name("Contacts")
        .tag("global")
        .priority(10)
        .start_condition(Condition::memory_tag("underworld_contact"))
        .node(
            Node::builder("start", "Keep your voice down. You were not followed?")
                .option(DialogueOption::simple("work", "Any work going?", "job"))
                .option(DialogueOption::exit("[Walk away]"))
                .build(),
        )
        .node(
            Node::builder("job", "A warehouse by the docks. Night shipment, light guard.")
                .option(
                    DialogueOption::builder("accept", "I am in.")
                        .target("sealed")
                        .action(Action::offer_quest("warehouse_job"))
                        .build(),
                )
                .option(
                    DialogueOption::builder("refuse", "Too rich for me.")
                        .action(Action::adjust_faction("underworld", -5))
                        .build(),
                )
                .build(),
        )
        .node(Node::transition("sealed", "Dawn, then. Do not be late.", "gone", 30))
        .node(
            Node::builder("gone", "...")
                .entry_action(Action::end_conversation())
                .build(),
        )
        .build()
}

/// Minimal fallback for uncategorized actors.
pub fn small_talk_tree() -> DialogueTree {
    DialogueTree::builder("small_talk")
        .name("Small talk")
        .node(Node::farewell("start", "Hm? Oh. Hello."))
        .build()
}
