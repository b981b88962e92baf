use std::time::Duration;

use crate::chat::message::{ChatId, Message, MessageId};

/// Reveal cadence for assistant replies.
pub const CHAT_TYPING_INTERVAL: Duration = Duration::from_millis(10);
/// Reveal cadence for [`TextReveal`] when none is given.
pub const TEXT_REVEAL_DEFAULT_INTERVAL: Duration = Duration::from_millis(20);

/// Message whose content is being revealed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypingTarget {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl TypingTarget {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }

    pub fn matches(&self, chat_id: &ChatId, message_id: MessageId) -> bool {
        self.message_id == message_id && &self.chat_id == chat_id
    }
}

/// Currently-typing marker: target plus the text revealed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingMarker {
    pub target: TypingTarget,
    pub content: String,
}

/// Content to write into the stored message once an animation ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    pub target: TypingTarget,
    pub content: String,
    /// False when the animation was stopped before the last character.
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No animation is running.
    Idle,
    /// One more character was revealed and more remain.
    Revealed,
    /// The last character was revealed; the animation is over.
    Completed(Finalized),
}

#[derive(Debug)]
struct ActiveTyping {
    marker: TypingMarker,
    full_text: String,
    cursor: usize,
}

/// Character-by-character reveal of a finished reply.
///
/// The engine never touches stored messages. It only tracks the marker and
/// hands back a [`Finalized`] value when the animation completes or is
/// stopped; the caller writes that into the chat store. Until then the
/// displayed content comes from [`Typewriter::displayed_content`].
#[derive(Debug, Default)]
pub struct Typewriter {
    active: Option<ActiveTyping>,
}

impl Typewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts revealing `full_text` into `target`.
    ///
    /// A running animation is stopped first and its partial content returned,
    /// so no stale target survives the replacement.
    pub fn start(&mut self, target: TypingTarget, full_text: impl Into<String>) -> Option<Finalized> {
        let previous = self.stop();
        self.active = Some(ActiveTyping {
            marker: TypingMarker {
                target,
                content: String::new(),
            },
            full_text: full_text.into(),
            cursor: 0,
        });
        previous
    }

    pub fn tick(&mut self) -> TickOutcome {
        let Some(active) = self.active.as_mut() else {
            return TickOutcome::Idle;
        };

        if let Some(next) = active.full_text[active.cursor..].chars().next() {
            active.cursor += next.len_utf8();
            active.marker.content.push(next);
            if active.cursor < active.full_text.len() {
                return TickOutcome::Revealed;
            }
        }

        match self.active.take() {
            Some(active) => TickOutcome::Completed(Finalized {
                target: active.marker.target,
                content: active.full_text,
                completed: true,
            }),
            None => TickOutcome::Idle,
        }
    }

    /// Ends the animation early, keeping only what was revealed.
    /// Returns `None` when nothing is running.
    pub fn stop(&mut self) -> Option<Finalized> {
        self.active.take().map(|active| Finalized {
            target: active.marker.target,
            content: active.marker.content,
            completed: false,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn marker(&self) -> Option<&TypingMarker> {
        self.active.as_ref().map(|active| &active.marker)
    }

    /// Marker content for the message being typed, stored content otherwise.
    pub fn displayed_content<'a>(&'a self, chat_id: &ChatId, message: &'a Message) -> &'a str {
        match self.marker() {
            Some(marker) if marker.target.matches(chat_id, message.id) => &marker.content,
            _ => &message.content,
        }
    }
}

/// Self-contained reveal of a piece of text, restarting whenever the text changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReveal {
    text: String,
    revealed: usize,
    interval: Duration,
}

impl TextReveal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            revealed: 0,
            interval: TEXT_REVEAL_DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true when the text differed and the reveal was reset.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }

        self.text = text;
        self.revealed = 0;
        true
    }

    /// Reveals one more character. Returns true while characters remain.
    pub fn tick(&mut self) -> bool {
        if let Some(next) = self.text[self.revealed..].chars().next() {
            self.revealed += next.len_utf8();
        }
        !self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.text.len()
    }

    pub fn displayed(&self) -> &str {
        &self.text[..self.revealed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TypingTarget {
        TypingTarget::new(ChatId::new("chat"), MessageId::new(7))
    }

    #[test]
    fn reveals_one_character_per_tick_and_completes_with_full_text() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "Hello");

        for expected in ["H", "He", "Hel", "Hell"] {
            assert_eq!(typewriter.tick(), TickOutcome::Revealed);
            assert_eq!(typewriter.marker().unwrap().content, expected);
        }

        let outcome = typewriter.tick();
        assert_eq!(
            outcome,
            TickOutcome::Completed(Finalized {
                target: target(),
                content: "Hello".to_string(),
                completed: true,
            })
        );
        assert!(!typewriter.is_active());
        assert_eq!(typewriter.tick(), TickOutcome::Idle);
    }

    #[test]
    fn stop_after_three_ticks_keeps_revealed_prefix_and_is_idempotent() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "Hello");
        for _ in 0..3 {
            typewriter.tick();
        }

        let stored = Message::assistant_placeholder(MessageId::new(7));
        assert_eq!(typewriter.displayed_content(&ChatId::new("chat"), &stored), "Hel");
        assert!(stored.content.is_empty());

        let finalized = typewriter.stop().unwrap();
        assert_eq!(finalized.content, "Hel");
        assert!(!finalized.completed);
        assert_eq!(typewriter.stop(), None);
    }

    #[test]
    fn multibyte_text_is_revealed_per_character() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "héllo ✓");

        let mut ticks = 0;
        let finalized = loop {
            ticks += 1;
            if let TickOutcome::Completed(finalized) = typewriter.tick() {
                break finalized;
            }
        };

        assert_eq!(ticks, "héllo ✓".chars().count());
        assert_eq!(finalized.content, "héllo ✓");
    }

    #[test]
    fn empty_text_completes_on_first_tick() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "");

        match typewriter.tick() {
            TickOutcome::Completed(finalized) => assert!(finalized.content.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn restarting_finalizes_the_previous_target() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "abc");
        typewriter.tick();

        let next = TypingTarget::new(ChatId::new("chat"), MessageId::new(8));
        let previous = typewriter.start(next.clone(), "xyz").unwrap();

        assert_eq!(previous.target, target());
        assert_eq!(previous.content, "a");
        assert_eq!(typewriter.marker().unwrap().target, next);
        assert!(typewriter.marker().unwrap().content.is_empty());
    }

    #[test]
    fn other_messages_show_stored_content() {
        let mut typewriter = Typewriter::new();
        typewriter.start(target(), "abc");
        typewriter.tick();

        let other = Message::new(MessageId::new(1), crate::chat::message::Role::User, "stored");
        assert_eq!(typewriter.displayed_content(&ChatId::new("chat"), &other), "stored");

        let same_id_other_chat = Message::assistant_placeholder(MessageId::new(7));
        assert_eq!(
            typewriter.displayed_content(&ChatId::new("elsewhere"), &same_id_other_chat),
            ""
        );
    }

    #[test]
    fn text_reveal_resets_only_on_new_text() {
        let mut reveal = TextReveal::new("Hi!");
        assert_eq!(reveal.interval(), TEXT_REVEAL_DEFAULT_INTERVAL);

        assert!(reveal.tick());
        assert_eq!(reveal.displayed(), "H");
        assert!(!reveal.set_text("Hi!"));
        assert_eq!(reveal.displayed(), "H");

        assert!(reveal.tick());
        assert!(!reveal.tick());
        assert!(reveal.is_complete());
        assert_eq!(reveal.displayed(), "Hi!");
        assert!(!reveal.tick());

        assert!(reveal.set_text("Bye"));
        assert_eq!(reveal.displayed(), "");
        assert!(!reveal.is_complete());
    }

    #[test]
    fn text_reveal_keeps_a_custom_interval_across_text_changes() {
        let mut reveal = TextReveal::new("Hi").with_interval(Duration::from_millis(55));
        reveal.set_text("Hello");

        assert_eq!(reveal.interval(), Duration::from_millis(55));
    }
}
