//! Addressee resolution for unthreaded group chat
//!
//! Rules, tried in the configured order:
//! - mention: the text names another participant
//! - last speaker: the most recent sender in the window who is not the
//!   current sender (reply adjacency)
//!
//! Consecutive messages from one sender form a single utterance: the run's
//! first message is resolved and its guess is carried to the rest of the run.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::AddresseePrecedence;
use crate::transcript::{Message, MessageStore};

const MENTION_CONFIDENCE: f32 = 1.0;
const LAST_SPEAKER_CONFIDENCE: f32 = 0.6;

/// Which rule produced an addressee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBasis {
    Mention,
    LastSpeaker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddresseeGuess {
    pub message_id: u64,
    pub candidate_target_id: String,
    pub confidence: f32,
    pub basis: ResolutionBasis,
}

/// Infers who a message is directed at
pub trait AddresseeResolver: Send + Sync {
    /// `preceding` holds at most `window` messages of the same conversation,
    /// oldest first, ending right before `message`.
    fn resolve(
        &self,
        message: &Message,
        preceding: &[&Message],
        participants: &[String],
    ) -> Option<AddresseeGuess>;
}

/// Rule-based mention / last-speaker resolver
pub struct WindowResolver {
    precedence: AddresseePrecedence,
}

impl WindowResolver {
    pub fn new(precedence: AddresseePrecedence) -> Self {
        Self { precedence }
    }

    fn by_mention(&self, message: &Message, participants: &[String]) -> Option<AddresseeGuess> {
        find_mention(&message.raw_text, &message.sender_id, participants).map(|target| {
            AddresseeGuess {
                message_id: message.id,
                candidate_target_id: target,
                confidence: MENTION_CONFIDENCE,
                basis: ResolutionBasis::Mention,
            }
        })
    }

    fn by_last_speaker(&self, message: &Message, preceding: &[&Message]) -> Option<AddresseeGuess> {
        preceding
            .iter()
            .rev()
            .find(|m| m.sender_id != message.sender_id)
            .map(|m| AddresseeGuess {
                message_id: message.id,
                candidate_target_id: m.sender_id.clone(),
                confidence: LAST_SPEAKER_CONFIDENCE,
                basis: ResolutionBasis::LastSpeaker,
            })
    }
}

impl AddresseeResolver for WindowResolver {
    fn resolve(
        &self,
        message: &Message,
        preceding: &[&Message],
        participants: &[String],
    ) -> Option<AddresseeGuess> {
        match self.precedence {
            AddresseePrecedence::MentionFirst => self
                .by_mention(message, participants)
                .or_else(|| self.by_last_speaker(message, preceding)),
            AddresseePrecedence::LastSpeakerFirst => self
                .by_last_speaker(message, preceding)
                .or_else(|| self.by_mention(message, participants)),
            AddresseePrecedence::LastSpeakerOnly => self.by_last_speaker(message, preceding),
        }
    }
}

/// Earliest mentioned participant other than the sender.
///
/// Case-insensitive. The character before a match must not be alphanumeric
/// (`@` is fine); the character after must not be an ASCII letter or digit,
/// which still lets Korean particles attach ("철수야"). At equal positions
/// the longer name wins.
pub fn find_mention(text: &str, sender: &str, participants: &[String]) -> Option<String> {
    let haystack = text.to_lowercase();
    let mut best: Option<(usize, usize, &String)> = None;

    for name in participants {
        if name == sender || name.trim().is_empty() {
            continue;
        }
        let needle = name.to_lowercase();

        for (position, _) in haystack.match_indices(&needle) {
            let before_ok = haystack[..position]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let after_ok = haystack[position + needle.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_ascii_alphanumeric());
            if !(before_ok && after_ok) {
                continue;
            }

            let candidate = (position, needle.len(), name);
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let better = position < current.0
                        || (position == current.0 && needle.len() > current.1)
                        || (position == current.0 && needle.len() == current.1 && name < current.2);
                    Some(if better { candidate } else { current })
                }
            };
            break;
        }
    }

    best.map(|(_, _, name)| name.clone())
}

/// Resolve every message of the store, in store order.
///
/// Runs strictly sequentially per conversation; the result is aligned with
/// `store.messages()`.
pub fn resolve_addressees(
    resolver: &dyn AddresseeResolver,
    store: &MessageStore,
    window: usize,
) -> Vec<Option<AddresseeGuess>> {
    let participants = store.participants();
    let messages = store.messages();

    // Store positions grouped per conversation, keeping order
    let mut by_conversation: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, m) in messages.iter().enumerate() {
        by_conversation
            .entry(m.conversation_id.as_str())
            .or_default()
            .push(index);
    }

    let mut guesses: Vec<Option<AddresseeGuess>> = vec![None; messages.len()];

    for conversation in store.conversations() {
        let positions = &by_conversation[conversation];
        let thread: Vec<&Message> = positions.iter().map(|&i| &messages[i]).collect();

        // Guess of the current same-sender run, set at the run's first message
        let mut carried: Option<AddresseeGuess> = None;
        for (i, message) in thread.iter().enumerate() {
            let continues_run = i > 0 && thread[i - 1].sender_id == message.sender_id;
            let guess = if continues_run {
                carried.as_ref().map(|g| AddresseeGuess {
                    message_id: message.id,
                    ..g.clone()
                })
            } else {
                let preceding = &thread[i.saturating_sub(window)..i];
                carried = resolver.resolve(message, preceding, &participants);
                carried.clone()
            };
            guesses[positions[i]] = guess;
        }
    }

    let resolved = guesses.iter().filter(|g| g.is_some()).count();
    tracing::debug!(resolved, total = messages.len(), "resolved addressees");

    guesses
}
