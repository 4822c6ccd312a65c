use log::{ debug, warn };
use tokio::sync::watch;

use crate::config::prompt::ERROR_FALLBACK;
use crate::generator::ResponseGenerator;
use crate::models::chat::{ ConversationState, InlineData, Message, Part, Role };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Neither text nor a usable image was supplied.
    Empty,
    /// A generation is already in flight.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Ignored(IgnoreReason),
}

/// A user turn that has been appended and marked busy but not yet answered.
#[must_use = "an accepted turn leaves the conversation busy until completed"]
pub struct AcceptedTurn {
    text: String,
    image: Option<InlineData>,
}

/// Owns one conversation: the append-only message log and the busy flag.
///
/// State lives in a watch channel so renderers can follow it with
/// [`ConversationController::subscribe`]. A watch receiver only sees the
/// latest value, so a fast reply can coalesce the busy state away; callers
/// that must show it use [`ConversationController::accept`] and render the
/// snapshot themselves. At most one submission is in flight; anything
/// submitted meanwhile is dropped.
pub struct ConversationController {
    generator: ResponseGenerator,
    state: watch::Sender<ConversationState>,
}

impl ConversationController {
    pub fn new(generator: ResponseGenerator) -> Self {
        let (state, _) = watch::channel(ConversationState::default());
        Self { generator, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Appends the user message and marks the conversation busy.
    pub fn accept(&self, text: &str, image: Option<InlineData>) -> Result<AcceptedTurn, IgnoreReason> {
        let image = image.filter(InlineData::is_usable);
        // Blank text alone is not a message; alongside an image it is kept verbatim.
        let text = if image.is_none() && text.trim().is_empty() { "" } else { text };

        let Some(user_message) = Message::from_user(Some(text), image.as_ref()) else {
            debug!("Ignoring empty submission");
            return Err(IgnoreReason::Empty);
        };

        // Busy check and user append happen under one state lock.
        let accepted = self.state.send_if_modified(move |state| {
            if state.busy {
                return false;
            }
            state.messages.push(user_message);
            state.busy = true;
            true
        });
        if !accepted {
            warn!("Submission dropped: a response is already being generated");
            return Err(IgnoreReason::Busy);
        }

        Ok(AcceptedTurn { text: text.to_string(), image })
    }

    /// Generates the reply for an accepted turn and clears the busy flag.
    pub async fn complete(&self, turn: AcceptedTurn) {
        let reply = match self.generator.generate(&turn.text, turn.image.as_ref()).await {
            Ok(parts) => Message::new(Role::Model, parts),
            Err(e) => {
                warn!("Generation failed, showing fallback: {}", e);
                Message::new(Role::Model, vec![Part::text(ERROR_FALLBACK)])
            }
        };

        self.state.send_modify(|state| {
            state.messages.push(reply);
            state.busy = false;
        });
    }

    pub async fn submit(&self, text: &str, image: Option<InlineData>) -> SubmitOutcome {
        match self.accept(text, image) {
            Ok(turn) => {
                self.complete(turn).await;
                SubmitOutcome::Completed
            }
            Err(reason) => SubmitOutcome::Ignored(reason),
        }
    }
}
