//! Conversation state and the turn lifecycle.
//!
//! A turn runs in three steps so the network part can live on another task:
//! [`ConversationController::begin_turn`] applies the optimistic user message
//! and takes the single in-flight slot, [`PendingTurn::run`] talks to the
//! backend without touching controller state, and
//! [`ConversationController::finish_turn`] either confirms the turn or
//! compensates with an error notice. `finish_turn` always releases the slot.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::client::{ChatReply, ChatRequest, EvaluateRequest, RagClient};
use crate::error::{Endpoint, Error, Result};
use crate::message::Message;
use crate::metrics::Metric;

/// How a successful chat response is folded into local history
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReconcilePolicy {
    /// Replace local history with the (sanitized) server history
    #[default]
    FullReplace,
    /// Keep local history and append the server answer as an assistant message
    AppendOnly,
}

/// Behavior switches for a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub policy: ReconcilePolicy,
    pub evaluate: bool,
    pub ground_truth_source: Option<String>,
    pub seed_system_message: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::default(),
            evaluate: false,
            ground_truth_source: None,
            seed_system_message: true,
        }
    }
}

/// Owns the conversation and the single in-flight turn
pub struct ConversationController {
    client: RagClient,
    settings: ControllerSettings,
    draft: String,
    history: Vec<Message>,
    in_flight: Option<Uuid>,
    metrics: Vec<Metric>,
    evaluation: Option<String>,
    notices: Vec<Notice>,
}

/// Local message shown between history entries but never sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// History length when the notice was raised; it is drawn before the
    /// entry at this index
    pub anchor: usize,
    pub text: String,
}

/// Network half of a turn, detached from controller state
#[derive(Clone)]
pub struct PendingTurn {
    id: Uuid,
    question: String,
    history: Vec<Message>,
    ground_truth_source: Option<String>,
    evaluate: bool,
    client: RagClient,
}

/// Everything the backend said about one turn
#[derive(Debug)]
pub struct TurnOutcome {
    pub turn_id: Uuid,
    pub chat: Result<ChatReply>,
    /// `None` when evaluation is disabled or the chat call failed
    pub evaluation: Option<Result<String>>,
}

impl TurnOutcome {
    /// Outcome for a turn whose task died before reporting back
    pub fn aborted(turn_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            turn_id,
            chat: Err(Error::Aborted {
                endpoint: Endpoint::Chat,
                reason: reason.into(),
            }),
            evaluation: None,
        }
    }
}

impl PendingTurn {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Chat, then evaluate the answer if enabled. The evaluation request is
    /// only sent after the chat call succeeded.
    pub async fn run(self) -> TurnOutcome {
        let request = ChatRequest {
            message: &self.question,
            history: &self.history,
            ground_truth_source: self.ground_truth_source.as_deref(),
        };

        let chat = self.client.chat(&request).await;

        let evaluation = match (&chat, self.evaluate) {
            (Ok(reply), true) => {
                let request = EvaluateRequest {
                    question: &self.question,
                    answer: &reply.answer,
                };
                Some(self.client.evaluate(&request).await)
            }
            _ => None,
        };

        TurnOutcome {
            turn_id: self.id,
            chat,
            evaluation,
        }
    }
}

impl ConversationController {
    pub fn new(client: RagClient, settings: ControllerSettings) -> Self {
        let history = Self::seed(&settings);

        Self {
            client,
            settings,
            draft: String::new(),
            history,
            in_flight: None,
            metrics: Vec::new(),
            evaluation: None,
            notices: Vec::new(),
        }
    }

    fn seed(settings: &ControllerSettings) -> Vec<Message> {
        if settings.seed_system_message {
            vec![Message::system("")]
        } else {
            Vec::new()
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn evaluation(&self) -> Option<&str> {
        self.evaluation.as_deref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Whether a send would currently be accepted
    pub fn can_send(&self, draft: &str) -> bool {
        !self.is_loading() && !draft.trim().is_empty()
    }

    /// Run a whole turn for `draft`. Returns `false` when the draft was
    /// rejected (blank, or a turn is already in flight).
    pub async fn submit(&mut self, draft: &str) -> bool {
        let Some(turn) = self.begin_turn(draft) else {
            return false;
        };
        let outcome = turn.run().await;
        self.finish_turn(outcome);
        true
    }

    /// Submit whatever is currently in the draft
    pub async fn submit_draft(&mut self) -> bool {
        let draft = self.draft.clone();
        self.submit(&draft).await
    }

    /// Optimistically append the user message and take the in-flight slot.
    pub fn begin_turn(&mut self, draft: &str) -> Option<PendingTurn> {
        if !self.can_send(draft) {
            tracing::debug!(loading = self.is_loading(), "send rejected");
            return None;
        }

        let text = draft.trim().to_string();
        let id = Uuid::new_v4();

        self.draft = draft.to_string();
        self.history.push(Message::user(text.clone()));
        self.in_flight = Some(id);
        self.evaluation = None;

        tracing::info!(turn_id = %id, history_len = self.history.len(), "turn started");

        Some(PendingTurn {
            id,
            question: text,
            history: self.history.clone(),
            ground_truth_source: self.settings.ground_truth_source.clone(),
            evaluate: self.settings.evaluate,
            client: self.client.clone(),
        })
    }

    /// Confirm or compensate the in-flight turn, then release it.
    pub fn finish_turn(&mut self, outcome: TurnOutcome) {
        if self.in_flight != Some(outcome.turn_id) {
            tracing::warn!(turn_id = %outcome.turn_id, "ignoring outcome of unknown turn");
            return;
        }

        match outcome.chat {
            Ok(reply) => {
                self.apply_reply(reply);
                match outcome.evaluation {
                    Some(Ok(evaluation)) => self.evaluation = Some(evaluation),
                    Some(Err(error)) => self.report(&error),
                    None => {}
                }
                tracing::info!(turn_id = %outcome.turn_id, history_len = self.history.len(), "turn completed");
            }
            Err(error) => self.report(&error),
        }

        self.draft.clear();
        self.in_flight = None;
    }

    fn apply_reply(&mut self, reply: ChatReply) {
        match self.settings.policy {
            ReconcilePolicy::FullReplace => self.history = reply.history,
            ReconcilePolicy::AppendOnly => self.history.push(Message::assistant(reply.answer)),
        }
        self.metrics = reply.metrics.unwrap_or_default();
    }

    fn report(&mut self, error: &Error) {
        tracing::warn!(%error, "backend call failed");
        self.history.push(Message::system(error.user_message()));
    }

    /// Show a local notice after the current history. Notices are kept
    /// apart from the history, so they never reach the backend and survive a
    /// full replace.
    pub fn push_notice(&mut self, text: impl Into<String>) {
        self.notices.push(Notice {
            anchor: self.history.len(),
            text: text.into(),
        });
    }

    /// Start over with a fresh conversation. Ignored while a turn is in flight.
    pub fn reset(&mut self) -> bool {
        if self.is_loading() {
            return false;
        }
        self.history = Self::seed(&self.settings);
        self.notices.clear();
        self.metrics.clear();
        self.evaluation = None;
        self.draft.clear();
        true
    }
}
