use crate::lifecycle::{Operation, RequestLifecycle};
use crate::traits::{ApiError, PlaygroundApi};
use crate::transcript::ChatTranscript;
use async_trait::async_trait;
use serde::Serialize;
use stageai_core::text::{
    MSG_CHAT_AI_FAILED, MSG_CHAT_CONNECTION_FAILED, MSG_IMAGE_FAILED, MSG_TEXT_FAILED,
};
use stageai_core::types::{ChatMessage, OperationKind, SlotResult};

pub type TextLifecycle = RequestLifecycle<TextGeneration>;
pub type ImageLifecycle = RequestLifecycle<ImageGeneration>;
pub type ChatLifecycle = RequestLifecycle<ChatTurn>;

/// Result slot for a generation kind. Empty while pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSlot {
    pub result: Option<SlotResult>,
}

fn settle_generation(
    slot: &mut GenerationSlot,
    outcome: Result<String, ApiError>,
    failure_text: &str,
) {
    slot.result = Some(match outcome {
        Ok(v) => SlotResult::Ready(v),
        Err(_) => SlotResult::Failed(failure_text.into()),
    });
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextGeneration;

#[async_trait]
impl Operation for TextGeneration {
    type Slot = GenerationSlot;

    fn kind(&self) -> OperationKind {
        OperationKind::Text
    }

    async fn call(&self, api: &dyn PlaygroundApi, input: &str) -> Result<String, ApiError> {
        api.generate_text(input).await
    }

    fn begin(&self, slot: &mut GenerationSlot, _input: &str) {
        slot.result = None;
    }

    fn settle(&self, slot: &mut GenerationSlot, outcome: Result<String, ApiError>) {
        settle_generation(slot, outcome, MSG_TEXT_FAILED);
    }
}

/// Image generation. The ready value is the server-relative image path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageGeneration;

#[async_trait]
impl Operation for ImageGeneration {
    type Slot = GenerationSlot;

    fn kind(&self) -> OperationKind {
        OperationKind::Image
    }

    async fn call(&self, api: &dyn PlaygroundApi, input: &str) -> Result<String, ApiError> {
        api.generate_image(input).await
    }

    fn begin(&self, slot: &mut GenerationSlot, _input: &str) {
        slot.result = None;
    }

    fn settle(&self, slot: &mut GenerationSlot, outcome: Result<String, ApiError>) {
        settle_generation(slot, outcome, MSG_IMAGE_FAILED);
    }
}

/// One chat exchange. Turns never overlap, so every turn settles as the latest one
/// and the transcript grows by exactly two messages per turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatTurn;

#[async_trait]
impl Operation for ChatTurn {
    type Slot = ChatTranscript;

    fn kind(&self) -> OperationKind {
        OperationKind::Chat
    }

    fn allows_overlap(&self) -> bool {
        false
    }

    async fn call(&self, api: &dyn PlaygroundApi, input: &str) -> Result<String, ApiError> {
        api.chat(input).await
    }

    fn begin(&self, slot: &mut ChatTranscript, input: &str) {
        slot.append(ChatMessage::user(input));
    }

    fn settle(&self, slot: &mut ChatTranscript, outcome: Result<String, ApiError>) {
        let content = match outcome {
            Ok(reply) => reply,
            Err(e) if e.is_transport() => MSG_CHAT_CONNECTION_FAILED.into(),
            Err(_) => MSG_CHAT_AI_FAILED.into(),
        };
        slot.append(ChatMessage::assistant(content));
    }
}
