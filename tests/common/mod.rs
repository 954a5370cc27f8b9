#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use linkdigest::ai::{Summarizer, SummaryOutput};
use linkdigest::api::EventRouter;
use linkdigest::core::models::{
    ButtonPress, ChatId, InboundEvent, InboundPost, MessageId, PrivateText, TraceRef, UserId,
    WorkUnit,
};
use linkdigest::errors::DigestError;
use linkdigest::extract::ContentExtractor;
use linkdigest::telegram::{InlineKeyboard, Messenger, PressAnswer, TextFormat};
use linkdigest::telemetry::{GenerationRecord, ObservabilitySink};
use linkdigest::{BotSettings, Services};

pub const SOURCE_CHAT: ChatId = -1001;
pub const DEST_CHAT: ChatId = -1002;
pub const BOT_USERNAME: &str = "digest_bot";
pub const URL: &str = "https://example.com/a";
pub const SUMMARY: &str = "<b>Title</b>\n<blockquote>Overview</blockquote>";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat_id: ChatId,
        id: MessageId,
        text: String,
        format: TextFormat,
        keyboard: Option<InlineKeyboard>,
    },
    Edit {
        chat_id: ChatId,
        id: MessageId,
        text: String,
        format: TextFormat,
        keyboard: Option<InlineKeyboard>,
    },
    EditKeyboard {
        id: MessageId,
        keyboard: Option<InlineKeyboard>,
    },
    Answer {
        press_id: String,
        answer: PressAnswer,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Send,
    Edit,
    EditKeyboard,
    Answer,
}

/// Records every outbound call. Optionally rejects HTML like Telegram does
/// for malformed markup, or fails a method with a transport error.
#[derive(Default)]
pub struct FakeMessenger {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    pub reject_html: AtomicBool,
    failures: Mutex<HashMap<Method, usize>>,
}

impl FakeMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sends_to(&self, chat: ChatId) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Send { chat_id, .. } if *chat_id == chat))
            .collect()
    }

    pub fn private_texts(&self, user: UserId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { chat_id, text, .. } if chat_id == user => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits_of(&self, message: MessageId) -> Vec<(String, TextFormat, Option<InlineKeyboard>)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit {
                    id,
                    text,
                    format,
                    keyboard,
                    ..
                } if id == message => Some((text, format, keyboard)),
                _ => None,
            })
            .collect()
    }

    pub fn last_edit(&self, message: MessageId) -> (String, TextFormat, Option<InlineKeyboard>) {
        self.edits_of(message).pop().expect("message was edited")
    }

    pub fn keyboard_edits(&self, message: MessageId) -> Vec<Option<InlineKeyboard>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::EditKeyboard { id, keyboard } if id == message => Some(keyboard),
                _ => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<PressAnswer> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Answer { answer, .. } => Some(answer),
                _ => None,
            })
            .collect()
    }

    /// Make the next `times` calls of `method` fail as if the network dropped.
    pub fn fail_next(&self, method: Method, times: usize) {
        self.failures.lock().unwrap().insert(method, times);
    }

    fn rejects(&self, format: TextFormat) -> bool {
        format == TextFormat::Html && self.reject_html.load(Ordering::SeqCst)
    }

    fn check(&self, method: Method) -> Result<(), DigestError> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&method) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(DigestError::TelegramError("connection reset".into()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageId, DigestError> {
        self.check(Method::Send)?;
        if self.rejects(format) {
            return Err(DigestError::RenderRejected("can't parse entities".into()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(Call::Send {
            chat_id,
            id,
            text: text.to_string(),
            format,
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        format: TextFormat,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError> {
        self.check(Method::Edit)?;
        if self.rejects(format) {
            return Err(DigestError::RenderRejected("can't parse entities".into()));
        }
        self.calls.lock().unwrap().push(Call::Edit {
            chat_id,
            id: message_id,
            text: text.to_string(),
            format,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_keyboard(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), DigestError> {
        self.check(Method::EditKeyboard)?;
        self.calls.lock().unwrap().push(Call::EditKeyboard {
            id: message_id,
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn answer_press(&self, press_id: &str, answer: &PressAnswer) -> Result<(), DigestError> {
        self.check(Method::Answer)?;
        self.calls.lock().unwrap().push(Call::Answer {
            press_id: press_id.to_string(),
            answer: answer.clone(),
        });
        Ok(())
    }
}

pub struct FakeExtractor {
    pub result: Mutex<Result<String, String>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Mutex::new(Ok(text.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, result: Result<&str, &str>) {
        *self.result.lock().unwrap() = result.map(str::to_string).map_err(str::to_string);
    }
}

#[async_trait]
impl ContentExtractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Result<String, DigestError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.result
            .lock()
            .unwrap()
            .clone()
            .map_err(DigestError::ExtractionFailed)
    }
}

pub struct FakeSummarizer {
    pub result: Mutex<Result<String, String>>,
    pub inputs: Mutex<Vec<String>>,
}

impl FakeSummarizer {
    pub fn ok(text: &str) -> Self {
        Self {
            result: Mutex::new(Ok(text.to_string())),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, result: Result<&str, &str>) {
        *self.result.lock().unwrap() = result.map(str::to_string).map_err(str::to_string);
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, article: &str) -> Result<SummaryOutput, DigestError> {
        self.inputs.lock().unwrap().push(article.to_string());
        let text = self
            .result
            .lock()
            .unwrap()
            .clone()
            .map_err(DigestError::SummarizationFailed)?;
        Ok(SummaryOutput {
            text,
            prompt: format!("summarize: {article}"),
            model: "fake-model".to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Hands out a fresh trace per generation.
    Tracing,
    /// Accepts everything but returns no trace references.
    Silent,
    /// Every call fails.
    Failing,
}

pub struct FakeSink {
    pub mode: Mutex<SinkMode>,
    pub generations: Mutex<Vec<GenerationRecord>>,
    pub ratings: Mutex<Vec<(TraceRef, bool)>>,
    pub comments: Mutex<Vec<(TraceRef, String)>>,
}

impl FakeSink {
    pub fn new(mode: SinkMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            generations: Mutex::new(Vec::new()),
            ratings: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
        }
    }

    fn mode(&self) -> SinkMode {
        *self.mode.lock().unwrap()
    }

    fn check(&self) -> Result<(), DigestError> {
        if self.mode() == SinkMode::Failing {
            return Err(DigestError::TracingFailed("sink down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObservabilitySink for FakeSink {
    async fn record_generation(
        &self,
        record: &GenerationRecord,
    ) -> Result<Option<TraceRef>, DigestError> {
        self.check()?;
        let mut generations = self.generations.lock().unwrap();
        generations.push(record.clone());
        Ok(match self.mode() {
            SinkMode::Tracing => Some(TraceRef(format!("trace-{}", generations.len()))),
            _ => None,
        })
    }

    async fn score_rating(&self, trace: &TraceRef, positive: bool) -> Result<(), DigestError> {
        self.check()?;
        self.ratings.lock().unwrap().push((trace.clone(), positive));
        Ok(())
    }

    async fn score_comment(&self, trace: &TraceRef, comment: &str) -> Result<(), DigestError> {
        self.check()?;
        self.comments
            .lock()
            .unwrap()
            .push((trace.clone(), comment.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub router: EventRouter,
    pub messenger: Arc<FakeMessenger>,
    pub extractor: Arc<FakeExtractor>,
    pub summarizer: Arc<FakeSummarizer>,
    pub sink: Arc<FakeSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(None, SinkMode::Tracing)
    }

    pub fn with(allowed_user_id: Option<UserId>, sink_mode: SinkMode) -> Self {
        let messenger = Arc::new(FakeMessenger::new());
        let extractor = Arc::new(FakeExtractor::ok("Article body. ".repeat(50).as_str()));
        let summarizer = Arc::new(FakeSummarizer::ok(SUMMARY));
        let sink = Arc::new(FakeSink::new(sink_mode));

        let services = Services {
            messenger: messenger.clone(),
            extractor: extractor.clone(),
            summarizer: summarizer.clone(),
            sink: sink.clone(),
        };
        let settings = BotSettings {
            source_chat_id: SOURCE_CHAT,
            dest_chat_id: DEST_CHAT,
            allowed_user_id,
            bot_username: BOT_USERNAME.to_string(),
            max_concurrent_jobs: 2,
        };

        Self {
            router: EventRouter::new(services, &settings),
            messenger,
            extractor,
            summarizer,
            sink,
        }
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Result<(), DigestError> {
        self.router.dispatch(event).await
    }

    /// Post a link and return the id of the resulting destination message.
    pub async fn post_link(&self, source_message: MessageId) -> MessageId {
        self.dispatch(post(source_message, &format!("check this out {URL}"), None))
            .await
            .unwrap();
        match self.messenger.sends_to(DEST_CHAT).last() {
            Some(Call::Send { id, .. }) => *id,
            _ => panic!("no placeholder was sent"),
        }
    }

    pub fn unit(&self, id: MessageId) -> WorkUnit {
        self.router.store().snapshot(id).expect("work unit exists")
    }

    pub async fn press(&self, id: MessageId, token: &str, user: UserId) {
        self.dispatch(press(id, token, user)).await.unwrap();
    }

    pub async fn private(&self, user: UserId, text: &str) {
        self.dispatch(private(user, text)).await.unwrap();
    }
}

pub fn post(message_id: MessageId, text: &str, author_id: Option<UserId>) -> InboundEvent {
    InboundEvent::Post(InboundPost {
        chat_id: SOURCE_CHAT,
        message_id,
        author_id,
        text: text.to_string(),
    })
}

pub fn press(message_id: MessageId, token: &str, user_id: UserId) -> InboundEvent {
    InboundEvent::Press(ButtonPress {
        press_id: format!("press-{message_id}-{token}"),
        chat_id: Some(DEST_CHAT),
        message_id: Some(message_id),
        user_id,
        data: token.to_string(),
    })
}

pub fn private(user_id: UserId, text: &str) -> InboundEvent {
    InboundEvent::Private(PrivateText {
        chat_id: user_id,
        user_id,
        text: text.to_string(),
    })
}
