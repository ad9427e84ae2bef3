//! Scripted backend and recording view shared by controller tests.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;

use crate::{
    api::{
        Backend, FileListReply, GenerationReply, GenerationRequest, LoginReply, LoginRequest,
        RegisterReply, RegisterRequest, SessionCheckReply, TransportError,
    },
    session::{SessionToken, TokenStore},
    view::{Effect, MessageKind, RedirectReason, Route, StatusSlot, View},
};

/// In-process token slot.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<SessionToken>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(SessionToken::new(token))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<SessionToken> {
        self.slot.lock().unwrap().clone()
    }

    fn set(&self, token: &SessionToken) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}

type Scripted<T> = Mutex<Result<T, String>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckSession(String),
    ListFiles(String),
    DeleteFile(String, String),
    Logout(String),
    Login(String),
    Register(String),
    Generate(GenerationRequest),
    Download(String),
}

pub struct FakeBackend {
    session: Scripted<SessionCheckReply>,
    files: Scripted<FileListReply>,
    delete: Scripted<bool>,
    logout: Scripted<()>,
    login: Scripted<LoginReply>,
    register: Scripted<RegisterReply>,
    generate: Scripted<GenerationReply>,
    download: Scripted<Vec<u8>>,
    calls: Mutex<Vec<Call>>,
}

fn unscripted<T>() -> Scripted<T> {
    Mutex::new(Err("not scripted".to_string()))
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            session: unscripted(),
            files: unscripted(),
            delete: unscripted(),
            logout: unscripted(),
            login: unscripted(),
            register: unscripted(),
            generate: unscripted(),
            download: unscripted(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

fn script<T>(reply: Result<T, &str>) -> Scripted<T> {
    Mutex::new(reply.map_err(str::to_string))
}

impl FakeBackend {
    pub fn with_session(mut self, reply: Result<SessionCheckReply, &str>) -> Self {
        self.session = script(reply);
        self
    }

    pub fn with_files(mut self, reply: Result<FileListReply, &str>) -> Self {
        self.files = script(reply);
        self
    }

    pub fn with_delete(mut self, reply: Result<bool, &str>) -> Self {
        self.delete = script(reply);
        self
    }

    pub fn with_logout(mut self, reply: Result<(), &str>) -> Self {
        self.logout = script(reply);
        self
    }

    pub fn with_login(mut self, reply: Result<LoginReply, &str>) -> Self {
        self.login = script(reply);
        self
    }

    pub fn with_register(mut self, reply: Result<RegisterReply, &str>) -> Self {
        self.register = script(reply);
        self
    }

    pub fn with_generate(mut self, reply: Result<GenerationReply, &str>) -> Self {
        self.generate = script(reply);
        self
    }

    pub fn with_download(mut self, reply: Result<Vec<u8>, &str>) -> Self {
        self.download = script(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record<T: Clone>(&self, call: Call, scripted: &Scripted<T>) -> Result<T, TransportError> {
        let path = format!("{call:?}");
        self.calls.lock().unwrap().push(call);
        scripted
            .lock()
            .unwrap()
            .clone()
            .map_err(|detail| TransportError::Decode { path, detail })
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn check_session(
        &self,
        token: &SessionToken,
    ) -> Result<SessionCheckReply, TransportError> {
        self.record(Call::CheckSession(token.as_str().to_string()), &self.session)
    }

    async fn list_files(&self, token: &SessionToken) -> Result<FileListReply, TransportError> {
        self.record(Call::ListFiles(token.as_str().to_string()), &self.files)
    }

    async fn delete_file(
        &self,
        token: &SessionToken,
        filename: &str,
    ) -> Result<bool, TransportError> {
        self.record(
            Call::DeleteFile(token.as_str().to_string(), filename.to_string()),
            &self.delete,
        )
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), TransportError> {
        self.record(Call::Logout(token.as_str().to_string()), &self.logout)
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginReply, TransportError> {
        self.record(Call::Login(request.username.clone()), &self.login)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterReply, TransportError> {
        self.record(Call::Register(request.username.clone()), &self.register)
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReply, TransportError> {
        self.record(Call::Generate(request.clone()), &self.generate)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.record(Call::Download(url.to_string()), &self.download)
    }
}

/// View that keeps every effect and answers confirmations from a script.
#[derive(Default)]
pub struct RecordingView {
    pub effects: Vec<Effect>,
    pub prompts: Vec<String>,
    answers: VecDeque<bool>,
}

impl RecordingView {
    pub fn answering(mut self, answer: bool) -> Self {
        self.answers.push_back(answer);
        self
    }

    pub fn redirected_to(&self, route: Route) -> bool {
        self.redirect_reason(route).is_some()
    }

    pub fn redirect_reason(&self, route: Route) -> Option<RedirectReason> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Redirect { route: r, reason } if *r == route => Some(*reason),
            _ => None,
        })
    }

    pub fn statuses(&self, slot: StatusSlot) -> Vec<(MessageKind, String)> {
        self.effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Status {
                    slot: s,
                    kind,
                    text,
                } if *s == slot => Some((*kind, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self, slot: StatusSlot) -> Option<(MessageKind, String)> {
        self.statuses(slot).pop()
    }
}

impl View for RecordingView {
    fn apply(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().unwrap_or(false)
    }
}
