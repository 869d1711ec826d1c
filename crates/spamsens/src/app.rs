//! One user's session: page state, demo accounts and access to the shared model.
//!
//! The classifier is loaded once per process and shared between sessions through an
//! `Arc`; everything else lives and dies with the session.

use core::fmt;
use std::sync::Arc;

use spamsens_preprocessing::pre_processor::is_whitespace;
use tracing::{info, warn};

use crate::{
    Message, SpamClassifier,
    auth::{AuthError, LoginState, UserStore},
    pages::{Page, Transition},
    translate::{Language, Translator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

/// A message for the user produced while handling an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "[{tag}] {}", self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(Page),
    Back,
    Logout,
    Predict(String),
    Translate {
        text: String,
        language: Language,
    },
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        confirm: String,
    },
}

pub struct Session {
    classifier: Arc<SpamClassifier>,
    translator: Arc<dyn Translator>,
    page: Page,
    users: UserStore,
    login: LoginState,
}

impl Session {
    pub fn new(classifier: Arc<SpamClassifier>, translator: Arc<dyn Translator>) -> Self {
        Self {
            classifier,
            translator,
            page: Page::default(),
            users: UserStore::new(),
            login: LoginState::default(),
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn login_state(&self) -> &LoginState {
        &self.login
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Banner shown at the top of the home page.
    pub fn status(&self) -> Notice {
        match self.login.email() {
            Some(email) => Notice::new(Level::Success, format!("Logged in as {email}")),
            None => Notice::new(
                Level::Info,
                "Please login or sign up to access all features.",
            ),
        }
    }

    /// Apply one user action and report what the user should see.
    pub fn handle(&mut self, event: Event) -> Vec<Notice> {
        match event {
            Event::Navigate(page) => {
                self.page = self.page.next(Transition::Open(page));
                Vec::new()
            }
            Event::Back => {
                self.page = self.page.next(Transition::Back);
                Vec::new()
            }
            Event::Logout => self.logout(),
            Event::Predict(text) => self.on(Page::Home, |session| session.predict(text)),
            Event::Translate { text, language } => {
                self.on(Page::Home, |session| session.translate(&text, language))
            }
            Event::Login { email, password } => {
                self.on(Page::Login, |session| session.login(email, &password))
            }
            Event::Signup {
                email,
                password,
                confirm,
            } => self.on(Page::Signup, |session| {
                session.signup(&email, &password, &confirm)
            }),
        }
    }

    fn on(&mut self, page: Page, action: impl FnOnce(&mut Self) -> Vec<Notice>) -> Vec<Notice> {
        if self.page == page {
            action(self)
        } else {
            vec![Notice::new(
                Level::Warning,
                format!("Open the {page} page first."),
            )]
        }
    }

    fn predict(&self, text: String) -> Vec<Notice> {
        match Message::new(text) {
            Ok(message) => {
                let label = self.classifier.classify(&message);
                vec![Notice::new(Level::Info, label.describe())]
            }
            Err(err) => vec![Notice::new(Level::Warning, err.to_string())],
        }
    }

    fn translate(&self, text: &str, language: Language) -> Vec<Notice> {
        if text.chars().all(is_whitespace) {
            return vec![Notice::new(Level::Warning, "Please enter a message first!")];
        }
        match self.translator.translate(text, language) {
            Ok(translated) => vec![Notice::new(
                Level::Info,
                format!("{language} Translation: {translated}"),
            )],
            Err(err) => {
                warn!(%language, error = %err, "Translation failed");
                vec![Notice::new(Level::Error, err.to_string())]
            }
        }
    }

    fn login(&mut self, email: String, password: &str) -> Vec<Notice> {
        match self.users.login(&email, password) {
            Ok(()) => {
                info!("Demo login succeeded");
                let notice =
                    Notice::new(Level::Success, format!("Login successful! Welcome, {email}"));
                self.login = LoginState::LoggedIn { email };
                self.page = self.page.next(Transition::LoginSucceeded);
                vec![notice]
            }
            Err(err) => vec![Notice::new(Level::Error, err.to_string())],
        }
    }

    fn signup(&mut self, email: &str, password: &str, confirm: &str) -> Vec<Notice> {
        match self.users.signup(email, password, confirm) {
            Ok(()) => vec![
                Notice::new(
                    Level::Success,
                    "Account created successfully! You can now log in.",
                ),
                Notice::new(
                    Level::Info,
                    "Note: In production, passwords must be stored securely (hashed).",
                ),
            ],
            Err(err @ AuthError::EmailTaken) => vec![Notice::new(Level::Warning, err.to_string())],
            Err(err) => vec![Notice::new(Level::Error, err.to_string())],
        }
    }

    fn logout(&mut self) -> Vec<Notice> {
        if !self.login.is_logged_in() {
            return vec![Notice::new(Level::Warning, "You are not logged in.")];
        }
        self.login = LoginState::LoggedOut;
        vec![Notice::new(Level::Success, "You have been logged out.")]
    }
}
