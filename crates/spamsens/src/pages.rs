//! Page flow of the interactive front-end as an explicit state machine.

use core::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Page {
    #[default]
    Home,
    About,
    Login,
    Signup,
}

/// User actions that can move between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Menu entry, available from every page.
    Open(Page),
    /// "Back" button on the secondary pages.
    Back,
    LoginSucceeded,
}

pub const ABOUT_TEXT: &str = "SpamSens AI is a demo application. Features include:
- Message spam classification (detect spam vs. ham)
- Simple text translation
- Login & Sign Up system (demo only, not secure for production)

This project is created for learning and demonstration purposes.";

impl Page {
    pub const ALL: [Self; 4] = [Self::Home, Self::About, Self::Login, Self::Signup];

    /// Page shown after `transition` is applied on this page.
    #[must_use]
    pub fn next(self, transition: Transition) -> Self {
        match (self, transition) {
            (_, Transition::Open(page)) => page,
            (Self::About | Self::Login | Self::Signup, Transition::Back) => Self::Home,
            (Self::Login, Transition::LoginSucceeded) => Self::Home,
            (page, Transition::Back | Transition::LoginSucceeded) => page,
        }
    }

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "SpamSens AI",
            Self::About => "About SpamSens AI",
            Self::Login => "Login",
            Self::Signup => "Sign Up",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Home => "home",
            Self::About => "about",
            Self::Login => "login",
            Self::Signup => "signup",
        })
    }
}
