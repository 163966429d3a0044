use std::fmt::Write;

use macrocoach_core::chat::{Message, Sender};
use macrocoach_core::profile::UserProfile;

use crate::chat::ChatSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Profile,
    #[default]
    Chat,
}

/// Which screen is showing. Toggled freely by the user.
#[derive(Debug, Default)]
pub struct ViewRouter {
    mode: ViewMode,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn toggle(&mut self) {
        self.mode = match self.mode {
            ViewMode::Profile => ViewMode::Chat,
            ViewMode::Chat => ViewMode::Profile,
        };
    }

    pub fn render(&self, profile: &UserProfile, chat: &ChatSession) -> String {
        match self.mode {
            ViewMode::Profile => render_profile(profile),
            ViewMode::Chat => render_chat(chat),
        }
    }
}

pub fn render_message(message: &Message) -> String {
    let speaker = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "coach",
    };
    format!("{speaker}> {}", message.text)
}

pub fn render_chat(chat: &ChatSession) -> String {
    let mut out = String::from("💬 Chat with your coach (/profile to switch, /quit to leave)\n");
    for message in chat.messages() {
        let _ = writeln!(out, "{}", render_message(message));
    }
    if chat.is_in_flight() {
        out.push_str("coach is typing...\n");
    }
    out
}

pub fn render_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "👤 {}", profile.name);
    let _ = writeln!(out, "  Goal:            {}", profile.goal.label());
    let _ = writeln!(out, "  Meal frequency:  {}", profile.meal_frequency);
    let _ = writeln!(out, "  Subscription:    {}", profile.subscription_label());
    let _ = writeln!(out, "Daily targets");
    let _ = writeln!(out, "  🔥 Calories: {} kcal", profile.target_calories);
    let _ = writeln!(out, "  🥩 Protein:  {} g", profile.target_protein);
    let _ = writeln!(out, "  🥑 Fat:      {} g", profile.target_fat);
    let _ = writeln!(out, "  🍚 Carbs:    {} g", profile.target_carbs);
    out.push_str("(/chat to talk to your coach)\n");
    out
}
