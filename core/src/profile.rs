use std::fmt;

use serde::{Deserialize, Serialize};

/// Context line sent with chat turns when no profile is loaded.
pub const NO_PROFILE_CONTEXT: &str = "User data unavailable.";

/// What the user is training their diet for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Gain,
    Loss,
    Maintain,
}

impl Goal {
    pub fn as_str(self) -> &'static str {
        match self {
            Goal::Gain => "gain",
            Goal::Loss => "loss",
            Goal::Maintain => "maintain",
        }
    }

    /// Human-readable label for the profile view
    pub fn label(self) -> &'static str {
        match self {
            Goal::Gain => "Muscle gain 💪",
            Goal::Loss => "Weight loss 🔥",
            Goal::Maintain => "Maintenance 👌",
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// A user's stored nutrition profile, as served by `GET /api/profile`.
///
/// Loaded once per session and replaced wholesale on reload; never edited
/// in place by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Host-side user id (the key the profile is stored under)
    pub telegram_id: i64,
    pub name: String,
    pub goal: Goal,
    /// Free-form label, e.g. "3 meals + 2 snacks"
    pub meal_frequency: String,
    /// Daily targets: kcal, then grams of protein, fat and carbs
    pub target_calories: f64,
    pub target_protein: f64,
    pub target_fat: f64,
    pub target_carbs: f64,
    /// Body weight in kg
    pub weight: f64,
    pub age: u32,
    pub gender: Gender,
    /// 1 = subscribed, anything else = free plan
    pub is_subscribed: i64,
}

impl UserProfile {
    pub fn is_subscribed(&self) -> bool {
        self.is_subscribed == 1
    }

    pub fn subscription_label(&self) -> &'static str {
        if self.is_subscribed() {
            "PRO active"
        } else {
            "Free plan"
        }
    }

    /// One-line summary of goal, weight and daily targets. This is the
    /// context the assistant personalizes its replies with.
    pub fn context_line(&self) -> String {
        format!(
            "Goal: {}, Weight: {} kg, Targets: kcal={}, protein={}, fat={}, carbs={}.",
            self.goal,
            self.weight,
            self.target_calories,
            self.target_protein,
            self.target_fat,
            self.target_carbs
        )
    }
}

/// Context line for an optional profile.
pub fn context_for(profile: Option<&UserProfile>) -> String {
    profile
        .map(UserProfile::context_line)
        .unwrap_or_else(|| NO_PROFILE_CONTEXT.to_string())
}

#[cfg(test)]
mod tests {
    use super::{Gender, Goal, NO_PROFILE_CONTEXT, UserProfile, context_for};

    const LOSS_PROFILE: &str = r#"{
        "telegram_id": 1056878733,
        "name": "Anna",
        "goal": "loss",
        "meal_frequency": "3 meals",
        "target_calories": 1800,
        "target_protein": 120,
        "target_fat": 60,
        "target_carbs": 180,
        "weight": 72.5,
        "age": 31,
        "gender": "female",
        "is_subscribed": 0
    }"#;

    #[test]
    fn profile_parses_backend_json_with_integer_targets() {
        let profile: UserProfile = serde_json::from_str(LOSS_PROFILE).expect("profile json");
        assert_eq!(profile.telegram_id, 1_056_878_733);
        assert_eq!(profile.goal, Goal::Loss);
        assert_eq!(profile.gender, Gender::Female);
        assert_eq!(profile.target_calories, 1800.0);
        assert!(!profile.is_subscribed());
        assert_eq!(profile.subscription_label(), "Free plan");
    }

    #[test]
    fn context_line_carries_goal_and_targets() {
        let profile: UserProfile = serde_json::from_str(LOSS_PROFILE).expect("profile json");
        let context = profile.context_line();
        assert!(context.contains("loss"));
        assert!(context.contains("1800"));
        assert_eq!(
            context,
            "Goal: loss, Weight: 72.5 kg, Targets: kcal=1800, protein=120, fat=60, carbs=180."
        );
    }

    #[test]
    fn unknown_goal_is_rejected() {
        let raw = LOSS_PROFILE.replace("\"loss\"", "\"bulk\"");
        assert!(serde_json::from_str::<UserProfile>(&raw).is_err());
    }

    #[test]
    fn missing_profile_uses_placeholder_context() {
        assert_eq!(context_for(None), NO_PROFILE_CONTEXT);
    }
}
