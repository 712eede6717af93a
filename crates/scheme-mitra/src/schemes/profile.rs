use serde::{Deserialize, Serialize};

/// Upper bound accepted from the age input; enforced at the HTTP boundary.
pub const MAX_PROFILE_AGE: u8 = 100;

/// Ephemeral user profile assembled per request; only its composed free-text
/// form flows into scoring and explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u8,
    pub category: String,
    #[serde(default)]
    pub skills: Option<String>,
}

impl UserProfile {
    /// Render the profile the way the matching pipeline consumes it, e.g.
    /// `"30 years old, Farmers category, skills: dairy farming"`.
    pub fn composed(&self) -> String {
        let mut text = format!("{} years old, {} category", self.age, self.category);
        if let Some(skills) = self
            .skills
            .as_deref()
            .map(str::trim)
            .filter(|skills| !skills.is_empty())
        {
            text.push_str(", skills: ");
            text.push_str(skills);
        }
        text
    }
}
