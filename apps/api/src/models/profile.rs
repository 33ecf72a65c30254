//! Profile document: the user-supplied content a portfolio site is rendered from.
//!
//! Every section is optional on the wire. Missing or `null` strings become `""`,
//! missing or `null` lists become `[]`, and numeric scalars (e.g. a skill
//! percentage sent as `90`) are read as their string form. Templates therefore
//! never see an absent key.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileDocument {
    pub personal_info: PersonalInfo,
    pub summary: Summary,
    #[serde(deserialize_with = "list")]
    pub skills: Vec<Skill>,
    #[serde(deserialize_with = "list")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "list")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(deserialize_with = "list")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "list")]
    pub technologies: Vec<Technology>,
    #[serde(deserialize_with = "list")]
    pub testimonials: Vec<Testimonial>,
    pub contact_info: ContactInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    /// The only strictly required field. Checked by the orchestrator before a job starts.
    #[serde(deserialize_with = "text")]
    pub full_name: String,
    #[serde(deserialize_with = "text")]
    pub nickname: String,
    #[serde(deserialize_with = "text")]
    pub location: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub github: String,
    #[serde(deserialize_with = "text")]
    pub linkedin: String,
    #[serde(deserialize_with = "text")]
    pub twitter: String,
    #[serde(deserialize_with = "text")]
    pub website: String,
    /// Either an `uploads/...` path or an external URL.
    #[serde(deserialize_with = "text")]
    pub profile_image: String,
    #[serde(deserialize_with = "text")]
    pub resume_link: String,
}

/// Free-text summary. Accepts either a plain string (taken as the introduction)
/// or the structured object the form produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SummaryRepr")]
pub struct Summary {
    pub introduction: String,
    pub tagline: String,
    pub highlights: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SummaryRepr {
    Text(String),
    Structured {
        #[serde(default, deserialize_with = "text")]
        introduction: String,
        #[serde(default, deserialize_with = "text")]
        tagline: String,
        #[serde(default, deserialize_with = "list")]
        highlights: Vec<String>,
    },
    Missing(()),
}

impl From<SummaryRepr> for Summary {
    fn from(repr: SummaryRepr) -> Self {
        match repr {
            SummaryRepr::Text(introduction) => Summary {
                introduction,
                ..Default::default()
            },
            SummaryRepr::Structured {
                introduction,
                tagline,
                highlights,
            } => Summary {
                introduction,
                tagline,
                highlights,
            },
            SummaryRepr::Missing(()) => Summary::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Skill {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub percentage: String,
    #[serde(deserialize_with = "text")]
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    #[serde(deserialize_with = "text")]
    pub degree: String,
    #[serde(deserialize_with = "text")]
    pub institution: String,
    #[serde(deserialize_with = "text")]
    pub year_start: String,
    #[serde(deserialize_with = "text")]
    pub year_end: String,
    #[serde(deserialize_with = "text")]
    pub score: String,
    #[serde(deserialize_with = "text")]
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkExperience {
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "text")]
    pub organization: String,
    #[serde(deserialize_with = "text")]
    pub duration: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "list")]
    pub bullet_points: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    #[serde(deserialize_with = "text")]
    pub title: String,
    #[serde(deserialize_with = "text")]
    pub image: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "text")]
    pub repo: String,
    #[serde(deserialize_with = "text")]
    pub demo: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Technology {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub position: String,
    #[serde(deserialize_with = "text")]
    pub company: String,
    #[serde(deserialize_with = "text")]
    pub quote: String,
    #[serde(deserialize_with = "text")]
    pub rating: String,
    #[serde(deserialize_with = "text")]
    pub avatar: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub phone: String,
    #[serde(deserialize_with = "text")]
    pub address: String,
}

impl ProfileDocument {
    /// Builds a document carrying only a full name.
    pub fn with_name(full_name: &str) -> Self {
        Self {
            personal_info: PersonalInfo {
                full_name: full_name.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Returns the trimmed full name, or `None` when it is blank.
    pub fn full_name(&self) -> Option<&str> {
        let name = self.personal_info.full_name.trim();
        (!name.is_empty()).then_some(name)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient field readers
// ────────────────────────────────────────────────────────────────────────────

/// Reads a string, number or bool as text; `null` becomes `""`.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Reads a list; `null` becomes an empty list.
fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
