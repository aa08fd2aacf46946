//! Homepage content edited from the admin CMS.
//!
//! One singleton document made of typed records. Every list item carries an id so the
//! editor can address it for edits and deletes; items arriving without one get a fresh UUID.

use serde::{Deserialize, Serialize};

/// Hero banner copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HeroContent {
    pub title: String,
    pub description: String,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            title: "Healing Hands, Caring Hearts, Brighter Futures.".to_string(),
            description: "Experience world-class healthcare with a personal touch.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSummary {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CareerBenefit {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, alias = "desc")]
    pub description: String,
}

/// Headline figure shown under the hero ("24/7 Emergency", ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatHighlight {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub icon: String,
    pub label: String,
    #[serde(alias = "val")]
    pub value: String,
}

/// The homepage document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct HomepageContent {
    #[serde(default)]
    pub hero: HeroContent,
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
    #[serde(default)]
    pub services: Vec<ServiceSummary>,
    #[serde(default)]
    pub careers: Vec<CareerBenefit>,
    #[serde(default)]
    pub stats: Vec<StatHighlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl HomepageContent {
    /// Check the required fields of every record.
    pub fn validate(&self) -> Result<(), String> {
        if self.hero.title.trim().is_empty() {
            return Err("Hero title is required".to_string());
        }
        for doctor in &self.doctors {
            if doctor.name.trim().is_empty() || doctor.specialty.trim().is_empty() {
                return Err("Every doctor needs a name and a specialty".to_string());
            }
        }
        if self.services.iter().any(|s| s.title.trim().is_empty()) {
            return Err("Every service needs a title".to_string());
        }
        if self.careers.iter().any(|c| c.title.trim().is_empty()) {
            return Err("Every career benefit needs a title".to_string());
        }
        if self
            .stats
            .iter()
            .any(|s| s.label.trim().is_empty() || s.value.trim().is_empty())
        {
            return Err("Every stat needs a label and a value".to_string());
        }
        Ok(())
    }

    /// Give every item without an id a fresh one.
    pub fn assign_missing_ids(&mut self) {
        fn fill(id: &mut String) {
            if id.trim().is_empty() {
                *id = uuid::Uuid::new_v4().to_string();
            }
        }
        self.doctors.iter_mut().for_each(|d| fill(&mut d.id));
        self.services.iter_mut().for_each(|s| fill(&mut s.id));
        self.careers.iter_mut().for_each(|c| fill(&mut c.id));
        self.stats.iter_mut().for_each(|s| fill(&mut s.id));
    }
}
