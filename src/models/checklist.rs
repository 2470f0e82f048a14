use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub custom: bool,
}

impl ChecklistItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            checked: false,
            custom: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistCategory {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Checklist(pub Vec<ChecklistCategory>);

impl Checklist {
    /// The packing list every new trip starts with.
    pub fn standard() -> Self {
        let category = |name: &str, labels: &[&str]| ChecklistCategory {
            name: name.to_string(),
            items: labels.iter().map(|label| ChecklistItem::new(*label)).collect(),
        };
        Self(vec![
            category(
                "Documents",
                &["Passport", "Boarding passes", "Hotel confirmations", "Travel insurance"],
            ),
            category("Clothing", &["Underwear", "Socks", "Sleepwear", "Jacket"]),
            category("Toiletries", &["Toothbrush", "Toothpaste", "Medication", "Sunscreen"]),
            category("Electronics", &["Phone charger", "Power adapter", "Headphones"]),
        ])
    }

    pub fn categories(&self) -> &[ChecklistCategory] {
        &self.0
    }

    pub fn item(&self, category: &str, label: &str) -> Option<&ChecklistItem> {
        self.0
            .iter()
            .find(|c| c.name == category)?
            .items
            .iter()
            .find(|item| item.label == label)
    }

    /// Flips one item and returns its new state.
    pub fn toggle(&mut self, category: &str, label: &str) -> Result<bool, AppError> {
        let item = self
            .0
            .iter_mut()
            .find(|c| c.name == category)
            .and_then(|c| c.items.iter_mut().find(|item| item.label == label))
            .ok_or_else(|| {
                AppError::validation(format!("no checklist item {label:?} in {category:?}"))
            })?;
        item.checked = !item.checked;
        Ok(item.checked)
    }

    /// Adds a user-defined item, creating the category when needed.
    /// Adding a label that already exists in the category is a no-op.
    pub fn add_custom(&mut self, category: &str, label: &str) -> Result<(), AppError> {
        let (category, label) = (category.trim(), label.trim());
        if category.is_empty() || label.is_empty() {
            return Err(AppError::validation(
                "checklist items need a category and a label",
            ));
        }
        let index = match self.0.iter().position(|c| c.name == category) {
            Some(index) => index,
            None => {
                self.0.push(ChecklistCategory {
                    name: category.to_string(),
                    items: Vec::new(),
                });
                self.0.len() - 1
            }
        };
        let items = &mut self.0[index].items;
        if !items.iter().any(|item| item.label == label) {
            items.push(ChecklistItem {
                label: label.to_string(),
                checked: false,
                custom: true,
            });
        }
        Ok(())
    }

    pub fn progress(&self) -> (usize, usize) {
        self.0
            .iter()
            .flat_map(|c| c.items.iter())
            .fold((0, 0), |(done, total), item| {
                (done + usize::from(item.checked), total + 1)
            })
    }
}

/// One viewer's private copy of a trip checklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserChecklist {
    pub user_id: String,
    pub checklist: Checklist,
    pub updated_at: DateTime<Utc>,
}
