//! Admin collection manager.
//!
//! Every section follows the same cycle: list the collection, open an empty
//! or prefilled form, save or delete, then reload the list. Store failures
//! become a notice on the section and never touch navigation state.

mod section;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use club_core::DocumentId;

use crate::pages::Load;
use crate::store::{ContentStore, Document, Fields, StoreError};

pub use section::{Column, FieldKind, FieldSpec, Section, display, lookup};

/// A user action inside the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AdminAction {
    /// Switch to another section.
    Open { section: Section },
    /// Open an empty form.
    New { section: Section },
    /// Open a form prefilled from a listed document.
    Edit { section: Section, id: DocumentId },
    /// Close the form without saving.
    Cancel { section: Section },
    /// Submit the open form.
    Save {
        section: Section,
        #[serde(default)]
        values: BTreeMap<String, String>,
    },
    /// Delete a listed document.
    Delete { section: Section, id: DocumentId },
}

impl AdminAction {
    const fn section(&self) -> Section {
        match self {
            Self::Open { section }
            | Self::New { section }
            | Self::Edit { section, .. }
            | Self::Cancel { section }
            | Self::Save { section, .. }
            | Self::Delete { section, .. } => *section,
        }
    }
}

/// Store work requested by the admin page.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminTask {
    List {
        epoch: u64,
        section: Section,
    },
    Save {
        section: Section,
        id: Option<DocumentId>,
        fields: Fields,
    },
    Delete {
        section: Section,
        id: DocumentId,
    },
}

/// Outcome of an [`AdminTask`].
#[derive(Debug)]
pub enum AdminCompletion {
    Listed {
        epoch: u64,
        section: Section,
        result: Result<Vec<Document>, StoreError>,
    },
    Saved {
        section: Section,
        result: Result<(), StoreError>,
    },
    Deleted {
        section: Section,
        result: Result<(), StoreError>,
    },
}

/// The open create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Editor {
    /// `None` when creating.
    pub id: Option<DocumentId>,
    pub values: BTreeMap<String, String>,
    pub error: Option<String>,
    pub saving: bool,
}

/// State of the admin page.
#[derive(Debug)]
pub struct AdminState {
    pub section: Section,
    pub items: Load<Vec<Document>>,
    pub editor: Option<Editor>,
    pub notice: Option<String>,
    epoch: u64,
}

impl Default for AdminState {
    fn default() -> Self {
        Self {
            section: Section::default(),
            items: Load::Pending,
            editor: None,
            notice: None,
            epoch: 0,
        }
    }
}

impl AdminState {
    /// Called when the admin page is entered; reloads the current section.
    pub fn enter(&mut self) -> AdminTask {
        self.editor = None;
        self.notice = None;
        self.reload()
    }

    fn reload(&mut self) -> AdminTask {
        self.epoch += 1;
        self.items = Load::Pending;
        AdminTask::List {
            epoch: self.epoch,
            section: self.section,
        }
    }

    /// Apply a user action. Actions aimed at another section than the one
    /// shown (other than switching to it) are ignored.
    pub fn apply(&mut self, action: AdminAction) -> Option<AdminTask> {
        if !matches!(action, AdminAction::Open { .. }) && action.section() != self.section {
            tracing::debug!(section = ?action.section(), "Ignoring action for inactive section");
            return None;
        }

        match action {
            AdminAction::Open { section } => {
                self.section = section;
                Some(self.enter())
            }
            AdminAction::New { section } => {
                if !section.is_read_only() {
                    self.editor = Some(Editor {
                        values: section.blank_form(),
                        ..Editor::default()
                    });
                }
                None
            }
            AdminAction::Edit { section, id } => {
                if section.is_read_only() {
                    return None;
                }
                let document = match &self.items {
                    Load::Ready(documents) => documents.iter().find(|d| d.id == id),
                    _ => None,
                };
                if let Some(document) = document {
                    self.editor = Some(Editor {
                        values: section.to_form(&document.fields),
                        id: Some(id),
                        ..Editor::default()
                    });
                }
                None
            }
            AdminAction::Cancel { .. } => {
                self.editor = None;
                None
            }
            AdminAction::Save { section, values } => {
                let editor = self.editor.as_mut().filter(|editor| !editor.saving)?;
                match section.from_form(&values) {
                    Ok(fields) => {
                        editor.saving = true;
                        editor.error = None;
                        Some(AdminTask::Save {
                            section,
                            id: editor.id.clone(),
                            fields,
                        })
                    }
                    Err(message) => {
                        editor.values = values;
                        editor.error = Some(message);
                        None
                    }
                }
            }
            AdminAction::Delete { section, id } => {
                if section.is_read_only() {
                    return None;
                }
                self.notice = None;
                Some(AdminTask::Delete { section, id })
            }
        }
    }

    /// Apply the outcome of a task. May request a reload.
    pub fn on_completion(&mut self, completion: AdminCompletion) -> Option<AdminTask> {
        match completion {
            AdminCompletion::Listed {
                epoch,
                section,
                result,
            } => {
                if epoch != self.epoch || section != self.section {
                    return None;
                }
                self.items = match result {
                    Ok(mut documents) => {
                        sort_for_display(section, &mut documents);
                        Load::Ready(documents)
                    }
                    Err(err) => {
                        tracing::error!(section = ?section, error = %err, "Failed to load section");
                        Load::Failed(format!(
                            "Could not load {}. Please try again later.",
                            section.label().to_lowercase()
                        ))
                    }
                };
                None
            }
            AdminCompletion::Saved { section, result } => {
                if section != self.section {
                    return None;
                }
                self.editor = None;
                match result {
                    Ok(()) => Some(self.reload()),
                    Err(err) => {
                        tracing::error!(section = ?section, error = %err, "Failed to save");
                        self.notice = Some(format!("Failed to save {}.", section.noun()));
                        None
                    }
                }
            }
            AdminCompletion::Deleted { section, result } => {
                if section != self.section {
                    return None;
                }
                match result {
                    Ok(()) => Some(self.reload()),
                    Err(err) => {
                        tracing::error!(section = ?section, error = %err, "Failed to delete");
                        self.notice = Some(format!("Failed to delete {}.", section.noun()));
                        None
                    }
                }
            }
        }
    }
}

/// Newest committee years and newest messages first; other sections keep
/// store order.
fn sort_for_display(section: Section, documents: &mut [Document]) {
    match section {
        Section::Committee | Section::Gallery => documents.sort_by_key(|d| {
            std::cmp::Reverse(d.fields.get("year").and_then(serde_json::Value::as_i64))
        }),
        Section::Messages => documents.sort_by(|a, b| {
            let stamp = |d: &Document| {
                d.fields
                    .get("timestamp")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string)
            };
            stamp(b).cmp(&stamp(a))
        }),
        _ => {}
    }
}

/// Run a task against the store.
pub async fn perform(task: AdminTask, store: Arc<dyn ContentStore>) -> AdminCompletion {
    match task {
        AdminTask::List { epoch, section } => AdminCompletion::Listed {
            epoch,
            section,
            result: store.list_all(section.collection()).await,
        },
        AdminTask::Save {
            section,
            id: Some(id),
            fields,
        } => AdminCompletion::Saved {
            section,
            result: store.update(section.collection(), &id, fields).await,
        },
        AdminTask::Save {
            section,
            id: None,
            fields,
        } => AdminCompletion::Saved {
            section,
            result: store.create(section.collection(), fields).await.map(|_| ()),
        },
        AdminTask::Delete { section, id } => AdminCompletion::Deleted {
            section,
            result: store.delete(section.collection(), &id).await,
        },
    }
}
