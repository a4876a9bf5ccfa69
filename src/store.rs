//! Persona store.
//!
//! Loads persona definitions from a directory of JSON files, one persona
//! per file. Files that fail to parse or validate are skipped with a
//! warning; an empty result is an error.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::StoreError;
use crate::model::Persona;

/// In-memory catalog of personas, keyed by id.
#[derive(Debug, Default)]
pub struct PersonaStore {
    personas: BTreeMap<String, Arc<Persona>>,
}

impl PersonaStore {
    /// Load every `*.json` file in `dir` as a persona.
    ///
    /// Invalid files are logged and skipped. Two files declaring the same
    /// id is an error rather than a silent overwrite. Returns
    /// [`StoreError::Empty`] when nothing valid was found.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|source| StoreError::ReadDir {
            dir: dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut personas: BTreeMap<String, Arc<Persona>> = BTreeMap::new();
        let mut sources: BTreeMap<String, String> = BTreeMap::new();

        for path in paths {
            let persona = match load_file(&path) {
                Ok(persona) => persona,
                Err(reason) => {
                    tracing::warn!(
                        path = %path.display(),
                        %reason,
                        "Skipping invalid persona file"
                    );
                    continue;
                }
            };

            let shown = path.display().to_string();
            if let Some(first) = sources.get(&persona.id) {
                return Err(StoreError::DuplicateId {
                    id: persona.id.clone(),
                    first: first.clone(),
                    second: shown,
                });
            }
            tracing::debug!(id = %persona.id, name = %persona.name, "Loaded persona");
            sources.insert(persona.id.clone(), shown);
            personas.insert(persona.id.clone(), Arc::new(persona));
        }

        if personas.is_empty() {
            return Err(StoreError::Empty {
                dir: dir.display().to_string(),
            });
        }

        tracing::info!(count = personas.len(), dir = %dir.display(), "Persona store loaded");
        Ok(Self { personas })
    }

    /// Look up one persona by id.
    pub fn get(&self, id: &str) -> Result<Arc<Persona>, StoreError> {
        self.personas
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                id: id.to_string(),
                available: self.ids(),
            })
    }

    /// Look up several personas; fails on the first unknown id.
    pub fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Arc<Persona>>, StoreError> {
        ids.iter().map(|id| self.get(id.as_ref())).collect()
    }

    /// All personas in id order.
    pub fn get_all(&self) -> Vec<Arc<Persona>> {
        self.personas.values().cloned().collect()
    }

    /// All known ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.personas.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}

fn load_file(path: &Path) -> Result<Persona, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let persona: Persona = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
    persona.validate().map_err(|e| e.to_string())?;
    Ok(persona)
}
