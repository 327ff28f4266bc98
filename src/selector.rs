//! Choosing one codespace from an inventory.
//!
//! The picker itself sits behind [`Selector`]. [`choose`] hands it the
//! inventory labels plus an annotation callback and maps the answer back to
//! a record. Only exact matches against the offered labels are accepted.

use std::io::IsTerminal;

use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;

use crate::codespace::Codespace;
use crate::inventory::Inventory;
use crate::{Error, Result};

/// Per-candidate annotation, called while candidates are rendered.
pub type Annotate<'a> = dyn Fn(&str) -> String + 'a;

/// An interactive (or scripted) picker.
pub trait Selector {
    /// Pick one of `candidates`.
    ///
    /// Returns `Ok(None)` when the user cancels.
    fn select(
        &self,
        prompt: &str,
        candidates: &[String],
        annotate: &Annotate<'_>,
    ) -> Result<Option<String>>;
}

/// Present `inventory` and return the record behind the chosen label.
///
/// Fails with [`Error::SelectionAborted`] when the inventory is empty, the
/// user cancels, or the selector answers with a label it was not offered.
pub fn choose(selector: &dyn Selector, prompt: &str, inventory: &Inventory) -> Result<Codespace> {
    if inventory.is_empty() {
        tracing::info!("no codespaces to choose from");
        return Err(Error::SelectionAborted);
    }

    let candidates: Vec<String> = inventory.labels().map(String::from).collect();
    let annotate = |label: &str| inventory.annotate(label);

    let label = selector
        .select(prompt, &candidates, &annotate)?
        .ok_or(Error::SelectionAborted)?;

    inventory.get(&label).cloned().ok_or_else(|| {
        tracing::info!(%label, "selection did not match any candidate");
        Error::SelectionAborted
    })
}

/// Fuzzy picker on the terminal.
#[derive(Debug, Default)]
pub struct FuzzySelector;

impl Selector for FuzzySelector {
    fn select(
        &self,
        prompt: &str,
        candidates: &[String],
        annotate: &Annotate<'_>,
    ) -> Result<Option<String>> {
        if !std::io::stderr().is_terminal() {
            return Err(Error::Environment(
                "Interactive selection needs a terminal. Pass --name <LABEL> instead.".to_string(),
            ));
        }

        let items: Vec<String> = candidates
            .iter()
            .map(|label| format!("{}{}", label, annotate(label)))
            .collect();

        let picked = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact_opt()?;

        Ok(picked.map(|index| candidates[index].clone()))
    }
}

/// Non-interactive picker: the label was given on the command line.
#[derive(Debug, Clone)]
pub struct ExactSelector {
    label: String,
}

impl ExactSelector {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Selector for ExactSelector {
    fn select(
        &self,
        _prompt: &str,
        candidates: &[String],
        annotate: &Annotate<'_>,
    ) -> Result<Option<String>> {
        let found = candidates.iter().find(|c| **c == self.label).cloned();
        if let Some(label) = &found {
            tracing::debug!(%label, annotation = %annotate(label), "selected by name");
        }
        Ok(found)
    }
}
