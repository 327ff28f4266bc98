//! Inventory of codespaces keyed by readable name.
//!
//! An [`Inventory`] is a snapshot of one `gh codespace list` call. It is
//! rebuilt on every fetch and never cached. Two codespaces with the same
//! readable name collide: the one listed later replaces the earlier one.

use std::collections::BTreeMap;

use crate::codespace::{self, Codespace};
use crate::provider::{CodespaceCommand, Provider};
use crate::{Error, Result};

/// Mapping from readable name to codespace for one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    entries: BTreeMap<String, Codespace>,
}

impl Inventory {
    /// Fold records into an inventory in the given order, last write wins.
    pub fn from_records(records: impl IntoIterator<Item = Codespace>) -> Self {
        records.into_iter().collect()
    }

    pub fn get(&self, label: &str) -> Option<&Codespace> {
        self.entries.get(label)
    }

    /// Labels in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Codespace)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Picker annotation for `label`, empty when the label is unknown.
    pub fn annotate(&self, label: &str) -> String {
        self.get(label).map(Codespace::annotation).unwrap_or_default()
    }

    fn filter(&self, keep: impl Fn(&Codespace) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, cs)| keep(*cs))
                .map(|(k, cs)| (k.clone(), cs.clone()))
                .collect(),
        }
    }
}

impl FromIterator<Codespace> for Inventory {
    fn from_iter<I: IntoIterator<Item = Codespace>>(iter: I) -> Self {
        let entries = iter.into_iter().fold(BTreeMap::new(), |mut acc, cs| {
            if let Some(previous) = acc.insert(cs.readable_name().to_string(), cs) {
                tracing::warn!(
                    label = previous.readable_name(),
                    dropped = %previous.name,
                    "two codespaces share a label; keeping the later one"
                );
            }
            acc
        });
        Self { entries }
    }
}

/// Codespaces whose state is exactly "Available".
pub fn available(inventory: &Inventory) -> Inventory {
    inventory.filter(Codespace::is_available)
}

/// Every codespace that is not "Available".
pub fn unavailable(inventory: &Inventory) -> Inventory {
    inventory.filter(|cs| !cs.is_available())
}

/// List codespaces through the provider and build a fresh inventory.
///
/// Fails with [`Error::Fetch`] on a non-zero exit, empty output, or output
/// that is not a JSON array of codespace objects.
pub fn fetch_all(provider: &dyn Provider) -> Result<Inventory> {
    let captured = provider.run(&CodespaceCommand::list())?;

    if !captured.success() {
        return Err(Error::Fetch(captured.failure_text()));
    }

    let stdout = captured.stdout.trim();
    if stdout.is_empty() {
        return Err(Error::Fetch(format!(
            "{} codespace list returned no output",
            provider.program()
        )));
    }

    let records = codespace::parse_list(stdout).map_err(|e| {
        Error::Fetch(format!(
            "could not parse {} output as a codespace list: {}",
            provider.program(),
            e
        ))
    })?;

    tracing::debug!(count = records.len(), "fetched codespaces");
    Ok(Inventory::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeProvider, SAMPLE_LIST, event_log};
    use std::collections::BTreeSet;

    fn record(name: &str, display_name: &str, state: &str) -> Codespace {
        Codespace {
            name: name.to_string(),
            display_name: display_name.to_string(),
            state: state.to_string(),
            repository: "octo/repo".to_string(),
            git_ref: "main".to_string(),
            last_used_at: None,
        }
    }

    fn fetch(json: &str) -> Result<Inventory> {
        fetch_all(&FakeProvider::new(json, event_log()))
    }

    #[test]
    fn test_single_available_scenario() {
        let inventory = fetch(
            r#"[{"name":"cs1","displayName":"","repository":"o/r","state":"Available","gitStatus":{"ref":"main"}}]"#,
        )
        .unwrap();

        assert_eq!(inventory.labels().collect::<Vec<_>>(), vec!["cs1"]);
        let avail = available(&inventory);
        assert_eq!(avail.len(), 1);
        assert_eq!(avail.get("cs1"), inventory.get("cs1"));
        assert!(unavailable(&inventory).is_empty());
    }

    #[test]
    fn test_partition_is_exhaustive_and_exclusive() {
        let inventory = Inventory::from_records(vec![
            record("a", "", "Available"),
            record("b", "Bee", "Shutdown"),
            record("c", "", "Starting"),
            record("d", "Dee", "Available"),
            record("e", "", "Rebuilding"),
        ]);

        let avail: BTreeSet<_> = available(&inventory).labels().map(String::from).collect();
        let unavail: BTreeSet<_> = unavailable(&inventory).labels().map(String::from).collect();
        let all: BTreeSet<_> = inventory.labels().map(String::from).collect();

        assert!(avail.is_disjoint(&unavail));
        assert_eq!(avail.union(&unavail).cloned().collect::<BTreeSet<_>>(), all);
        assert_eq!(avail, BTreeSet::from(["Dee".to_string(), "a".to_string()]));
    }

    #[test]
    fn test_duplicate_label_last_write_wins() {
        let inventory = Inventory::from_records(vec![
            record("first", "Shared", "Available"),
            record("second", "Shared", "Shutdown"),
        ]);

        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.get("Shared").unwrap().name, "second");
    }

    #[test]
    fn test_name_and_display_name_can_collide() {
        let inventory = Inventory::from_records(vec![
            record("alpha", "", "Available"),
            record("other", "alpha", "Shutdown"),
        ]);
        assert_eq!(inventory.get("alpha").unwrap().name, "other");
    }

    #[test]
    fn test_annotate_known_and_unknown_labels() {
        let inventory = fetch(SAMPLE_LIST).unwrap();
        assert_eq!(inventory.annotate("cs1"), " | Available | octo/alpha | main");
        assert_eq!(inventory.annotate("Beta Box"), " | Shutdown | octo/beta | feature/x");
        assert_eq!(inventory.annotate("missing"), "");
    }

    #[test]
    fn test_empty_array_is_empty_inventory() {
        let inventory = fetch("[]").unwrap();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_truncated_json_is_fetch_error() {
        let err = fetch(r#"[{"name":"cs1","state":"Avail"#).unwrap_err();
        assert!(matches!(err, Error::Fetch(_)), "got {:?}", err);
    }

    #[test]
    fn test_empty_output_is_fetch_error() {
        assert!(matches!(fetch("  \n").unwrap_err(), Error::Fetch(_)));
    }

    #[test]
    fn test_non_zero_exit_is_fetch_error_with_cli_text() {
        let mut provider = FakeProvider::new(SAMPLE_LIST, event_log());
        provider.list_status = 1;

        let err = fetch_all(&provider).unwrap_err();
        match err {
            Error::Fetch(text) => assert!(text.contains("Bad credentials")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_every_fetch_invokes_provider() {
        let events = event_log();
        let provider = FakeProvider::new(SAMPLE_LIST, events.clone());

        fetch_all(&provider).unwrap();
        fetch_all(&provider).unwrap();

        assert_eq!(events.borrow().len(), 2);
        assert!(events.borrow()[0].starts_with("run codespace list --json"));
    }
}
