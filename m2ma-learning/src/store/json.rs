use std::path::Path;

use m2ma::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Store, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    alphabet: Vec<String>,
}

/// The layout of example files. The alphabet is usually found in the metadata object, older
/// files have it at the top level.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ExampleFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alphabet: Option<Vec<String>>,
    #[serde(rename = "Positive sample", default)]
    positive: Vec<String>,
    #[serde(rename = "Negative sample", default)]
    negative: Vec<String>,
}

impl Store {
    /// Reads a store from the JSON example format.
    ///
    /// # Example
    /// ```
    /// use m2ma_learning::prelude::*;
    /// let store = Store::from_json(r#"{
    ///     "metadata": { "alphabet": ["a", "b"], "source": "hand written" },
    ///     "Positive sample": ["", "a a"],
    ///     "Negative sample": ["a"]
    /// }"#).unwrap();
    /// assert_eq!(store.len(), 3);
    /// assert_eq!(store.alphabet().size(), 2);
    /// ```
    pub fn from_json(text: &str) -> Result<Store, StoreError> {
        let file: ExampleFile = serde_json::from_str(text)?;
        let names = file
            .metadata
            .map(|metadata| metadata.alphabet)
            .or(file.alphabet)
            .ok_or(StoreError::MissingAlphabet)?;
        let alphabet = Alphabet::new(names)?;
        let store = Store::from_strings(
            alphabet,
            file.positive.iter().map(String::as_str),
            file.negative.iter().map(String::as_str),
        )?;
        debug!(
            "loaded {} positive and {} negative examples",
            store.positive.len(),
            store.negative.len()
        );
        Ok(store)
    }

    /// Reads a store from an example file on disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Store, StoreError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Writes the store in the JSON example format, words are in insertion order.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let file = ExampleFile {
            metadata: Some(Metadata {
                alphabet: self.alphabet.names().map(String::from).collect(),
            }),
            alphabet: None,
            positive: self.positive().map(|w| self.alphabet.render(w)).collect(),
            negative: self.negative().map(|w| self.alphabet.render(w)).collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Writes the store to an example file on disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        debug!(
            "saved {} examples to {}",
            self.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn loading_examples() {
        let store = Store::from_json(
            r#"{ "alphabet": ["x", "y"], "Positive sample": ["x y"], "Negative sample": [] }"#,
        )
        .unwrap();
        let xy = store.alphabet().parse_word("x y").unwrap();
        assert_eq!(store.classify(&xy), Some(true));

        let reloaded = Store::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, store);
    }

    #[test_log::test]
    fn saving_and_loading() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let store = Store::from_strings(alphabet, ["", "b a"], ["a", "a b b"]).unwrap();
        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["metadata"]["alphabet"][1], "b");
        assert_eq!(json["Positive sample"][1], "b a");
        assert_eq!(json["Negative sample"][1], "a b b");

        let path = std::env::temp_dir().join(format!("m2ma-store-{}.json", std::process::id()));
        store.save(&path).unwrap();
        let loaded = Store::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, store);
        assert!(matches!(
            Store::load(path.with_extension("missing")),
            Err(StoreError::Io(_))
        ));
    }

    #[test_log::test]
    fn broken_files() {
        assert!(matches!(
            Store::from_json(r#"{ "Positive sample": ["a"] }"#),
            Err(StoreError::MissingAlphabet)
        ));
        assert!(matches!(
            Store::from_json(r#"{ "alphabet": ["a"], "Positive sample": ["b"] }"#),
            Err(StoreError::Alphabet(_))
        ));
        assert!(matches!(
            Store::from_json(
                r#"{ "alphabet": ["a"], "Positive sample": ["a"], "Negative sample": ["a"] }"#
            ),
            Err(StoreError::Conflict { .. })
        ));
        assert!(matches!(
            Store::from_json("[1, 2"),
            Err(StoreError::Json(_))
        ));
    }
}
