//! Typed view of the bundler dependency manifest.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ManifestError;

/// Reserved key holding build metadata.
pub const INFO_KEY: &str = "info";

/// Key of the container consumed by the multiple and group strategies.
pub const DEPS_KEY: &str = "deps";

/// Build metadata stored under the manifest `info` key.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestInfo {
  /// URL prefix under which the build output is served.
  pub public_path: String,
  /// Any additional metadata emitted by the bundler.
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Stylesheets and scripts produced for one manifest entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DependencyRecord {
  /// Stylesheet URLs in emit order.
  #[serde(default)]
  pub css: Vec<String>,
  /// Script URLs in emit order.
  #[serde(default)]
  pub js: Vec<String>,
}

impl DependencyRecord {
  /// All URLs of the record, stylesheets first.
  pub fn urls(&self) -> impl Iterator<Item = &str> {
    self.css.iter().chain(self.js.iter()).map(String::as_str)
  }
}

/// Ordered mapping of entry names to dependency records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepsContainer {
  records: Vec<(String, DependencyRecord)>,
}

impl DepsContainer {
  /// Build a container from ordered `(name, record)` pairs.
  pub fn new(records: Vec<(String, DependencyRecord)>) -> Self {
    Self { records }
  }

  /// Look up a record by its entry name.
  pub fn get(&self, name: &str) -> Option<&DependencyRecord> {
    self
      .records
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, record)| record)
  }

  /// Records in manifest order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &DependencyRecord)> {
    self
      .records
      .iter()
      .map(|(name, record)| (name.as_str(), record))
  }

  /// Number of records in the container.
  pub fn len(&self) -> usize {
    self.records.len()
  }

  /// Returns `true` when the container holds no records.
  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

/// One top-level manifest value, classified once when the manifest is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestEntry {
  /// A URL, or several URLs, emitted for a top-level entry.
  TopLevelUrl(Vec<String>),
  /// Dependency records stored under the `deps` key.
  Deps(DepsContainer),
}

/// Dependency manifest describing which entries produced which output files.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
  info: ManifestInfo,
  entries: Vec<(String, ManifestEntry)>,
}

impl Manifest {
  /// Classify a parsed JSON document into a manifest.
  pub fn from_value(value: Value) -> Result<Self, ManifestError> {
    let Value::Object(object) = value else {
      return Err(ManifestError::Invalid(
        "expected the manifest to be an object".into(),
      ));
    };

    let mut info = None;
    let mut entries = Vec::new();

    for (key, value) in object {
      if key == INFO_KEY {
        info = Some(parse_info(value)?);
        continue;
      }

      match classify_entry(&key, value)? {
        Some(entry) => entries.push((key, entry)),
        None => tracing::debug!("skipping manifest entry '{}' with unsupported value", key),
      }
    }

    Ok(Self {
      info: info.ok_or(ManifestError::MissingPublicPath)?,
      entries,
    })
  }

  /// Build metadata from the `info` key.
  pub fn info(&self) -> &ManifestInfo {
    &self.info
  }

  /// Public path recorded by the bundler.
  pub fn public_path(&self) -> &str {
    &self.info.public_path
  }

  /// All classified entries in manifest order.
  pub fn entries(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
    self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
  }

  /// Top-level URL entries in manifest order.
  pub fn top_level_urls(&self) -> impl Iterator<Item = (&str, &[String])> {
    self.entries().filter_map(|(name, entry)| match entry {
      ManifestEntry::TopLevelUrl(urls) => Some((name, urls.as_slice())),
      ManifestEntry::Deps(_) => None,
    })
  }

  /// The dependency container stored under the `deps` key, if any.
  pub fn deps(&self) -> Option<&DepsContainer> {
    self.entries().find_map(|(name, entry)| match entry {
      ManifestEntry::Deps(container) if name == DEPS_KEY => Some(container),
      _ => None,
    })
  }
}

impl<'de> Deserialize<'de> for Manifest {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let value = Value::deserialize(deserializer)?;
    Manifest::from_value(value).map_err(serde::de::Error::custom)
  }
}

fn parse_info(value: Value) -> Result<ManifestInfo, ManifestError> {
  let has_public_path = value
    .get("publicPath")
    .is_some_and(|public_path| public_path.is_string());
  if !has_public_path {
    return Err(ManifestError::MissingPublicPath);
  }

  serde_json::from_value(value).map_err(|err| ManifestError::Invalid(err.to_string()))
}

fn classify_entry(key: &str, value: Value) -> Result<Option<ManifestEntry>, ManifestError> {
  match value {
    Value::String(url) => Ok(Some(ManifestEntry::TopLevelUrl(vec![url]))),
    Value::Array(items) => {
      let urls = items
        .into_iter()
        .map(|item| match item {
          Value::String(url) => Ok(url),
          other => Err(ManifestError::Invalid(format!(
            "entry '{key}' lists a non-string URL: {other}"
          ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Some(ManifestEntry::TopLevelUrl(urls)))
    }
    Value::Object(records) if key == DEPS_KEY => {
      let records = records
        .into_iter()
        .map(|(name, record)| {
          serde_json::from_value::<DependencyRecord>(record)
            .map(|record| (name.clone(), record))
            .map_err(|err| {
              ManifestError::Invalid(format!("dependency record '{key}.{name}': {err}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
      Ok(Some(ManifestEntry::Deps(DepsContainer::new(records))))
    }
    _ => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn classifies_top_level_urls_and_deps() {
    let manifest = Manifest::from_value(json!({
      "main.js": "/main.123.js",
      "info": { "publicPath": "/", "hash": "abc" },
      "styles": ["/a.css", "/b.css"],
      "deps": {
        "main.js": { "css": ["/main.css"], "js": ["/main.123.js"] },
        "other.js": { "js": ["/other.js"] }
      },
      "count": 3
    }))
    .unwrap();

    assert_eq!(manifest.public_path(), "/");
    assert_eq!(manifest.info().extra["hash"], "abc");

    let urls: Vec<_> = manifest.top_level_urls().collect();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0].0, "main.js");
    assert_eq!(urls[1].1, ["/a.css".to_string(), "/b.css".to_string()]);

    let deps = manifest.deps().unwrap();
    let names: Vec<_> = deps.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["main.js", "other.js"]);
    assert!(deps.get("other.js").unwrap().css.is_empty());
  }

  #[test]
  fn requires_public_path() {
    let result = Manifest::from_value(json!({ "info": {}, "main.js": "/main.js" }));
    assert!(matches!(result, Err(ManifestError::MissingPublicPath)));

    let result = Manifest::from_value(json!({ "main.js": "/main.js" }));
    assert!(matches!(result, Err(ManifestError::MissingPublicPath)));
  }

  #[test]
  fn rejects_malformed_dependency_records() {
    let result = Manifest::from_value(json!({
      "info": { "publicPath": "/" },
      "deps": { "main.js": { "js": [1, 2] } }
    }));

    assert!(matches!(result, Err(ManifestError::Invalid(_))));
  }

  #[test]
  fn skips_objects_outside_the_deps_key() {
    let manifest = Manifest::from_value(json!({
      "info": { "publicPath": "/" },
      "entrypoints": { "main": ["main.js"] },
      "deps": { "main.js": { "js": ["/main.js"] } }
    }))
    .unwrap();

    assert_eq!(manifest.entries().count(), 1);
    assert_eq!(manifest.deps().unwrap().len(), 1);
    assert_eq!(manifest.top_level_urls().count(), 0);
  }

  #[test]
  fn record_urls_list_styles_before_scripts() {
    let record = DependencyRecord {
      css: vec!["/a.css".into()],
      js: vec!["/a.js".into()],
    };

    assert_eq!(record.urls().collect::<Vec<_>>(), vec!["/a.css", "/a.js"]);
  }
}
