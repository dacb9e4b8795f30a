use indexmap::IndexMap;
use meos_core::{MeosError, MeosResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A group of terms of the same kind as stored in parameter files.
///
/// Every coefficient is either a list with one entry per term or a scalar
/// that is shared by all terms of the group:
/// ```json
/// {"type": "power", "n": [0.976, -2.69], "d": [1, 1], "t": [0.25, 1.125]}
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TermGroup {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(flatten)]
    parameters: IndexMap<String, Value>,
}

impl TermGroup {
    /// Number of terms in the group.
    pub fn len(&self) -> MeosResult<usize> {
        let mut lengths = self
            .parameters
            .iter()
            .filter_map(|(k, v)| v.as_array().map(|v| (k, v.len())));
        let Some((first, count)) = lengths.next() else {
            return Ok(1);
        };
        if count == 0 {
            return Err(MeosError::Configuration(format!(
                "empty coefficient list `{first}` in group `{}`",
                self.ty
            )));
        }
        if let Some((k, n)) = lengths.find(|&(_, n)| n != count) {
            return Err(MeosError::Configuration(format!(
                "group `{}`: `{k}` has {n} entries, `{first}` has {count}",
                self.ty
            )));
        }
        Ok(count)
    }

    /// Split the group into one value per term.
    ///
    /// Fails if the coefficient lists differ in length, are empty, or
    /// if the kind of the group is unknown.
    pub fn terms<T: DeserializeOwned>(&self) -> MeosResult<Vec<T>> {
        (0..self.len()?)
            .map(|i| {
                let mut term = Map::with_capacity(self.parameters.len() + 1);
                term.insert("type".into(), Value::String(self.ty.clone()));
                for (k, v) in &self.parameters {
                    let v = match v {
                        Value::Array(values) => values[i].clone(),
                        v => v.clone(),
                    };
                    term.insert(k.clone(), v);
                }
                serde_json::from_value(Value::Object(term)).map_err(|e| {
                    MeosError::Configuration(format!("term {i} of group `{}`: {e}", self.ty))
                })
            })
            .collect()
    }
}

/// Flatten a list of groups into a list of terms.
pub(crate) fn flatten<T: DeserializeOwned>(groups: &[TermGroup]) -> MeosResult<Vec<T>> {
    let mut terms = Vec::new();
    for group in groups {
        terms.extend(group.terms()?);
    }
    Ok(terms)
}
