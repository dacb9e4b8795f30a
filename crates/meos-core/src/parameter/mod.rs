//! Fluid records and their identification in parameter files.
use crate::errors::{MeosError, MeosResult};
use indexmap::IndexSet;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::ops::Deref;
use std::path::Path;

mod identifier;
pub use identifier::{Identifier, IdentifierOption};

/// Model parameters of a pure fluid together with its identifier.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PureRecord<M> {
    pub identifier: Identifier,
    /// Molar weight in g/mol
    pub molarweight: f64,
    #[serde(flatten)]
    pub model_record: M,
}

impl<M> PureRecord<M> {
    /// Create a new `PureRecord`.
    pub fn new(identifier: Identifier, molarweight: f64, model_record: M) -> Self {
        Self {
            identifier,
            molarweight,
            model_record,
        }
    }

    /// Read all records stored in a json file.
    pub fn from_file<P: AsRef<Path>>(file: P) -> MeosResult<Vec<Self>>
    where
        M: DeserializeOwned,
    {
        let reader = BufReader::new(File::open(file)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read the records of the given substances from a json file.
    ///
    /// The records are returned in the order of `substances`.
    pub fn from_json<P, S>(
        substances: &[S],
        file: P,
        identifier_option: IdentifierOption,
    ) -> MeosResult<Vec<Self>>
    where
        P: AsRef<Path>,
        S: Deref<Target = str>,
        M: DeserializeOwned,
    {
        Self::select(Self::from_file(file)?, substances, identifier_option)
    }

    /// Pick the records of the given substances from a list of records.
    pub fn select<S>(
        file_records: Vec<Self>,
        substances: &[S],
        identifier_option: IdentifierOption,
    ) -> MeosResult<Vec<Self>>
    where
        S: Deref<Target = str>,
    {
        let mut queried: IndexSet<&str> = substances.iter().map(|s| s.deref()).collect();
        if queried.len() != substances.len() {
            return Err(MeosError::IncompatibleParameters(
                "A substance was defined more than once.".to_string(),
            ));
        }

        let mut records: HashMap<&str, Self> = HashMap::with_capacity(substances.len());
        for record in file_records {
            if let Some(id) = record.identifier.as_str(identifier_option) {
                if let Some(id) = queried.shift_take(id) {
                    records.insert(id, record);
                }
            }
            if queried.is_empty() {
                break;
            }
        }

        if !queried.is_empty() {
            return Err(MeosError::ComponentsNotFound(format!("{queried:?}")));
        };

        substances
            .iter()
            .map(|s| {
                records
                    .remove(s.deref())
                    .ok_or_else(|| MeosError::ComponentsNotFound(s.to_string()))
            })
            .collect()
    }
}

impl<M: Serialize> fmt::Display for PureRecord<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PureRecord({}, molarweight={})",
            self.identifier, self.molarweight
        )
    }
}
