use serde::{Deserialize, Serialize};
use std::fmt;

/// Possible variants to identify a substance.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierOption {
    Cas,
    Name,
    IupacName,
    Smiles,
    Inchi,
    Formula,
}

impl fmt::Display for IdentifierOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let str = match self {
            IdentifierOption::Cas => "CAS",
            IdentifierOption::Name => "name",
            IdentifierOption::IupacName => "IUPAC name",
            IdentifierOption::Smiles => "SMILES",
            IdentifierOption::Inchi => "InChI",
            IdentifierOption::Formula => "formula",
        };
        write!(f, "{str}")
    }
}

/// A collection of identifiers for a fluid.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Identifier {
    /// CAS number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas: Option<String>,
    /// Commonly used english name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// IUPAC name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iupac_name: Option<String>,
    /// SMILES key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smiles: Option<String>,
    /// InChI key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inchi: Option<String>,
    /// Chemical formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Identifier {
    /// Create an identifier that only contains a name.
    pub fn from_name(name: &str) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn as_str(&self, option: IdentifierOption) -> Option<&str> {
        match option {
            IdentifierOption::Cas => self.cas.as_deref(),
            IdentifierOption::Name => self.name.as_deref(),
            IdentifierOption::IupacName => self.iupac_name.as_deref(),
            IdentifierOption::Smiles => self.smiles.as_deref(),
            IdentifierOption::Inchi => self.inchi.as_deref(),
            IdentifierOption::Formula => self.formula.as_deref(),
        }
    }

    // first available identifier, used in error messages and outputs
    pub fn as_readable_str(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.iupac_name.as_deref())
            .or(self.cas.as_deref())
            .or(self.smiles.as_deref())
            .or(self.inchi.as_deref())
            .or(self.formula.as_deref())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<_> = [
            ("cas", &self.cas),
            ("name", &self.name),
            ("iupac_name", &self.iupac_name),
            ("smiles", &self.smiles),
            ("inchi", &self.inchi),
            ("formula", &self.formula),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
        .collect();
        write!(f, "Identifier({})", ids.join(", "))
    }
}
