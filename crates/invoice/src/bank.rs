//! Bank detail records printed on invoices

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use text_format::title_case_key;

/// An ordered list of `(key, value)` bank fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BankDetails {
    fields: Vec<(String, String)>,
}

impl BankDetails {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// The record used when no bank is selected or none is configured
    pub fn fallback() -> Self {
        Self::from_pairs(&[
            (
                "account_name",
                "SHANG HAI DUO SI DAI WANG LUO KE JI YOU XIAN GONG SI",
            ),
            ("account_number", "798277695"),
            ("bank_code", "016"),
            ("branch_code", "478"),
            ("swift_code", "DHBKHKHH"),
            ("bank_name", "DBS Bank (Hong Kong) Limited"),
            (
                "bank_address",
                "18th Floor, The Center, 99 Queen's Road Central, Central",
            ),
            ("city", "Hong Kong SAR"),
        ])
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Build from a JSON object, keeping key order; non-string values are
    /// written in their JSON form
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self::new(
            map.iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect(),
        )
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `"Swift Code: DHBKHKHH"` style lines, in record order
    pub fn display_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(key, value)| format!("{}: {}", title_case_key(key), value))
            .collect()
    }
}

impl Serialize for BankDetails {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BankDetails {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_json(&map))
    }
}
