//! Company addresses and bank records (`address.json`)
//!
//! Top-level string entries map a company name to its address. The bank
//! section maps a bank name to an ordered detail record.

use invoice::BankDetails;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const ADDRESS_FILE: &str = "address.json";

/// Key of the nested bank section
pub const BANK_SECTION: &str = "银行信息";
const BANK_SECTION_ALIAS: &str = "banks";

/// Company -> prefix of the bank names that belong to it
const BANK_PREFIXES: [(&str, &str); 2] = [("上海公司", "上海-"), ("香港公司", "香港-")];

/// Contents written when no address file exists
pub fn default_address_json() -> Value {
    json!({
        "公司1": "公司1地址信息...",
        BANK_SECTION: {
            "银行1": Value::Object(BankDetails::fallback().to_json()),
        }
    })
}

/// Prefix selecting a company's banks; empty for companies without one
pub fn bank_prefix(company: &str) -> &'static str {
    BANK_PREFIXES
        .iter()
        .find(|(name, _)| *name == company)
        .map(|(_, prefix)| *prefix)
        .unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AddressBook {
    companies: Vec<(String, String)>,
    banks: Vec<(String, BankDetails)>,
}

impl AddressBook {
    /// Address book used when the file cannot be read
    pub fn placeholder() -> Self {
        Self {
            companies: vec![("默认公司".to_string(), "默认地址信息".to_string())],
            banks: Vec::new(),
        }
    }

    pub fn from_json(root: &Map<String, Value>) -> Self {
        let mut book = Self::default();
        for (key, value) in root {
            match value {
                Value::Object(section) if key == BANK_SECTION || key == BANK_SECTION_ALIAS => {
                    for (bank, record) in section {
                        if let Value::Object(record) = record {
                            book.banks
                                .push((bank.clone(), BankDetails::from_json(record)));
                        } else {
                            log::warn!("bank '{bank}' is not an object, ignored");
                        }
                    }
                }
                Value::String(address) => book.companies.push((key.clone(), address.clone())),
                _ => log::warn!("address entry '{key}' is not a string, ignored"),
            }
        }
        book
    }

    /// Load the address file, creating the default one when it is missing
    ///
    /// Read or parse failures yield [`AddressBook::placeholder`].
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            if let Err(e) = write_default(path) {
                log::warn!("cannot create {}: {}", path.display(), e);
            } else {
                log::info!("created default address file {}", path.display());
            }
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                serde_json::from_str::<Map<String, Value>>(&text).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(root) => Self::from_json(&root),
            Err(e) => {
                log::warn!("cannot read address file {}: {}", path.display(), e);
                Self::placeholder()
            }
        }
    }

    pub fn companies(&self) -> &[(String, String)] {
        &self.companies
    }

    pub fn company_address(&self, company: &str) -> Option<&str> {
        self.companies
            .iter()
            .find(|(name, _)| name == company)
            .map(|(_, address)| address.as_str())
    }

    pub fn bank_names(&self) -> impl Iterator<Item = &str> {
        self.banks.iter().map(|(name, _)| name.as_str())
    }

    pub fn bank(&self, name: &str) -> Option<&BankDetails> {
        self.banks
            .iter()
            .find(|(bank, _)| bank == name)
            .map(|(_, details)| details)
    }

    /// Banks offered for a company, in file order
    pub fn banks_for_company(&self, company: &str) -> Vec<&str> {
        let prefix = bank_prefix(company);
        self.bank_names()
            .filter(|name| name.starts_with(prefix))
            .collect()
    }

    /// Bank record to print on an invoice
    ///
    /// A selection naming a known bank wins. Otherwise, when a company is
    /// given, its first bank is used. Otherwise the built-in record.
    pub fn select_bank(&self, company: Option<&str>, selected: Option<&str>) -> BankDetails {
        let chosen = selected
            .filter(|name| self.bank(name).is_some())
            .or_else(|| {
                company
                    .filter(|c| !c.is_empty())
                    .and_then(|c| self.banks_for_company(c).into_iter().next())
            });

        match chosen.and_then(|name| self.bank(name)) {
            Some(details) => {
                log::debug!("using bank record '{}'", chosen.unwrap_or_default());
                details.clone()
            }
            None => {
                log::debug!("using built-in bank record");
                BankDetails::fallback()
            }
        }
    }
}

/// Write the default address file
pub fn write_default(path: &Path) -> std::io::Result<()> {
    let text = serde_json::to_string_pretty(&default_address_json())?;
    std::fs::write(path, text)
}
