//! Template families and their declarative field lists

use crate::validate::ValidationError;
use invoice::Variant;
use std::fmt;
use std::str::FromStr;

/// Choices offered for `business_name`, as `"Label: Company Name"`
pub const BUSINESS_NAME_OPTIONS: [&str; 2] = [
    "上海公司: Shanghai Dosdai Network Tech Co.",
    "香港公司: Number Seven Trading Limited",
];

/// Fields whose past values are remembered and offered again
pub const SUGGEST_FIELDS: [&str; 3] = ["seller_name", "seller_email", "store_link"];

/// One of the three supported document families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    GeneralAgreement,
    InvoiceAd,
    InvoicePromo,
}

/// How a field is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Date,
    MultiLine,
    Choice(&'static [&'static str]),
    /// Free text with previously used values offered
    Suggest,
}

/// Extra check applied after the non-empty check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    None,
    Email,
    /// Comma-separated list of `http(s)://` URLs
    UrlList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: InputKind,
    pub rule: Rule,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: InputKind, rule: Rule) -> Self {
        Self { name, kind, rule }
    }
}

const GENERAL_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new(
        "business_name",
        InputKind::Choice(&BUSINESS_NAME_OPTIONS),
        Rule::None,
    ),
    FieldSpec::new("agreement_date", InputKind::Date, Rule::None),
    FieldSpec::new("seller_name", InputKind::Suggest, Rule::None),
    FieldSpec::new("seller_email", InputKind::Suggest, Rule::Email),
    FieldSpec::new("store_link", InputKind::Suggest, Rule::UrlList),
];

const INVOICE_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("invoice_my_address", InputKind::Text, Rule::None),
    FieldSpec::new("invoice_address", InputKind::Text, Rule::None),
    FieldSpec::new("invoice_no", InputKind::Text, Rule::None),
    FieldSpec::new("invoice_date", InputKind::Date, Rule::None),
    FieldSpec::new("table_data", InputKind::MultiLine, Rule::None),
];

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::GeneralAgreement,
        TemplateKind::InvoiceAd,
        TemplateKind::InvoicePromo,
    ];

    /// Template file name, also the `template_type` value
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateKind::GeneralAgreement => "General_Agreement_Template.docx",
            TemplateKind::InvoiceAd => "Invoice_AD_Template.docx",
            TemplateKind::InvoicePromo => "Invoice_Promo_Template.docx",
        }
    }

    /// File name without `_Template.docx`
    pub fn base_name(self) -> String {
        text_format::template_base_name(self.file_name())
    }

    pub fn from_template_type(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == value)
    }

    /// Invoice variant, `None` for the word-template family
    pub fn variant(self) -> Option<Variant> {
        match self {
            TemplateKind::GeneralAgreement => None,
            TemplateKind::InvoiceAd => Some(Variant::Ad),
            TemplateKind::InvoicePromo => Some(Variant::Promo),
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            TemplateKind::GeneralAgreement => &GENERAL_FIELDS,
            TemplateKind::InvoiceAd | TemplateKind::InvoicePromo => &INVOICE_FIELDS,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Accepts the template file name or a short alias (`general`, `ad`, `promo`)
impl FromStr for TemplateKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" | "general_agreement" | "agreement" => Ok(TemplateKind::GeneralAgreement),
            "ad" | "invoice_ad" => Ok(TemplateKind::InvoiceAd),
            "promo" | "invoice_promo" => Ok(TemplateKind::InvoicePromo),
            _ => Self::from_template_type(s.trim())
                .ok_or_else(|| ValidationError::UnknownTemplate(s.to_string())),
        }
    }
}

/// Reduce a `"Label: Company Name"` choice to `Company Name`
pub fn business_name_value(choice: &str) -> &str {
    match choice.split_once(": ") {
        Some((_, name)) => name,
        None => choice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_names() {
        assert_eq!(TemplateKind::GeneralAgreement.base_name(), "General_Agreement");
        assert_eq!(TemplateKind::InvoicePromo.base_name(), "Invoice_Promo");
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("ad".parse::<TemplateKind>().unwrap(), TemplateKind::InvoiceAd);
        assert_eq!(
            "General_Agreement_Template.docx"
                .parse::<TemplateKind>()
                .unwrap(),
            TemplateKind::GeneralAgreement
        );
        assert!(matches!(
            "Contract.docx".parse::<TemplateKind>(),
            Err(ValidationError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_field_lists() {
        let names: Vec<&str> = TemplateKind::GeneralAgreement
            .fields()
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "business_name",
                "agreement_date",
                "seller_name",
                "seller_email",
                "store_link"
            ]
        );
        assert!(TemplateKind::InvoiceAd
            .fields()
            .iter()
            .all(|f| !f.name.contains("date") || f.kind == InputKind::Date));
    }

    #[test]
    fn test_business_name_value() {
        assert_eq!(
            business_name_value(BUSINESS_NAME_OPTIONS[1]),
            "Number Seven Trading Limited"
        );
        assert_eq!(business_name_value("Acme Corp"), "Acme Corp");
    }
}
