//! autopdf CLI - fill document templates and generate PDFs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use autopdf::{
    recent_display_name, AddressBook, ConfigStore, FormData, GenerationRequest, Generator,
    InputKind, TemplateKind, Workspace,
};

#[derive(Parser)]
#[command(name = "autopdf")]
#[command(version)]
#[command(about = "Fill document templates and generate PDFs", long_about = None)]
struct Cli {
    /// Directory holding config.json, address.json, templates/ and output/
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create address.json, templates/ and output/
    Init,

    /// List the fields a template needs
    Fields {
        /// general, ad, promo, or a template file name
        #[arg(value_name = "TEMPLATE")]
        template: TemplateKind,
    },

    /// Generate a PDF
    Generate {
        /// general, ad, promo, or a template file name
        #[arg(short, long, value_name = "TEMPLATE")]
        template: TemplateKind,

        /// JSON object of field values
        #[arg(long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Field value; `@path` reads the value from a file
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Start from the last values used with this template
        #[arg(long)]
        reuse_recent: bool,

        /// Issuing company from address.json (invoices)
        #[arg(long)]
        company: Option<String>,

        /// Bank record from address.json (invoices)
        #[arg(long)]
        bank: Option<String>,

        /// TrueType font for PDF text
        #[arg(long, value_name = "FILE")]
        font: Option<PathBuf>,
    },

    /// Show recently generated files
    Recent,

    /// Show companies and their bank records
    Companies,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => cmd_init(&cli.base_dir),
        Commands::Fields { template } => cmd_fields(&cli.base_dir, template),
        Commands::Generate {
            template,
            data,
            set,
            reuse_recent,
            company,
            bank,
            font,
        } => cmd_generate(
            &cli.base_dir,
            template,
            data.as_deref(),
            &set,
            reuse_recent,
            company,
            bank,
            font.as_deref(),
        ),
        Commands::Recent => cmd_recent(&cli.base_dir),
        Commands::Companies => cmd_companies(&cli.base_dir),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_init(base_dir: &Path) -> Result<()> {
    let workspace = Workspace::new(base_dir);
    workspace
        .init()
        .with_context(|| format!("cannot initialise {}", base_dir.display()))?;
    println!("Initialised {}", base_dir.display());
    println!(
        "Put the template files in {}",
        workspace.templates_dir().display()
    );
    Ok(())
}

fn cmd_fields(base_dir: &Path, template: TemplateKind) -> Result<()> {
    let config = ConfigStore::load(Workspace::new(base_dir).config_path());
    let recent = config.recent_inputs(template.file_name());

    println!("{template}");
    for field in template.fields() {
        let kind = match field.kind {
            InputKind::Text => "text".to_string(),
            InputKind::Date => "date".to_string(),
            InputKind::MultiLine => "multi-line".to_string(),
            InputKind::Choice(options) => format!("one of: {}", options.join(" | ")),
            InputKind::Suggest => "text".to_string(),
        };
        println!("  {:<20} {}", field.name, kind);

        if let Some(value) = recent.and_then(|form| form.get(field.name)) {
            println!("  {:<20} last: {}", "", value.replace('\n', " / "));
        }
        if field.kind == InputKind::Suggest {
            for value in config.common_values(field.name) {
                println!("  {:<20} used: {}", "", value);
            }
        }
    }
    Ok(())
}

/// Read a `--set` value, resolving `@path`
fn resolve_value(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("cannot read {path}")),
        None => Ok(raw.to_string()),
    }
}

fn read_data_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let object: Map<String, Value> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON object", path.display()))?;

    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    base_dir: &Path,
    template: TemplateKind,
    data: Option<&Path>,
    set: &[String],
    reuse_recent: bool,
    company: Option<String>,
    bank: Option<String>,
    font: Option<&Path>,
) -> Result<()> {
    let mut generator = Generator::open(base_dir);
    if let Some(font) = font {
        let data = fs::read(font).with_context(|| format!("cannot read {}", font.display()))?;
        generator.set_font_data(data);
    }

    let mut form = FormData::new(template);
    if let Some(path) = data {
        form.fill_missing(&read_data_file(path)?);
    }
    for assignment in set {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("expected KEY=VALUE, got '{assignment}'");
        };
        form.set(key.trim(), resolve_value(value)?);
    }
    if reuse_recent {
        if let Some(recent) = generator.config().recent_inputs(template.file_name()) {
            form.fill_missing(&recent.values);
        }
    }

    if let Some(company) = company.as_deref() {
        if template.variant().is_some() && form.get("invoice_my_address").is_none() {
            match generator.address_book().company_address(company) {
                Some(address) => form.set("invoice_my_address", address),
                None => log::warn!("company '{company}' is not in the address book"),
            }
        }
    }

    let outcome = generator.generate(GenerationRequest {
        form,
        company,
        bank,
    })?;

    if let Some(docx) = &outcome.docx_path {
        println!("Filled document: {}", docx.display());
    }
    if let Some(report) = &outcome.fill_report {
        println!(
            "Substituted {} placeholder(s) in {} paragraph(s)",
            report.substituted_keys.len(),
            report.changed_paragraphs
        );
    }
    if let Some(total) = outcome.total {
        println!("Total: {}", text_format::format_usd(total));
    }
    if outcome.skipped_rows > 0 {
        println!("Skipped {} malformed line item(s)", outcome.skipped_rows);
    }
    println!("PDF generated at: {}", outcome.pdf_path.display());
    Ok(())
}

fn cmd_recent(base_dir: &Path) -> Result<()> {
    let config = ConfigStore::load(Workspace::new(base_dir).config_path());
    let files = config.recent_files();
    if files.is_empty() {
        println!("No recent files");
    }
    for file in files {
        println!("{:<30} {}", recent_display_name(&file), file.display());
    }
    Ok(())
}

fn cmd_companies(base_dir: &Path) -> Result<()> {
    let book = AddressBook::load_or_create(Workspace::new(base_dir).address_path());
    for (company, address) in book.companies() {
        println!("{company}");
        println!("  address: {address}");
        for bank in book.banks_for_company(company) {
            println!("  bank:    {bank}");
        }
    }
    Ok(())
}
