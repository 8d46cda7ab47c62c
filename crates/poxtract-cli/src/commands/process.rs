//! Process command - extract order data from a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use poxtract_core::models::order::OutputRecord;
use poxtract_core::{DocumentOutcome, ParsedAddress};

use super::{GlobalOpts, file_name};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Number of leading pages to read (0 reads every page)
    #[arg(long)]
    max_pages: Option<usize>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = globals.load_config()?;
    if let Some(max_pages) = args.max_pages {
        config.pdf.max_pages = max_pages;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading PDF...");
    pb.set_position(10);

    let pipeline = globals.pipeline(&config)?;
    let data = fs::read(&args.input)?;
    let name = file_name(&args.input);

    pb.set_message("Extracting order data...");
    pb.set_position(40);

    let outcome = pipeline.process_pdf(&data, &name).await?;

    pb.finish_with_message("Done");

    let record = match outcome {
        DocumentOutcome::Extracted(record) => record,
        DocumentOutcome::OverTokenLimit { tokens, limit } => {
            anyhow::bail!("Too many tokens in {}: {} > {}", name, tokens, limit)
        }
        DocumentOutcome::NoText => anyhow::bail!("No text could be extracted from the PDF"),
        DocumentOutcome::AmbiguousAddress(e) => anyhow::bail!("Address parsing failed: {}", e),
    };

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_record(record: &OutputRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(record.to_json()?),
        OutputFormat::Csv => format_csv(record),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn address_cell(parsed: Option<&ParsedAddress>, raw: Option<&str>) -> String {
    match parsed {
        Some(address) if !address.is_empty() => address.format(),
        _ => raw.unwrap_or_default().replace('\n', ", "),
    }
}

fn format_csv(record: &OutputRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "input_blob_name",
        "order_number",
        "company_name",
        "order_date",
        "shipping_address",
        "billing_address",
        "total_price",
        "description",
        "quantity",
        "price",
        "specifications",
    ])?;

    let info = &record.data.other_info;
    let order = &info.order;
    let table = &record.data.product_table;
    let shipping = address_cell(
        info.shipping_address_parsed.as_ref(),
        order.shipping_address.as_deref(),
    );
    let billing = address_cell(
        info.billing_address_parsed.as_ref(),
        order.billing_address.as_deref(),
    );
    let total = table.total_price.to_string();

    let head = [
        record.input_blob_name.as_str(),
        order.order_number.as_str(),
        order.company_name.as_str(),
        order.order_date.as_deref().unwrap_or_default(),
        shipping.as_str(),
        billing.as_str(),
        total.as_str(),
    ];

    if table.entries.is_empty() {
        wtr.write_record(head.iter().copied().chain(["", "", "", ""]))?;
    }

    for item in &table.entries {
        let quantity = item.quantity.to_string();
        let price = item.price.to_string();
        wtr.write_record(head.iter().copied().chain([
            item.description.as_str(),
            quantity.as_str(),
            price.as_str(),
            item.specifications.as_deref().unwrap_or_default(),
        ]))?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &OutputRecord) -> String {
    let info = &record.data.other_info;
    let order = &info.order;
    let table = &record.data.product_table;
    let mut output = String::new();

    output.push_str(&format!("Purchase order: {}\n", order.order_number));
    output.push_str(&format!("Company: {}\n", order.company_name));
    if let Some(date) = &order.order_date {
        output.push_str(&format!("Date: {}\n", date));
    }
    output.push_str(&format!("Source: {}\n", record.input_blob_name));
    output.push('\n');

    output.push_str("Ship to:\n");
    output.push_str(&format!(
        "  {}\n",
        address_cell(
            info.shipping_address_parsed.as_ref(),
            order.shipping_address.as_deref()
        )
    ));
    output.push_str("Bill to:\n");
    output.push_str(&format!(
        "  {}\n",
        address_cell(
            info.billing_address_parsed.as_ref(),
            order.billing_address.as_deref()
        )
    ));
    output.push('\n');

    output.push_str(&format!("Items ({}):\n", table.entries.len()));
    for item in &table.entries {
        output.push_str(&format!(
            "  {} x {} @ {}\n",
            item.quantity, item.description, item.price
        ));
        if let Some(specs) = &item.specifications {
            output.push_str(&format!("      {}\n", specs));
        }
    }
    output.push_str(&format!("Total: {}\n", table.total_price));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use poxtract_core::models::order::{
        ExtendedExtractedData, ExtendedOrderInfo, OrderInfo, ProductLineItem, ProductTable,
    };

    fn record() -> OutputRecord {
        let order = OrderInfo {
            company_name: "Acme Corp".to_string(),
            order_number: "PO-1001".to_string(),
            shipping_address: Some("Acme Corp\n123 Main St\nSpringfield, IL 62701".to_string()),
            billing_address: None,
            order_date: Some("2024-03-01".to_string()),
        };
        let mut info = ExtendedOrderInfo::new(order);
        info.shipping_address_parsed = Some(ParsedAddress {
            street_line_1: "123 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
            name: "Acme Corp".to_string(),
            ..Default::default()
        });

        OutputRecord::new(
            ExtendedExtractedData {
                product_table: ProductTable {
                    total_price: "25.00".parse().unwrap(),
                    entries: vec![ProductLineItem {
                        description: "Widget".to_string(),
                        quantity: 2,
                        price: "12.50".parse().unwrap(),
                        specifications: Some("Blue".to_string()),
                    }],
                },
                other_info: info,
            },
            "order.pdf",
        )
    }

    #[test]
    fn test_csv_has_one_row_per_item() {
        let csv = format_record(&record(), OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("input_blob_name,order_number"));
        assert!(lines[1].contains("PO-1001"));
        assert!(lines[1].contains("\"Acme Corp, 123 Main St, Springfield, IL 62701\""));
        assert!(lines[1].ends_with("Widget,2,12.50,Blue"));
    }

    #[test]
    fn test_csv_without_items_still_has_a_row() {
        let mut record = record();
        record.data.product_table.entries.clear();
        let csv = format_record(&record, OutputFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn test_text_summary() {
        let text = format_record(&record(), OutputFormat::Text).unwrap();
        assert!(text.contains("Purchase order: PO-1001"));
        assert!(text.contains("2 x Widget @ 12.50"));
        assert!(text.contains("Bill to:\n  \n"));
    }
}
