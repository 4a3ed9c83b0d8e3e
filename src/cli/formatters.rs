//! Output formatting for the terminal report.
//!
//! Separates presentation from the report model: tables for humans, JSON for
//! scripts. All currency values arrive already truncated to centavos.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use crate::reports::ReportModel;
use crate::utils::{format_currency, format_quantity};

/// Serialize the full report model as pretty JSON.
pub fn format_report_json(report: &ReportModel) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "Código")]
    ticker: String,
    #[tabled(rename = "Quantidade")]
    quantity: String,
    #[tabled(rename = "Custo Total")]
    total_cost: String,
    #[tabled(rename = "Preço Médio")]
    average: String,
    #[tabled(rename = "Vendas")]
    proceeds: String,
    #[tabled(rename = "Resultado")]
    net: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Mês")]
    month: String,
    #[tabled(rename = "Vendas")]
    proceeds: String,
    #[tabled(rename = "Lucro")]
    gains: String,
    #[tabled(rename = "Prejuízo")]
    losses: String,
    #[tabled(rename = "Resultado")]
    net: String,
}

/// Print the report as terminal tables.
pub fn print_report(report: &ReportModel) {
    match (report.reference_year, &report.institution) {
        (Some(year), Some(institution)) => {
            println!("\n{}", format!("IRPF {} — {}", year, institution).bold())
        }
        (Some(year), None) => println!("\n{}", format!("IRPF {}", year).bold()),
        _ => {}
    }

    if report.assets.is_empty() {
        println!("\n{}", "No positions or disposals found".yellow());
    } else {
        println!("\n{}", "Bens e Direitos".bold());
        let rows: Vec<AssetRow> = report
            .assets
            .iter()
            .map(|a| AssetRow {
                ticker: a.ticker.clone(),
                quantity: format_quantity(a.open_quantity),
                total_cost: format_currency(a.total_cost),
                average: format_currency(a.average_unit_cost),
                proceeds: format_currency(a.total_proceeds),
                net: format_currency(a.realized_gain_total - a.realized_loss_total),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !report.months.is_empty() {
        println!("\n{}", "Resultados mensais".bold());
        let rows: Vec<MonthRow> = report
            .months
            .iter()
            .map(|m| MonthRow {
                month: format!("{:02}/{}", m.month, m.year),
                proceeds: format_currency(m.proceeds),
                gains: format_currency(m.gains),
                losses: format_currency(m.losses),
                net: format_currency(m.net),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    if !report.rejected_rows.is_empty() {
        println!(
            "\n{} {} row(s) skipped during normalization:",
            "!".yellow().bold(),
            report.rejected_rows.len()
        );
        for message in &report.rejected_rows {
            println!("  {}", message.yellow());
        }
    }

    if !report.processing_errors.is_empty() {
        println!(
            "\n{} {} asset error(s):",
            "✗".red().bold(),
            report.processing_errors.len()
        );
        for message in &report.processing_errors {
            println!("  {}", message.red());
        }
    }
}
