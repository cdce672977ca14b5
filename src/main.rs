use std::env;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use rpata_monitor::format;
use rpata_monitor::reporting::ledger::ContractLedger;
use rpata_monitor::session::AccessGate;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: cargo run -- <dataset.csv> [KPPN]");
        std::process::exit(1);
    }
    let source = &args[1];
    let office = args.get(2).map(String::as_str);

    let secret = env::var("RPATA_SECRET").unwrap_or_else(|_| "admin123".to_string());
    let password = env::var("RPATA_PASSWORD").unwrap_or_else(|_| secret.clone());

    let mut session = AccessGate::new(secret).open(&password)?;
    let ledger = session
        .ledger(source)
        .with_context(|| format!("failed to load {}", source))?;

    if let Some(code) = office {
        if !ledger.offices().iter().any(|known| known == code) {
            bail!("unknown KPPN {:?}, known: {}", code, ledger.offices().join(", "));
        }
    }

    render(ledger, office)
}

fn render(ledger: &ContractLedger, office: Option<&str>) -> Result<()> {
    let summary = ledger.portfolio_summary();
    let status = ledger.reserve_status();

    println!("Total Jumlah Kontrak: {} Kontrak", summary.contracts);
    println!(
        "Total Nilai Kontrak: {} ({})",
        format::rupiah(summary.total_value),
        format::compact(summary.total_value)
    );
    println!("Total Nama Supplier: {} Vendor", summary.suppliers);
    println!(
        "Total Nilai Dicadangkan (Pengisian): {} ({})",
        format::rupiah(status.reserved),
        format::compact(status.reserved)
    );
    println!(
        "Realisasi Pembayaran (Belanja): {} ({})",
        format::rupiah(status.spent),
        format::compact(status.spent)
    );
    println!(
        "Total Sisa Cadangan (Saldo): {} ({})",
        format::rupiah(status.balance),
        format::compact(status.balance)
    );
    println!(
        "Total Tidak Terbayar (Penihilan): {} ({})",
        format::rupiah(status.written_off),
        format::compact(status.written_off)
    );
    println!();

    write_section("Perbandingan Antar KPPN", &ledger.office_comparison())?;
    write_section(
        "Top 10 Satker dengan Kontrak Terbanyak",
        &ledger.top_org_units_by_count(),
    )?;
    write_section(
        "Top 10 Satker dengan Saldo Terbesar",
        &ledger.top_org_units_by_balance(),
    )?;
    write_section(
        "Daftar Kontrak Dalam Masa Pemberian Kesempatan",
        &ledger.grace_period_contracts(),
    )?;
    println!("Keterangan: critical <= 7 hari, warning <= 14 hari");
    println!();

    let active_title = match office {
        Some(code) => format!("Rincian Kontrak dengan Saldo Aktif ({})", code),
        None => "Rincian Kontrak dengan Saldo Aktif (Semua KPPN)".to_string(),
    };
    write_section(&active_title, &ledger.active_balances(office))?;
    write_section("Top 10 Supplier (Saldo Terbanyak)", &ledger.top_suppliers_by_balance())?;
    write_section("Top 10 Supplier (Kontrak Terbanyak)", &ledger.top_suppliers_by_count())?;

    if ledger.coerced_cells() > 0 {
        println!(
            "Catatan: {} sel nilai tidak terbaca dan dianggap nol",
            ledger.coerced_cells()
        );
    }

    Ok(())
}

fn write_section<T: Serialize>(title: &str, rows: &[T]) -> Result<()> {
    println!("== {} ==", title);
    if rows.is_empty() {
        println!("(tidak ada data)");
    } else {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(std::io::stdout());
        for row in rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
    }
    println!();

    Ok(())
}
