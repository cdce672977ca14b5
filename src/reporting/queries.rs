//! Read-only aggregations over a loaded ledger. Each query walks the
//! cleaned records on demand; nothing here mutates the snapshot.

use std::collections::HashSet;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::reporting::ledger::ContractLedger;
use crate::reporting::DeadlineSeverity;

/// Ranked views are capped at this many rows.
pub const TOP_N: usize = 10;

#[derive(Debug, Default, PartialEq)]
pub struct PortfolioSummary {
    pub contracts: usize,
    pub total_value: Decimal,
    /// Distinct, non-blank supplier names.
    pub suppliers: usize,
}

/// Lifecycle totals of the reserved funds across the whole snapshot.
#[derive(Debug, Default, PartialEq)]
pub struct ReserveStatus {
    pub reserved: Decimal,
    pub spent: Decimal,
    pub balance: Decimal,
    pub written_off: Decimal,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct OfficeRow {
    #[serde(rename = "KPPN")]
    pub office: String,
    #[serde(rename = "Total Kontrak")]
    pub contracts: usize,
    #[serde(rename = "Belanja_Pembayaran")]
    pub spent: Decimal,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
    #[serde(rename = "Total Nilai Kontrak")]
    pub total_value: Decimal,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct OrgUnitCountRow {
    #[serde(rename = "Satker")]
    pub org_unit: String,
    #[serde(rename = "KPPN")]
    pub office: String,
    #[serde(rename = "Jumlah Kontrak")]
    pub contracts: usize,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct OrgUnitBalanceRow {
    #[serde(rename = "Satker")]
    pub org_unit: String,
    #[serde(rename = "KPPN")]
    pub office: String,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct GracePeriodRow {
    #[serde(rename = "KPPN")]
    pub office: String,
    #[serde(rename = "No Kontrak")]
    pub contract_number: String,
    #[serde(rename = "Satker")]
    pub org_unit: String,
    #[serde(rename = "Nama Supplier")]
    pub supplier_name: String,
    #[serde(rename = "Tgl Kesempatan")]
    pub deadline: NaiveDate,
    #[serde(rename = "Sisa_Hari")]
    pub days_remaining: i64,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
    pub severity: DeadlineSeverity,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ActiveBalanceRow {
    #[serde(rename = "No Kontrak")]
    pub contract_number: String,
    #[serde(rename = "Satker")]
    pub org_unit: String,
    #[serde(rename = "Nama Supplier")]
    pub supplier_name: String,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
    #[serde(rename = "Tgl Kontrak")]
    pub contract_date: Option<NaiveDate>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SupplierBalanceRow {
    #[serde(rename = "Nama Supplier")]
    pub supplier_name: String,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct SupplierCountRow {
    #[serde(rename = "Nama Supplier")]
    pub supplier_name: String,
    #[serde(rename = "Jumlah Kontrak")]
    pub contracts: usize,
}

impl ContractLedger {
    pub fn portfolio_summary(&self) -> PortfolioSummary {
        let suppliers: HashSet<&str> = self
            .records()
            .iter()
            .map(|record| record.supplier_name().as_str())
            .filter(|name| !name.is_empty())
            .collect();
        PortfolioSummary {
            contracts: self.len(),
            total_value: self.records().iter().map(|record| record.total_value()).sum(),
            suppliers: suppliers.len(),
        }
    }

    pub fn reserve_status(&self) -> ReserveStatus {
        let mut status = ReserveStatus::default();
        for record in self.records() {
            status.reserved += record.reserved();
            status.spent += record.spent();
            status.balance += record.balance();
            status.written_off += record.written_off();
        }
        status
    }

    /// Per-office totals, sorted by office code. Records with a blank
    /// office belong to no office and are left out.
    pub fn office_comparison(&self) -> Vec<OfficeRow> {
        let mut groups: IndexMap<&str, OfficeRow> = IndexMap::new();
        for record in self.records() {
            if record.office().is_empty() {
                continue;
            }
            let row = groups
                .entry(record.office().as_str())
                .or_insert_with(|| OfficeRow {
                    office: record.office().clone(),
                    contracts: 0,
                    balance: Decimal::ZERO,
                    spent: Decimal::ZERO,
                    total_value: Decimal::ZERO,
                });
            row.contracts += 1;
            row.balance += record.balance();
            row.spent += record.spent();
            row.total_value += record.total_value();
        }
        let mut rows: Vec<OfficeRow> = groups.into_values().collect();
        rows.sort_by(|a, b| a.office.cmp(&b.office));
        rows
    }

    /// Busiest org units, at most [`TOP_N`]. Ties keep the order the units
    /// first appeared in the source.
    pub fn top_org_units_by_count(&self) -> Vec<OrgUnitCountRow> {
        let mut groups: IndexMap<(&str, &str), OrgUnitCountRow> = IndexMap::new();
        for record in self.records() {
            if record.org_unit().is_empty() || record.office().is_empty() {
                continue;
            }
            let key = (record.org_unit().as_str(), record.office().as_str());
            let row = groups.entry(key).or_insert_with(|| OrgUnitCountRow {
                org_unit: record.org_unit().clone(),
                office: record.office().clone(),
                contracts: 0,
            });
            row.contracts += 1;
        }
        let mut rows: Vec<OrgUnitCountRow> = groups.into_values().collect();
        rows.sort_by(|a, b| b.contracts.cmp(&a.contracts));
        rows.truncate(TOP_N);
        rows
    }

    pub fn top_org_units_by_balance(&self) -> Vec<OrgUnitBalanceRow> {
        let mut groups: IndexMap<(&str, &str), OrgUnitBalanceRow> = IndexMap::new();
        for record in self.records() {
            if record.org_unit().is_empty() || record.office().is_empty() {
                continue;
            }
            let key = (record.org_unit().as_str(), record.office().as_str());
            let row = groups.entry(key).or_insert_with(|| OrgUnitBalanceRow {
                org_unit: record.org_unit().clone(),
                office: record.office().clone(),
                balance: Decimal::ZERO,
            });
            row.balance += record.balance();
        }
        let mut rows: Vec<OrgUnitBalanceRow> = groups.into_values().collect();
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(TOP_N);
        rows
    }

    /// Contracts inside a grace period, most urgent first. Overdue rows
    /// sort ahead of everything else because their day count is negative.
    pub fn grace_period_contracts(&self) -> Vec<GracePeriodRow> {
        let mut rows: Vec<GracePeriodRow> = self
            .records()
            .iter()
            .filter_map(|record| {
                let deadline = record.opportunity_deadline()?;
                let days_remaining = record.days_remaining()?;
                Some(GracePeriodRow {
                    office: record.office().clone(),
                    contract_number: record.contract_number().clone(),
                    org_unit: record.org_unit().clone(),
                    supplier_name: record.supplier_name().clone(),
                    deadline,
                    days_remaining,
                    balance: record.balance(),
                    severity: DeadlineSeverity::classify(days_remaining),
                })
            })
            .collect();
        rows.sort_by_key(|row| row.days_remaining);
        rows
    }

    /// Contracts with funds still reserved, in source order, optionally
    /// narrowed to one office.
    pub fn active_balances(&self, office: Option<&str>) -> Vec<ActiveBalanceRow> {
        self.records()
            .iter()
            .filter(|record| office.map_or(true, |code| record.office().as_str() == code))
            .filter(|record| record.balance() > Decimal::ZERO)
            .map(|record| ActiveBalanceRow {
                contract_number: record.contract_number().clone(),
                org_unit: record.org_unit().clone(),
                supplier_name: record.supplier_name().clone(),
                balance: record.balance(),
                contract_date: record.contract_date(),
            })
            .collect()
    }

    pub fn top_suppliers_by_balance(&self) -> Vec<SupplierBalanceRow> {
        let mut groups: IndexMap<&str, SupplierBalanceRow> = IndexMap::new();
        for record in self.records() {
            if record.supplier_name().is_empty() {
                continue;
            }
            let row = groups
                .entry(record.supplier_name().as_str())
                .or_insert_with(|| SupplierBalanceRow {
                    supplier_name: record.supplier_name().clone(),
                    balance: Decimal::ZERO,
                });
            row.balance += record.balance();
        }
        let mut rows: Vec<SupplierBalanceRow> = groups.into_values().collect();
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(TOP_N);
        rows
    }

    pub fn top_suppliers_by_count(&self) -> Vec<SupplierCountRow> {
        let mut groups: IndexMap<&str, SupplierCountRow> = IndexMap::new();
        for record in self.records() {
            if record.supplier_name().is_empty() {
                continue;
            }
            let row = groups
                .entry(record.supplier_name().as_str())
                .or_insert_with(|| SupplierCountRow {
                    supplier_name: record.supplier_name().clone(),
                    contracts: 0,
                });
            row.contracts += 1;
        }
        let mut rows: Vec<SupplierCountRow> = groups.into_values().collect();
        rows.sort_by(|a, b| b.contracts.cmp(&a.contracts));
        rows.truncate(TOP_N);
        rows
    }
}
