use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::reporting::DeadlineSeverity;

/// One cleaned contract reservation. Monetary fields are always present;
/// cells that failed to parse were coerced to zero at load time. Dates stay
/// `None` when the source left them blank or unreadable.
#[derive(Debug, Clone, Default, PartialEq, Getters, CopyGetters, Serialize)]
pub struct ContractRecord {
    #[serde(rename = "No")]
    #[getset(get_copy = "pub")]
    pub(crate) id: u32,
    #[serde(rename = "No Kontrak")]
    #[getset(get = "pub")]
    pub(crate) contract_number: String,
    /// Treasury office (KPPN) code handling the contract.
    #[serde(rename = "KPPN")]
    #[getset(get = "pub")]
    pub(crate) office: String,
    /// Spending organization unit (Satker) the contract belongs to.
    #[serde(rename = "Satker")]
    #[getset(get = "pub")]
    pub(crate) org_unit: String,
    #[serde(rename = "Nama Supplier")]
    #[getset(get = "pub")]
    pub(crate) supplier_name: String,
    #[serde(rename = "Total Nilai Kontrak")]
    #[getset(get_copy = "pub")]
    pub(crate) total_value: Decimal,
    #[serde(rename = "Nilai Kontrak yang Sudah Dibayarkan")]
    #[getset(get_copy = "pub")]
    pub(crate) paid_value: Decimal,
    /// Funds reserved for the contract (Pengisian).
    #[serde(rename = "Pengisian")]
    #[getset(get_copy = "pub")]
    pub(crate) reserved: Decimal,
    /// Payments realized against the reserve (Belanja_Pembayaran).
    #[serde(rename = "Belanja_Pembayaran")]
    #[getset(get_copy = "pub")]
    pub(crate) spent: Decimal,
    #[serde(rename = "Potongan_Pembayaran")]
    #[getset(get_copy = "pub")]
    pub(crate) deductions: Decimal,
    /// Reserve written off without payment (Penihilan).
    #[serde(rename = "Penihilan")]
    #[getset(get_copy = "pub")]
    pub(crate) written_off: Decimal,
    #[serde(rename = "Saldo")]
    #[getset(get_copy = "pub")]
    pub(crate) balance: Decimal,
    #[serde(rename = "Tgl Kontrak")]
    #[getset(get_copy = "pub")]
    pub(crate) contract_date: Option<NaiveDate>,
    /// Last day of the grace period granted to finish the contract.
    #[serde(rename = "Tgl Kesempatan")]
    #[getset(get_copy = "pub")]
    pub(crate) opportunity_deadline: Option<NaiveDate>,
    /// Days from the load date to the deadline; negative once overdue.
    #[serde(rename = "Sisa_Hari")]
    #[getset(get_copy = "pub")]
    pub(crate) days_remaining: Option<i64>,
}

impl ContractRecord {
    /// Urgency band for the grace period, if the record has a deadline.
    pub fn deadline_severity(&self) -> Option<DeadlineSeverity> {
        self.days_remaining.map(DeadlineSeverity::classify)
    }
}
