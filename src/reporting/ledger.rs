use getset::CopyGetters;

use crate::reporting::record::ContractRecord;

/// A cleaned snapshot of the reservation dataset, plus the data quality
/// signal accumulated while cleaning it. All reporting queries run against
/// this type and never mutate it.
#[derive(Debug, Default, PartialEq, CopyGetters)]
pub struct ContractLedger {
    records: Vec<ContractRecord>,
    /// Monetary cells that failed to parse and were coerced to zero.
    #[getset(get_copy = "pub")]
    coerced_cells: u64,
}

impl ContractLedger {
    pub fn new(records: Vec<ContractRecord>, coerced_cells: u64) -> ContractLedger {
        ContractLedger { records, coerced_cells }
    }

    pub fn records(&self) -> &[ContractRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct office codes in the snapshot, sorted. Blank codes are not
    /// offices and are left out.
    pub fn offices(&self) -> Vec<String> {
        let mut offices: Vec<String> = self
            .records
            .iter()
            .filter(|record| !record.office.is_empty())
            .map(|record| record.office.clone())
            .collect();
        offices.sort();
        offices.dedup();
        offices
    }
}
