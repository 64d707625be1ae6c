use crate::domain::{AccountId, ActId, CategoryId, ContractId, RequestId};
use crate::error::{Result, SettlementError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Approve,
    Pay,
    Cancel,
}

/// One row of the operations CSV.
///
/// Columns: `op, request, category, contract, act, account, amount, date,
/// reason, comment`. Which columns are required depends on the operation;
/// the `request` column is ignored for `create` rows, since request ids are
/// assigned sequentially by the engine.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub op: OperationKind,
    pub request: Option<RequestId>,
    pub category: Option<CategoryId>,
    pub contract: Option<ContractId>,
    pub act: Option<ActId>,
    pub account: Option<AccountId>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// Reads workflow operations from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<Operation>` lazily, so large files
/// stream without loading everything into memory. Whitespace is trimmed and
/// short records are tolerated.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(SettlementError::from))
    }
}
