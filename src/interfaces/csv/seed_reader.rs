use crate::domain::account::Account;
use crate::domain::act::Act;
use crate::domain::money::{Amount, Balance};
use crate::domain::{AccountId, ActId, ContractId};
use crate::error::{Result, SettlementError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct AccountRow {
    id: AccountId,
    name: String,
    currency: String,
    balance: Decimal,
}

#[derive(Debug, Deserialize)]
struct ActRow {
    id: ActId,
    contract: ContractId,
    amount_gross: Decimal,
}

/// Reads reference accounts from a CSV source
/// (`id, name, currency, balance`). Seeded accounts start at version 0.
pub fn read_accounts<R: Read>(source: R) -> Result<Vec<Account>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let mut accounts = Vec::new();
    for row in reader.deserialize() {
        let row: AccountRow = row?;
        accounts.push(Account::new(
            row.id,
            row.name,
            row.currency,
            Balance::new(row.balance),
        ));
    }
    Ok(accounts)
}

/// Reads reference acts from a CSV source (`id, contract, amount_gross`).
/// The gross amount must be positive.
pub fn read_acts<R: Read>(source: R) -> Result<Vec<Act>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let mut acts = Vec::new();
    for row in reader.deserialize() {
        let row: ActRow = row?;
        let gross = Amount::new(row.amount_gross).map_err(|_| {
            SettlementError::Validation(format!(
                "act {}: gross amount must be positive, got {}",
                row.id, row.amount_gross
            ))
        })?;
        acts.push(Act::new(row.id, row.contract, gross));
    }
    Ok(acts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_accounts() {
        let data = "id, name, currency, balance\n1, Main, RUB, 1000.00\n2, Reserve, RUB, 0";
        let accounts = read_accounts(data.as_bytes()).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].name, "Main");
        assert_eq!(accounts[0].balance, Balance::new(dec!(1000.00)));
        assert_eq!(accounts[0].version, 0);
        assert_eq!(accounts[1].balance, Balance::ZERO);
    }

    #[test]
    fn test_read_acts() {
        let data = "id, contract, amount_gross\n1, 5, 300.00";
        let acts = read_acts(data.as_bytes()).unwrap();
        assert_eq!(acts.len(), 1);
        assert_eq!(acts[0].contract_id, 5);
        assert_eq!(acts[0].unpaid_amount(), dec!(300.00));
    }

    #[test]
    fn test_read_acts_rejects_non_positive_gross() {
        let data = "id, contract, amount_gross\n1, 5, 0";
        assert!(matches!(
            read_acts(data.as_bytes()),
            Err(SettlementError::Validation(_))
        ));
    }
}
