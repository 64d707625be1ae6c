#![allow(dead_code)]

use rust_decimal::Decimal;
use settled::application::engine::SettlementEngine;
use settled::domain::account::Account;
use settled::domain::act::Act;
use settled::domain::money::{Amount, Balance};
use settled::domain::ports::{SettlementStore, SettlementStoreArc};
use settled::domain::request::NewPaymentRequest;
use settled::domain::{AccountId, ActId, ContractId};
use settled::infrastructure::in_memory::InMemoryStore;
use std::sync::Arc;

pub async fn engine_with(
    accounts: Vec<Account>,
    acts: Vec<Act>,
) -> (SettlementEngine, SettlementStoreArc) {
    let store: SettlementStoreArc = Arc::new(InMemoryStore::new());
    for account in accounts {
        store.insert_account(account).await.unwrap();
    }
    for act in acts {
        store.insert_act(act).await.unwrap();
    }
    (SettlementEngine::new(store.clone()), store)
}

pub fn account(id: AccountId, balance: Decimal) -> Account {
    Account::new(id, format!("acc{id}"), "RUB", Balance::new(balance))
}

pub fn act(id: ActId, contract: ContractId, gross: Decimal) -> Act {
    Act::new(id, contract, Amount::new(gross).unwrap())
}

pub fn new_request(amount: Decimal) -> NewPaymentRequest {
    NewPaymentRequest {
        category_id: 10,
        amount: Amount::new(amount).unwrap(),
        planned_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        contract_id: None,
        act_id: None,
        account_id: None,
        comment: None,
        created_by: "tests".to_string(),
    }
}

pub fn new_request_for_act(amount: Decimal, contract: ContractId, act: ActId) -> NewPaymentRequest {
    let mut new = new_request(amount);
    new.contract_id = Some(contract);
    new.act_id = Some(act);
    new
}
