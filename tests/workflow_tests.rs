mod common;

use common::{account, act, engine_with, new_request, new_request_for_act};
use rust_decimal_macros::dec;
use settled::domain::money::{Amount, Balance};
use settled::domain::ports::SettlementStore;
use settled::domain::request::RequestStatus;
use settled::error::SettlementError;

#[tokio::test]
async fn test_full_settlement_against_act() {
    // Account 1000.00, request 300.00 against an act of exactly 300.00.
    let (engine, store) = engine_with(
        vec![account(1, dec!(1000.00))],
        vec![act(1, 5, dec!(300.00))],
    )
    .await;

    let r1 = engine
        .create_request(new_request_for_act(dec!(300.00), 5, 1))
        .await
        .unwrap();
    let r1 = engine.approve_request(r1.id).await.unwrap();
    assert_eq!(r1.status, RequestStatus::Approved);

    let r1 = engine.pay_request(r1.id, 1).await.unwrap();
    assert_eq!(r1.status, RequestStatus::Paid);
    let payment_id = r1.payment_id.expect("paid request carries a payment id");

    assert_eq!(
        engine.ledger().balance(1).await.unwrap(),
        (Balance::new(dec!(700.00)), 1)
    );
    assert_eq!(engine.act_unpaid_amount(1).await.unwrap(), dec!(0.00));

    let payment = store.payment(payment_id).await.unwrap().unwrap();
    assert_eq!(payment.request_id, r1.id);
    assert_eq!(payment.account_id, 1);
    assert_eq!(payment.amount, Amount::new(dec!(300.00)).unwrap());
    assert_eq!(payment.act_id, Some(1));
}

#[tokio::test]
async fn test_cancel_from_planned_touches_nothing() {
    let (engine, _store) = engine_with(vec![account(1, dec!(500.00))], vec![]).await;

    let r2 = engine.create_request(new_request(dec!(50.00))).await.unwrap();
    let r2 = engine
        .cancel_request(r2.id, Some("duplicate".to_string()))
        .await
        .unwrap();

    assert_eq!(r2.status, RequestStatus::Cancelled);
    assert_eq!(r2.cancel_reason.as_deref(), Some("duplicate"));
    assert_eq!(r2.payment_id, None);
    assert_eq!(
        engine.ledger().balance(1).await.unwrap(),
        (Balance::new(dec!(500.00)), 0)
    );
}

#[tokio::test]
async fn test_insufficient_funds_leaves_request_approved() {
    let (engine, store) = engine_with(vec![account(2, dec!(100.00))], vec![]).await;

    let r3 = engine.create_request(new_request(dec!(150.00))).await.unwrap();
    engine.approve_request(r3.id).await.unwrap();

    let result = engine.pay_request(r3.id, 2).await;
    assert!(matches!(
        result,
        Err(SettlementError::InsufficientFunds { account: 2, .. })
    ));

    let r3 = engine.get_request(r3.id).await.unwrap();
    assert_eq!(r3.status, RequestStatus::Approved);
    assert_eq!(r3.payment_id, None);
    assert_eq!(
        engine.ledger().balance(2).await.unwrap(),
        (Balance::new(dec!(100.00)), 0)
    );
    // No payment record was written.
    assert!(store.payment(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_over_allocation_aborts_whole_payment() {
    // Act of 200.00 with 150.00 already allocated leaves 50.00 unpaid; an
    // 80.00 payment against it must fail without any ledger effect.
    let (engine, store) = engine_with(vec![account(1, dec!(1000.00))], vec![]).await;
    let mut a2 = act(2, 5, dec!(200.00));
    a2.allocate(
        99,
        Amount::new(dec!(150.00)).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
    )
    .unwrap();
    store.insert_act(a2).await.unwrap();

    let r4 = engine
        .create_request(new_request_for_act(dec!(80.00), 5, 2))
        .await
        .unwrap();
    engine.approve_request(r4.id).await.unwrap();

    let result = engine.pay_request(r4.id, 1).await;
    assert!(matches!(
        result,
        Err(SettlementError::OverAllocation { act: 2, .. })
    ));

    let r4 = engine.get_request(r4.id).await.unwrap();
    assert_eq!(r4.status, RequestStatus::Approved);
    assert_eq!(
        engine.ledger().balance(1).await.unwrap(),
        (Balance::new(dec!(1000.00)), 0)
    );
    assert_eq!(engine.act_unpaid_amount(2).await.unwrap(), dec!(50.00));
    assert!(store.payment(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_pay_is_not_repeatable() {
    let (engine, _store) = engine_with(vec![account(1, dec!(1000.00))], vec![]).await;

    let r = engine.create_request(new_request(dec!(300.00))).await.unwrap();
    engine.approve_request(r.id).await.unwrap();
    engine.pay_request(r.id, 1).await.unwrap();

    let result = engine.pay_request(r.id, 1).await;
    assert!(matches!(
        result,
        Err(SettlementError::InvalidTransition {
            status: RequestStatus::Paid,
            ..
        })
    ));
    // The account was debited exactly once.
    assert_eq!(
        engine.ledger().balance(1).await.unwrap(),
        (Balance::new(dec!(700.00)), 1)
    );
}

#[tokio::test]
async fn test_balance_conservation_over_many_payments() {
    let (engine, _store) = engine_with(vec![account(1, dec!(100.00))], vec![]).await;

    let mut paid_total = dec!(0);
    for amount in [dec!(10.00), dec!(25.50), dec!(0.50)] {
        let r = engine.create_request(new_request(amount)).await.unwrap();
        engine.approve_request(r.id).await.unwrap();
        engine.pay_request(r.id, 1).await.unwrap();
        paid_total += amount;
    }

    let (balance, version) = engine.ledger().balance(1).await.unwrap();
    assert_eq!(balance, Balance::new(dec!(100.00) - paid_total));
    assert_eq!(version, 3);
}

#[tokio::test]
async fn test_concurrent_pay_debits_exactly_once() {
    let (engine, store) = engine_with(vec![account(1, dec!(1000.00))], vec![]).await;

    let r = engine.create_request(new_request(dec!(300.00))).await.unwrap();
    engine.approve_request(r.id).await.unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let id = r.id;
    let h1 = tokio::spawn(async move { e1.pay_request(id, 1).await });
    let h2 = tokio::spawn(async move { e2.pay_request(id, 1).await });
    let (r1, r2) = (h1.await.unwrap(), h2.await.unwrap());

    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one pay call must win");
    for result in [r1, r2] {
        if let Err(e) = result {
            assert!(
                matches!(
                    e,
                    SettlementError::ConcurrentModification { .. }
                        | SettlementError::InvalidTransition { .. }
                ),
                "unexpected loser error: {e}"
            );
        }
    }

    // The account was debited exactly once and exactly one payment row
    // exists, regardless of which attempt reserved which payment id.
    let (balance, _) = engine.ledger().balance(1).await.unwrap();
    assert_eq!(balance, Balance::new(dec!(700.00)));
    let mut payment_rows = 0;
    for payment_id in 1..=2 {
        if store.payment(payment_id).await.unwrap().is_some() {
            payment_rows += 1;
        }
    }
    assert_eq!(payment_rows, 1);

    let request = engine.get_request(id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Paid);
}

#[tokio::test]
async fn test_unrelated_accounts_do_not_conflict() {
    let (engine, _store) = engine_with(
        vec![account(1, dec!(100.00)), account(2, dec!(100.00))],
        vec![],
    )
    .await;

    let ra = engine.create_request(new_request(dec!(40.00))).await.unwrap();
    let rb = engine.create_request(new_request(dec!(60.00))).await.unwrap();
    engine.approve_request(ra.id).await.unwrap();
    engine.approve_request(rb.id).await.unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let (res_a, res_b) = tokio::join!(e1.pay_request(ra.id, 1), e2.pay_request(rb.id, 2));
    res_a.unwrap();
    res_b.unwrap();

    assert_eq!(
        engine.ledger().balance(1).await.unwrap().0,
        Balance::new(dec!(60.00))
    );
    assert_eq!(
        engine.ledger().balance(2).await.unwrap().0,
        Balance::new(dec!(40.00))
    );
}

#[tokio::test]
async fn test_unknown_request() {
    let (engine, _store) = engine_with(vec![], vec![]).await;
    assert!(matches!(
        engine.approve_request(9).await,
        Err(SettlementError::NotFound {
            entity: "payment request",
            id: 9
        })
    ));
}
