use chrono::NaiveDate;
use emerald_core::db::{open_db_in_memory, open_db_in_memory_with, StoreOptions};
use emerald_core::{
    CounterpartyRepository, CounterpartyType, LotRepository, NewCounterparty, NewEmeraldLot,
    NewTrade, RepoError, SqliteCounterpartyRepository, SqliteLotRepository,
    SqliteTradeRepository, TradeListQuery, TradePatch, TradeRepository, TradeType,
};
use rusqlite::Connection;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let created = repo
        .create_trade(&sample_trade(TradeType::Purchase, lot_id, counterparty_id, 2500.0))
        .unwrap();
    assert!(created.id > 0);

    let loaded = repo.get_trade(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(loaded.currency, "USD");
    assert_eq!(loaded.total_price, 2500.0);
}

#[test]
fn dangling_reference_is_rejected_when_foreign_keys_enforced() {
    let conn = open_db_in_memory().unwrap();
    let (_, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let err = repo
        .create_trade(&sample_trade(TradeType::Sale, 9999, counterparty_id, 100.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(repo.list_trades(&TradeListQuery::default()).unwrap().is_empty());
}

#[test]
fn dangling_reference_is_stored_when_foreign_keys_disabled() {
    let conn = open_db_in_memory_with(&StoreOptions {
        enforce_foreign_keys: false,
        ..StoreOptions::default()
    })
    .unwrap();
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let created = repo
        .create_trade(&sample_trade(TradeType::Sale, 9999, 8888, 100.0))
        .unwrap();
    let loaded = repo.get_trade(created.id).unwrap().unwrap();
    assert_eq!(loaded.emerald_lot_id, 9999);
    assert_eq!(loaded.counterparty_id, 8888);
}

#[test]
fn deleting_referenced_lot_is_rejected_and_lot_survives() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let trades = SqliteTradeRepository::try_new(&conn).unwrap();
    let lots = SqliteLotRepository::try_new(&conn).unwrap();

    let trade = trades
        .create_trade(&sample_trade(TradeType::Purchase, lot_id, counterparty_id, 2500.0))
        .unwrap();

    let err = lots.delete_lot(lot_id).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(lots.get_lot(lot_id).unwrap().is_some());
    assert_eq!(trades.get_trade(trade.id).unwrap().unwrap(), trade);
}

#[test]
fn deleting_referenced_counterparty_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    SqliteTradeRepository::try_new(&conn)
        .unwrap()
        .create_trade(&sample_trade(TradeType::Sale, lot_id, counterparty_id, 3000.0))
        .unwrap();
    let counterparties = SqliteCounterpartyRepository::try_new(&conn).unwrap();

    let err = counterparties.delete_counterparty(counterparty_id).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(counterparties.get_counterparty(counterparty_id).unwrap().is_some());
}

#[test]
fn negative_price_is_stored_as_given() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let mut adjustment = sample_trade(TradeType::Purchase, lot_id, counterparty_id, -12.5);
    adjustment.unit_price = -5.0;
    let created = repo.create_trade(&adjustment).unwrap();

    let loaded = repo.get_trade(created.id).unwrap().unwrap();
    assert_eq!(loaded.unit_price, -5.0);
    assert_eq!(loaded.total_price, -12.5);
}

#[test]
fn non_finite_price_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let err = repo
        .create_trade(&sample_trade(TradeType::Sale, lot_id, counterparty_id, f64::INFINITY))
        .unwrap_err();
    assert!(
        matches!(err, RepoError::Validation(ref validation) if validation.field == "total_price")
    );
}

#[test]
fn partial_update_keeps_omitted_fields() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();
    let created = repo
        .create_trade(&sample_trade(TradeType::Sale, lot_id, counterparty_id, 3000.0))
        .unwrap();

    let patch = TradePatch {
        total_price: Some(3100.0),
        location: Some(Some("Bogota".to_string())),
        ..TradePatch::default()
    };
    let updated = repo.update_trade(created.id, &patch).unwrap().unwrap();

    assert_eq!(updated.total_price, 3100.0);
    assert_eq!(updated.location.as_deref(), Some("Bogota"));
    assert_eq!(updated.kind, created.kind);
    assert_eq!(updated.date, created.date);
    assert_eq!(updated.unit_price, created.unit_price);
    assert_eq!(updated.emerald_lot_id, created.emerald_lot_id);
    assert_eq!(updated.counterparty_id, created.counterparty_id);
}

#[test]
fn update_to_dangling_reference_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();
    let created = repo
        .create_trade(&sample_trade(TradeType::Sale, lot_id, counterparty_id, 3000.0))
        .unwrap();

    let patch = TradePatch {
        counterparty_id: Some(777),
        ..TradePatch::default()
    };
    let err = repo.update_trade(created.id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert_eq!(repo.get_trade(created.id).unwrap().unwrap(), created);
}

#[test]
fn delete_returns_prior_state_then_none() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();
    let created = repo
        .create_trade(&sample_trade(TradeType::Purchase, lot_id, counterparty_id, 2500.0))
        .unwrap();

    assert_eq!(repo.delete_trade(created.id).unwrap(), Some(created.clone()));
    assert!(repo.get_trade(created.id).unwrap().is_none());
    assert!(repo.delete_trade(created.id).unwrap().is_none());

    let lots = SqliteLotRepository::try_new(&conn).unwrap();
    assert!(lots.delete_lot(lot_id).unwrap().is_some());
}

#[test]
fn list_filters_by_type_lot_and_counterparty() {
    let conn = open_db_in_memory().unwrap();
    let (lot_id, counterparty_id) = seed_references(&conn);
    let other_lot = SqliteLotRepository::try_new(&conn)
        .unwrap()
        .create_lot(&NewEmeraldLot::new("EM002", 1.1))
        .unwrap();
    let repo = SqliteTradeRepository::try_new(&conn).unwrap();

    let purchase = repo
        .create_trade(&sample_trade(TradeType::Purchase, lot_id, counterparty_id, 2500.0))
        .unwrap();
    let sale = repo
        .create_trade(&sample_trade(TradeType::Sale, lot_id, counterparty_id, 3000.0))
        .unwrap();
    let other = repo
        .create_trade(&sample_trade(
            TradeType::Purchase,
            other_lot.id,
            counterparty_id,
            900.0,
        ))
        .unwrap();

    let sales = repo
        .list_trades(&TradeListQuery {
            kind: Some(TradeType::Sale),
            ..TradeListQuery::default()
        })
        .unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].id, sale.id);

    let on_lot = repo
        .list_trades(&TradeListQuery {
            emerald_lot_id: Some(lot_id),
            ..TradeListQuery::default()
        })
        .unwrap();
    let on_lot_ids: Vec<_> = on_lot.iter().map(|trade| trade.id).collect();
    assert_eq!(on_lot_ids, vec![purchase.id, sale.id]);

    let with_counterparty = repo
        .list_trades(&TradeListQuery {
            kind: Some(TradeType::Purchase),
            counterparty_id: Some(counterparty_id),
            ..TradeListQuery::default()
        })
        .unwrap();
    let with_counterparty_ids: Vec<_> = with_counterparty.iter().map(|trade| trade.id).collect();
    assert_eq!(with_counterparty_ids, vec![purchase.id, other.id]);
}

fn seed_references(conn: &Connection) -> (i64, i64) {
    let lot = SqliteLotRepository::try_new(conn)
        .unwrap()
        .create_lot(&NewEmeraldLot::new("EM001", 2.5))
        .unwrap();
    let counterparty = SqliteCounterpartyRepository::try_new(conn)
        .unwrap()
        .create_counterparty(&NewCounterparty::new(
            "Muzo Mining",
            CounterpartyType::Supplier,
        ))
        .unwrap();
    (lot.id, counterparty.id)
}

fn sample_trade(kind: TradeType, lot_id: i64, counterparty_id: i64, total_price: f64) -> NewTrade {
    NewTrade {
        kind,
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        currency: "USD".to_string(),
        unit_price: 1000.0,
        total_price,
        location: None,
        emerald_lot_id: lot_id,
        counterparty_id,
    }
}
