use chrono::NaiveDate;
use emerald_core::{
    CounterpartyPatch, CounterpartyType, EmeraldLot, EmeraldLotPatch, LotStatus, NewCounterparty,
    NewEmeraldLot, NewTrade, TradePatch, TradeType,
};

#[test]
fn lot_create_payload_fills_defaults() {
    let lot: NewEmeraldLot =
        serde_json::from_str(r#"{"lot_code": "EM001", "carat": 2.5}"#).unwrap();

    assert_eq!(lot, NewEmeraldLot::new("EM001", 2.5));
    assert_eq!(lot.status, LotStatus::InStock);
}

#[test]
fn lot_patch_distinguishes_absent_null_and_value() {
    let patch: EmeraldLotPatch =
        serde_json::from_str(r#"{"origin": null, "shape": "Oval"}"#).unwrap();

    assert_eq!(patch.origin, Some(None));
    assert_eq!(patch.shape, Some(Some("Oval".to_string())));
    assert_eq!(patch.certificate_id, None);
    assert_eq!(patch.lot_code, None);
    assert!(!patch.is_empty());

    let empty: EmeraldLotPatch = serde_json::from_str("{}").unwrap();
    assert!(empty.is_empty());
}

#[test]
fn null_on_required_patch_fields_is_rejected() {
    for payload in [
        r#"{"lot_code": null}"#,
        r#"{"carat": null}"#,
        r#"{"status": null}"#,
    ] {
        let err = serde_json::from_str::<EmeraldLotPatch>(payload).unwrap_err();
        assert!(err.to_string().contains("must not be null"), "{payload}");
    }

    for payload in [r#"{"name": null}"#, r#"{"type": null}"#] {
        assert!(serde_json::from_str::<CounterpartyPatch>(payload).is_err(), "{payload}");
    }

    for payload in [
        r#"{"type": null}"#,
        r#"{"date": null}"#,
        r#"{"currency": null}"#,
        r#"{"unit_price": null}"#,
        r#"{"total_price": null}"#,
        r#"{"emerald_lot_id": null}"#,
        r#"{"counterparty_id": null}"#,
    ] {
        assert!(serde_json::from_str::<TradePatch>(payload).is_err(), "{payload}");
    }

    let patch: TradePatch = serde_json::from_str(r#"{"location": null}"#).unwrap();
    assert_eq!(patch.location, Some(None));
}

#[test]
fn status_tags_use_upper_case_names() {
    let patch: EmeraldLotPatch = serde_json::from_str(r#"{"status": "SOLD"}"#).unwrap();
    assert_eq!(patch.status, Some(LotStatus::Sold));

    let err = serde_json::from_str::<EmeraldLotPatch>(r#"{"status": "sold"}"#);
    assert!(err.is_err());
}

#[test]
fn counterparty_payload_reads_type_key() {
    let counterparty: NewCounterparty =
        serde_json::from_str(r#"{"name": "Gem House", "type": "BUYER"}"#).unwrap();
    assert_eq!(counterparty.kind, CounterpartyType::Buyer);
    assert_eq!(counterparty.country, None);

    let patch: CounterpartyPatch =
        serde_json::from_str(r#"{"type": "BOTH", "kyc_notes": null}"#).unwrap();
    assert_eq!(patch.kind, Some(CounterpartyType::Both));
    assert_eq!(patch.kyc_notes, Some(None));
    assert_eq!(patch.contact_info, None);
}

#[test]
fn trade_payload_parses_iso_date() {
    let trade: NewTrade = serde_json::from_str(
        r#"{
            "type": "PURCHASE",
            "date": "2024-01-01",
            "currency": "USD",
            "unit_price": 1000.0,
            "total_price": 2500.0,
            "emerald_lot_id": 1,
            "counterparty_id": 2
        }"#,
    )
    .unwrap();

    assert_eq!(trade.kind, TradeType::Purchase);
    assert_eq!(trade.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!(trade.location, None);
}

#[test]
fn lot_serializes_type_tags_and_nulls() {
    let lot = EmeraldLot {
        id: 7,
        lot_code: "EM007".to_string(),
        carat: 1.25,
        shape: None,
        color_grade: None,
        clarity: None,
        treatment: None,
        origin: Some("Zambia".to_string()),
        certificate_id: None,
        status: LotStatus::InStock,
    };

    let value = serde_json::to_value(&lot).unwrap();
    assert_eq!(value["status"], "IN_STOCK");
    assert_eq!(value["origin"], "Zambia");
    assert!(value["shape"].is_null());
}
