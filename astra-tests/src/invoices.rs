use astra::{CqlClient, Entity, Fields, Session};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: String,
}

/// Mapped by convention: no declared table.
#[derive(Entity, Debug, Clone, Default, PartialEq)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub customer: String,
    pub total: Decimal,
    pub issued_at: Option<OffsetDateTime>,
    #[cql(converted)]
    pub billing_address: Address,
    pub lines: BTreeMap<String, i32>,
    #[cql(skip)]
    pub cached_total: Option<Decimal>,
}

pub fn invoice() -> Invoice {
    Invoice {
        invoice_id: Uuid::parse_str("c3c3c3c3-c3c3-c3c3-c3c3-c3c3c3c3c3c3").unwrap(),
        customer: "ACME".into(),
        total: Decimal::new(12_550, 2),
        issued_at: Some(datetime!(2025-03-01 12:00:00.125 UTC)),
        billing_address: Address {
            street: "1 Main Street".into(),
            city: "Springfield".into(),
            zip: "12345".into(),
        },
        lines: BTreeMap::from([("anvil".into(), 2), ("rope".into(), 10)]),
        cached_total: None,
    }
}

pub async fn invoices<S: Session>(client: &CqlClient<S>) {
    let mut invoice = invoice();
    let result = client.write_entity(None, &invoice, None).await;
    assert!(
        matches!(result, Ok(ref v) if v.success),
        "Failed to write the invoice: {:?}",
        result
    );

    let result = client
        .read_entities::<Invoice>(
            None,
            &Fields::new().with("invoice_id", invoice.invoice_id),
            None,
        )
        .await;
    assert!(result.is_ok(), "Failed to read invoices: {:?}", result.as_ref().err());
    assert_eq!(result.unwrap(), [invoice.clone()]);

    // Skipped fields are never written
    invoice.cached_total = Some(Decimal::ONE);
    let fields = client
        .map_to_fields(&invoice)
        .expect("Could not map the invoice");
    assert!(!fields.contains("cached_total"));
    assert_eq!(fields.len(), 6);
}
