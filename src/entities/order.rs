use crate::entities::account::Entity as Account;
use base64::{engine::general_purpose::STANDARD, Engine};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub state: State,
    #[sea_orm(indexed)]
    pub account_id: i32,
    pub date: DateTimeUtc,
}

impl Model {
    /// Opaque external id: base64 of `"<id>|<date>"`.
    ///
    /// Anyone can decode it back, so it must never gate access on its own.
    pub fn opaque_id(&self) -> String {
        encode_order_id(self.id, &self.date.to_string())
    }
}

pub fn encode_order_id(id: i32, date: &str) -> String {
    STANDARD.encode(format!("{id}|{date}"))
}

/// Recovers the integer order id from an opaque id.
///
/// Returns `None` for anything that is not base64 text with an integer
/// before the first `|`. Spaces are read back as `+`, the way form decoding
/// mangles them.
pub fn decode_order_id(opaque: &str) -> Option<i32> {
    let bytes = STANDARD.decode(opaque.trim().replace(' ', "+")).ok()?;
    let key = String::from_utf8(bytes).ok()?;
    let (prefix, _) = key.split_once('|')?;
    prefix.parse().ok()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Account",
        from = "Column::AccountId",
        to = "crate::entities::account::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Account,
    #[sea_orm(has_many = "crate::entities::order_book::Entity")]
    OrderBook,
}

impl Related<crate::entities::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<crate::entities::order_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderBook.def()
    }
}

impl Related<crate::entities::book::Entity> for Entity {
    fn to() -> RelationDef {
        crate::entities::order_book::Relation::Book.def()
    }

    fn via() -> Option<RelationDef> {
        Some(crate::entities::order_book::Relation::Order.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "order_state_enum",
    db_type = "String(StringLen::N(20))",
    rs_type = "String"
)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[sea_orm(string_value = "u")]
    Unfinished,
    #[sea_orm(string_value = "p")]
    InProgress,
    #[sea_orm(string_value = "c")]
    Completed,
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unfinished" | "u" => Ok(Self::Unfinished),
            "in_progress" | "p" => Ok(Self::InProgress),
            "completed" | "c" => Ok(Self::Completed),
            _ => Err(format!("Invalid order state: {s}")),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unfinished => f.write_str("unfinished"),
            Self::InProgress => f.write_str("in_progress"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn opaque_id_round_trips() {
        let order = Model {
            id: 42,
            state: State::Unfinished,
            account_id: 1,
            date: Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap(),
        };
        let opaque = order.opaque_id();
        assert_ne!(opaque, "42");
        assert_eq!(decode_order_id(&opaque), Some(42));
    }

    #[test]
    fn encoding_matches_plain_base64() {
        assert_eq!(encode_order_id(7, "2020-01-01"), "N3wyMDIwLTAxLTAx");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_order_id("not base64!"), None);
        // "42" without a separator
        assert_eq!(decode_order_id(&STANDARD.encode("42")), None);
        assert_eq!(decode_order_id(&STANDARD.encode("abc|2020-01-01")), None);
    }

    #[test]
    fn decode_accepts_form_decoded_plus() {
        // "9|~~~" encodes to "OXx+fn4="
        assert_eq!(decode_order_id("OXx+fn4="), Some(9));
        assert_eq!(decode_order_id("OXx fn4="), Some(9));
    }

    #[test]
    fn decode_stops_at_first_separator() {
        assert_eq!(decode_order_id(&STANDARD.encode("12|a|b")), Some(12));
    }

    #[test]
    fn state_parses_codes_and_names() {
        assert_eq!("p".parse::<State>(), Ok(State::InProgress));
        assert_eq!("completed".parse::<State>(), Ok(State::Completed));
        assert!("shipped".parse::<State>().is_err());
    }
}
