//! Database query functions organized by domain.
//!
//! Every function takes a `&Connection`; callers pass a `Transaction`
//! (which derefs to one) when several statements must commit together.

pub mod businesses;
pub mod cards;
pub mod customers;
pub mod events;
pub mod passes;
pub mod promotions;
pub mod rewards;
pub mod staff;

use rusqlite::types::Type;

/// Decode a TEXT column through a closed-set parser.
pub(crate) fn parse_text<T>(
    idx: usize,
    value: String,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value '{value}'").into(),
        )
    })
}
