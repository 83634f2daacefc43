use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Instrument entity - a tracked tradable symbol
///
/// Symbol is the business identity and is unique case-insensitively;
/// it is normalized to uppercase before it ever reaches storage.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::instruments)]
pub struct Instrument {
    /// Auto-incrementing ID
    pub id: i64,

    /// Ticker symbol (e.g., "AAPL", "GOOGL"), stored uppercase
    pub symbol: String,

    /// Human-readable company name
    pub name: String,

    /// Exchange the instrument trades on (optional)
    pub exchange: Option<String>,

    /// Timestamp when record was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when record was last updated
    pub updated_at: DateTime<Utc>,
}

/// New instrument for insertion
#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::instruments)]
pub struct NewInstrument {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewInstrument {
    /// Create a new instrument, normalizing the symbol to uppercase
    pub fn new(symbol: &str, name: &str, exchange: Option<&str>) -> Self {
        let now = Utc::now();
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name.to_string(),
            exchange: exchange.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instrument_normalizes_symbol() {
        let instrument = NewInstrument::new(" aapl ", "Apple Inc.", Some("NASDAQ"));

        assert_eq!(instrument.symbol, "AAPL");
        assert_eq!(instrument.name, "Apple Inc.");
        assert_eq!(instrument.exchange, Some("NASDAQ".to_string()));
        assert_eq!(instrument.created_at, instrument.updated_at);
    }

    #[test]
    fn test_new_instrument_without_exchange() {
        let instrument = NewInstrument::new("TSLA", "Tesla Inc.", None);

        assert_eq!(instrument.symbol, "TSLA");
        assert_eq!(instrument.exchange, None);
    }
}
