use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One user's position in one traded symbol. shares and at least one of
// (amount_invested, price_bought_at) are kept consistent at write time;
// the missing member of the triple is derived from the other two.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub company_name: String,
    pub shares: BigDecimal,
    pub amount_invested: Option<BigDecimal>,
    pub price_bought_at: Option<BigDecimal>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHolding {
    pub symbol: String,
    pub company_name: String,
    pub shares: BigDecimal,
    pub amount_invested: Option<BigDecimal>,
    pub price_bought_at: Option<BigDecimal>,
}

impl Holding {
    pub fn new(
        user_id: Uuid,
        symbol: String,
        company_name: String,
        shares: BigDecimal,
        amount_invested: Option<BigDecimal>,
        price_bought_at: Option<BigDecimal>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol,
            company_name,
            shares,
            amount_invested,
            price_bought_at,
            added_at: Utc::now(),
        }
    }
}
