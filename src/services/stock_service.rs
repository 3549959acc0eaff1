use bigdecimal::BigDecimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::external::quote_provider::{PricePoint, QuoteProvider, QuoteProviderError, SymbolMatch};
use crate::models::{CreateHolding, Holding};

/// A buy with the missing member of the (shares, amount, price) triple
/// filled in. amount = shares × price whenever shares is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBuy {
    pub shares: BigDecimal,
    pub amount_invested: Option<BigDecimal>,
    pub price_bought_at: Option<BigDecimal>,
}

pub fn normalize_buy(
    shares: BigDecimal,
    amount_invested: Option<BigDecimal>,
    price_bought_at: Option<BigDecimal>,
) -> Result<NormalizedBuy, AppError> {
    if shares < BigDecimal::from(0) {
        return Err(AppError::Validation("Share count cannot be negative".into()));
    }
    if amount_invested.is_none() && price_bought_at.is_none() {
        return Err(AppError::Validation(
            "Either amount_invested or price_bought_at is required".into(),
        ));
    }

    let positive_shares = shares > BigDecimal::from(0);

    let amount_invested = amount_invested.or_else(|| {
        price_bought_at
            .as_ref()
            .map(|price| price * &shares)
    });

    let price_bought_at = price_bought_at.or_else(|| {
        if positive_shares {
            amount_invested.as_ref().map(|amount| amount / &shares)
        } else {
            None
        }
    });

    Ok(NormalizedBuy {
        shares,
        amount_invested,
        price_bought_at,
    })
}

/// Record a buy: create the holding, or merge into an existing position for
/// the same symbol by accumulating shares and cost and re-averaging price.
pub async fn add_stock(
    pool: &PgPool,
    user_id: Uuid,
    input: CreateHolding,
) -> Result<Holding, AppError> {
    let symbol = input.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Symbol cannot be empty".into()));
    }
    if input.company_name.trim().is_empty() {
        return Err(AppError::Validation("Company name cannot be empty".into()));
    }

    let buy = normalize_buy(input.shares, input.amount_invested, input.price_bought_at)?;

    match db::holding_queries::find_by_user_and_symbol(pool, user_id, &symbol).await? {
        Some(existing) => {
            let shares = &existing.shares + &buy.shares;
            let amount = match (existing.amount_invested, buy.amount_invested) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
            let price = match (&amount, shares > BigDecimal::from(0)) {
                (Some(total), true) => Some(total / &shares),
                _ => existing.price_bought_at,
            };

            info!("Merging repeat buy of {} for user {}", symbol, user_id);
            db::holding_queries::update_position(pool, existing.id, shares, amount, price)
                .await?
                .ok_or_else(|| AppError::NotFound("Holding disappeared during update".into()))
        }
        None => {
            let holding = Holding::new(
                user_id,
                symbol,
                input.company_name.trim().to_string(),
                buy.shares,
                buy.amount_invested,
                buy.price_bought_at,
            );
            Ok(db::holding_queries::insert(pool, holding).await?)
        }
    }
}

pub async fn remove_stock(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    match db::holding_queries::delete_for_user(pool, user_id, id).await? {
        0 => Err(AppError::NotFound("Holding not found".into())),
        _ => Ok(()),
    }
}

pub async fn get_portfolio(pool: &PgPool, user_id: Uuid) -> Result<Vec<Holding>, AppError> {
    Ok(db::holding_queries::list_for_user(pool, user_id).await?)
}

pub async fn get_price(
    quotes: &dyn QuoteProvider,
    symbol: &str,
) -> Result<PricePoint, AppError> {
    match quotes.latest_quote(symbol).await {
        Ok(quote) => Ok(quote),
        Err(QuoteProviderError::RateLimited) => Err(AppError::RateLimited),
        Err(QuoteProviderError::UnknownSymbol(s)) => {
            Err(AppError::NotFound(format!("No quote for symbol {}", s)))
        }
        Err(e) => Err(AppError::External(e.to_string())),
    }
}

pub async fn search_symbols(
    quotes: &dyn QuoteProvider,
    keyword: &str,
) -> Result<Vec<SymbolMatch>, AppError> {
    if keyword.trim().is_empty() {
        return Err(AppError::Validation("Search keyword cannot be empty".into()));
    }
    match quotes.search_symbols(keyword).await {
        Ok(matches) => Ok(matches),
        Err(QuoteProviderError::RateLimited) => Err(AppError::RateLimited),
        Err(e) => Err(AppError::External(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_derives_amount_from_price() {
        let buy = normalize_buy(dec("10"), None, Some(dec("100.00"))).unwrap();
        assert_eq!(buy.amount_invested, Some(dec("1000.00")));
        assert_eq!(buy.price_bought_at, Some(dec("100.00")));
    }

    #[test]
    fn test_normalize_derives_price_from_amount() {
        let buy = normalize_buy(dec("4"), Some(dec("500.00")), None).unwrap();
        assert_eq!(buy.price_bought_at, Some(dec("125.00")));
    }

    #[test]
    fn test_normalize_keeps_both_when_given() {
        let buy = normalize_buy(dec("10"), Some(dec("990.00")), Some(dec("100.00"))).unwrap();
        assert_eq!(buy.amount_invested, Some(dec("990.00")));
        assert_eq!(buy.price_bought_at, Some(dec("100.00")));
    }

    #[test]
    fn test_normalize_requires_amount_or_price() {
        assert!(normalize_buy(dec("10"), None, None).is_err());
    }

    #[test]
    fn test_normalize_rejects_negative_shares() {
        assert!(normalize_buy(dec("-1"), Some(dec("100")), None).is_err());
    }

    #[test]
    fn test_normalize_zero_shares_cannot_derive_price() {
        let buy = normalize_buy(dec("0"), Some(dec("100.00")), None).unwrap();
        assert_eq!(buy.price_bought_at, None);
        assert_eq!(buy.amount_invested, Some(dec("100.00")));
    }
}
