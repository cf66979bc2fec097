//! Price configuration. Amounts are decimal BRL as typed by operators.

use serde::Deserialize;

use crate::domain::access::Pricing;
use crate::domain::foundation::Money;
use crate::domain::settlement::AmountFloor;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    #[serde(default = "default_pix")]
    pub pix: f64,

    /// PIX price when the buyer signed up with an affiliate code
    #[serde(default = "default_pix_referred")]
    pub pix_referred: f64,

    #[serde(default = "default_card")]
    pub card: f64,

    /// Admin-issued coupon, PIX only
    #[serde(default = "default_coupon")]
    pub coupon: f64,

    #[serde(default = "default_subscription_monthly")]
    pub subscription_monthly: f64,

    /// Approved payments below `minimum_settlement - rounding_margin` are
    /// rejected as suspicious
    #[serde(default = "default_minimum_settlement")]
    pub minimum_settlement: f64,

    #[serde(default = "default_rounding_margin")]
    pub rounding_margin: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_coupon_validity_days")]
    pub coupon_validity_days: i64,
}

impl PricingConfig {
    /// Checkout prices for the access handlers.
    pub fn pricing(&self) -> Result<Pricing, ValidationError> {
        Ok(Pricing {
            pix: money(self.pix, "pricing.pix")?,
            pix_referred: money(self.pix_referred, "pricing.pix_referred")?,
            card: money(self.card, "pricing.card")?,
            coupon: money(self.coupon, "pricing.coupon")?,
            subscription_monthly: money(self.subscription_monthly, "pricing.subscription_monthly")?,
            currency: self.currency.clone(),
            coupon_validity_days: self.coupon_validity_days,
        })
    }

    /// Settlement floor for one-time payments.
    pub fn amount_floor(&self) -> Result<AmountFloor, ValidationError> {
        Ok(AmountFloor::new(
            money(self.minimum_settlement, "pricing.minimum_settlement")?,
            money(self.rounding_margin, "pricing.rounding_margin")?,
        ))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let pricing = self.pricing()?;
        let floor = self.amount_floor()?;
        if self.currency.trim().is_empty() {
            return Err(ValidationError::MissingRequired("PRICING__CURRENCY"));
        }
        if self.coupon_validity_days <= 0 {
            return Err(ValidationError::NotPositive("pricing.coupon_validity_days"));
        }
        // A configured checkout price below the floor would be rejected on settlement.
        for (name, price) in [
            ("pricing.pix", pricing.pix),
            ("pricing.pix_referred", pricing.pix_referred),
            ("pricing.card", pricing.card),
            ("pricing.coupon", pricing.coupon),
        ] {
            if !floor.accepts(Some(price)) {
                return Err(ValidationError::InvalidPrice(name));
            }
        }
        Ok(())
    }
}

fn money(value: f64, field: &'static str) -> Result<Money, ValidationError> {
    Money::from_decimal(value).map_err(|_| ValidationError::InvalidPrice(field))
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            pix: default_pix(),
            pix_referred: default_pix_referred(),
            card: default_card(),
            coupon: default_coupon(),
            subscription_monthly: default_subscription_monthly(),
            minimum_settlement: default_minimum_settlement(),
            rounding_margin: default_rounding_margin(),
            currency: default_currency(),
            coupon_validity_days: default_coupon_validity_days(),
        }
    }
}

fn default_pix() -> f64 {
    19.90
}

fn default_pix_referred() -> f64 {
    16.90
}

fn default_card() -> f64 {
    20.90
}

fn default_coupon() -> f64 {
    16.90
}

fn default_subscription_monthly() -> f64 {
    9.90
}

fn default_minimum_settlement() -> f64 {
    16.00
}

fn default_rounding_margin() -> f64 {
    0.01
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_coupon_validity_days() -> i64 {
    7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.pricing().unwrap(), Pricing::default());
        assert_eq!(config.amount_floor().unwrap().threshold().cents(), 1599);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_price_is_invalid() {
        let config = PricingConfig {
            card: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_price_below_floor_is_invalid() {
        let config = PricingConfig {
            coupon: 9.90,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPrice("pricing.coupon"))
        ));
    }
}
