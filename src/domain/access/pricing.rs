//! Checkout prices.

use crate::domain::foundation::Money;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    /// PIX price for buyers without a referral.
    pub pix: Money,
    /// PIX price for buyers who signed up with an affiliate code.
    pub pix_referred: Money,
    pub card: Money,
    /// Admin-issued coupon, PIX only.
    pub coupon: Money,
    pub subscription_monthly: Money,
    pub currency: String,
    pub coupon_validity_days: i64,
}

impl Pricing {
    /// Price of a one-time checkout. The referral discount applies to PIX only.
    pub fn checkout_price(&self, pix: bool, referred: bool) -> Money {
        match (pix, referred) {
            (true, true) => self.pix_referred,
            (true, false) => self.pix,
            (false, _) => self.card,
        }
    }
}

impl Default for Pricing {
    fn default() -> Self {
        let cents = |c: i64| Money::from_cents(c).unwrap_or(Money::ZERO);
        Self {
            pix: cents(1990),
            pix_referred: cents(1690),
            card: cents(2090),
            coupon: cents(1690),
            subscription_monthly: cents(990),
            currency: "BRL".to_string(),
            coupon_validity_days: 7,
        }
    }
}
