//! Affiliate commission crediting for an approved purchase.

use std::sync::Arc;

use crate::application::handlers::EventRecorder;
use crate::domain::foundation::{DomainError, Money, SubjectId, Timestamp, UserId};
use crate::domain::referral::{distinct_total, ReferralCommission};
use crate::domain::settlement::AccessEvent;
use crate::ports::{CommissionLedger, ProfileRepository, SaveResult};

/// Credits the buyer's affiliate, at most once per (affiliate, buyer, subject).
pub struct CommissionCrediting {
    profiles: Arc<dyn ProfileRepository>,
    commissions: Arc<dyn CommissionLedger>,
    recorder: Arc<EventRecorder>,
}

impl CommissionCrediting {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        commissions: Arc<dyn CommissionLedger>,
        recorder: Arc<EventRecorder>,
    ) -> Self {
        Self {
            profiles,
            commissions,
            recorder,
        }
    }

    /// Returns the new commission, or `None` when nothing was owed or it
    /// had already been credited.
    pub async fn credit(
        &self,
        referred_user_id: &UserId,
        subject_id: &SubjectId,
        sale_amount: Money,
        now: Timestamp,
    ) -> Result<Option<ReferralCommission>, DomainError> {
        let Some(code) = self
            .profiles
            .find(referred_user_id)
            .await?
            .and_then(|p| p.referred_by)
        else {
            return Ok(None);
        };

        let Some(affiliate) = self.profiles.find_by_referral_code(&code).await? else {
            tracing::warn!(
                referred_user_id = %referred_user_id,
                referral_code = %code,
                "Referral code has no owner, skipping commission"
            );
            return Ok(None);
        };
        let affiliate_id = affiliate.user_id;
        if &affiliate_id == referred_user_id {
            tracing::warn!(user_id = %referred_user_id, "Self-referral, skipping commission");
            return Ok(None);
        }

        if self
            .commissions
            .exists(&affiliate_id, referred_user_id, subject_id)
            .await?
        {
            tracing::info!(
                affiliate_user_id = %affiliate_id,
                referred_user_id = %referred_user_id,
                subject_id = %subject_id,
                "Commission already credited"
            );
            return Ok(None);
        }

        let previous = self.commissions.referred_users(&affiliate_id).await?;
        let distinct = distinct_total(&previous, referred_user_id);
        let commission = ReferralCommission::compute(
            affiliate_id.clone(),
            referred_user_id.clone(),
            subject_id.clone(),
            sale_amount,
            distinct,
            now,
        );

        if self.commissions.insert(&commission).await? == SaveResult::AlreadyExists {
            // Lost a race with a concurrent delivery of the same payment.
            return Ok(None);
        }

        tracing::info!(
            affiliate_user_id = %affiliate_id,
            referred_user_id = %referred_user_id,
            subject_id = %subject_id,
            percent = commission.commission_percent,
            amount = %commission.commission_amount,
            "Affiliate commission credited"
        );

        self.recorder
            .record(
                Some(&affiliate_id),
                AccessEvent::AffiliateCommission {
                    affiliate_user_id: affiliate_id.clone(),
                    referred_user_id: referred_user_id.clone(),
                    subject_id: subject_id.clone(),
                    sale_amount,
                    commission_percent: commission.commission_percent,
                    commission_amount: commission.commission_amount,
                },
                now,
            )
            .await;

        Ok(Some(commission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCommissionLedger, InMemoryEventLog, InMemoryProfileRepository,
        RecordingEmailSender,
    };
    use crate::domain::foundation::ReferralCode;
    use crate::ports::Profile;

    struct Fixture {
        crediting: CommissionCrediting,
        profiles: Arc<InMemoryProfileRepository>,
        ledger: Arc<InMemoryCommissionLedger>,
        events: Arc<InMemoryEventLog>,
    }

    fn fixture() -> Fixture {
        let profiles = Arc::new(InMemoryProfileRepository::new());
        let ledger = Arc::new(InMemoryCommissionLedger::new());
        let events = Arc::new(InMemoryEventLog::new());
        let recorder = Arc::new(EventRecorder::new(
            events.clone(),
            Arc::new(RecordingEmailSender::new()),
            None,
        ));
        Fixture {
            crediting: CommissionCrediting::new(profiles.clone(), ledger.clone(), recorder),
            profiles,
            ledger,
            events,
        }
    }

    fn profile(id: &str, referred_by: Option<&str>, code: Option<&str>) -> Profile {
        Profile {
            user_id: UserId::new(id).unwrap(),
            email: None,
            name: None,
            referred_by: referred_by.map(|c| ReferralCode::new(c).unwrap()),
            referral_code: code.map(|c| ReferralCode::new(c).unwrap()),
            is_admin: false,
            is_vip: false,
        }
    }

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn go() -> SubjectId {
        SubjectId::new("go").unwrap()
    }

    fn reais(cents: i64) -> Money {
        Money::from_cents(cents).unwrap()
    }

    #[tokio::test]
    async fn first_referral_earns_ten_percent() {
        let f = fixture();
        f.profiles.insert(profile("aff", None, Some("AFF"))).await;
        f.profiles.insert(profile("buyer", Some("AFF"), None)).await;

        let commission = f
            .crediting
            .credit(&uid("buyer"), &go(), reais(1990), Timestamp::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(commission.affiliate_user_id, uid("aff"));
        assert_eq!(commission.commission_percent, 10);
        assert_eq!(commission.commission_amount.cents(), 199);
        assert_eq!(f.events.count_of("affiliate_commission").await, 1);
    }

    #[tokio::test]
    async fn second_credit_for_same_subject_is_skipped() {
        let f = fixture();
        f.profiles.insert(profile("aff", None, Some("AFF"))).await;
        f.profiles.insert(profile("buyer", Some("AFF"), None)).await;
        let now = Timestamp::now();

        f.crediting.credit(&uid("buyer"), &go(), reais(1990), now).await.unwrap();
        let again = f.crediting.credit(&uid("buyer"), &go(), reais(1990), now).await.unwrap();

        assert!(again.is_none());
        assert_eq!(f.ledger.all().await.len(), 1);
    }

    #[tokio::test]
    async fn sixth_distinct_referral_moves_to_twenty_percent() {
        let f = fixture();
        f.profiles.insert(profile("aff", None, Some("AFF"))).await;
        let now = Timestamp::now();
        for i in 0..5 {
            let id = format!("b{}", i);
            f.profiles.insert(profile(&id, Some("AFF"), None)).await;
            f.crediting.credit(&uid(&id), &go(), reais(1000), now).await.unwrap();
        }
        f.profiles.insert(profile("b5", Some("AFF"), None)).await;

        let sixth = f
            .crediting
            .credit(&uid("b5"), &go(), reais(1000), now)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sixth.commission_percent, 20);
        assert_eq!(sixth.commission_amount.cents(), 200);
    }

    #[tokio::test]
    async fn unreferred_and_orphaned_buyers_earn_nothing() {
        let f = fixture();
        f.profiles.insert(profile("plain", None, None)).await;
        f.profiles.insert(profile("orphan", Some("GONE"), None)).await;
        let now = Timestamp::now();

        assert!(f.crediting.credit(&uid("plain"), &go(), reais(1990), now).await.unwrap().is_none());
        assert!(f.crediting.credit(&uid("orphan"), &go(), reais(1990), now).await.unwrap().is_none());
        assert!(f.crediting.credit(&uid("nobody"), &go(), reais(1990), now).await.unwrap().is_none());
        assert!(f.ledger.all().await.is_empty());
    }

    #[tokio::test]
    async fn self_referral_is_skipped() {
        let f = fixture();
        f.profiles.insert(profile("me", Some("ME"), Some("ME"))).await;

        let result = f
            .crediting
            .credit(&uid("me"), &go(), reais(1990), Timestamp::now())
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
