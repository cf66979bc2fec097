/// What a notification did. Every variant is answered with `200 ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Topic not handled, no id, or no external reference.
    Ignored,
    /// Access granted for the first time.
    Approved,
    /// Access was already approved; nothing changed.
    AlreadyApproved,
    /// Gateway reported a rejected or cancelled payment.
    PaymentFailed,
    /// Payment status that requires no action (pending, in_process, ...).
    NoAction(String),
    /// Subscription status synced from the preapproval.
    SubscriptionUpdated,
    /// Preapproval status matched the stored subscription.
    SubscriptionUnchanged,
    /// Recurring charge extended the subscription period.
    RecurringPaymentRecorded,
    /// Recurring charge had already been applied.
    DuplicateRecurringPayment,
}
