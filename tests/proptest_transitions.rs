//! Property-based tests for the subscription state machine
//!
//! These tests exercise `Subscription::apply` with arbitrary statuses,
//! events and clocks:
//! - Organic events only ever produce transitions the status table allows
//! - Every applied transition bumps the version and audits before/after
//! - Open periods never move backwards
//! - Overrides without a reason are always rejected

use proptest::prelude::*;

use tutorly::domain::foundation::{PlanId, StateMachine, SubscriptionId, Timestamp, UserId};
use tutorly::domain::subscription::{
    AdminOverride, OverrideGuard, Subscription, SubscriptionError, SubscriptionEvent,
    SubscriptionStatus,
};

// ============================================================================
// Strategies
// ============================================================================

fn arb_status() -> impl Strategy<Value = SubscriptionStatus> {
    prop::sample::select(SubscriptionStatus::ALL.to_vec())
}

/// Subscription in `status` whose period ends `end_offset_days` from `base`.
fn subscription(base: Timestamp, status: SubscriptionStatus, end_offset_days: i64) -> Subscription {
    let mut sub = Subscription::start_trial(
        SubscriptionId::new(),
        UserId::new("learner-prop").unwrap(),
        PlanId::new(),
        base.add_days(-60),
        7,
    )
    .subscription;
    sub.status = status;
    sub.current_period_end = base.add_days(end_offset_days);
    sub
}

/// Organic (non-admin) events with a payment end relative to the base time.
fn arb_organic_event(base: Timestamp) -> impl Strategy<Value = SubscriptionEvent> {
    prop_oneof![
        (-40i64..400).prop_map(move |days| SubscriptionEvent::PaymentVerified {
            plan_id: PlanId::new(),
            new_period_end: base.add_days(days),
            gateway_subscription_ref: None,
        }),
        Just(SubscriptionEvent::TrialExpired),
        Just(SubscriptionEvent::PeriodExpired),
        Just(SubscriptionEvent::UserCancel {
            user_id: UserId::new("learner-prop").unwrap(),
            reason: None,
        }),
        Just(SubscriptionEvent::GatewayPause { reason: None }),
    ]
}

fn base_time() -> Timestamp {
    Timestamp::now()
}

// ============================================================================
// Transition Properties
// ============================================================================

proptest! {
    /// Property: organic events land only on statuses the table allows
    #[test]
    fn prop_organic_transitions_follow_table(
        status in arb_status(),
        end_offset in -30i64..30,
        now_offset in -30i64..30,
        event in arb_organic_event(base_time()),
    ) {
        let base = base_time();
        let sub = subscription(base, status, end_offset);

        match sub.apply(&event, base.add_days(now_offset)) {
            Ok(transition) => {
                prop_assert!(status.can_transition_to(&transition.subscription.status));
                prop_assert_eq!(transition.subscription.version, sub.version + 1);
                prop_assert_eq!(transition.audit.before_status, Some(status));
                prop_assert_eq!(transition.audit.after_status, transition.subscription.status);
                prop_assert_eq!(transition.audit.action.as_str(), event.name());
            }
            Err(err) => {
                let is_illegal = matches!(err, SubscriptionError::IllegalTransition { .. });
                prop_assert!(is_illegal);
            }
        }
    }

    /// Property: a verified payment never shortens the paid period
    #[test]
    fn prop_payment_never_moves_period_back(
        status in prop::sample::select(vec![
            SubscriptionStatus::Trial,
            SubscriptionStatus::Active,
        ]),
        end_offset in -30i64..60,
        paid_until_offset in -60i64..400,
    ) {
        let base = base_time();
        let sub = subscription(base, status, end_offset);
        let event = SubscriptionEvent::PaymentVerified {
            plan_id: sub.plan_id,
            new_period_end: base.add_days(paid_until_offset),
            gateway_subscription_ref: None,
        };

        let transition = sub.apply(&event, base).unwrap();

        prop_assert_eq!(transition.subscription.status, SubscriptionStatus::Active);
        prop_assert!(!transition
            .subscription
            .current_period_end
            .is_before(&sub.current_period_end));
    }

    /// Property: terminal cancelled rows accept no organic event
    #[test]
    fn prop_cancelled_is_terminal_for_organic_events(
        end_offset in -30i64..30,
        event in arb_organic_event(base_time()),
    ) {
        let base = base_time();
        let sub = subscription(base, SubscriptionStatus::Cancelled, end_offset);

        prop_assert!(sub.apply(&event, base).is_err());
    }

    /// Property: expiry only fires once the period has elapsed
    #[test]
    fn prop_expiry_requires_elapsed_period(
        status in arb_status(),
        end_offset in -30i64..30,
    ) {
        let base = base_time();
        let sub = subscription(base, status, end_offset);

        if let Some(event) = sub.expiry_event() {
            let result = sub.apply(&event, base);
            prop_assert_eq!(result.is_ok(), sub.is_due_for_expiry(base));
            if let Ok(transition) = result {
                prop_assert_eq!(transition.subscription.status, SubscriptionStatus::Expired);
            }
        } else {
            prop_assert!(!sub.is_due_for_expiry(base));
        }
    }
}

// ============================================================================
// Override Properties
// ============================================================================

proptest! {
    /// Property: whitespace-only reasons never pass the override guard
    #[test]
    fn prop_blank_override_reason_rejected(
        status in arb_status(),
        target in arb_status(),
        reason in "[ \t\n]{0,8}",
    ) {
        let base = base_time();
        let sub = subscription(base, status, 10);
        let event = SubscriptionEvent::AdminOverride(AdminOverride {
            admin_id: UserId::new("admin-prop").unwrap(),
            target_status: target,
            target_plan_id: None,
            target_end_date: None,
            reason,
        });

        prop_assert_eq!(
            sub.apply(&event, base).unwrap_err(),
            SubscriptionError::OverrideRejected(OverrideGuard::MissingReason)
        );
    }

    /// Property: an override with a reason reaches any target status
    #[test]
    fn prop_reasoned_override_reaches_target(
        status in arb_status(),
        target in arb_status(),
    ) {
        let base = base_time();
        let sub = subscription(base, status, 10);
        let event = SubscriptionEvent::AdminOverride(AdminOverride {
            admin_id: UserId::new("admin-prop").unwrap(),
            target_status: target,
            target_plan_id: None,
            target_end_date: None,
            reason: "support ticket 4411".to_string(),
        });

        let transition = sub.apply(&event, base).unwrap();

        prop_assert_eq!(transition.subscription.status, target);
        prop_assert_eq!(transition.audit.reason.as_deref(), Some("support ticket 4411"));
        prop_assert_eq!(transition.subscription.current_period_end, sub.current_period_end);
    }
}
