//! Dashboard arithmetic over a user's subscriptions. Everything here is pure:
//! callers load the rows and pass `today`.

use crate::db::models::{Currency, SubscriptionWithDetails, UserTotals};
use crate::types::currency::{PRIMARY_CURRENCY_CODE, format_currency, format_currency_short};
use crate::types::dates::{add_days, days_until, days_until_label, format_long, format_short};
use crate::types::{BillingCycleType, calculate_yearly_projection, convert_to_monthly};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_UPCOMING_WINDOW_DAYS: i64 = 30;
/// Widest renewal window a caller may ask for (about ten years).
pub const MAX_UPCOMING_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BreakdownEntry {
    pub subscription_id: String,
    pub name: String,
    pub amount: f64,
    pub billing_cycle: BillingCycleType,
    pub monthly_amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MonthlyTotal {
    pub total: f64,
    pub currency: Option<Currency>,
    pub breakdown: Vec<BreakdownEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentDue {
    pub subscription_id: String,
    pub name: String,
    pub amount: f64,
    pub currency: Currency,
    pub next_billing_date: NaiveDate,
    pub days_until_payment: i64,
    pub days_until_label: String,
    pub formatted_date: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub active_subscriptions: usize,
    pub monthly_total: MonthlyTotal,
    pub yearly_projection: f64,
    pub formatted_monthly_total: Option<String>,
    pub formatted_yearly_projection: Option<String>,
    /// `7.2K lei`-style yearly figure for compact cards.
    pub compact_yearly_projection: Option<String>,
    pub next_payment: Option<PaymentDue>,
    pub upcoming_renewals: Vec<PaymentDue>,
    pub savings_insights: Vec<String>,
}

struct CurrencyGroup {
    currency: Currency,
    total: f64,
    breakdown: Vec<BreakdownEntry>,
}

/// Sum the monthly equivalents of active subscriptions per currency and pick
/// one group for display: the primary currency when present, otherwise the
/// first currency encountered.
pub fn calculate_monthly_total(subs: &[SubscriptionWithDetails]) -> MonthlyTotal {
    let mut groups: Vec<CurrencyGroup> = Vec::new();

    for sub in subs.iter().filter(|s| s.is_active()) {
        let monthly_amount =
            convert_to_monthly(sub.subscription.amount, sub.billing_cycle.cycle_type);
        let entry = BreakdownEntry {
            subscription_id: sub.subscription.id.clone(),
            name: sub.subscription.name.clone(),
            amount: sub.subscription.amount,
            billing_cycle: sub.billing_cycle.cycle_type,
            monthly_amount,
        };
        match groups
            .iter_mut()
            .find(|g| g.currency.code == sub.currency.code)
        {
            Some(group) => {
                group.total += monthly_amount;
                group.breakdown.push(entry);
            }
            None => groups.push(CurrencyGroup {
                currency: sub.currency.clone(),
                total: monthly_amount,
                breakdown: vec![entry],
            }),
        }
    }

    let primary = groups
        .iter()
        .position(|g| g.currency.code == PRIMARY_CURRENCY_CODE)
        .unwrap_or(0);
    if groups.is_empty() {
        return MonthlyTotal::default();
    }
    let group = groups.swap_remove(primary);
    MonthlyTotal {
        total: group.total,
        currency: Some(group.currency),
        breakdown: group.breakdown,
    }
}

fn payment_due(sub: &SubscriptionWithDetails, today: NaiveDate, long: bool) -> PaymentDue {
    let date = sub.subscription.next_billing_date;
    PaymentDue {
        subscription_id: sub.subscription.id.clone(),
        name: sub.subscription.name.clone(),
        amount: sub.subscription.amount,
        currency: sub.currency.clone(),
        next_billing_date: date,
        days_until_payment: days_until(date, today),
        days_until_label: days_until_label(date, today),
        formatted_date: if long {
            format_long(date)
        } else {
            format_short(date)
        },
    }
}

/// The active subscription with the earliest renewal date.
pub fn get_next_payment(subs: &[SubscriptionWithDetails], today: NaiveDate) -> Option<PaymentDue> {
    subs.iter()
        .filter(|s| s.is_active())
        .min_by_key(|s| s.subscription.next_billing_date)
        .map(|s| payment_due(s, today, true))
}

/// Active subscriptions renewing within `window_days` of `today` (overdue
/// ones included), soonest first. The window is clamped to
/// `0..=MAX_UPCOMING_WINDOW_DAYS`.
pub fn get_upcoming_renewals(
    subs: &[SubscriptionWithDetails],
    today: NaiveDate,
    window_days: i64,
) -> Vec<PaymentDue> {
    let window = window_days.clamp(0, MAX_UPCOMING_WINDOW_DAYS);
    let horizon = add_days(today, window).unwrap_or(NaiveDate::MAX);
    let mut renewals: Vec<PaymentDue> = subs
        .iter()
        .filter(|s| s.is_active() && s.subscription.next_billing_date <= horizon)
        .map(|s| payment_due(s, today, false))
        .collect();
    renewals.sort_by_key(|p| p.days_until_payment);
    renewals
}

pub fn generate_savings_insights(yearly_projection: f64, currency: &Currency) -> Vec<String> {
    if yearly_projection <= 0.0 {
        return Vec::new();
    }
    let tier = if yearly_projection > 1200.0 {
        "💡 Consider reviewing subscriptions quarterly to optimize spending"
    } else if yearly_projection > 600.0 {
        "💡 You're spending moderately on subscriptions"
    } else {
        "💡 Great job keeping subscription costs low!"
    };
    vec![
        format!(
            "You could save {} yearly by cutting 10%",
            format_currency(yearly_projection * 0.1, currency)
        ),
        format!(
            "That's {} if you optimize 20% of subscriptions",
            format_currency(yearly_projection * 0.2, currency)
        ),
        tier.to_string(),
    ]
}

pub fn build_summary(
    subs: &[SubscriptionWithDetails],
    today: NaiveDate,
    window_days: i64,
) -> DashboardSummary {
    let monthly_total = calculate_monthly_total(subs);
    let yearly_projection = calculate_yearly_projection(monthly_total.total);
    let currency = monthly_total.currency.as_ref();
    let formatted_monthly_total = currency.map(|c| format_currency(monthly_total.total, c));
    let formatted_yearly_projection = currency.map(|c| format_currency(yearly_projection, c));
    let compact_yearly_projection = currency.map(|c| format_currency_short(yearly_projection, c));
    let savings_insights = currency
        .map(|c| generate_savings_insights(yearly_projection, c))
        .unwrap_or_default();

    DashboardSummary {
        active_subscriptions: subs.iter().filter(|s| s.is_active()).count(),
        monthly_total,
        yearly_projection,
        formatted_monthly_total,
        formatted_yearly_projection,
        compact_yearly_projection,
        next_payment: get_next_payment(subs, today),
        upcoming_renewals: get_upcoming_renewals(subs, today, window_days),
        savings_insights,
    }
}

/// Aggregate totals over every active subscription regardless of currency.
pub fn calculate_user_totals(subs: &[SubscriptionWithDetails]) -> UserTotals {
    let active: Vec<&SubscriptionWithDetails> = subs.iter().filter(|s| s.is_active()).collect();
    let monthly_total: f64 = active
        .iter()
        .map(|s| convert_to_monthly(s.subscription.amount, s.billing_cycle.cycle_type))
        .sum();
    let next = active
        .iter()
        .min_by_key(|s| s.subscription.next_billing_date);

    UserTotals {
        monthly_total,
        yearly_projection: calculate_yearly_projection(monthly_total),
        active_subscriptions: active.len() as i64,
        next_payment_date: next.map(|s| s.subscription.next_billing_date),
        next_payment_amount: next.map(|s| s.subscription.amount),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{currency, sub};
    use super::*;
    use crate::types::SubscriptionStatus::{Active, Cancelled, Paused};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn empty_input_has_no_currency() {
        let total = calculate_monthly_total(&[]);
        assert_eq!(total.total, 0.0);
        assert!(total.currency.is_none());
        assert!(total.breakdown.is_empty());
    }

    #[test]
    fn inactive_only_counts_as_empty() {
        let ron = currency("RON", "lei");
        let subs = vec![sub("Netflix", 50.0, BillingCycleType::Monthly, ron, d(2026, 11, 1), Paused)];
        assert_eq!(calculate_monthly_total(&subs), MonthlyTotal::default());
    }

    #[test]
    fn prefers_primary_currency_group() {
        let usd = currency("USD", "$");
        let ron = currency("RON", "lei");
        let subs = vec![
            sub("Figma", 15.0, BillingCycleType::Monthly, usd.clone(), d(2026, 11, 1), Active),
            sub("Netflix", 60.0, BillingCycleType::Monthly, ron.clone(), d(2026, 11, 2), Active),
            sub("Office", 120.0, BillingCycleType::Yearly, ron.clone(), d(2026, 12, 1), Active),
            sub("Old", 99.0, BillingCycleType::Monthly, ron.clone(), d(2026, 10, 1), Cancelled),
        ];
        let total = calculate_monthly_total(&subs);
        assert_eq!(total.currency.unwrap().code, "RON");
        assert_eq!(total.total, 70.0);
        assert_eq!(total.breakdown.len(), 2);
    }

    #[test]
    fn falls_back_to_first_seen_currency() {
        let usd = currency("USD", "$");
        let eur = currency("EUR", "€");
        let subs = vec![
            sub("A", 7.0, BillingCycleType::Weekly, eur.clone(), d(2026, 11, 1), Active),
            sub("B", 10.0, BillingCycleType::Monthly, usd, d(2026, 11, 1), Active),
        ];
        let total = calculate_monthly_total(&subs);
        assert_eq!(total.currency.unwrap().code, "EUR");
        assert_eq!(total.total, 7.0 * 4.33);
    }

    #[test]
    fn next_payment_is_earliest_active() {
        let ron = currency("RON", "lei");
        let today = d(2026, 10, 19);
        let subs = vec![
            sub("Later", 10.0, BillingCycleType::Monthly, ron.clone(), d(2026, 11, 5), Active),
            sub("Paused", 10.0, BillingCycleType::Monthly, ron.clone(), d(2026, 10, 20), Paused),
            sub("Soon", 10.0, BillingCycleType::Monthly, ron, d(2026, 10, 22), Active),
        ];
        let next = get_next_payment(&subs, today).unwrap();
        assert_eq!(next.name, "Soon");
        assert_eq!(next.days_until_payment, 3);
        assert_eq!(next.formatted_date, "22 October 2026");
        assert!(get_next_payment(&[], today).is_none());
    }

    #[test]
    fn upcoming_renewals_respect_window_and_order() {
        let ron = currency("RON", "lei");
        let today = d(2026, 10, 19);
        let subs = vec![
            sub("Edge", 1.0, BillingCycleType::Monthly, ron.clone(), d(2026, 11, 18), Active),
            sub("Beyond", 1.0, BillingCycleType::Monthly, ron.clone(), d(2026, 11, 19), Active),
            sub("Overdue", 1.0, BillingCycleType::Monthly, ron.clone(), d(2026, 10, 17), Active),
            sub("Tomorrow", 1.0, BillingCycleType::Monthly, ron, d(2026, 10, 20), Active),
        ];
        let names: Vec<String> = get_upcoming_renewals(&subs, today, 30)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Overdue", "Tomorrow", "Edge"]);
    }

    #[test]
    fn upcoming_window_is_clamped() {
        let ron = currency("RON", "lei");
        let today = d(2026, 10, 19);
        let subs = vec![
            sub("Today", 1.0, BillingCycleType::Monthly, ron.clone(), today, Active),
            sub("Decade", 1.0, BillingCycleType::Yearly, ron.clone(), d(2036, 10, 1), Active),
            sub("Century", 1.0, BillingCycleType::Yearly, ron, d(2126, 1, 1), Active),
        ];
        let names = |window| -> Vec<String> {
            get_upcoming_renewals(&subs, today, window)
                .into_iter()
                .map(|p| p.name)
                .collect()
        };
        assert_eq!(names(i64::MAX), vec!["Today", "Decade"]);
        assert_eq!(names(-10), vec!["Today"]);
    }

    #[test]
    fn insights_tiers() {
        let ron = currency("RON", "lei");
        assert!(generate_savings_insights(0.0, &ron).is_empty());
        let low = generate_savings_insights(500.0, &ron);
        assert_eq!(low[0], "You could save 50.00 lei yearly by cutting 10%");
        assert_eq!(low[1], "That's 100.00 lei if you optimize 20% of subscriptions");
        assert!(low[2].contains("Great job"));
        assert!(generate_savings_insights(700.0, &ron)[2].contains("moderately"));
        assert!(generate_savings_insights(1500.0, &ron)[2].contains("quarterly"));
    }

    #[test]
    fn summary_formats_totals() {
        let ron = currency("RON", "lei");
        let today = d(2026, 10, 19);
        let subs = vec![sub("Netflix", 50.0, BillingCycleType::Monthly, ron, d(2026, 10, 25), Active)];
        let summary = build_summary(&subs, today, DEFAULT_UPCOMING_WINDOW_DAYS);
        assert_eq!(summary.active_subscriptions, 1);
        assert_eq!(summary.yearly_projection, 600.0);
        assert_eq!(summary.formatted_monthly_total.as_deref(), Some("50.00 lei"));
        assert_eq!(summary.formatted_yearly_projection.as_deref(), Some("600.00 lei"));
        assert_eq!(summary.compact_yearly_projection.as_deref(), Some("600.00 lei"));
        assert_eq!(summary.upcoming_renewals.len(), 1);
        assert_eq!(summary.savings_insights.len(), 3);
    }

    #[test]
    fn compact_projection_collapses_thousands() {
        let today = d(2026, 10, 19);
        let subs = vec![sub("Gym", 700.0, BillingCycleType::Monthly, currency("USD", "$"), d(2026, 11, 1), Active)];
        let summary = build_summary(&subs, today, DEFAULT_UPCOMING_WINDOW_DAYS);
        assert_eq!(summary.formatted_yearly_projection.as_deref(), Some("$8400.00"));
        assert_eq!(summary.compact_yearly_projection.as_deref(), Some("$8.4K"));
    }

    #[test]
    fn user_totals_span_all_currencies() {
        let subs = vec![
            sub("A", 30.0, BillingCycleType::Quarterly, currency("USD", "$"), d(2026, 11, 3), Active),
            sub("B", 5.0, BillingCycleType::Monthly, currency("RON", "lei"), d(2026, 10, 30), Active),
            sub("C", 5.0, BillingCycleType::Monthly, currency("RON", "lei"), d(2026, 10, 20), Cancelled),
        ];
        let totals = calculate_user_totals(&subs);
        assert_eq!(totals.monthly_total, 15.0);
        assert_eq!(totals.yearly_projection, 180.0);
        assert_eq!(totals.active_subscriptions, 2);
        assert_eq!(totals.next_payment_date, Some(d(2026, 10, 30)));
        assert_eq!(totals.next_payment_amount, Some(5.0));
    }
}
