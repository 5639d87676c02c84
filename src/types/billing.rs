use crate::error::SubtrackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Average number of billed days in a month for daily cycles.
pub const DAYS_PER_MONTH: f64 = 30.0;
/// 52 weeks / 12 months, rounded the way the mobile client always showed it.
pub const WEEKS_PER_MONTH: f64 = 4.33;
pub const MONTHS_PER_QUARTER: f64 = 3.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Recurrence period of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BillingCycleType {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycleType {
    pub const ALL: [BillingCycleType; 5] = [
        BillingCycleType::Daily,
        BillingCycleType::Weekly,
        BillingCycleType::Monthly,
        BillingCycleType::Quarterly,
        BillingCycleType::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycleType::Daily => "daily",
            BillingCycleType::Weekly => "weekly",
            BillingCycleType::Monthly => "monthly",
            BillingCycleType::Quarterly => "quarterly",
            BillingCycleType::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycleType {
    type Err = SubtrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BillingCycleType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SubtrackError::Validation(format!("unknown billing cycle type `{s}`")))
    }
}

/// Monthly equivalent of `amount` billed once per `cycle`.
pub fn convert_to_monthly(amount: f64, cycle: BillingCycleType) -> f64 {
    match cycle {
        BillingCycleType::Daily => amount * DAYS_PER_MONTH,
        BillingCycleType::Weekly => amount * WEEKS_PER_MONTH,
        BillingCycleType::Monthly => amount,
        BillingCycleType::Quarterly => amount / MONTHS_PER_QUARTER,
        BillingCycleType::Yearly => amount / MONTHS_PER_YEAR,
    }
}

pub fn calculate_yearly_projection(monthly_total: f64) -> f64 {
    monthly_total * MONTHS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMOUNTS: [f64; 6] = [0.0, 1.0, 9.99, 12.0, 45.5, 1234.56];

    #[test]
    fn monthly_is_identity() {
        for amount in AMOUNTS {
            assert_eq!(convert_to_monthly(amount, BillingCycleType::Monthly), amount);
        }
    }

    #[test]
    fn documented_multipliers_hold() {
        for amount in AMOUNTS {
            assert_eq!(convert_to_monthly(amount, BillingCycleType::Daily), amount * 30.0);
            assert_eq!(convert_to_monthly(amount, BillingCycleType::Weekly), amount * 4.33);
            assert_eq!(convert_to_monthly(amount, BillingCycleType::Quarterly), amount / 3.0);
            assert_eq!(convert_to_monthly(amount, BillingCycleType::Yearly), amount / 12.0);
        }
    }

    #[test]
    fn yearly_projection_is_twelve_months() {
        assert_eq!(calculate_yearly_projection(10.0), 120.0);
        assert_eq!(calculate_yearly_projection(0.0), 0.0);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Quarterly".parse::<BillingCycleType>().unwrap(), BillingCycleType::Quarterly);
        assert_eq!(" yearly ".parse::<BillingCycleType>().unwrap(), BillingCycleType::Yearly);
        assert!("fortnightly".parse::<BillingCycleType>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&BillingCycleType::Weekly).unwrap();
        assert_eq!(json, r#""weekly""#);
    }
}
