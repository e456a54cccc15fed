use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Billing cycle of a subscription. Stored as free text; anything we do not
/// recognize bills like a monthly plan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum BillingCycle {
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "quarterly")]
    Quarterly,
    #[serde(rename = "yearly")]
    Yearly,
    #[serde(rename = "trial")]
    Trial,
}

impl BillingCycle {
    pub fn parse(value: &str) -> Self {
        match value {
            "quarterly" => BillingCycle::Quarterly,
            "yearly" => BillingCycle::Yearly,
            "trial" => BillingCycle::Trial,
            // "monthly" and any unknown value
            _ => BillingCycle::Monthly,
        }
    }

    /// Calendar months per billing-cycle increment.
    pub fn increment_months(&self) -> u32 {
        match self {
            BillingCycle::Monthly | BillingCycle::Trial => 1,
            BillingCycle::Quarterly => 3,
            BillingCycle::Yearly => 12,
        }
    }
}

impl std::fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingCycle::Monthly => write!(f, "monthly"),
            BillingCycle::Quarterly => write!(f, "quarterly"),
            BillingCycle::Yearly => write!(f, "yearly"),
            BillingCycle::Trial => write!(f, "trial"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum SubscriptionStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_billing_cycle() {
        assert_eq!(BillingCycle::parse("monthly"), BillingCycle::Monthly);
        assert_eq!(BillingCycle::parse("quarterly"), BillingCycle::Quarterly);
        assert_eq!(BillingCycle::parse("yearly"), BillingCycle::Yearly);
        assert_eq!(BillingCycle::parse("trial"), BillingCycle::Trial);
        // unknown values bill monthly
        assert_eq!(BillingCycle::parse("weekly"), BillingCycle::Monthly);
        assert_eq!(BillingCycle::parse(""), BillingCycle::Monthly);
    }

    #[test]
    fn test_increment_months() {
        assert_eq!(BillingCycle::Monthly.increment_months(), 1);
        assert_eq!(BillingCycle::Quarterly.increment_months(), 3);
        assert_eq!(BillingCycle::Yearly.increment_months(), 12);
        assert_eq!(BillingCycle::Trial.increment_months(), 1);
    }
}
