//! Financial drafts: batches, contributions, pledges, and accounts.

use chrono::NaiveDate;

use super::{AccountId, DefinedValueId, PersonAliasId};

/// A financial batch (a deposit grouping of contributions)
#[derive(Debug, Clone)]
pub struct BatchDraft {
    /// Source-system batch key
    pub foreign_batch_id: i64,
    pub name: String,
    pub batch_date: Option<NaiveDate>,
    /// Expected total of the batch, used as the control amount
    pub control_amount: f64,
}

/// A financial account (fund), created on the fly when no match exists
#[derive(Debug, Clone)]
pub struct AccountDraft {
    pub name: String,
    /// Sub-fund or campus scope the account belongs to, if any
    pub campus_scope: Option<String>,
    pub is_active: bool,
}

/// A single contribution row resolved into a transaction draft
#[derive(Debug, Clone)]
pub struct ContributionDraft {
    /// Source-system contribution key
    pub foreign_contribution_id: i64,
    /// Source-system batch key the transaction belongs to, if any
    pub foreign_batch_id: Option<i64>,
    /// Alias of the giver, resolved before the draft is accumulated
    pub authorized_alias_id: PersonAliasId,
    pub amount: f64,
    pub transaction_date: Option<NaiveDate>,
    pub currency_type_value_id: DefinedValueId,
    /// Check or reference number carried into the transaction code
    pub transaction_code: Option<String>,
    pub summary: Option<String>,
    /// Fund account the single transaction detail posts to
    pub account_id: AccountId,
}

/// How often a pledge recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PledgeFrequency {
    OneTime,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    TwiceYearly,
    Yearly,
}

impl PledgeFrequency {
    /// Translate a source frequency label, defaulting to one-time
    #[must_use]
    pub fn from_source(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "weekly" | "week" => Self::Weekly,
            "bi-weekly" | "biweekly" | "every two weeks" => Self::BiWeekly,
            "monthly" | "month" => Self::Monthly,
            "quarterly" => Self::Quarterly,
            "twice a year" | "semi-annually" => Self::TwiceYearly,
            "yearly" | "annually" | "year" => Self::Yearly,
            _ => Self::OneTime,
        }
    }
}

/// A pledge of future giving against a fund account
#[derive(Debug, Clone)]
pub struct PledgeDraft {
    /// Source-system pledge key, when the source provides one
    pub foreign_pledge_id: Option<i64>,
    pub alias_id: PersonAliasId,
    pub account_id: AccountId,
    pub total_amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub frequency: PledgeFrequency,
}
