//! Financial mapping: batches, contributions, and pledges.

use rustc_hash::FxHashMap;

use super::field_map::FieldMap;
use super::translate;
use crate::error::Result;
use crate::error::exceptions::ExceptionLog;
use crate::model::financial::{
    AccountDraft, BatchDraft, ContributionDraft, PledgeDraft, PledgeFrequency,
};
use crate::model::AccountId;
use crate::repository::Repository;
use crate::resolve::{ForeignKeyMap, ForeignKind, IdentityResolver};
use crate::rows::Row;

/// Builds financial drafts for one table pass
pub struct FinancialBuilder<'a> {
    pub map: &'a FieldMap,
    /// Table name used in exception-log entries
    pub table: &'a str,
}

impl FinancialBuilder<'_> {
    /// Map one batch row, skipping batches that already exist
    pub fn build_batch(
        &self,
        row: &Row,
        keys: &mut ForeignKeyMap,
        exceptions: &mut ExceptionLog,
    ) -> Option<BatchDraft> {
        let Some(foreign_batch_id) = row.i64(self.map.batch_id) else {
            exceptions.record(self.table, row.ordinal(), "missing or unparsable batch id");
            return None;
        };
        if !keys.reserve(ForeignKind::Batch, foreign_batch_id) {
            log::debug!("batch {foreign_batch_id} already imported, skipping");
            return None;
        }

        let name = row
            .string(self.map.batch_name)
            .unwrap_or_else(|| format!("Batch {foreign_batch_id}"));

        Some(BatchDraft {
            foreign_batch_id,
            name,
            batch_date: row.date(self.map.batch_date),
            control_amount: row.f64(self.map.batch_amount).unwrap_or(0.0),
        })
    }

    /// Map one contribution row into a transaction draft.
    ///
    /// The giver is resolved through the identity index (household fallback
    /// excludes visitors, since visitors do not give for the household) and
    /// the fund account is resolved or created on the fly.
    pub fn build_contribution<R: Repository>(
        &self,
        row: &Row,
        repository: &mut R,
        resolver: &IdentityResolver,
        keys: &mut ForeignKeyMap,
        fund_memo: &mut FxHashMap<String, AccountId>,
        exceptions: &mut ExceptionLog,
    ) -> Result<Option<ContributionDraft>> {
        let map = self.map;

        let Some(foreign_contribution_id) = row.i64(map.contribution_id) else {
            exceptions.record(
                self.table,
                row.ordinal(),
                "missing or unparsable contribution id",
            );
            return Ok(None);
        };
        if !keys.reserve(ForeignKind::Contribution, foreign_contribution_id) {
            log::debug!("contribution {foreign_contribution_id} already imported, skipping");
            return Ok(None);
        }

        let giver = resolver.lookup(
            row.i64(map.contribution_individual_id),
            row.i64(map.contribution_household_id),
            false,
        );
        let Some(alias_id) = giver.and_then(|key| key.person_alias_id) else {
            exceptions.record(self.table, row.ordinal(), "giver not found");
            return Ok(None);
        };

        let Some(amount) = row.f64(map.contribution_amount) else {
            exceptions.record(self.table, row.ordinal(), "missing or unparsable amount");
            return Ok(None);
        };

        let account_id = resolve_account(
            repository,
            fund_memo,
            row.str(map.fund_name).unwrap_or("General Fund"),
            row.str(map.sub_fund_name),
        )?;

        Ok(Some(ContributionDraft {
            foreign_contribution_id,
            foreign_batch_id: row.i64(map.contribution_batch_id),
            authorized_alias_id: alias_id,
            amount,
            transaction_date: row.date(map.contribution_date),
            currency_type_value_id: translate::currency_type(row.str(map.contribution_type)),
            transaction_code: row.string(map.check_number),
            summary: row.string(map.memo),
            account_id,
        }))
    }

    /// Map one pledge row
    pub fn build_pledge<R: Repository>(
        &self,
        row: &Row,
        repository: &mut R,
        resolver: &IdentityResolver,
        fund_memo: &mut FxHashMap<String, AccountId>,
        exceptions: &mut ExceptionLog,
    ) -> Result<Option<PledgeDraft>> {
        let map = self.map;

        let pledger = resolver.lookup(
            row.i64(map.pledge_individual_id),
            row.i64(map.pledge_household_id),
            false,
        );
        let Some(alias_id) = pledger.and_then(|key| key.person_alias_id) else {
            exceptions.record(self.table, row.ordinal(), "pledger not found");
            return Ok(None);
        };

        let Some(total_amount) = row.f64(map.pledge_total) else {
            exceptions.record(
                self.table,
                row.ordinal(),
                "missing or unparsable pledge total",
            );
            return Ok(None);
        };

        let account_id = resolve_account(
            repository,
            fund_memo,
            row.str(map.pledge_fund_name).unwrap_or("General Fund"),
            row.str(map.pledge_sub_fund_name),
        )?;

        let frequency = row
            .str(map.pledge_frequency)
            .map_or(PledgeFrequency::OneTime, PledgeFrequency::from_source);

        Ok(Some(PledgeDraft {
            foreign_pledge_id: map.pledge_id.and_then(|col| row.i64(col)),
            alias_id,
            account_id,
            total_amount,
            start_date: row.date(map.pledge_start_date),
            end_date: row.date(map.pledge_end_date),
            frequency,
        }))
    }
}

/// Resolve a fund name (optionally scoped to a sub-fund) to an account.
///
/// Matching is by case-insensitive name prefix. A sub-fund scope prefers an
/// account carrying that scope. When nothing matches, a new active account
/// is created on the fly. Results are memoized for the rest of the run.
pub fn resolve_account<R: Repository>(
    repository: &mut R,
    fund_memo: &mut FxHashMap<String, AccountId>,
    fund_name: &str,
    sub_fund: Option<&str>,
) -> Result<AccountId> {
    let memo_key = match sub_fund {
        Some(sub) => format!("{}::{}", fund_name.to_lowercase(), sub.to_lowercase()),
        None => fund_name.to_lowercase(),
    };
    if let Some(&id) = fund_memo.get(&memo_key) {
        return Ok(id);
    }

    let query = fund_name.to_lowercase();
    let candidates: Vec<_> = repository
        .accounts()?
        .into_iter()
        .filter(|account| account.name.to_lowercase().starts_with(&query))
        .collect();

    let matched = match sub_fund {
        Some(sub) => candidates
            .iter()
            .find(|account| {
                account
                    .campus_scope
                    .as_deref()
                    .is_some_and(|scope| scope.eq_ignore_ascii_case(sub))
            })
            .or_else(|| candidates.first()),
        None => candidates.first(),
    };

    let id = match matched {
        Some(account) => account.id,
        None => repository.insert_account(&AccountDraft {
            name: fund_name.to_string(),
            campus_scope: sub_fund.map(str::to_string),
            is_active: true,
        })?,
    };

    fund_memo.insert(memo_key, id);
    Ok(id)
}
