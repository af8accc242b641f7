//! Run orchestration.
//!
//! One import run walks the selected tables in dependency order: people
//! first, then companies, then batches, then everything keyed off them.
//! Each table is a single streaming pass that drafts rows, accumulates
//! them in a [`BatchCommitter`], and reports progress per whole percent.
//! The run owns the long-lived identity indexes, so a record created early
//! in the run is visible to every later table without re-querying the
//! repository.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use chrono::{Local, NaiveDate};
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::builder::{
    FieldMap, FinancialBuilder, PersonBuilder, build_address, scan_attachments,
};
use crate::builder::document::DOCUMENT_TABLE;
use crate::builder::translate;
use crate::commit::{
    BATCH_REPORTING_NUMBER, BatchCommitter, DEFAULT_REPORTING_NUMBER, DOCUMENT_REPORTING_NUMBER,
    Draft,
};
use crate::config::ImportConfig;
use crate::error::exceptions::ExceptionLog;
use crate::error::{Error, Result};
use crate::model::attribute::{KnownAttributes, keys};
use crate::model::defined_value::LookupTables;
use crate::model::family::FamilyDraft;
use crate::model::{AccountId, AttributeId};
use crate::model::attribute::AttributeEntityType;
use crate::progress::{NullObserver, ProgressObserver, ProgressReporter};
use crate::repository::{AttributeStore, Repository};
use crate::resolve::{ForeignKeyMap, ForeignKind, IdentityResolver, ImportedPersonKey};
use crate::rows::{Row, RowSource, TableInfo};

/// User-visible message of a run that committed every selected table
pub const SUCCESS_MESSAGE: &str = "Import Complete";
/// User-visible message of a run that halted on an error
pub const FAILURE_MESSAGE: &str = "Import Failed: check the log for details";

/// Shared handle for cancelling a run cooperatively.
///
/// The worker checks the flag between rows, so cancellation never tears a
/// transaction: whatever the last flush committed stays committed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect at the next between-rows check
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Lifecycle of one table within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Pending,
    InProgress,
    Done,
    /// Selected but not recognized by the active source format
    Skipped,
    Failed,
}

/// Per-table result of a run
#[derive(Debug, Clone)]
pub struct TableSummary {
    pub name: String,
    pub state: TableState,
    /// Rows that produced a draft or a direct update
    pub completed: usize,
    /// Rows dropped with an exception-log entry
    pub skipped: usize,
}

/// Final report of a run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub tables: Vec<TableSummary>,
    pub message: String,
}

impl RunSummary {
    /// Total completed rows across all tables
    #[must_use]
    pub fn completed(&self) -> usize {
        self.tables.iter().map(|t| t.completed).sum()
    }

    /// Total exception-logged rows across all tables
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TableCounts {
    completed: usize,
    skipped: usize,
}

/// Read-only environment shared by every table pass
struct PassEnv<'a> {
    map: &'a FieldMap,
    lookups: &'a LookupTables,
    observer: &'a dyn ProgressObserver,
    cancel: &'a CancelFlag,
    attributes: KnownAttributes,
    extra_attributes: &'a FxHashMap<&'static str, AttributeId>,
    as_of: NaiveDate,
    reporting_override: Option<usize>,
}

impl PassEnv<'_> {
    fn reporting(&self, default: usize) -> usize {
        self.reporting_override.unwrap_or(default).max(1)
    }
}

/// Mutable indexes that live for the whole run
struct RunState {
    resolver: IdentityResolver,
    keys: ForeignKeyMap,
    fund_memo: FxHashMap<String, AccountId>,
}

/// Drives one import run end to end
pub struct ImportOrchestrator<R> {
    config: ImportConfig,
    source: Box<dyn RowSource>,
    map: FieldMap,
    lookups: LookupTables,
    repository: R,
    observer: Box<dyn ProgressObserver>,
    cancel: CancelFlag,
    exceptions: ExceptionLog,
}

impl<R: Repository + AttributeStore> ImportOrchestrator<R> {
    #[must_use]
    pub fn new(
        config: ImportConfig,
        source: Box<dyn RowSource>,
        map: FieldMap,
        repository: R,
    ) -> Self {
        let exceptions = match &config.exception_log_path {
            Some(path) => ExceptionLog::with_path(path),
            None => ExceptionLog::new(),
        };
        Self {
            config,
            source,
            map,
            lookups: LookupTables::standard(),
            repository,
            observer: Box::new(NullObserver),
            cancel: CancelFlag::new(),
            exceptions,
        }
    }

    #[must_use]
    pub fn with_lookups(mut self, lookups: LookupTables) -> Self {
        self.lookups = lookups;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// A handle that cancels this run from another thread
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    #[must_use]
    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Rows dropped so far, with their reasons
    #[must_use]
    pub fn exceptions(&self) -> &ExceptionLog {
        &self.exceptions
    }

    /// Run the import on the calling thread.
    ///
    /// Halts at the first table whose batch fails to commit; partial
    /// progress from earlier flushes stays committed, and a later run picks
    /// up from it through the foreign-id attributes.
    pub fn run(&mut self) -> Result<RunSummary> {
        match self.run_inner() {
            Ok(summary) => {
                log::info!("{SUCCESS_MESSAGE}");
                Ok(summary)
            }
            Err(e) => {
                if let Err(flush_error) = self.exceptions.flush_to_disk() {
                    log::warn!("could not write exception log: {flush_error}");
                }
                log::error!("{FAILURE_MESSAGE}: {e}");
                Err(e)
            }
        }
    }

    /// Run the import on a dedicated worker thread.
    ///
    /// Progress arrives through the observer; grab a [`CancelFlag`] before
    /// calling. The handle yields the orchestrator back together with the
    /// run result.
    #[must_use]
    pub fn run_in_background(mut self) -> JoinHandle<(Self, Result<RunSummary>)>
    where
        R: Send + 'static,
    {
        std::thread::spawn(move || {
            let result = self.run();
            // Release the observer so a channel-backed consumer sees the
            // stream end when the run does
            self.observer = Box::new(NullObserver);
            (self, result)
        })
    }

    fn run_inner(&mut self) -> Result<RunSummary> {
        if self.config.import_user.trim().is_empty() {
            return Err(Error::Setup("no import user configured".to_string()));
        }

        let attributes = KnownAttributes::ensure(&mut self.repository)?;
        let mut extra_attributes: FxHashMap<&'static str, AttributeId> = FxHashMap::default();
        for &(key, name, _) in self.map.person_attributes {
            let id = self.repository.get_or_create_attribute(
                AttributeEntityType::Person,
                key,
                attribute_field_type(key),
                name,
                "Imported from the source system",
            )?;
            extra_attributes.insert(key, id);
        }

        let mut state = RunState {
            resolver: IdentityResolver::new(),
            keys: ForeignKeyMap::new(),
            fund_memo: FxHashMap::default(),
        };
        self.seed_state(&mut state)?;

        let selected = self.selected_tables()?;
        log::info!(
            "run order: {}",
            selected.iter().map(|t| t.name.as_str()).join(", ")
        );
        if !selected.iter().any(|t| t.name == self.map.tables.people)
            && state.resolver.is_empty()
        {
            return Err(Error::Setup(
                "the people table is not selected and no people have been imported yet"
                    .to_string(),
            ));
        }

        let env = PassEnv {
            map: &self.map,
            lookups: &self.lookups,
            observer: self.observer.as_ref(),
            cancel: &self.cancel,
            attributes,
            extra_attributes: &extra_attributes,
            as_of: Local::now().date_naive(),
            reporting_override: self.config.reporting_number,
        };

        let mut tables = Vec::with_capacity(selected.len() + 1);
        for table in &selected {
            log::info!("importing table {} ({} rows)", table.name, table.row_count);
            let outcome = dispatch_table(
                self.source.as_ref(),
                &mut self.repository,
                &env,
                &mut state,
                &mut self.exceptions,
                table,
            );
            match outcome {
                Some(Ok(counts)) => tables.push(TableSummary {
                    name: table.name.clone(),
                    state: TableState::Done,
                    completed: counts.completed,
                    skipped: counts.skipped,
                }),
                Some(Err(e)) => {
                    log::error!("table {} failed: {e}", table.name);
                    tables.push(TableSummary {
                        name: table.name.clone(),
                        state: TableState::Failed,
                        completed: 0,
                        skipped: 0,
                    });
                    return Err(e);
                }
                None => {
                    log::warn!("table {} is not recognized, skipping", table.name);
                    tables.push(TableSummary {
                        name: table.name.clone(),
                        state: TableState::Skipped,
                        completed: 0,
                        skipped: 0,
                    });
                }
            }
        }

        if let Some(dir) = self.config.attachment_dir.clone() {
            log::info!("importing attachments from {}", dir.display());
            let counts = documents_pass(
                &dir,
                &mut self.repository,
                &env,
                &mut state,
                &mut self.exceptions,
            )?;
            tables.push(TableSummary {
                name: DOCUMENT_TABLE.to_string(),
                state: TableState::Done,
                completed: counts.completed,
                skipped: counts.skipped,
            });
        }

        self.exceptions.flush_to_disk()?;
        Ok(RunSummary {
            tables,
            message: SUCCESS_MESSAGE.to_string(),
        })
    }

    /// Load the identity indexes from what earlier runs committed
    fn seed_state(&mut self, state: &mut RunState) -> Result<()> {
        let committed = self.repository.previously_imported_people()?;
        for person in &committed {
            if let (Some(household_id), Some(family_id)) =
                (person.foreign_household_id, person.family_id)
            {
                state
                    .keys
                    .fulfill(ForeignKind::Household, household_id, family_id);
            }
        }
        if !committed.is_empty() {
            log::info!("found {} previously imported people", committed.len());
        }
        state.resolver.seed(committed);

        for (foreign_id, batch_id) in self.repository.previously_imported_batches()? {
            state.keys.fulfill(ForeignKind::Batch, foreign_id, batch_id);
        }
        for (foreign_id, transaction_id) in self.repository.previously_imported_contributions()? {
            state
                .keys
                .fulfill(ForeignKind::Contribution, foreign_id, transaction_id);
        }
        Ok(())
    }

    /// Selected tables in dependency order: people, companies, batches,
    /// then the rest in the order the source enumerates them
    fn selected_tables(&self) -> Result<Vec<TableInfo>> {
        let mut tables: Vec<TableInfo> = self
            .source
            .tables()?
            .into_iter()
            .filter(|t| self.config.is_table_selected(&t.name))
            .collect();
        let names = &self.map.tables;
        tables.sort_by_key(|t| {
            if t.name == names.people {
                0
            } else if Some(t.name.as_str()) == names.companies {
                1
            } else if t.name == names.batches {
                2
            } else {
                3
            }
        });
        Ok(tables)
    }
}

/// Field type for the free-form person columns stored as attributes
fn attribute_field_type(key: &str) -> &'static str {
    match key {
        keys::TWITTER | keys::FACEBOOK => "SocialMedia",
        _ => "Text",
    }
}

/// Route one table to its pass; `None` means the name is not recognized
fn dispatch_table<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Option<Result<TableCounts>> {
    let names = &env.map.tables;
    let result = if table.name == names.people {
        people_pass(source, repository, env, state, exceptions, table)
    } else if Some(table.name.as_str()) == names.companies {
        companies_pass(source, repository, env, state, exceptions, table)
    } else if table.name == names.batches {
        batches_pass(source, repository, env, state, exceptions, table)
    } else if table.name == names.contributions {
        contributions_pass(source, repository, env, state, exceptions, table)
    } else if table.name == names.pledges {
        pledges_pass(source, repository, env, state, exceptions, table)
    } else if table.name == names.addresses {
        addresses_pass(source, repository, env, state, exceptions, table)
    } else if table.name == names.communications {
        communications_pass(source, repository, env, state, exceptions, table)
    } else {
        return None;
    };
    Some(result)
}

fn flush_committer<R: Repository + AttributeStore>(
    committer: &mut BatchCommitter,
    repository: &mut R,
    state: &mut RunState,
    attributes: &KnownAttributes,
    table: &str,
) -> Result<usize> {
    let committed = committer
        .flush(repository, &mut state.resolver, &mut state.keys, attributes)
        .map_err(|e| Error::CommitFailed {
            table: table.to_string(),
            message: e.to_string(),
        })?;
    if committed > 0 {
        log::debug!("committed {committed} drafts for table {table}");
    }
    Ok(committed)
}

/// Draft one family's members, flushing at every reporting boundary.
///
/// A flush boundary may fall in the middle of a household; members after
/// the boundary join the family created by the earlier flush through the
/// household key map.
fn commit_family<R: Repository + AttributeStore>(
    family: FamilyDraft,
    committer: &mut BatchCommitter,
    reporter: &mut ProgressReporter<'_>,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    table: &str,
) -> Result<()> {
    let stub = family.stub();
    for person in family.members {
        env.cancel.check()?;
        state.resolver.add(ImportedPersonKey {
            person_id: None,
            person_alias_id: None,
            foreign_individual_id: person.foreign_individual_id,
            foreign_household_id: person.foreign_household_id,
            family_role: person.identity_role(),
            family_id: None,
        });
        committer.add(Draft::Person {
            person,
            family: stub.clone(),
        });

        let boundary = reporter.row_completed();
        if committer.should_flush(reporter.completed()) {
            flush_committer(committer, repository, state, &env.attributes, table)?;
            if !boundary {
                reporter.partial();
            }
        }
    }
    Ok(())
}

fn people_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let builder = PersonBuilder {
        map: env.map,
        lookups: env.lookups,
        extra_attributes: env.extra_attributes,
        as_of: env.as_of,
        table: &table.name,
    };
    let mut committer = BatchCommitter::new(env.reporting(DEFAULT_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    // Group rows by household, preserving the first-seen order of
    // households. A person row with no household key has nothing to group
    // under; it is exception-logged and skipped.
    let mut order: Vec<i64> = Vec::new();
    let mut groups: FxHashMap<i64, Vec<Row>> = FxHashMap::default();
    let mut companies: Vec<Row> = Vec::new();
    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        if is_company_row(env.map, &row) {
            companies.push(row);
            continue;
        }
        match row.i64(env.map.household_id) {
            Some(household_id) => groups
                .entry(household_id)
                .or_insert_with(|| {
                    order.push(household_id);
                    Vec::new()
                })
                .push(row),
            None => exceptions.record(
                &table.name,
                row.ordinal(),
                "missing or unparsable household id",
            ),
        }
    }

    for household_id in order {
        env.cancel.check()?;
        let rows = &groups[&household_id];
        let Some(family) = builder.build_household(rows, &state.resolver, exceptions) else {
            continue;
        };
        commit_family(
            family,
            &mut committer,
            &mut reporter,
            repository,
            env,
            state,
            &table.name,
        )?;
    }
    for row in companies {
        env.cancel.check()?;
        let Some(family) = builder.build_company(&row, &state.resolver, exceptions) else {
            continue;
        };
        commit_family(
            family,
            &mut committer,
            &mut reporter,
            repository,
            env,
            state,
            &table.name,
        )?;
    }

    flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

/// Whether a people-table row is a flattened company row
fn is_company_row(map: &FieldMap, row: &Row) -> bool {
    map.is_company
        .and_then(|column| row.bool(column))
        .unwrap_or(false)
}

fn companies_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let builder = PersonBuilder {
        map: env.map,
        lookups: env.lookups,
        extra_attributes: env.extra_attributes,
        as_of: env.as_of,
        table: &table.name,
    };
    let mut committer = BatchCommitter::new(env.reporting(DEFAULT_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some(family) = builder.build_company(&row, &state.resolver, exceptions) else {
            continue;
        };
        commit_family(
            family,
            &mut committer,
            &mut reporter,
            repository,
            env,
            state,
            &table.name,
        )?;
    }

    flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

fn batches_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let builder = FinancialBuilder {
        map: env.map,
        table: &table.name,
    };
    let mut committer = BatchCommitter::new(env.reporting(BATCH_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some(batch) = builder.build_batch(&row, &mut state.keys, exceptions) else {
            continue;
        };
        committer.add(Draft::Batch(batch));

        let boundary = reporter.row_completed();
        if committer.should_flush(reporter.completed()) {
            flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

fn contributions_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let builder = FinancialBuilder {
        map: env.map,
        table: &table.name,
    };
    let mut committer = BatchCommitter::new(env.reporting(DEFAULT_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some(contribution) = builder.build_contribution(
            &row,
            repository,
            &state.resolver,
            &mut state.keys,
            &mut state.fund_memo,
            exceptions,
        )?
        else {
            continue;
        };
        committer.add(Draft::Contribution(contribution));

        let boundary = reporter.row_completed();
        if committer.should_flush(reporter.completed()) {
            flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

fn pledges_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let builder = FinancialBuilder {
        map: env.map,
        table: &table.name,
    };
    let mut committer = BatchCommitter::new(env.reporting(DEFAULT_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some(pledge) = builder.build_pledge(
            &row,
            repository,
            &state.resolver,
            &mut state.fund_memo,
            exceptions,
        )?
        else {
            continue;
        };
        committer.add(Draft::Pledge(pledge));

        let boundary = reporter.row_completed();
        if committer.should_flush(reporter.completed()) {
            flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    flush_committer(&mut committer, repository, state, &env.attributes, &table.name)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

/// Addresses update committed families directly, with a periodic save
fn addresses_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let reporting = env.reporting(DEFAULT_REPORTING_NUMBER);
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some((household_id, address)) = build_address(env.map, &table.name, &row, exceptions)
        else {
            continue;
        };
        let Some(family_id) = state.keys.get(ForeignKind::Household, household_id) else {
            exceptions.record(&table.name, row.ordinal(), "household not found");
            continue;
        };
        repository.add_family_address(family_id, &address)?;

        let boundary = reporter.row_completed();
        if reporter.completed() % reporting == 0 {
            repository.save_changes(true)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    repository.save_changes(true)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

/// Communications update committed people directly.
///
/// The first listed email becomes the primary email; later emails land in
/// the secondary-email attribute unless they replace an inactive primary.
/// Phone rows are deduplicated against the numbers already stored.
fn communications_pass<R: Repository + AttributeStore>(
    source: &dyn RowSource,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
    table: &TableInfo,
) -> Result<TableCounts> {
    let map = env.map;
    let reporting = env.reporting(DEFAULT_REPORTING_NUMBER);
    let mut reporter = ProgressReporter::new(env.observer, &table.name, table.row_count);
    let skipped_before = exceptions.len();

    for row in source.scan_table(&table.name)? {
        env.cancel.check()?;
        let Some(value) = row.string(map.communication_value) else {
            continue;
        };
        let kind = row.string(map.communication_type).unwrap_or_default();
        let listed = row.bool(map.communication_listed).unwrap_or(true);

        let person = state.resolver.lookup(
            row.i64(map.communication_individual_id),
            row.i64(map.communication_household_id),
            true,
        );
        let Some(person_id) = person.and_then(|key| key.person_id) else {
            exceptions.record(&table.name, row.ordinal(), "person not found");
            continue;
        };

        let lowered = kind.to_lowercase();
        if lowered.contains("email") {
            match repository.person_email(person_id)? {
                None => repository.set_person_email(person_id, &value, listed)?,
                Some((_, false)) if listed => {
                    repository.set_person_email(person_id, &value, true)?;
                }
                Some((current, _)) => {
                    if !current.eq_ignore_ascii_case(&value) {
                        repository.insert_value(
                            env.attributes.secondary_email,
                            person_id,
                            &value,
                        )?;
                    }
                }
            }
        } else if lowered.contains("twitter") {
            let attribute_id = repository.get_or_create_attribute(
                AttributeEntityType::Person,
                keys::TWITTER,
                "SocialMedia",
                "Twitter Username",
                "Imported from the source system",
            )?;
            repository.insert_value(attribute_id, person_id, &value)?;
        } else if lowered.contains("facebook") {
            let attribute_id = repository.get_or_create_attribute(
                AttributeEntityType::Person,
                keys::FACEBOOK,
                "SocialMedia",
                "Facebook Username",
                "Imported from the source system",
            )?;
            repository.insert_value(attribute_id, person_id, &value)?;
        } else if let Some(phone) = translate::phone(&kind, &value, !listed) {
            let existing = repository.person_phones(person_id)?;
            if !existing.contains(&phone.number) {
                repository.add_person_phone(person_id, &phone)?;
            }
        } else {
            continue;
        }

        let boundary = reporter.row_completed();
        if reporter.completed() % reporting == 0 {
            repository.save_changes(true)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    repository.save_changes(true)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

/// Scan the attachment directory and commit its files as binary documents
fn documents_pass<R: Repository + AttributeStore>(
    dir: &std::path::Path,
    repository: &mut R,
    env: &PassEnv<'_>,
    state: &mut RunState,
    exceptions: &mut ExceptionLog,
) -> Result<TableCounts> {
    let skipped_before = exceptions.len();
    let drafts = scan_attachments(dir, &state.resolver, repository, exceptions)?;

    let mut committer = BatchCommitter::new(env.reporting(DOCUMENT_REPORTING_NUMBER));
    let mut reporter = ProgressReporter::new(env.observer, DOCUMENT_TABLE, drafts.len());
    for draft in drafts {
        env.cancel.check()?;
        committer.add(Draft::Document(draft));

        let boundary = reporter.row_completed();
        if committer.should_flush(reporter.completed()) {
            flush_committer(&mut committer, repository, state, &env.attributes, DOCUMENT_TABLE)?;
            if !boundary {
                reporter.partial();
            }
        }
    }

    flush_committer(&mut committer, repository, state, &env.attributes, DOCUMENT_TABLE)?;
    reporter.finish();
    Ok(TableCounts {
        completed: reporter.completed(),
        skipped: exceptions.len() - skipped_before,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_round_trip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());
        let handle = flag.clone();
        handle.cancel();
        assert!(flag.is_cancelled());
        assert!(flag.check().is_err());
    }
}
