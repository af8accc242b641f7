//! End-to-end runs over an in-memory source and repository.

use rock_migrate::builder::field_map::CSV_EXPORT;
use rock_migrate::model::attribute::AttributeEntityType;
use rock_migrate::model::defined_value::{DefinedValue, LookupTables};
use rock_migrate::model::person::FamilyRole;
use rock_migrate::orchestrator::ImportOrchestrator;
use rock_migrate::repository::{AttributeStore, MemoryRepository, Repository};
use rock_migrate::rows::{MemorySource, Row};
use rock_migrate::ImportConfig;
use serde_json::json;

fn decker_row(ordinal: usize, individual_id: i64, first: &str, position: &str, born: &str) -> Row {
    Row::new(ordinal)
        .with("individual_id", json!(individual_id))
        .with("household_id", json!(10))
        .with("household_name", json!("Decker Family"))
        .with("first_name", json!(first))
        .with("last_name", json!("Decker"))
        .with("date_of_birth", json!(born))
        .with("status", json!("Member"))
        .with("household_position", json!(position))
}

fn scenario_source() -> MemorySource {
    let people = vec![
        decker_row(0, 1, "Ted", "Head", "1975-02-10"),
        decker_row(1, 2, "Cindy", "Spouse", "1977-05-01"),
        decker_row(2, 3, "Noah", "Child", "2012-03-12"),
        decker_row(3, 4, "Walt", "Visitor", "1940-01-02"),
        Row::new(4)
            .with("household_id", json!(99))
            .with("household_name", json!("Acme Supplies"))
            .with("is_company", json!(true)),
    ];

    let batches = vec![
        Row::new(0)
            .with("batch_id", json!(100))
            .with("batch_name", json!("Sunday Offering"))
            .with("batch_date", json!("2024-01-07"))
            .with("amount", json!(300.0)),
    ];

    let contributions = vec![
        Row::new(0)
            .with("contribution_id", json!(1000))
            .with("batch_id", json!(100))
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("amount", json!(250.0))
            .with("received_date", json!("2024-01-07"))
            .with("contribution_type_name", json!("Check"))
            .with("check_number", json!("1234"))
            .with("fund_name", json!("General Fund")),
        // Household-only giver: falls back to an adult of the household
        Row::new(1)
            .with("contribution_id", json!(1001))
            .with("batch_id", json!(100))
            .with("household_id", json!(10))
            .with("amount", json!(50.0))
            .with("received_date", json!("2024-01-14"))
            .with("contribution_type_name", json!("Cash"))
            .with("fund_name", json!("General Fund")),
    ];

    let pledges = vec![
        Row::new(0)
            .with("pledge_id", json!(500))
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("total_pledge", json!(1200.0))
            .with("start_date", json!("2024-01-01"))
            .with("end_date", json!("2024-12-31"))
            .with("pledge_frequency", json!("Monthly"))
            .with("fund_name", json!("Building Fund")),
    ];

    let addresses = vec![
        Row::new(0)
            .with("household_id", json!(10))
            .with("address_1", json!("11624 N 31st Dr"))
            .with("city", json!("Phoenix"))
            .with("state", json!("AZ"))
            .with("postal_code", json!("85029"))
            .with("address_type", json!("Primary")),
    ];

    let communications = vec![
        Row::new(0)
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("communication_type", json!("Home Email"))
            .with("communication_value", json!("ted@rocksolid.example"))
            .with("listed", json!(true)),
        Row::new(1)
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("communication_type", json!("Work Email"))
            .with("communication_value", json!("ted.alt@rocksolid.example"))
            .with("listed", json!(true)),
        Row::new(2)
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("communication_type", json!("Mobile"))
            .with("communication_value", json!("(555) 765-4321"))
            .with("listed", json!(true)),
        Row::new(3)
            .with("individual_id", json!(1))
            .with("household_id", json!(10))
            .with("communication_type", json!("Twitter"))
            .with("communication_value", json!("teddecker"))
            .with("listed", json!(true)),
    ];

    MemorySource::new()
        .with_table("individual", people)
        .with_table("batch", batches)
        .with_table("contribution", contributions)
        .with_table("pledge", pledges)
        .with_table("address", addresses)
        .with_table("communication", communications)
}

fn run_scenario(reporting_number: usize) -> MemoryRepository {
    let config = ImportConfig {
        reporting_number: Some(reporting_number),
        ..ImportConfig::default()
    };
    let mut orchestrator = ImportOrchestrator::new(
        config,
        Box::new(scenario_source()),
        CSV_EXPORT,
        MemoryRepository::new(),
    );
    orchestrator.run().unwrap();
    orchestrator.into_repository()
}

#[test]
fn test_full_import_with_mid_household_flush() {
    // A flush interval of 2 forces a batch boundary in the middle of the
    // Decker household; later members must join the committed family
    let repository = run_scenario(2);

    assert_eq!(repository.families().len(), 2);
    assert_eq!(repository.people().len(), 5);

    let decker = repository
        .families()
        .iter()
        .find(|f| f.foreign_household_id == Some(10))
        .unwrap();
    assert_eq!(repository.members_of(decker.id).len(), 4);
}

#[test]
fn test_family_roles_and_giving_groups() {
    let repository = run_scenario(100);

    let noah = repository
        .people()
        .iter()
        .find(|p| p.first_name == "Noah")
        .unwrap();
    assert_eq!(noah.family_role, FamilyRole::Child);
    assert_eq!(noah.giving_group_id, None);

    let ted = repository
        .people()
        .iter()
        .find(|p| p.first_name == "Ted")
        .unwrap();
    assert_eq!(ted.family_role, FamilyRole::Adult);
    assert_eq!(ted.giving_group_id, Some(ted.family_id));

    // Visitor-labeled members keep an adult group membership
    let walt = repository
        .people()
        .iter()
        .find(|p| p.first_name == "Walt")
        .unwrap();
    assert_eq!(walt.family_role, FamilyRole::Adult);
}

#[test]
fn test_company_becomes_business_person() {
    let repository = run_scenario(100);

    let acme = repository
        .people()
        .iter()
        .find(|p| p.last_name == "Acme Supplies")
        .unwrap();
    assert!(acme.is_business);

    let family = repository
        .families()
        .iter()
        .find(|f| f.foreign_household_id == Some(99))
        .unwrap();
    assert_eq!(repository.members_of(family.id).len(), 1);
}

#[test]
fn test_contributions_link_batch_giver_and_fund() {
    let repository = run_scenario(100);

    assert_eq!(repository.batches().len(), 1);
    assert_eq!(repository.transactions().len(), 2);

    let batch_id = repository.batches()[0].id;
    assert!(repository
        .transactions()
        .iter()
        .all(|t| t.batch_id == Some(batch_id)));

    // Household-only giver resolved to an adult's alias
    let ted_alias = repository.aliases().iter().find(|(_, person_id)| {
        repository
            .people()
            .iter()
            .any(|p| p.id == *person_id && p.first_name == "Ted")
    });
    assert!(ted_alias.is_some());
    let (ted_alias_id, _) = *ted_alias.unwrap();
    assert_eq!(repository.transactions()[1].authorized_alias_id, ted_alias_id);

    // Funds were created on the fly, once per name
    let accounts = repository.accounts().unwrap();
    let names: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert!(names.contains(&"General Fund"));
    assert!(names.contains(&"Building Fund"));
    assert_eq!(names.iter().filter(|n| **n == "General Fund").count(), 1);
}

#[test]
fn test_pledge_links_pledger_and_fund() {
    let repository = run_scenario(100);

    assert_eq!(repository.pledges().len(), 1);
    let pledge = &repository.pledges()[0];
    assert_eq!(pledge.total_amount, 1200.0);

    let building = repository
        .accounts()
        .unwrap()
        .into_iter()
        .find(|a| a.name == "Building Fund")
        .unwrap();
    assert_eq!(pledge.account_id, building.id);
}

#[test]
fn test_address_attaches_to_committed_family() {
    let repository = run_scenario(100);

    let decker = repository
        .families()
        .iter()
        .find(|f| f.foreign_household_id == Some(10))
        .unwrap();
    assert_eq!(decker.addresses.len(), 1);
    assert_eq!(decker.addresses[0].street1, "11624 N 31st Dr");
}

#[test]
fn test_communications_update_email_phone_and_attributes() {
    let mut repository = run_scenario(100);

    let ted = repository
        .people()
        .iter()
        .find(|p| p.first_name == "Ted")
        .unwrap();
    // First email becomes primary, second lands in the secondary attribute
    assert_eq!(
        ted.email,
        Some(("ted@rocksolid.example".to_string(), true))
    );
    assert!(ted.phones.iter().any(|p| p.number == "5557654321"));
    let ted_id = ted.id;

    let secondary = repository
        .get_or_create_attribute(
            AttributeEntityType::Person,
            "SecondaryEmail",
            "Text",
            "Secondary Email",
            "",
        )
        .unwrap();
    let values = repository.values_by_attribute(secondary).unwrap();
    assert_eq!(values, vec![(ted_id, "ted.alt@rocksolid.example".to_string())]);

    let twitter = repository
        .get_or_create_attribute(
            AttributeEntityType::Person,
            "TwitterUsername",
            "SocialMedia",
            "Twitter Username",
            "",
        )
        .unwrap();
    let values = repository.values_by_attribute(twitter).unwrap();
    assert_eq!(values, vec![(ted_id, "teddecker".to_string())]);
}

#[test]
fn test_new_member_joins_existing_family_on_later_run() {
    let config = ImportConfig::default();
    let mut orchestrator = ImportOrchestrator::new(
        config.clone(),
        Box::new(scenario_source()),
        CSV_EXPORT,
        MemoryRepository::new(),
    );
    orchestrator.run().unwrap();
    let repository = orchestrator.into_repository();
    let families_before = repository.families().len();

    // A later export adds Alex to the already-imported Decker household
    let source = MemorySource::new().with_table(
        "individual",
        vec![decker_row(0, 5, "Alex", "Child", "2015-08-20")],
    );
    let mut orchestrator =
        ImportOrchestrator::new(config, Box::new(source), CSV_EXPORT, repository);
    orchestrator.run().unwrap();
    let repository = orchestrator.into_repository();

    assert_eq!(repository.families().len(), families_before);
    let decker = repository
        .families()
        .iter()
        .find(|f| f.foreign_household_id == Some(10))
        .unwrap();
    assert_eq!(repository.members_of(decker.id).len(), 5);
}

#[test]
fn test_dominant_campus_lands_on_the_family_record() {
    let source = MemorySource::new().with_table(
        "individual",
        vec![
            decker_row(0, 1, "Ted", "Head", "1975-02-10").with("campus", json!("West")),
            decker_row(1, 2, "Cindy", "Spouse", "1977-05-01").with("campus", json!("West")),
            decker_row(2, 3, "Noah", "Child", "2012-03-12").with("campus", json!("MAIN")),
            Row::new(3)
                .with("individual_id", json!(20))
                .with("household_id", json!(11))
                .with("household_name", json!("Jones Family"))
                .with("first_name", json!("Ben"))
                .with("last_name", json!("Jones"))
                .with("campus", json!("MAIN")),
        ],
    );
    let lookups = LookupTables::standard().with_campuses(vec![
        DefinedValue::new(1001, "Main Campus").with_short_code("MAIN"),
        DefinedValue::new(1002, "West Campus").with_short_code("WST"),
    ]);
    let mut orchestrator = ImportOrchestrator::new(
        ImportConfig::default(),
        Box::new(source),
        CSV_EXPORT,
        MemoryRepository::new(),
    )
    .with_lookups(lookups);
    orchestrator.run().unwrap();

    let repository = orchestrator.repository();
    let campus_of = |household: i64| {
        repository
            .families()
            .iter()
            .find(|f| f.foreign_household_id == Some(household))
            .unwrap()
            .campus_value_id
    };
    // Two of three Deckers attend West; the name prefix resolves it
    assert_eq!(campus_of(10), Some(1002));
    // The Jones row carries the short code
    assert_eq!(campus_of(11), Some(1001));
}
