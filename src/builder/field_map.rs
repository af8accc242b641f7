//! Per-source-format field mappings.
//!
//! The row-to-draft transforms are shared across source formats; only the
//! column spelling differs. A `FieldMap` names, per semantic field, the
//! column a format stores it in, so adding a format means adding a table
//! here rather than another copy of the mapping logic.

/// Table names a source format uses for each entity family
#[derive(Debug, Clone, Copy)]
pub struct TableNames {
    /// The primary identity table carrying individual and household rows
    pub people: &'static str,
    /// Separate company table, when the format has one
    pub companies: Option<&'static str>,
    pub batches: &'static str,
    pub contributions: &'static str,
    pub pledges: &'static str,
    pub addresses: &'static str,
    pub communications: &'static str,
}

/// Column names for one source format
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pub tables: TableNames,

    // Primary identity table
    pub individual_id: &'static str,
    pub household_id: &'static str,
    pub household_name: &'static str,
    pub prefix: &'static str,
    pub first_name: &'static str,
    pub goes_by: Option<&'static str>,
    pub middle_name: &'static str,
    pub last_name: &'static str,
    pub suffix: &'static str,
    pub gender: &'static str,
    pub birth_date: &'static str,
    pub marital_status: &'static str,
    pub household_position: &'static str,
    pub connection_status: &'static str,
    pub campus: &'static str,
    pub email: Option<&'static str>,
    pub email_listed: Option<&'static str>,
    /// Flag column marking a row as a company, when the format flattens
    /// companies into the people table
    pub is_company: Option<&'static str>,
    /// Phone columns on the people table: (type label, column)
    pub phones: &'static [(&'static str, &'static str)],
    /// Free-form person columns stored as attributes: (key, name, column)
    pub person_attributes: &'static [(&'static str, &'static str, &'static str)],

    // Company table
    pub company_id: &'static str,
    pub company_name: &'static str,

    // Batch table
    pub batch_id: &'static str,
    pub batch_name: &'static str,
    pub batch_date: &'static str,
    pub batch_amount: &'static str,

    // Contribution table
    pub contribution_id: &'static str,
    pub contribution_batch_id: &'static str,
    pub contribution_individual_id: &'static str,
    pub contribution_household_id: &'static str,
    pub contribution_amount: &'static str,
    pub contribution_date: &'static str,
    pub contribution_type: &'static str,
    pub check_number: &'static str,
    pub memo: &'static str,
    pub fund_name: &'static str,
    pub sub_fund_name: &'static str,

    // Pledge table
    pub pledge_id: Option<&'static str>,
    pub pledge_individual_id: &'static str,
    pub pledge_household_id: &'static str,
    pub pledge_total: &'static str,
    pub pledge_start_date: &'static str,
    pub pledge_end_date: &'static str,
    pub pledge_frequency: &'static str,
    pub pledge_fund_name: &'static str,
    pub pledge_sub_fund_name: &'static str,

    // Address table
    pub address_household_id: &'static str,
    pub address_street1: &'static str,
    pub address_street2: &'static str,
    pub address_city: &'static str,
    pub address_state: &'static str,
    pub address_postal_code: &'static str,
    pub address_country: &'static str,
    pub address_type: &'static str,

    // Communication table
    pub communication_individual_id: &'static str,
    pub communication_household_id: &'static str,
    pub communication_type: &'static str,
    pub communication_value: &'static str,
    pub communication_listed: &'static str,
}

/// Column layout of FellowshipOne exports
pub const FELLOWSHIP_ONE: FieldMap = FieldMap {
    tables: TableNames {
        people: "Individual_Household",
        companies: Some("Company"),
        batches: "Batch",
        contributions: "Contribution",
        pledges: "Pledge",
        addresses: "Address",
        communications: "Communication",
    },

    individual_id: "Individual_ID",
    household_id: "Household_ID",
    household_name: "Household_Name",
    prefix: "Prefix",
    first_name: "First_Name",
    goes_by: Some("Goes_By"),
    middle_name: "Middle_Name",
    last_name: "Last_Name",
    suffix: "Suffix",
    gender: "Gender",
    birth_date: "Date_Of_Birth",
    marital_status: "Marital_Status",
    household_position: "Household_Position",
    connection_status: "Status_Name",
    campus: "SubStatus_Name",
    email: None,
    email_listed: None,
    is_company: None,
    phones: &[],
    person_attributes: &[
        ("FormerChurch", "Former Church", "Former_Church"),
        ("Employer", "Employer", "Employer"),
        ("Position", "Position", "Position"),
        ("School", "School", "School"),
    ],

    company_id: "Household_ID",
    company_name: "Household_Name",

    batch_id: "BatchID",
    batch_name: "BatchName",
    batch_date: "BatchDate",
    batch_amount: "BatchAmount",

    contribution_id: "ContributionID",
    contribution_batch_id: "BatchID",
    contribution_individual_id: "Individual_ID",
    contribution_household_id: "Household_ID",
    contribution_amount: "Amount",
    contribution_date: "Received_Date",
    contribution_type: "Contribution_Type_Name",
    check_number: "Check_Number",
    memo: "Memo",
    fund_name: "Fund_Name",
    sub_fund_name: "Sub_Fund_Name",

    pledge_id: None,
    pledge_individual_id: "Individual_ID",
    pledge_household_id: "Household_ID",
    pledge_total: "Total_Pledge",
    pledge_start_date: "Start_Date",
    pledge_end_date: "End_Date",
    pledge_frequency: "Pledge_Frequency_Name",
    pledge_fund_name: "Fund_Name",
    pledge_sub_fund_name: "Sub_Fund_Name",

    address_household_id: "Household_ID",
    address_street1: "Address_1",
    address_street2: "Address_2",
    address_city: "City",
    address_state: "State",
    address_postal_code: "Postal_Code",
    address_country: "Country",
    address_type: "Address_Type",

    communication_individual_id: "Individual_ID",
    communication_household_id: "Household_ID",
    communication_type: "Communication_Type",
    communication_value: "Communication_Value",
    communication_listed: "Listed",
};

/// Column layout of the generic CSV export format
pub const CSV_EXPORT: FieldMap = FieldMap {
    tables: TableNames {
        people: "individual",
        companies: None,
        batches: "batch",
        contributions: "contribution",
        pledges: "pledge",
        addresses: "address",
        communications: "communication",
    },

    individual_id: "individual_id",
    household_id: "household_id",
    household_name: "household_name",
    prefix: "prefix",
    first_name: "first_name",
    goes_by: Some("nick_name"),
    middle_name: "middle_name",
    last_name: "last_name",
    suffix: "suffix",
    gender: "gender",
    birth_date: "date_of_birth",
    marital_status: "marital_status",
    household_position: "household_position",
    connection_status: "status",
    campus: "campus",
    email: Some("email"),
    email_listed: Some("email_listed"),
    is_company: Some("is_company"),
    phones: &[
        ("Home", "home_phone"),
        ("Mobile", "mobile_phone"),
        ("Work", "work_phone"),
    ],
    person_attributes: &[
        ("FormerChurch", "Former Church", "former_church"),
        ("Employer", "Employer", "employer"),
        ("Position", "Position", "position"),
        ("School", "School", "school"),
        ("TwitterUsername", "Twitter Username", "twitter"),
        ("FacebookUsername", "Facebook Username", "facebook"),
    ],

    company_id: "household_id",
    company_name: "household_name",

    batch_id: "batch_id",
    batch_name: "batch_name",
    batch_date: "batch_date",
    batch_amount: "amount",

    contribution_id: "contribution_id",
    contribution_batch_id: "batch_id",
    contribution_individual_id: "individual_id",
    contribution_household_id: "household_id",
    contribution_amount: "amount",
    contribution_date: "received_date",
    contribution_type: "contribution_type_name",
    check_number: "check_number",
    memo: "memo",
    fund_name: "fund_name",
    sub_fund_name: "sub_fund_name",

    pledge_id: Some("pledge_id"),
    pledge_individual_id: "individual_id",
    pledge_household_id: "household_id",
    pledge_total: "total_pledge",
    pledge_start_date: "start_date",
    pledge_end_date: "end_date",
    pledge_frequency: "pledge_frequency",
    pledge_fund_name: "fund_name",
    pledge_sub_fund_name: "sub_fund_name",

    address_household_id: "household_id",
    address_street1: "address_1",
    address_street2: "address_2",
    address_city: "city",
    address_state: "state",
    address_postal_code: "postal_code",
    address_country: "country",
    address_type: "address_type",

    communication_individual_id: "individual_id",
    communication_household_id: "household_id",
    communication_type: "communication_type",
    communication_value: "communication_value",
    communication_listed: "listed",
};
