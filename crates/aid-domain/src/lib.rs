//! # Aid & Conflict Dashboard - Domain Model
//!
//! Record types, user selections and canonical display tables shared by
//! the warehouse loader, the aggregation pipeline and the dashboard binary.
//!
//! Every record set is flat and read-only once loaded. Country aliases are
//! folded into their canonical name and event dates are derived when a
//! [`RecordSets`] is built, before anything is filtered or grouped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Sentinel shown in every selector for "no filter"
pub const ALL: &str = "All";

/// Canonical display name for Israel
pub const ISRAEL: &str = "Israel";

/// Canonical display name for the Palestinian territories
pub const PALESTINE: &str = "Palestine";

/// Raw country labels that name the same place as a canonical label.
const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("West Bank and Gaza", PALESTINE),
    ("OPT", PALESTINE),
];

/// Canonicalize a raw country label. Unknown names pass through unchanged.
#[must_use]
pub fn canonical_country(name: &str) -> &str {
    COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, canonical)| *canonical)
}

/// Whether a raw label is a known alias of a canonical country name.
#[must_use]
pub fn is_country_alias(name: &str) -> bool {
    COUNTRY_ALIASES.iter().any(|(alias, _)| *alias == name)
}

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A selector value: either the `All` sentinel or one concrete choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Selection<T> {
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    #[must_use]
    pub const fn as_option(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Selection<U> {
        match self {
            Self::All => Selection::All,
            Self::Only(value) => Selection::Only(f(value)),
        }
    }
}

impl<T: fmt::Display> Selection<T> {
    /// Display label, using `all_label` for the sentinel
    /// (e.g. "All Countries", "All Years").
    pub fn label_or(&self, all_label: &str) -> String {
        match self {
            Self::All => all_label.to_string(),
            Self::Only(value) => value.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Selection<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::All, Self::Only)
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Borrowed view of a single record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
    Missing,
}

impl Value<'_> {
    /// Numeric reading of the field. Text and missing values count as zero,
    /// matching how a column sum skips nulls.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Int(v) => v as f64,
            Self::Float(v) => v,
            Self::Text(_) | Self::Missing => 0.0,
        }
    }

    /// Owned grouping key. Missing values and measures (floats) have none.
    #[must_use]
    pub fn to_key(&self) -> Option<Key> {
        match *self {
            Self::Text(s) => Some(Key::Text(s.to_string())),
            Self::Int(v) => Some(Key::Int(v)),
            Self::Float(_) | Self::Missing => None,
        }
    }

    /// Equality against an owned key.
    #[must_use]
    pub fn matches(&self, key: &Key) -> bool {
        match (self, key) {
            (Self::Text(a), Key::Text(b)) => *a == b.as_str(),
            (Self::Int(a), Key::Int(b)) => a == b,
            _ => false,
        }
    }
}

/// Owned, totally ordered grouping/filter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl Key {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

/// Field-addressable row. The associated field enum names every column a
/// pipeline stage may filter, group or sum on.
pub trait Record {
    type Field: Copy + Eq + fmt::Debug;

    fn value(&self, field: Self::Field) -> Value<'_>;
}

/// Records that carry a country label subject to canonicalization.
pub trait CountryScoped {
    fn country_mut(&mut self) -> Option<&mut String>;
}

/// Replace country aliases in place. Consumes and returns the rows so the
/// loaded set is canonical before it is frozen.
#[must_use]
pub fn canonicalize_countries<R: CountryScoped>(mut rows: Vec<R>) -> Vec<R> {
    for row in &mut rows {
        if let Some(country) = row.country_mut() {
            if is_country_alias(country) {
                *country = canonical_country(country).to_string();
            }
        }
    }
    rows
}

fn text(value: Option<&String>) -> Value<'_> {
    value.map_or(Value::Missing, |s| Value::Text(s.as_str()))
}

// =============================================================================
// AID TRANSACTIONS
// =============================================================================

/// One foreign-aid disbursement.
///
/// Only the fiscal year is guaranteed; any other column may be null in the
/// warehouse. A missing amount sums as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidTransaction {
    pub country: Option<String>,
    pub fiscal_year: i32,
    pub dollar_amount: Option<f64>,
    pub activity_name: Option<String>,
    pub activity_description: Option<String>,
    pub funding_agency: Option<String>,
    pub objective_name: Option<String>,
    pub purpose_name: Option<String>,
    pub category_name: Option<String>,
    pub sector_name: Option<String>,
}

/// Columns of [`AidTransaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AidField {
    Country,
    FiscalYear,
    DollarAmount,
    ActivityName,
    ActivityDescription,
    FundingAgency,
    ObjectiveName,
    PurposeName,
    CategoryName,
    SectorName,
}

impl AidField {
    /// Warehouse column name
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Country => "Country_Name",
            Self::FiscalYear => "Fiscal_Year",
            Self::DollarAmount => "Current_Dollar_Amount",
            Self::ActivityName => "Activity_Name",
            Self::ActivityDescription => "Activity_Description",
            Self::FundingAgency => "Funding_Agency_Name",
            Self::ObjectiveName => "Foreign_Assistance_Objective_Name",
            Self::PurposeName => "International_Purpose_Name",
            Self::CategoryName => "International_Category_Name",
            Self::SectorName => "International_Sector_Name",
        }
    }
}

impl Record for AidTransaction {
    type Field = AidField;

    fn value(&self, field: AidField) -> Value<'_> {
        match field {
            AidField::Country => text(self.country.as_ref()),
            AidField::FiscalYear => Value::Int(i64::from(self.fiscal_year)),
            AidField::DollarAmount => self.dollar_amount.map_or(Value::Missing, Value::Float),
            AidField::ActivityName => text(self.activity_name.as_ref()),
            AidField::ActivityDescription => text(self.activity_description.as_ref()),
            AidField::FundingAgency => text(self.funding_agency.as_ref()),
            AidField::ObjectiveName => text(self.objective_name.as_ref()),
            AidField::PurposeName => text(self.purpose_name.as_ref()),
            AidField::CategoryName => text(self.category_name.as_ref()),
            AidField::SectorName => text(self.sector_name.as_ref()),
        }
    }
}

impl CountryScoped for AidTransaction {
    fn country_mut(&mut self) -> Option<&mut String> {
        self.country.as_mut()
    }
}

// =============================================================================
// CONFLICT EVENTS
// =============================================================================

/// Monthly event and fatality counters for both sides of the conflict.
///
/// The political-violence and civilian-targeting sets share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEvent {
    pub year: i32,
    pub month: Option<String>,
    pub pse_events: i64,
    pub pse_fatalities: i64,
    pub israel_events: i64,
    pub israel_fatalities: i64,
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub type PoliticalEvent = ConflictEvent;
pub type CivilianEvent = ConflictEvent;

impl ConflictEvent {
    /// First day of the event month, or `None` when the month is missing
    /// or not a full English month name. Abbreviations such as `Oct` are
    /// rejected.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        let month = self.month.as_deref()?;
        let index = MONTHS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(month))?;
        let number = u32::try_from(index + 1).ok()?;
        NaiveDate::from_ymd_opt(self.year, number, 1)
    }
}

/// Columns of [`ConflictEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
    Year,
    Month,
    PseEvents,
    PseFatalities,
    IsraelEvents,
    IsraelFatalities,
}

impl EventField {
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::PseEvents => "pse_events",
            Self::PseFatalities => "pse_fatalities",
            Self::IsraelEvents => "israel_events",
            Self::IsraelFatalities => "israel_fatalities",
        }
    }
}

impl Record for ConflictEvent {
    type Field = EventField;

    fn value(&self, field: EventField) -> Value<'_> {
        match field {
            EventField::Year => Value::Int(i64::from(self.year)),
            EventField::Month => text(self.month.as_ref()),
            EventField::PseEvents => Value::Int(self.pse_events),
            EventField::PseFatalities => Value::Int(self.pse_fatalities),
            EventField::IsraelEvents => Value::Int(self.israel_events),
            EventField::IsraelFatalities => Value::Int(self.israel_fatalities),
        }
    }
}

/// An event row whose date parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedEvent {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub event: ConflictEvent,
}

impl Record for DatedEvent {
    type Field = EventField;

    fn value(&self, field: EventField) -> Value<'_> {
        self.event.value(field)
    }
}

/// Attach derived dates, silently dropping rows without one, and order the
/// result by date. Rows sharing a date keep their load order.
#[must_use]
pub fn date_events(rows: Vec<ConflictEvent>) -> Vec<DatedEvent> {
    let total = rows.len();
    let mut dated: Vec<DatedEvent> = rows
        .into_iter()
        .filter_map(|event| event.date().map(|date| DatedEvent { date, event }))
        .collect();
    dated.sort_by_key(|row| row.date);

    let dropped = total - dated.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = dated.len(), "Dropped event rows without a parseable date");
    }
    dated
}

// =============================================================================
// HEALTHCARE ATTACKS
// =============================================================================

/// Per-country totals of attacks on healthcare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthcareAttack {
    pub country: String,
    pub facilities_damaged: i64,
    pub facilities_occupied: i64,
    pub transportation_damaged: i64,
    pub supplies_looted: i64,
    pub workers_killed: i64,
    pub workers_injured: i64,
    pub weapons_used: i64,
}

/// Columns of [`HealthcareAttack`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthField {
    Country,
    FacilitiesDamaged,
    FacilitiesOccupied,
    TransportationDamaged,
    SuppliesLooted,
    WorkersKilled,
    WorkersInjured,
    WeaponsUsed,
}

impl Record for HealthcareAttack {
    type Field = HealthField;

    fn value(&self, field: HealthField) -> Value<'_> {
        match field {
            HealthField::Country => Value::Text(&self.country),
            HealthField::FacilitiesDamaged => Value::Int(self.facilities_damaged),
            HealthField::FacilitiesOccupied => Value::Int(self.facilities_occupied),
            HealthField::TransportationDamaged => Value::Int(self.transportation_damaged),
            HealthField::SuppliesLooted => Value::Int(self.supplies_looted),
            HealthField::WorkersKilled => Value::Int(self.workers_killed),
            HealthField::WorkersInjured => Value::Int(self.workers_injured),
            HealthField::WeaponsUsed => Value::Int(self.weapons_used),
        }
    }
}

impl CountryScoped for HealthcareAttack {
    fn country_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.country)
    }
}

// =============================================================================
// WEAPON / LOCATION INCIDENTS
// =============================================================================

/// Incident counts per (country, weapon, location).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponIncident {
    pub country: String,
    pub weapon_used: Option<String>,
    pub weapon_usage_count: i64,
    pub incident_location: Option<String>,
    pub attack_count: i64,
}

/// Columns of [`WeaponIncident`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponField {
    Country,
    WeaponUsed,
    WeaponUsageCount,
    IncidentLocation,
    AttackCount,
}

impl Record for WeaponIncident {
    type Field = WeaponField;

    fn value(&self, field: WeaponField) -> Value<'_> {
        match field {
            WeaponField::Country => Value::Text(&self.country),
            WeaponField::WeaponUsed => text(self.weapon_used.as_ref()),
            WeaponField::WeaponUsageCount => Value::Int(self.weapon_usage_count),
            WeaponField::IncidentLocation => text(self.incident_location.as_ref()),
            WeaponField::AttackCount => Value::Int(self.attack_count),
        }
    }
}

impl CountryScoped for WeaponIncident {
    fn country_mut(&mut self) -> Option<&mut String> {
        Some(&mut self.country)
    }
}

// =============================================================================
// SELECTOR ENUMS
// =============================================================================

/// Dimension the objective breakdown groups by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDimension {
    #[default]
    ObjectiveName,
    PurposeName,
}

impl SortDimension {
    pub const ALL: [Self; 2] = [Self::ObjectiveName, Self::PurposeName];

    #[must_use]
    pub const fn field(&self) -> AidField {
        match self {
            Self::ObjectiveName => AidField::ObjectiveName,
            Self::PurposeName => AidField::PurposeName,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.field().column()
    }
}

/// Healthcare counter shown in the pie chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    #[default]
    WorkersKilled,
    WorkersInjured,
    FacilitiesDamaged,
    FacilitiesOccupied,
    TransportationDamaged,
    SuppliesLooted,
}

impl HealthMetric {
    pub const ALL: [Self; 6] = [
        Self::WorkersKilled,
        Self::WorkersInjured,
        Self::FacilitiesDamaged,
        Self::FacilitiesOccupied,
        Self::TransportationDamaged,
        Self::SuppliesLooted,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::WorkersKilled => "Health Workers Killed",
            Self::WorkersInjured => "Health Workers Injured",
            Self::FacilitiesDamaged => "Healthcare Facilities Damaged",
            Self::FacilitiesOccupied => "Healthcare Facilities Occupied",
            Self::TransportationDamaged => "Health Transportation Damaged",
            Self::SuppliesLooted => "Health Supplies Looted",
        }
    }

    #[must_use]
    pub const fn field(&self) -> HealthField {
        match self {
            Self::WorkersKilled => HealthField::WorkersKilled,
            Self::WorkersInjured => HealthField::WorkersInjured,
            Self::FacilitiesDamaged => HealthField::FacilitiesDamaged,
            Self::FacilitiesOccupied => HealthField::FacilitiesOccupied,
            Self::TransportationDamaged => HealthField::TransportationDamaged,
            Self::SuppliesLooted => HealthField::SuppliesLooted,
        }
    }

    /// Snake-case name used on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WorkersKilled => "workers_killed",
            Self::WorkersInjured => "workers_injured",
            Self::FacilitiesDamaged => "facilities_damaged",
            Self::FacilitiesOccupied => "facilities_occupied",
            Self::TransportationDamaged => "transportation_damaged",
            Self::SuppliesLooted => "supplies_looted",
        }
    }
}

/// Dimension of the weapon/location comparison, paired with its counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    #[default]
    WeaponUsed,
    IncidentLocation,
}

impl WeaponCategory {
    pub const ALL: [Self; 2] = [Self::WeaponUsed, Self::IncidentLocation];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::WeaponUsed => "Weapons Used by perpetrator",
            Self::IncidentLocation => "Location of Incident",
        }
    }

    /// `(category column, counter column)`
    #[must_use]
    pub const fn fields(&self) -> (WeaponField, WeaponField) {
        match self {
            Self::WeaponUsed => (WeaponField::WeaponUsed, WeaponField::WeaponUsageCount),
            Self::IncidentLocation => (WeaponField::IncidentLocation, WeaponField::AttackCount),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WeaponUsed => "weapon_used",
            Self::IncidentLocation => "incident_location",
        }
    }
}

/// Y-axis toggle for the event timelines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YAxisMetric {
    #[default]
    Events,
    Fatalities,
}

impl YAxisMetric {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Events => "Events",
            Self::Fatalities => "Fatalities",
        }
    }

    /// Palestinian and Israeli counters plotted for this metric
    #[must_use]
    pub const fn fields(&self) -> [EventField; 2] {
        match self {
            Self::Events => [EventField::PseEvents, EventField::IsraelEvents],
            Self::Fatalities => [EventField::PseFatalities, EventField::IsraelFatalities],
        }
    }
}

/// One side of the conflict, used for per-side comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Israel,
    Palestine,
}

impl Side {
    pub const BOTH: [Self; 2] = [Self::Israel, Self::Palestine];

    #[must_use]
    pub const fn country(&self) -> &'static str {
        match self {
            Self::Israel => ISRAEL,
            Self::Palestine => PALESTINE,
        }
    }
}

macro_rules! parse_option {
    ($ty:ty, $kind:literal, { $($($name:literal)|+ => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($($name)|+ => Ok($variant),)+
                    _ => Err(DomainError::UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Which conflict-event set a timeline plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Political,
    Civilian,
}

impl EventKind {
    pub const ALL: [Self; 2] = [Self::Political, Self::Civilian];

    /// Title prefix, e.g. `Political Events in Israel and Palestine`
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Political => "Political",
            Self::Civilian => "Civilian",
        }
    }
}

parse_option!(SortDimension, "sort dimension", {
    "objective" | "objective_name" | "foreign_assistance_objective_name" => SortDimension::ObjectiveName,
    "purpose" | "purpose_name" | "international_purpose_name" => SortDimension::PurposeName,
});

parse_option!(HealthMetric, "health metric", {
    "workers_killed" | "health workers killed" => HealthMetric::WorkersKilled,
    "workers_injured" | "health workers injured" => HealthMetric::WorkersInjured,
    "facilities_damaged" | "healthcare facilities damaged" => HealthMetric::FacilitiesDamaged,
    "facilities_occupied" | "healthcare facilities occupied" => HealthMetric::FacilitiesOccupied,
    "transportation_damaged" | "health transportation damaged" => HealthMetric::TransportationDamaged,
    "supplies_looted" | "health supplies looted" => HealthMetric::SuppliesLooted,
});

parse_option!(WeaponCategory, "weapon category", {
    "weapon" | "weapon_used" | "weapons used by perpetrator" => WeaponCategory::WeaponUsed,
    "location" | "incident_location" | "location of incident" => WeaponCategory::IncidentLocation,
});

parse_option!(YAxisMetric, "y-axis metric", {
    "events" => YAxisMetric::Events,
    "fatalities" => YAxisMetric::Fatalities,
});

// =============================================================================
// PALETTE
// =============================================================================

/// Single lookup table for series colours and counter display labels.
pub struct Palette;

impl Palette {
    /// Colour for any label the table does not know
    pub const DEFAULT_COLOR: &'static str = "gray";

    const COLORS: &'static [(&'static str, &'static str)] = &[
        (ISRAEL, "steelblue"),
        (PALESTINE, "salmon"),
        ("Economic", "#FFD700"),
        ("Military", "#008000"),
    ];

    const GROUP_LABELS: &'static [(EventField, &'static str)] = &[
        (EventField::PseEvents, "Palestine Events"),
        (EventField::IsraelEvents, "Israel Events"),
        (EventField::PseFatalities, "Palestine Fatalities"),
        (EventField::IsraelFatalities, "Israel Fatalities"),
    ];

    #[must_use]
    pub fn color(label: &str) -> Option<&'static str> {
        Self::COLORS
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, color)| *color)
    }

    #[must_use]
    pub fn color_or_default(label: &str) -> &'static str {
        Self::color(label).unwrap_or(Self::DEFAULT_COLOR)
    }

    /// Human-readable series label for an event counter, falling back to
    /// the raw column name.
    #[must_use]
    pub fn group_label(field: EventField) -> &'static str {
        Self::GROUP_LABELS
            .iter()
            .find(|(f, _)| *f == field)
            .map_or_else(|| field.column(), |(_, label)| *label)
    }
}

// =============================================================================
// RECORD SETS
// =============================================================================

/// The five record sets exactly as fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecordSets {
    pub aid: Vec<AidTransaction>,
    pub political: Vec<PoliticalEvent>,
    pub civilian: Vec<CivilianEvent>,
    pub healthcare: Vec<HealthcareAttack>,
    pub weapons: Vec<WeaponIncident>,
}

/// Loaded, canonical and read-only record sets for one session.
#[derive(Debug, Clone, Default)]
pub struct RecordSets {
    pub aid: Arc<[AidTransaction]>,
    pub political: Arc<[DatedEvent]>,
    pub civilian: Arc<[DatedEvent]>,
    pub healthcare: Arc<[HealthcareAttack]>,
    pub weapons: Arc<[WeaponIncident]>,
}

impl RecordSets {
    /// Canonicalize countries, derive event dates and freeze the sets.
    #[must_use]
    pub fn from_raw(raw: RawRecordSets) -> Self {
        Self {
            aid: canonicalize_countries(raw.aid).into(),
            political: date_events(raw.political).into(),
            civilian: date_events(raw.civilian).into(),
            healthcare: canonicalize_countries(raw.healthcare).into(),
            weapons: canonicalize_countries(raw.weapons).into(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown {kind}: '{value}'")]
    UnknownOption { kind: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::address::en::CountryName;

    fn event(year: i32, month: Option<&str>) -> ConflictEvent {
        ConflictEvent {
            year,
            month: month.map(String::from),
            pse_events: 1,
            pse_fatalities: 2,
            israel_events: 3,
            israel_fatalities: 4,
        }
    }

    #[test]
    fn test_canonical_country_aliases() {
        assert_eq!(canonical_country("West Bank and Gaza"), PALESTINE);
        assert_eq!(canonical_country("OPT"), PALESTINE);
        assert_eq!(canonical_country("Israel"), ISRAEL);
    }

    #[test]
    fn test_canonical_country_passthrough() {
        for _ in 0..50 {
            let name: String = CountryName().fake();
            if !is_country_alias(&name) {
                assert_eq!(canonical_country(&name), name);
            }
        }
    }

    #[test]
    fn test_event_date_parsing() {
        assert_eq!(
            event(2023, Some("October")).date(),
            NaiveDate::from_ymd_opt(2023, 10, 1)
        );
        assert_eq!(
            event(2021, Some("march")).date(),
            NaiveDate::from_ymd_opt(2021, 3, 1)
        );
        assert_eq!(event(2023, Some("Smarch")).date(), None);
        assert_eq!(event(2023, None).date(), None);
    }

    #[test]
    fn test_event_date_rejects_abbreviated_months() {
        assert_eq!(event(2023, Some("Oct")).date(), None);
        assert_eq!(event(2023, Some("Sept")).date(), None);
        assert_eq!(event(2023, Some("jan")).date(), None);
        assert_eq!(
            event(2023, Some("SEPTEMBER")).date(),
            NaiveDate::from_ymd_opt(2023, 9, 1)
        );
    }

    #[test]
    fn test_aid_nulls_read_as_missing() {
        let row = AidTransaction {
            country: None,
            fiscal_year: 2020,
            dollar_amount: None,
            activity_name: None,
            activity_description: None,
            funding_agency: None,
            objective_name: None,
            purpose_name: None,
            category_name: None,
            sector_name: None,
        };
        assert_eq!(row.value(AidField::ActivityName), Value::Missing);
        assert_eq!(row.value(AidField::FundingAgency), Value::Missing);
        assert_eq!(row.value(AidField::DollarAmount).as_f64(), 0.0);
        assert_eq!(row.value(AidField::FiscalYear), Value::Int(2020));

        let canonical = canonicalize_countries(vec![
            row.clone(),
            AidTransaction {
                country: Some("West Bank and Gaza".to_string()),
                ..row
            },
        ]);
        assert_eq!(canonical[0].country, None);
        assert_eq!(canonical[1].country.as_deref(), Some(PALESTINE));
    }

    #[test]
    fn test_date_events_drops_and_sorts() {
        let rows = vec![
            event(2024, Some("February")),
            event(2023, Some("Nope")),
            event(2023, Some("December")),
            event(2024, None),
        ];
        let dated = date_events(rows);
        assert_eq!(dated.len(), 2);
        assert_eq!(dated[0].date, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(dated[1].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_record_sets_canonicalize_before_freeze() {
        let raw = RawRecordSets {
            healthcare: vec![HealthcareAttack {
                country: "OPT".to_string(),
                facilities_damaged: 1,
                facilities_occupied: 0,
                transportation_damaged: 0,
                supplies_looted: 0,
                workers_killed: 0,
                workers_injured: 0,
                weapons_used: 0,
            }],
            ..Default::default()
        };
        let sets = RecordSets::from_raw(raw);
        assert_eq!(sets.healthcare[0].country, PALESTINE);
    }

    #[test]
    fn test_selection_labels() {
        let all: Selection<i32> = Selection::All;
        assert_eq!(all.label_or("All Years"), "All Years");
        assert_eq!(Selection::Only(2020).label_or("All Years"), "2020");
        assert_eq!(all.to_string(), ALL);
        assert_eq!(Selection::from(Some("Israel")), Selection::Only("Israel"));
    }

    #[test]
    fn test_palette_defaults() {
        assert_eq!(Palette::color_or_default(ISRAEL), "steelblue");
        assert_eq!(Palette::color_or_default(PALESTINE), "salmon");
        assert_eq!(Palette::color_or_default("Egypt"), Palette::DEFAULT_COLOR);
        assert_eq!(Palette::group_label(EventField::PseEvents), "Palestine Events");
        assert_eq!(Palette::group_label(EventField::Year), "Year");
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("Fatalities".parse::<YAxisMetric>().unwrap(), YAxisMetric::Fatalities);
        assert_eq!(
            "Health Workers Injured".parse::<HealthMetric>().unwrap(),
            HealthMetric::WorkersInjured
        );
        assert_eq!("purpose".parse::<SortDimension>().unwrap(), SortDimension::PurposeName);
        assert_eq!(
            "location".parse::<WeaponCategory>().unwrap(),
            WeaponCategory::IncidentLocation
        );
        assert!(matches!(
            "bogus".parse::<HealthMetric>(),
            Err(DomainError::UnknownOption { kind: "health metric", .. })
        ));
    }

    #[test]
    fn test_value_keys() {
        assert_eq!(Value::Text("a").to_key(), Some(Key::from("a")));
        assert_eq!(Value::Int(3).to_key(), Some(Key::Int(3)));
        assert_eq!(Value::Float(1.5).to_key(), None);
        assert!(Value::Int(2020).matches(&Key::from(2020)));
        assert!(!Value::Text("2020").matches(&Key::from(2020)));
    }
}
