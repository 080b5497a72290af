//! Dashboard views built from the loaded record sets.
//!
//! Each builder is a pure function of the rows it reads and the selection
//! driving it; the result is exactly the table a chart or KPI renders.

use crate::format::{format_count, format_large_number, format_percent, percentage_of_total};
use crate::table::{Filter, LongRow, SortOrder, group_sum, melt, rank_top_n, sort_by_value, sum};
use aid_domain::{
    AidField, AidTransaction, DatedEvent, EventField, EventKind, HealthMetric, HealthcareAttack, Palette,
    Selection, Side, SortDimension, WeaponField, WeaponCategory, WeaponIncident, YAxisMetric,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rows kept in the top funding activities table
pub const TOP_ACTIVITIES: usize = 10;

/// Rows kept per side in the weapon/location comparison
pub const TOP_PER_SIDE: usize = 5;

const ALL_COUNTRIES: &str = "All Countries";
const ALL_YEARS: &str = "All Years";

// =============================================================================
// SELECTIONS
// =============================================================================

/// Selectors of the aid overview section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidSelection {
    pub country: Selection<String>,
    pub fiscal_year: Selection<i32>,
    pub funding_agency: Selection<String>,
}

/// Selectors of the objective breakdown section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownSelection {
    pub country: Selection<String>,
    pub fiscal_year: Selection<i32>,
    pub sort_by: SortDimension,
}

/// Selectors of an event timeline section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSelection {
    pub year: Selection<i32>,
    pub y_axis: YAxisMetric,
}

// =============================================================================
// SELECTOR OPTIONS
// =============================================================================

/// Choices offered by the aid selectors, each led by `All`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOptions {
    pub countries: Vec<Selection<String>>,
    pub fiscal_years: Vec<Selection<i32>>,
    pub funding_agencies: Vec<Selection<String>>,
}

/// Distinct countries and agencies ascending, fiscal years descending.
/// Null countries and agencies offer no option.
#[must_use]
pub fn selector_options(aid: &[AidTransaction]) -> SelectorOptions {
    let countries: BTreeSet<&str> = aid.iter().filter_map(|row| row.country.as_deref()).collect();
    let years: BTreeSet<i32> = aid.iter().map(|row| row.fiscal_year).collect();
    let agencies: BTreeSet<&str> = aid
        .iter()
        .filter_map(|row| row.funding_agency.as_deref())
        .collect();

    SelectorOptions {
        countries: with_all(countries.into_iter().map(String::from)),
        fiscal_years: with_all(years.into_iter().rev()),
        funding_agencies: with_all(agencies.into_iter().map(String::from)),
    }
}

/// Years present in an event set, most recent first.
#[must_use]
pub fn available_years(events: &[DatedEvent]) -> Vec<i32> {
    let years: BTreeSet<i32> = events.iter().map(|row| row.event.year).collect();
    years.into_iter().rev().collect()
}

fn with_all<T>(values: impl Iterator<Item = T>) -> Vec<Selection<T>> {
    std::iter::once(Selection::All)
        .chain(values.map(Selection::Only))
        .collect()
}

// =============================================================================
// AID OVERVIEW
// =============================================================================

/// Yearly aid total for one country, coloured for the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidTrendPoint {
    pub country: String,
    pub fiscal_year: i32,
    pub total: f64,
    pub color: String,
}

/// KPI heading, total, filtered table and trend of the aid section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidOverview {
    pub heading: String,
    pub heading_color: String,
    pub total_aid: f64,
    pub total_aid_display: String,
    pub transactions: Vec<AidTransaction>,
    pub trend_title: String,
    pub trend: Vec<AidTrendPoint>,
}

#[must_use]
pub fn aid_overview(aid: &[AidTransaction], selection: &AidSelection) -> AidOverview {
    let filtered = Filter::new()
        .with(AidField::Country, &selection.country)
        .with(AidField::FiscalYear, &selection.fiscal_year)
        .with(AidField::FundingAgency, &selection.funding_agency)
        .apply(aid);
    let total_aid = sum(filtered.iter().copied(), AidField::DollarAmount);

    // The trend spans every year, so only country and agency apply.
    let trend_rows = Filter::new()
        .with(AidField::Country, &selection.country)
        .with(AidField::FundingAgency, &selection.funding_agency)
        .apply(aid);
    let trend = group_sum(
        trend_rows,
        &[AidField::Country, AidField::FiscalYear],
        AidField::DollarAmount,
    )
    .into_iter()
    .map(|row| {
        let country = row.label(0);
        AidTrendPoint {
            color: Palette::color_or_default(&country).to_string(),
            fiscal_year: row
                .key(1)
                .and_then(aid_domain::Key::as_int)
                .and_then(|year| i32::try_from(year).ok())
                .unwrap_or_default(),
            total: row.value,
            country,
        }
    })
    .collect();

    let heading = selection.country.label_or(ALL_COUNTRIES);
    let heading_color = selection
        .country
        .as_option()
        .map_or(Palette::DEFAULT_COLOR, |country| Palette::color_or_default(country))
        .to_string();

    AidOverview {
        trend_title: format!("Foreign Aid Over Time ({heading})"),
        heading,
        heading_color,
        total_aid,
        total_aid_display: format_large_number(total_aid),
        transactions: filtered.into_iter().cloned().collect(),
        trend,
    }
}

// =============================================================================
// OBJECTIVE BREAKDOWN
// =============================================================================

/// One bar of the horizontal breakdown chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownBar {
    pub label: String,
    pub total: f64,
    pub color: Option<String>,
}

/// One ranked row of the top funding activities table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub rank: usize,
    pub activity_name: String,
    pub activity_description: String,
    pub total: f64,
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveBreakdown {
    pub dimension: SortDimension,
    pub title: String,
    pub bars: Vec<BreakdownBar>,
    pub activities_title: String,
    pub top_activities: Vec<ActivityRow>,
}

#[must_use]
pub fn objective_breakdown(aid: &[AidTransaction], selection: &BreakdownSelection) -> ObjectiveBreakdown {
    let filtered = Filter::new()
        .with(AidField::Country, &selection.country)
        .with(AidField::FiscalYear, &selection.fiscal_year)
        .apply(aid);

    let dimension = selection.sort_by;
    let coloured = dimension == SortDimension::ObjectiveName;
    let bars = sort_by_value(
        group_sum(filtered.iter().copied(), &[dimension.field()], AidField::DollarAmount),
        SortOrder::Ascending,
    )
    .into_iter()
    .map(|row| {
        let label = row.label(0);
        BreakdownBar {
            color: coloured.then(|| Palette::color_or_default(&label).to_string()),
            total: row.value,
            label,
        }
    })
    .collect();

    let top_activities = rank_top_n(
        group_sum(
            filtered,
            &[AidField::ActivityName, AidField::ActivityDescription],
            AidField::DollarAmount,
        ),
        SortOrder::Descending,
        TOP_ACTIVITIES,
    )
    .into_iter()
    .enumerate()
    .map(|(i, row)| ActivityRow {
        rank: i + 1,
        activity_name: row.label(0),
        activity_description: row.label(1),
        total: row.value,
        total_display: format_large_number(row.value),
    })
    .collect();

    let scope = format!(
        "{}, {}",
        selection.country.label_or(ALL_COUNTRIES),
        selection.fiscal_year.label_or(ALL_YEARS)
    );

    ObjectiveBreakdown {
        dimension,
        title: format!("Total Foreign Aid by {} ({scope})", dimension.as_str()),
        bars,
        activities_title: format!("Top {TOP_ACTIVITIES} Funding Activities ({scope})"),
        top_activities,
    }
}

// =============================================================================
// EVENT TIMELINES
// =============================================================================

/// Fatality totals of both sides for the selected year scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalityTotals {
    pub pse_fatalities: f64,
    pub israel_fatalities: f64,
    pub pse_display: String,
    pub israel_display: String,
}

impl FatalityTotals {
    fn of<'a>(rows: impl IntoIterator<Item = &'a DatedEvent> + Clone) -> Self {
        let pse = sum(rows.clone(), EventField::PseFatalities);
        let israel = sum(rows, EventField::IsraelFatalities);
        Self {
            pse_fatalities: pse,
            israel_fatalities: israel,
            pse_display: format_count(pse),
            israel_display: format_count(israel),
        }
    }
}

/// Year options, KPI totals and long-format series of one event set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimeline {
    pub title: String,
    pub y_axis: YAxisMetric,
    pub available_years: Vec<i32>,
    pub totals: FatalityTotals,
    pub series: Vec<LongRow<NaiveDate>>,
}

/// Build a timeline. Totals follow the year selection; the plotted series
/// always covers the whole dated set.
#[must_use]
pub fn event_timeline(kind: EventKind, events: &[DatedEvent], selection: &TimelineSelection) -> EventTimeline {
    let in_scope = year_scope(events, &selection.year);

    EventTimeline {
        title: format!("{} {} Over Time", kind.label(), selection.y_axis.label()),
        y_axis: selection.y_axis,
        available_years: available_years(events),
        totals: FatalityTotals::of(in_scope.iter().copied()),
        series: melt(events, |row| row.date, &selection.y_axis.fields(), Palette::group_label),
    }
}

/// Civilian fatalities as a share of political fatalities, per side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatalityShare {
    pub pse: Option<f64>,
    pub israel: Option<f64>,
    pub pse_display: String,
    pub israel_display: String,
}

/// Both sums use the same year scope. A zero political total yields `None`.
#[must_use]
pub fn fatality_share(civilian: &[DatedEvent], political: &[DatedEvent], year: &Selection<i32>) -> FatalityShare {
    let civilian_totals = FatalityTotals::of(year_scope(civilian, year).iter().copied());
    let political_totals = FatalityTotals::of(year_scope(political, year).iter().copied());

    let pse = percentage_of_total(civilian_totals.pse_fatalities, political_totals.pse_fatalities);
    let israel = percentage_of_total(
        civilian_totals.israel_fatalities,
        political_totals.israel_fatalities,
    );
    if pse.is_none() || israel.is_none() {
        tracing::debug!(?year, "Political fatality total is zero, share not available");
    }

    FatalityShare {
        pse,
        israel,
        pse_display: format_percent(pse),
        israel_display: format_percent(israel),
    }
}

fn year_scope<'a>(events: &'a [DatedEvent], year: &Selection<i32>) -> Vec<&'a DatedEvent> {
    Filter::new().with(EventField::Year, year).apply(events)
}

// =============================================================================
// HEALTHCARE ATTACKS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub country: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareBreakdown {
    pub metric: HealthMetric,
    pub title: String,
    pub slices: Vec<PieSlice>,
}

#[must_use]
pub fn healthcare_breakdown(attacks: &[HealthcareAttack], metric: HealthMetric) -> HealthcareBreakdown {
    let slices = group_sum(attacks, &[aid_domain::HealthField::Country], metric.field())
        .into_iter()
        .map(|row| {
            let country = row.label(0);
            PieSlice {
                color: Palette::color_or_default(&country).to_string(),
                value: row.value,
                country,
            }
        })
        .collect();

    HealthcareBreakdown {
        metric,
        title: format!("{} by Country", metric.label()),
        slices,
    }
}

// =============================================================================
// WEAPON / LOCATION COMPARISON
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: f64,
}

/// Top categories for one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidePanel {
    pub side: Side,
    pub title: String,
    pub color: String,
    pub rows: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponComparison {
    pub category: WeaponCategory,
    pub panels: Vec<SidePanel>,
}

#[must_use]
pub fn weapon_comparison(incidents: &[WeaponIncident], category: WeaponCategory) -> WeaponComparison {
    let (column, counter) = category.fields();
    let grouped = group_sum(incidents, &[WeaponField::Country, column], counter);

    let panels = Side::BOTH
        .into_iter()
        .map(|side| {
            let country = side.country();
            let rows = grouped
                .iter()
                .filter(|row| row.key(0).and_then(aid_domain::Key::as_text) == Some(country))
                .cloned()
                .collect();
            SidePanel {
                side,
                title: format!("{country} - {}", category.label()),
                color: Palette::color_or_default(country).to_string(),
                rows: rank_top_n(rows, SortOrder::Descending, TOP_PER_SIDE)
                    .into_iter()
                    .map(|row| CategoryCount {
                        label: row.label(1),
                        count: row.value,
                    })
                    .collect(),
            }
        })
        .collect();

    WeaponComparison { category, panels }
}
