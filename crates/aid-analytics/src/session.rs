//! Explicit recomputation of dashboard sections.
//!
//! A [`DashboardSession`] owns the loaded record sets and the current
//! selections. Selection changes arrive as [`ParamChange`] events; a change
//! invalidates only the section it feeds, and an invalidated section is
//! rebuilt the next time it is read.

use crate::error::{AnalyticsError, Result};
use crate::views::{
    self, AidOverview, AidSelection, BreakdownSelection, EventTimeline, FatalityShare,
    HealthcareBreakdown, ObjectiveBreakdown, SelectorOptions, TimelineSelection, WeaponComparison,
};
use aid_domain::{
    EventKind, HealthMetric, RecordSets, Selection, SortDimension, WeaponCategory, YAxisMetric, ALL,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Every selector on the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardParams {
    pub aid: AidSelection,
    pub breakdown: BreakdownSelection,
    pub political: TimelineSelection,
    pub civilian: TimelineSelection,
    pub health_metric: HealthMetric,
    pub weapon_category: WeaponCategory,
}

/// Independently recomputed parts of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    AidOverview,
    ObjectiveBreakdown,
    PoliticalTimeline,
    CivilianTimeline,
    Healthcare,
    Weapons,
}

/// A single selector change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamChange {
    AidCountry(Selection<String>),
    AidYear(Selection<i32>),
    AidAgency(Selection<String>),
    BreakdownCountry(Selection<String>),
    BreakdownYear(Selection<i32>),
    SortBy(SortDimension),
    PoliticalYear(Selection<i32>),
    PoliticalYAxis(YAxisMetric),
    CivilianYear(Selection<i32>),
    CivilianYAxis(YAxisMetric),
    HealthMetric(HealthMetric),
    WeaponCategory(WeaponCategory),
}

impl ParamChange {
    /// Section whose inputs this change touches
    #[must_use]
    pub const fn section(&self) -> Section {
        match self {
            Self::AidCountry(_) | Self::AidYear(_) | Self::AidAgency(_) => Section::AidOverview,
            Self::BreakdownCountry(_) | Self::BreakdownYear(_) | Self::SortBy(_) => {
                Section::ObjectiveBreakdown
            }
            Self::PoliticalYear(_) | Self::PoliticalYAxis(_) => Section::PoliticalTimeline,
            Self::CivilianYear(_) | Self::CivilianYAxis(_) => Section::CivilianTimeline,
            Self::HealthMetric(_) => Section::Healthcare,
            Self::WeaponCategory(_) => Section::Weapons,
        }
    }

    /// Parse a `name=value` pair as sent by a selector widget or the CLI,
    /// e.g. `aid.country=Israel` or `political.year=All`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown selector name or an unparsable value.
    pub fn parse(assignment: &str) -> Result<Self> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            AnalyticsError::InvalidParameter(format!("expected name=value, got '{assignment}'"))
        })?;
        let value = value.trim();

        Ok(match name.trim() {
            "aid.country" => Self::AidCountry(text_selection(value)),
            "aid.year" => Self::AidYear(year_selection(value)?),
            "aid.agency" => Self::AidAgency(text_selection(value)),
            "breakdown.country" => Self::BreakdownCountry(text_selection(value)),
            "breakdown.year" => Self::BreakdownYear(year_selection(value)?),
            "breakdown.sort_by" => Self::SortBy(SortDimension::from_str(value)?),
            "political.year" => Self::PoliticalYear(year_selection(value)?),
            "political.y_axis" => Self::PoliticalYAxis(YAxisMetric::from_str(value)?),
            "civilian.year" => Self::CivilianYear(year_selection(value)?),
            "civilian.y_axis" => Self::CivilianYAxis(YAxisMetric::from_str(value)?),
            "health.metric" => Self::HealthMetric(HealthMetric::from_str(value)?),
            "weapons.category" => Self::WeaponCategory(WeaponCategory::from_str(value)?),
            other => {
                return Err(AnalyticsError::InvalidParameter(format!(
                    "unknown selector '{other}'"
                )));
            }
        })
    }
}

fn text_selection(value: &str) -> Selection<String> {
    if value.eq_ignore_ascii_case(ALL) {
        Selection::All
    } else {
        Selection::Only(value.to_string())
    }
}

fn year_selection(value: &str) -> Result<Selection<i32>> {
    if value.eq_ignore_ascii_case(ALL) {
        return Ok(Selection::All);
    }
    value
        .parse()
        .map(Selection::Only)
        .map_err(|_| AnalyticsError::InvalidParameter(format!("invalid year '{value}'")))
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Loaded data, current selections and lazily rebuilt sections.
#[derive(Debug)]
pub struct DashboardSession {
    records: RecordSets,
    params: DashboardParams,
    options: Option<SelectorOptions>,
    aid_overview: Option<AidOverview>,
    objective_breakdown: Option<ObjectiveBreakdown>,
    political: Option<EventTimeline>,
    civilian: Option<(EventTimeline, FatalityShare)>,
    healthcare: Option<HealthcareBreakdown>,
    weapons: Option<WeaponComparison>,
    builds: BTreeMap<Section, usize>,
}

impl DashboardSession {
    #[must_use]
    pub fn new(records: RecordSets, params: DashboardParams) -> Self {
        Self {
            records,
            params,
            options: None,
            aid_overview: None,
            objective_breakdown: None,
            political: None,
            civilian: None,
            healthcare: None,
            weapons: None,
            builds: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn params(&self) -> &DashboardParams {
        &self.params
    }

    #[must_use]
    pub const fn records(&self) -> &RecordSets {
        &self.records
    }

    /// Apply a selector change. Returns `true` when the value differed and
    /// the affected section was invalidated.
    pub fn apply(&mut self, change: ParamChange) -> bool {
        let section = change.section();
        let params = &mut self.params;
        let changed = match change {
            ParamChange::AidCountry(v) => replace_if_changed(&mut params.aid.country, v),
            ParamChange::AidYear(v) => replace_if_changed(&mut params.aid.fiscal_year, v),
            ParamChange::AidAgency(v) => replace_if_changed(&mut params.aid.funding_agency, v),
            ParamChange::BreakdownCountry(v) => replace_if_changed(&mut params.breakdown.country, v),
            ParamChange::BreakdownYear(v) => replace_if_changed(&mut params.breakdown.fiscal_year, v),
            ParamChange::SortBy(v) => replace_if_changed(&mut params.breakdown.sort_by, v),
            ParamChange::PoliticalYear(v) => replace_if_changed(&mut params.political.year, v),
            ParamChange::PoliticalYAxis(v) => replace_if_changed(&mut params.political.y_axis, v),
            ParamChange::CivilianYear(v) => replace_if_changed(&mut params.civilian.year, v),
            ParamChange::CivilianYAxis(v) => replace_if_changed(&mut params.civilian.y_axis, v),
            ParamChange::HealthMetric(v) => replace_if_changed(&mut params.health_metric, v),
            ParamChange::WeaponCategory(v) => replace_if_changed(&mut params.weapon_category, v),
        };

        if changed {
            self.invalidate(section);
            tracing::debug!(?section, "Selection changed, section invalidated");
        }
        changed
    }

    /// Drop the cached output of one section.
    pub fn invalidate(&mut self, section: Section) {
        match section {
            Section::AidOverview => self.aid_overview = None,
            Section::ObjectiveBreakdown => self.objective_breakdown = None,
            Section::PoliticalTimeline => self.political = None,
            Section::CivilianTimeline => self.civilian = None,
            Section::Healthcare => self.healthcare = None,
            Section::Weapons => self.weapons = None,
        }
    }

    /// Whether the section will be rebuilt on next read.
    #[must_use]
    pub const fn is_stale(&self, section: Section) -> bool {
        match section {
            Section::AidOverview => self.aid_overview.is_none(),
            Section::ObjectiveBreakdown => self.objective_breakdown.is_none(),
            Section::PoliticalTimeline => self.political.is_none(),
            Section::CivilianTimeline => self.civilian.is_none(),
            Section::Healthcare => self.healthcare.is_none(),
            Section::Weapons => self.weapons.is_none(),
        }
    }

    /// How many times a section has been built in this session.
    #[must_use]
    pub fn build_count(&self, section: Section) -> usize {
        self.builds.get(&section).copied().unwrap_or(0)
    }

    fn record_build(builds: &mut BTreeMap<Section, usize>, section: Section) {
        *builds.entry(section).or_insert(0) += 1;
        tracing::debug!(?section, "Recomputing section");
    }

    pub fn selector_options(&mut self) -> &SelectorOptions {
        let aid = &self.records.aid;
        self.options
            .get_or_insert_with(|| views::selector_options(aid))
    }

    pub fn aid_overview(&mut self) -> &AidOverview {
        let Self { records, params, aid_overview, builds, .. } = self;
        aid_overview.get_or_insert_with(|| {
            Self::record_build(builds, Section::AidOverview);
            views::aid_overview(&records.aid, &params.aid)
        })
    }

    pub fn objective_breakdown(&mut self) -> &ObjectiveBreakdown {
        let Self { records, params, objective_breakdown, builds, .. } = self;
        objective_breakdown.get_or_insert_with(|| {
            Self::record_build(builds, Section::ObjectiveBreakdown);
            views::objective_breakdown(&records.aid, &params.breakdown)
        })
    }

    pub fn political_timeline(&mut self) -> &EventTimeline {
        let Self { records, params, political, builds, .. } = self;
        political.get_or_insert_with(|| {
            Self::record_build(builds, Section::PoliticalTimeline);
            views::event_timeline(EventKind::Political, &records.political, &params.political)
        })
    }

    /// Civilian timeline together with its share of political fatalities.
    pub fn civilian_timeline(&mut self) -> &(EventTimeline, FatalityShare) {
        let Self { records, params, civilian, builds, .. } = self;
        civilian.get_or_insert_with(|| {
            Self::record_build(builds, Section::CivilianTimeline);
            (
                views::event_timeline(EventKind::Civilian, &records.civilian, &params.civilian),
                views::fatality_share(&records.civilian, &records.political, &params.civilian.year),
            )
        })
    }

    pub fn healthcare(&mut self) -> &HealthcareBreakdown {
        let Self { records, params, healthcare, builds, .. } = self;
        healthcare.get_or_insert_with(|| {
            Self::record_build(builds, Section::Healthcare);
            views::healthcare_breakdown(&records.healthcare, params.health_metric)
        })
    }

    pub fn weapons(&mut self) -> &WeaponComparison {
        let Self { records, params, weapons, builds, .. } = self;
        weapons.get_or_insert_with(|| {
            Self::record_build(builds, Section::Weapons);
            views::weapon_comparison(&records.weapons, params.weapon_category)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aid_domain::{AidTransaction, RawRecordSets};

    fn session() -> DashboardSession {
        let aid = ["Israel", "West Bank and Gaza", "Israel"]
            .iter()
            .enumerate()
            .map(|(i, country)| AidTransaction {
                country: Some((*country).to_string()),
                fiscal_year: 2020 + i as i32,
                dollar_amount: Some(1_000.0 * (i + 1) as f64),
                activity_name: Some(format!("Activity {i}")),
                activity_description: Some("Support".to_string()),
                funding_agency: Some("USAID".to_string()),
                objective_name: Some("Economic".to_string()),
                purpose_name: Some("Relief".to_string()),
                category_name: None,
                sector_name: None,
            })
            .collect();
        let records = RecordSets::from_raw(RawRecordSets {
            aid,
            ..Default::default()
        });
        DashboardSession::new(records, DashboardParams::default())
    }

    #[test]
    fn test_sections_are_memoized() {
        let mut session = session();
        assert!(session.is_stale(Section::AidOverview));
        assert_eq!(session.aid_overview().total_aid, 6_000.0);
        assert_eq!(session.aid_overview().total_aid, 6_000.0);
        assert_eq!(session.build_count(Section::AidOverview), 1);
        assert!(!session.is_stale(Section::AidOverview));
    }

    #[test]
    fn test_change_invalidates_only_its_section() {
        let mut session = session();
        session.aid_overview();
        session.objective_breakdown();
        session.healthcare();

        assert!(session.apply(ParamChange::AidCountry(Selection::Only("Israel".to_string()))));
        assert!(session.is_stale(Section::AidOverview));
        assert!(!session.is_stale(Section::ObjectiveBreakdown));
        assert!(!session.is_stale(Section::Healthcare));

        assert_eq!(session.aid_overview().total_aid, 4_000.0);
        assert_eq!(session.build_count(Section::AidOverview), 2);
        assert_eq!(session.build_count(Section::ObjectiveBreakdown), 1);
    }

    #[test]
    fn test_unchanged_value_keeps_cache() {
        let mut session = session();
        session.weapons();
        assert!(!session.apply(ParamChange::WeaponCategory(WeaponCategory::WeaponUsed)));
        assert!(!session.is_stale(Section::Weapons));
        assert!(session.apply(ParamChange::WeaponCategory(WeaponCategory::IncidentLocation)));
        assert!(session.is_stale(Section::Weapons));
    }

    #[test]
    fn test_parse_changes() {
        assert_eq!(
            ParamChange::parse("aid.country=Israel").unwrap(),
            ParamChange::AidCountry(Selection::Only("Israel".to_string()))
        );
        assert_eq!(
            ParamChange::parse("political.year = all").unwrap(),
            ParamChange::PoliticalYear(Selection::All)
        );
        assert_eq!(
            ParamChange::parse("health.metric=supplies_looted").unwrap(),
            ParamChange::HealthMetric(HealthMetric::SuppliesLooted)
        );
        assert!(matches!(
            ParamChange::parse("aid.year=twenty"),
            Err(AnalyticsError::InvalidParameter(_))
        ));
        assert!(matches!(
            ParamChange::parse("weapons.category=knives"),
            Err(AnalyticsError::Domain(_))
        ));
        assert!(ParamChange::parse("colour").is_err());
    }

    #[test]
    fn test_civilian_section_with_empty_sets() {
        let mut session = session();
        let (timeline, share) = session.civilian_timeline();
        assert!(timeline.series.is_empty());
        assert_eq!(share.pse, None);
        assert_eq!(share.pse_display, "N/A");
    }
}
