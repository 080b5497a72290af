//! Report generation for a dashboard snapshot.

use crate::error::Result;
use crate::format::{format_count, format_large_number};
use crate::session::{DashboardParams, DashboardSession};
use crate::views::{
    AidOverview, EventTimeline, FatalityShare, HealthcareBreakdown, ObjectiveBreakdown,
    WeaponComparison,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Write as _;

/// Every section of the dashboard for the current selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub generated_at: String,
    pub params: DashboardParams,
    pub aid_overview: AidOverview,
    pub objective_breakdown: ObjectiveBreakdown,
    pub political: EventTimeline,
    pub civilian: EventTimeline,
    pub civilian_share: FatalityShare,
    pub healthcare: HealthcareBreakdown,
    pub weapons: WeaponComparison,
}

impl DashboardSession {
    /// Snapshot every section, rebuilding only the stale ones.
    pub fn report(&mut self) -> DashboardReport {
        let aid_overview = self.aid_overview().clone();
        let objective_breakdown = self.objective_breakdown().clone();
        let political = self.political_timeline().clone();
        let (civilian, civilian_share) = self.civilian_timeline().clone();
        let healthcare = self.healthcare().clone();
        let weapons = self.weapons().clone();

        DashboardReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            params: self.params().clone(),
            aid_overview,
            objective_breakdown,
            political,
            civilian,
            civilian_share,
            healthcare,
            weapons,
        }
    }
}

impl DashboardReport {
    /// Report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Report as Markdown tables.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Israel Palestine Conflict Dashboard\n\n");
        let _ = writeln!(md, "**Generated:** {}\n", self.generated_at);

        let aid = &self.aid_overview;
        md.push_str("## 1. Key US Foreign Aid Figures\n\n");
        md.push_str("| Scope | Total Aid (USD) | Transactions |\n");
        md.push_str("|-------|-----------------|--------------|\n");
        let _ = writeln!(
            md,
            "| {} | {} | {} |\n",
            cell(&aid.heading),
            aid.total_aid_display,
            aid.transactions.len()
        );

        if !aid.trend.is_empty() {
            let _ = writeln!(md, "### {}\n", aid.trend_title);
            md.push_str("| Country | Fiscal Year | Total Aid |\n");
            md.push_str("|---------|-------------|-----------|\n");
            for point in &aid.trend {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} |",
                    cell(&point.country),
                    point.fiscal_year,
                    format_large_number(point.total)
                );
            }
            md.push('\n');
        }

        let breakdown = &self.objective_breakdown;
        if !breakdown.bars.is_empty() {
            let _ = writeln!(md, "### {}\n", breakdown.title);
            md.push_str("| Label | Total Aid |\n");
            md.push_str("|-------|-----------|\n");
            for bar in &breakdown.bars {
                let _ = writeln!(md, "| {} | {} |", cell(&bar.label), format_large_number(bar.total));
            }
            md.push('\n');
        }

        if !breakdown.top_activities.is_empty() {
            let _ = writeln!(md, "### {}\n", breakdown.activities_title);
            md.push_str("| Rank | Activity | Description | Total Aid |\n");
            md.push_str("|------|----------|-------------|-----------|\n");
            for row in &breakdown.top_activities {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | {} |",
                    row.rank,
                    cell(&row.activity_name),
                    cell(&row.activity_description),
                    row.total_display
                );
            }
            md.push('\n');
        }

        md.push_str("## 2. Political events and fatalities timeline\n\n");
        write_timeline(&mut md, &self.political, None);
        md.push_str("## Civilian targeting events and fatalities\n\n");
        write_timeline(&mut md, &self.civilian, Some(&self.civilian_share));

        let health = &self.healthcare;
        md.push_str("## 3. Attack on healthcare facilities\n\n");
        if !health.slices.is_empty() {
            let _ = writeln!(md, "### {}\n", health.title);
            md.push_str("| Country | Count |\n");
            md.push_str("|---------|-------|\n");
            for slice in &health.slices {
                let _ = writeln!(md, "| {} | {} |", cell(&slice.country), format_count(slice.value));
            }
            md.push('\n');
        }

        md.push_str("## Location of incident / weapon used by attacker\n\n");
        for panel in &self.weapons.panels {
            let _ = writeln!(md, "### {}\n", panel.title);
            if panel.rows.is_empty() {
                md.push_str("_No incidents recorded._\n\n");
                continue;
            }
            md.push_str("| Category | Occurrences |\n");
            md.push_str("|----------|-------------|\n");
            for row in &panel.rows {
                let _ = writeln!(md, "| {} | {} |", cell(&row.label), format_count(row.count));
            }
            md.push('\n');
        }

        md
    }
}

/// Table cell text: pipes escaped, line breaks flattened to spaces.
fn cell(text: &str) -> Cow<'_, str> {
    if text.contains(['|', '\n', '\r']) {
        Cow::Owned(
            text.replace('|', "\\|")
                .replace("\r\n", " ")
                .replace(['\n', '\r'], " "),
        )
    } else {
        Cow::Borrowed(text)
    }
}

fn write_timeline(md: &mut String, timeline: &EventTimeline, share: Option<&FatalityShare>) {
    md.push_str("| Side | Fatalities |");
    if share.is_some() {
        md.push_str(" Share of Political |");
    }
    md.push('\n');
    md.push_str("|------|------------|");
    if share.is_some() {
        md.push_str("--------------------|");
    }
    md.push('\n');

    let totals = &timeline.totals;
    match share {
        Some(share) => {
            let _ = writeln!(md, "| Palestine | {} | {} |", totals.pse_display, share.pse_display);
            let _ = writeln!(md, "| Israel | {} | {} |", totals.israel_display, share.israel_display);
        }
        None => {
            let _ = writeln!(md, "| Palestine | {} |", totals.pse_display);
            let _ = writeln!(md, "| Israel | {} |", totals.israel_display);
        }
    }
    let _ = writeln!(
        md,
        "\n_{}: {} points across {} years_\n",
        timeline.title,
        timeline.series.len(),
        timeline.available_years.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use aid_domain::{AidTransaction, RawRecordSets, RecordSets, WeaponIncident};

    #[test]
    fn test_empty_report() {
        let mut session = DashboardSession::new(RecordSets::default(), DashboardParams::default());
        let report = session.report();
        assert!(report.aid_overview.transactions.is_empty());
        assert_eq!(report.aid_overview.total_aid_display, "$0.00");
        assert!(report.objective_breakdown.top_activities.is_empty());
        assert_eq!(report.civilian_share.israel_display, "N/A");
        assert_eq!(report.weapons.panels.len(), 2);
    }

    #[test]
    fn test_markdown_generation() {
        let mut session = DashboardSession::new(RecordSets::default(), DashboardParams::default());
        let md = session.report().to_markdown();
        assert!(md.contains("# Israel Palestine Conflict Dashboard"));
        assert!(md.contains("| All Countries | $0.00 | 0 |"));
        assert!(md.contains("Israel - Weapons Used by perpetrator"));
    }

    #[test]
    fn test_markdown_escapes_cell_text() {
        assert_eq!(cell("plain"), "plain");
        assert_eq!(cell("a | b"), "a \\| b");
        assert_eq!(cell("line\r\nbreak\nhere"), "line break here");

        let records = RecordSets::from_raw(RawRecordSets {
            aid: vec![AidTransaction {
                country: Some("Israel".to_string()),
                fiscal_year: 2020,
                dollar_amount: Some(100.0),
                activity_name: Some("Water | Sanitation".to_string()),
                activity_description: Some("Wells\nand pumps | repairs".to_string()),
                funding_agency: Some("USAID".to_string()),
                objective_name: Some("Economic".to_string()),
                purpose_name: None,
                category_name: None,
                sector_name: None,
            }],
            weapons: vec![WeaponIncident {
                country: "Israel".to_string(),
                weapon_used: Some("Rifle|Pistol".to_string()),
                weapon_usage_count: 2,
                incident_location: None,
                attack_count: 2,
            }],
            ..Default::default()
        });
        let mut session = DashboardSession::new(records, DashboardParams::default());
        let md = session.report().to_markdown();

        assert!(md.contains("| 1 | Water \\| Sanitation | Wells and pumps \\| repairs | $100.00 |"));
        assert!(md.contains("| Rifle\\|Pistol | 2 |"));
        assert!(!md.contains("Wells\nand"));
    }

    #[test]
    fn test_json_generation() {
        let mut session = DashboardSession::new(RecordSets::default(), DashboardParams::default());
        let json = session.report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["healthcare"]["metric"], "workers_killed");
        assert_eq!(value["params"]["aid"]["country"], "all");
    }
}
