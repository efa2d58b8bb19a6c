//! Chart generation and rendering for the dashboard.
//!
//! Charts are built as ECharts options with charming and initialised by a
//! small script in the page head.

use charming::{
    Chart,
    component::{Legend, Title},
    element::{Tooltip, Trigger},
    series::Pie,
};
use maud::PreEscaped;

use crate::{dashboard::summary::DashboardSummary, html::HeadElement};

/// Where the ECharts library is loaded from.
pub(super) const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Each chart follows the browser's dark mode setting and resizes with the window.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A donut chart of fraudulent vs. safe transactions.
pub(super) fn verdict_chart(summary: &DashboardSummary) -> Chart {
    Chart::new()
        .title(Title::new().text("Verdicts").left("center"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().bottom("5%").left("center"))
        .color::<charming::element::Color>(vec!["#ef4444".into(), "#22c55e".into()])
        .series(
            Pie::new()
                .name("Transactions")
                .radius(vec!["40%", "70%"])
                .data(vec![
                    (summary.fraud_count as f64, "Fraud"),
                    (summary.safe_count as f64, "Safe"),
                ]),
        )
}
