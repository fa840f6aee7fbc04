//! Label-scanning overlay against the built-in timeline renderer
//!
//! Both ways of placing today's line must agree: scanning the rendered month
//! labels and asking the renderer for `date_to_x` directly.

use std::time::Duration;

use chrono::NaiveDate;
use milestrack_core::{
    ChartRenderer, DateResolution, DependencyEdge, Milestone, OverlayConfig, Renderer,
};
use milestrack_render::{
    draw_today_line, overlay_today_line, ChartSlot, LineStyle, OverlayOutcome, SvgChart,
    TimelineSvgRenderer, TodayLineController, TodayLinePlan,
};
use milestrack_status::format_dependencies;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Feed spanning Nov 2023 to Feb 2025, so January appears twice
fn multi_year_feed() -> Vec<DependencyEdge> {
    vec![
        DependencyEdge::new(
            Milestone::new("Radar", "PDR").actual(date(2023, 11, 6), date(2024, 1, 19)),
            Milestone::new("Radar", "CDR").projected(date(2024, 2, 1), date(2024, 7, 31)),
        ),
        DependencyEdge::new(
            Milestone::new("Radar", "CDR").projected(date(2024, 2, 1), date(2024, 7, 31)),
            Milestone::new("Avionics", "Integration").projected(date(2024, 8, 15), date(2025, 2, 14)),
        ),
    ]
}

fn rendered(edges: &[DependencyEdge], today: NaiveDate) -> (String, f64) {
    let chart = format_dependencies(edges, today);
    let renderer = TimelineSvgRenderer::new().chart_width(1200);
    let svg = renderer.render(&chart).unwrap();
    let x = renderer.date_to_x(&chart, today).unwrap();
    (svg, x)
}

#[test]
fn label_scan_matches_direct_positioning() {
    let edges = multi_year_feed();
    // axis runs Nov 1 2023 .. Mar 1 2025, 486 days over 1200px
    let px_per_day = 1200.0 / 486.0;

    for today in [
        date(2024, 1, 10),
        date(2024, 2, 29),
        date(2024, 6, 15),
        date(2024, 12, 1),
        date(2025, 1, 20),
    ] {
        let (svg, direct) = rendered(&edges, today);
        let mut chart = SvgChart::parse(&svg).unwrap();
        let outcome = overlay_today_line(
            &mut chart,
            &edges,
            today,
            DateResolution::default(),
            &LineStyle::default(),
        );

        let scanned = outcome.x().unwrap_or_else(|| panic!("{}: {:?}", today, outcome));
        // the scan places the line at the end of the day, the renderer at its start
        assert!(
            (scanned - direct - px_per_day).abs() < 0.01,
            "{}: scanned {} vs direct {}",
            today,
            scanned,
            direct
        );
    }
}

#[test]
fn repeated_month_picks_this_years_label() {
    let edges = multi_year_feed();
    let today = date(2025, 1, 20);
    let plan = TodayLinePlan::new(&edges, today, DateResolution::default()).unwrap();
    assert_eq!(plan.label, "Jan");
    assert_eq!(plan.occurrences, 2);
    assert_eq!(plan.occurrence, 2);

    let (svg, _) = rendered(&edges, today);
    let chart = SvgChart::parse(&svg).unwrap();
    let labels = chart.text_labels("Jan");
    assert_eq!(labels.len(), 2);
    let placed = plan.locate(&chart).unwrap();
    assert!(placed.x > labels[0].x);
    assert!(placed.x > labels[1].x);
}

#[test]
fn overlay_line_survives_serialization() {
    let edges = multi_year_feed();
    let today = date(2024, 6, 15);
    let (svg, _) = rendered(&edges, today);
    let mut chart = SvgChart::parse(&svg).unwrap();
    let plan = TodayLinePlan::new(&edges, today, DateResolution::default()).unwrap();
    let x = draw_today_line(&mut chart, &plan, &LineStyle::default()).unwrap();

    let reparsed = SvgChart::parse(&chart.to_svg_string()).unwrap();
    let line = reparsed.find_by_id("today-line").unwrap();
    assert_eq!(line.numeric_attr("x1"), Some(x));
    assert_eq!(line.numeric_attr("y2"), reparsed.height());
}

#[test]
fn today_outside_chart_draws_nothing() {
    let edges = multi_year_feed();
    let (svg, _) = rendered(&edges, date(2024, 6, 15));
    let mut chart = SvgChart::parse(&svg).unwrap();
    let outcome = overlay_today_line(
        &mut chart,
        &edges,
        date(2025, 3, 1),
        DateResolution::default(),
        &LineStyle::default(),
    );
    assert_eq!(outcome, OverlayOutcome::OutsideRange);
    assert!(chart.find_by_id("today-line").is_none());
}

#[tokio::test(start_paused = true)]
async fn controller_follows_data_changes() {
    let edges = multi_year_feed();
    let config = OverlayConfig {
        maintain: false,
        ..OverlayConfig::default()
    };
    let controller = TodayLineController::new(ChartSlot::new(), config, DateResolution::default());

    let first = controller.data_changed(&edges, date(2024, 6, 15));
    tokio::time::sleep(Duration::from_millis(120)).await;
    let second = controller.data_changed(&edges, date(2024, 6, 16));

    // chart painted only after the second change
    let (svg, _) = rendered(&edges, date(2024, 6, 16));
    controller.host().paint(SvgChart::parse(&svg).unwrap());

    assert_eq!(first.await.unwrap(), OverlayOutcome::Superseded);
    let outcome = second.await.unwrap();
    assert!(outcome.is_drawn());

    let painted = controller.host().snapshot().unwrap();
    let svg = painted.to_svg_string();
    assert_eq!(svg.matches("id=\"today-line\"").count(), 1);
}
