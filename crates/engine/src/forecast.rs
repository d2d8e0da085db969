//! Forecast aggregator: weighted value per lead and the roll-ups built on it.
//!
//! Every function here is pure and takes a caller-owned slice of leads.
//! Archived leads never count toward a stage total or the forecast.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::numeric::{percent_of, ratio_percent};
use crate::stage::Stage;
use crate::types::Lead;

/// Weighted total for one pipeline column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub count: usize,
    pub weighted_total: Decimal,
}

/// Headline forecast figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSummary {
    /// Weighted value of open (not Won/Lost) leads.
    pub weighted_pipeline: Decimal,
    /// Raw expected value of Won leads.
    pub closed_revenue: Decimal,
    /// Won as a whole percentage of Won + Lost; 0 when nothing is closed.
    pub win_rate: u32,
}

/// Probability-adjusted expected revenue of a lead.
///
/// A Won lead counts its full expected value whatever its probability.
/// Every other stage, Lost included, counts
/// `round(expected_value × probability / 100)`.
pub fn weighted_value(lead: &Lead) -> Decimal {
    let expected = lead.expected_value_or_zero();
    if lead.status == Stage::Won {
        return expected;
    }
    percent_of(expected, lead.probability_or_zero())
}

fn active(leads: &[Lead]) -> impl Iterator<Item = &Lead> {
    leads.iter().filter(|l| !l.archived)
}

/// Sum of weighted values of non-archived leads in `stage`.
pub fn stage_summary(leads: &[Lead], stage: Stage) -> Decimal {
    active(leads)
        .filter(|l| l.status == stage)
        .map(weighted_value)
        .sum()
}

/// One [`StageSummary`] per stage, in pipeline order.
pub fn pipeline_board(leads: &[Lead]) -> Vec<StageSummary> {
    Stage::ALL
        .into_iter()
        .map(|stage| StageSummary {
            stage,
            count: active(leads).filter(|l| l.status == stage).count(),
            weighted_total: stage_summary(leads, stage),
        })
        .collect()
}

pub fn forecast_summary(leads: &[Lead]) -> ForecastSummary {
    let weighted_pipeline = active(leads)
        .filter(|l| l.status.is_open())
        .map(weighted_value)
        .sum();
    let closed_revenue = active(leads)
        .filter(|l| l.status == Stage::Won)
        .map(Lead::expected_value_or_zero)
        .sum();
    let total_won = active(leads).filter(|l| l.status == Stage::Won).count();
    let total_closed = active(leads).filter(|l| l.status.is_terminal()).count();

    ForecastSummary {
        weighted_pipeline,
        closed_revenue,
        win_rate: ratio_percent(total_won, total_closed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(status: Stage, value: Option<i64>, probability: Option<u8>) -> Lead {
        Lead {
            id: format!("{}-{:?}-{:?}", status, value, probability),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            company: "Co".to_string(),
            company_domain: None,
            service: "Svc".to_string(),
            description: None,
            source: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            status,
            owner_id: None,
            archived: false,
            expected_value: value.map(Decimal::from),
            probability,
            last_activity: None,
        }
    }

    fn archived(mut l: Lead) -> Lead {
        l.archived = true;
        l
    }

    fn worked_example() -> Vec<Lead> {
        vec![
            lead(Stage::Won, Some(1000), Some(40)),
            lead(Stage::Negotiation, Some(2000), Some(50)),
            lead(Stage::Lost, Some(500), Some(10)),
        ]
    }

    #[test]
    fn won_counts_full_value_regardless_of_probability() {
        for p in [None, Some(0), Some(40), Some(100)] {
            assert_eq!(
                weighted_value(&lead(Stage::Won, Some(1234), p)),
                Decimal::from(1234)
            );
        }
    }

    #[test]
    fn won_keeps_fractional_value_exactly() {
        let mut l = lead(Stage::Won, None, Some(10));
        l.expected_value = Some(Decimal::new(99995, 2));
        assert_eq!(weighted_value(&l), Decimal::new(99995, 2));
    }

    #[test]
    fn open_stages_use_rounded_formula() {
        for stage in Stage::ALL.into_iter().filter(|s| *s != Stage::Won) {
            assert_eq!(
                weighted_value(&lead(stage, Some(333), Some(15))),
                Decimal::from(50),
                "stage {}",
                stage
            );
        }
    }

    #[test]
    fn nulls_read_as_zero() {
        assert_eq!(weighted_value(&lead(Stage::New, None, Some(80))), Decimal::ZERO);
        assert_eq!(weighted_value(&lead(Stage::New, Some(900), None)), Decimal::ZERO);
        assert_eq!(weighted_value(&lead(Stage::Won, None, None)), Decimal::ZERO);
    }

    #[test]
    fn worked_example_weighted_values() {
        let values: Vec<Decimal> = worked_example().iter().map(weighted_value).collect();
        assert_eq!(
            values,
            [Decimal::from(1000), Decimal::from(1000), Decimal::from(50)]
        );
    }

    #[test]
    fn worked_example_forecast() {
        let summary = forecast_summary(&worked_example());
        assert_eq!(summary.weighted_pipeline, Decimal::from(1000));
        assert_eq!(summary.closed_revenue, Decimal::from(1000));
        assert_eq!(summary.win_rate, 50);
    }

    #[test]
    fn empty_forecast_is_all_zero() {
        assert_eq!(
            forecast_summary(&[]),
            ForecastSummary {
                weighted_pipeline: Decimal::ZERO,
                closed_revenue: Decimal::ZERO,
                win_rate: 0,
            }
        );
    }

    #[test]
    fn no_closed_leads_means_zero_win_rate() {
        let leads = vec![lead(Stage::Qualified, Some(100), Some(50))];
        assert_eq!(forecast_summary(&leads).win_rate, 0);
    }

    #[test]
    fn archived_leads_excluded_from_forecast() {
        let leads = vec![
            lead(Stage::Won, Some(1000), None),
            archived(lead(Stage::Won, Some(5000), None)),
            archived(lead(Stage::Lost, Some(10), None)),
            archived(lead(Stage::New, Some(10_000), Some(90))),
        ];
        let summary = forecast_summary(&leads);
        assert_eq!(summary.closed_revenue, Decimal::from(1000));
        assert_eq!(summary.weighted_pipeline, Decimal::ZERO);
        assert_eq!(summary.win_rate, 100);
    }

    #[test]
    fn stage_summary_excludes_archived() {
        let leads = vec![
            lead(Stage::New, Some(100), Some(50)),
            archived(lead(Stage::New, Some(1000), Some(50))),
            lead(Stage::Contacted, Some(1000), Some(50)),
        ];
        assert_eq!(stage_summary(&leads, Stage::New), Decimal::from(50));
    }

    #[test]
    fn stage_summary_of_empty_stage_is_zero() {
        assert_eq!(stage_summary(&[], Stage::Negotiation), Decimal::ZERO);
        let leads = vec![lead(Stage::New, Some(100), Some(50))];
        assert_eq!(stage_summary(&leads, Stage::Won), Decimal::ZERO);
    }

    #[test]
    fn lost_lead_keeps_residual_weight_but_not_in_pipeline() {
        let leads = vec![lead(Stage::Lost, Some(500), Some(10))];
        assert_eq!(stage_summary(&leads, Stage::Lost), Decimal::from(50));
        assert_eq!(forecast_summary(&leads).weighted_pipeline, Decimal::ZERO);
    }

    #[test]
    fn board_has_every_stage_in_order() {
        let mut leads = worked_example();
        leads.push(lead(Stage::Negotiation, Some(100), Some(25)));
        let board = pipeline_board(&leads);
        let stages: Vec<Stage> = board.iter().map(|s| s.stage).collect();
        assert_eq!(stages, Stage::ALL);

        let negotiation = &board[4];
        assert_eq!(negotiation.count, 2);
        assert_eq!(negotiation.weighted_total, Decimal::from(1025));
        assert_eq!(board[0].count, 0);
        assert_eq!(board[0].weighted_total, Decimal::ZERO);
    }

    #[test]
    fn largest_accepted_values_sum_without_overflow() {
        let max = crate::types::MAX_EXPECTED_VALUE;
        let mut leads = Vec::new();
        for _ in 0..1000 {
            let mut won = lead(Stage::Won, None, Some(100));
            won.expected_value = Some(max);
            leads.push(won);
            let mut open = lead(Stage::ProposalSent, None, Some(99));
            open.expected_value = Some(max);
            leads.push(open);
        }
        let summary = forecast_summary(&leads);
        assert_eq!(summary.closed_revenue, max * Decimal::from(1000));
        assert_eq!(summary.weighted_pipeline, percent_of(max, 99) * Decimal::from(1000));
        assert_eq!(summary.win_rate, 100);
    }
}
