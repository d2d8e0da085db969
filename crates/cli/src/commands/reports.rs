//! Aggregate views: pipeline board, forecast cards, dashboard counters.

use leadbook_engine::LeadService;
use leadbook_storage::LeadStorage;
use time::OffsetDateTime;

use super::Context;
use crate::error::CliError;

pub(crate) async fn cmd_pipeline<S: LeadStorage>(
    service: &LeadService<S>,
    ctx: Context,
) -> Result<(), CliError> {
    let board = service.pipeline_board().await?;
    ctx.emit(&board, || {
        board
            .iter()
            .map(|column| {
                format!(
                    "{:<13}  {:>4}  {:>12}",
                    column.stage, column.count, column.weighted_total
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(())
}

pub(crate) async fn cmd_forecast<S: LeadStorage>(
    service: &LeadService<S>,
    ctx: Context,
) -> Result<(), CliError> {
    let summary = service.forecast_summary().await?;
    ctx.emit(&summary, || {
        format!(
            "weighted pipeline: {}\nclosed revenue:    {}\nwin rate:          {}%",
            summary.weighted_pipeline, summary.closed_revenue, summary.win_rate
        )
    });
    Ok(())
}

pub(crate) async fn cmd_dashboard<S: LeadStorage>(
    service: &LeadService<S>,
    ctx: Context,
) -> Result<(), CliError> {
    let stats = service.dashboard_stats(OffsetDateTime::now_utc()).await?;
    ctx.emit(&stats, || {
        format!(
            "total leads: {}\nthis month:  {}\nthis week:   {}",
            stats.total, stats.this_month, stats.this_week
        )
    });
    Ok(())
}
