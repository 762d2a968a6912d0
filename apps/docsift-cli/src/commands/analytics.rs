//! Corpus analytics commands

use anyhow::Result;
use colored::Colorize;

use crate::app::App;
use crate::cli::AnalyticsCommands;
use crate::output::{self, OutputFormat};

pub async fn run(app: &App, cmd: AnalyticsCommands, format: OutputFormat) -> Result<()> {
    let analytics = app.analytics();

    match cmd {
        AnalyticsCommands::Summary => {
            let summary = analytics.summary().await?;
            output::emit(&summary, format, |summary| {
                output::key_value("Documents", &summary.total_files.to_string());
                output::key_value("Statements", &summary.total_policies.to_string());

                output::section("By content type");
                for (content_type, count) in &summary.file_types {
                    println!("  {:<50} {}", content_type.cyan(), count);
                }

                output::section("By kind");
                for (kind, count) in &summary.kinds {
                    println!("  {:<50} {}", kind.to_string().cyan(), count);
                }
            })
        }
        AnalyticsCommands::Anomalies => {
            let report = analytics.anomalies().await?;
            output::emit(&report, format, |report| {
                if report.is_empty() {
                    output::dimmed("No anomalous documents.");
                    return;
                }
                output::section(&format!("Anomalous documents ({})", report.len()));
                for id in &report.anomalies {
                    println!("  {}", id);
                }
            })
        }
        AnalyticsCommands::Clusters => {
            let report = analytics.clusters().await?;
            output::emit(&report, format, |report| {
                if report.cluster_count() == 0 {
                    output::dimmed("No policy statements in the corpus.");
                    return;
                }
                for (i, cluster) in report.clusters.iter().enumerate() {
                    output::section(&format!("Cluster {} ({} statements)", i + 1, cluster.len()));
                    for (j, statement) in cluster.iter().enumerate() {
                        output::list_item(j + 1, &output::truncate(statement, 120));
                    }
                }
            })
        }
    }
}
