use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, fs::File, io::Write, path::PathBuf, rc::Rc};
use thiserror::Error;

use crate::core::sla::{Report, TaskResultRow};
use crate::metrics::collector::MetricsCollector;
use crate::simulator::SimulationResult;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("could not write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not serialize json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub enum OutputFormat {
    #[default]
    JSON,
    PrettyTable,
    /// Per-task result rows as CSV.
    Csv,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MetricsPrinterConfig {
    #[serde(default)]
    pub format: OutputFormat,
    pub output_file: PathBuf,
}

pub fn print_metrics(
    result: &SimulationResult,
    collector: Rc<RefCell<MetricsCollector>>,
    config: &MetricsPrinterConfig,
) -> Result<(), OutputError> {
    let mut output = File::create(&config.output_file)?;
    match config.format {
        OutputFormat::PrettyTable => print_metrics_as_pretty_table(result, collector, &mut output),
        OutputFormat::JSON => print_metrics_as_json(result, collector, &mut output),
        OutputFormat::Csv => print_rows_as_csv(&result.rows, &mut output),
    }
}

pub fn report_table(report: &Report) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Metric", "Value"]);
    table.add_row(row!["Total tasks", report.total_tasks]);
    table.add_row(row!["Succeeded", report.success_count]);
    table.add_row(row!["Failed", report.failure_count]);
    table.add_row(row!["SLA violations", report.violation_count]);
    table.add_row(row!["Total penalty", report.total_penalty]);
    table
}

pub fn rows_table(rows: &[TaskResultRow]) -> Table {
    let mut table = Table::new();
    table.add_row(row![
        "Task", "VM", "Status", "Execution time", "Deadline", "Violated"
    ]);
    for r in rows {
        table.add_row(row![
            r.id,
            r.vm_id,
            format!("{:?}", r.status).to_uppercase(),
            format!("{:.3}", r.actual_execution_time),
            format!("{:.3}", r.deadline),
            r.violated
        ]);
    }
    table
}

pub fn print_metrics_as_pretty_table<W: Write>(
    result: &SimulationResult,
    collector: Rc<RefCell<MetricsCollector>>,
    output: &mut W,
) -> Result<(), OutputError> {
    let metrics = collector.borrow();

    let mut counters_table = Table::new();
    counters_table.add_row(row!["Metric", "Count"]);
    counters_table.add_row(row!["VMs created", metrics.vms_created]);
    counters_table.add_row(row!["Injected failures", metrics.injected_failures]);
    counters_table.add_row(row!["VM cost", metrics.vm_cost]);
    counters_table.add_row(row!["Processing cost", metrics.processing_cost]);

    let mut stats_table = Table::new();
    stats_table.add_row(row!["Metric", "Min", "Max", "Mean", "Variance"]);
    stats_table.add_row(row![
        "Task execution time",
        metrics.task_execution_time_stats.min(),
        metrics.task_execution_time_stats.max(),
        metrics.task_execution_time_stats.mean(),
        metrics.task_execution_time_stats.population_variance()
    ]);

    report_table(&result.report).print(output)?;
    counters_table.print(output)?;
    stats_table.print(output)?;
    rows_table(&result.rows).print(output)?;
    Ok(())
}

#[derive(Serialize)]
struct MetricsJSON<'a> {
    report: &'a Report,
    counters: Counters,
    timings: Timings,
    tasks: &'a [TaskResultRow],
}

#[derive(Serialize)]
struct Counters {
    vms_created: u64,
    vms_destroyed: u64,
    injected_failures: u64,
    vm_cost: f64,
    processing_cost: f64,
}

#[derive(Serialize)]
struct Timings {
    task_execution_time: TimingsStats,
}

#[derive(Serialize)]
struct TimingsStats {
    min: f64,
    max: f64,
    mean: f64,
    variance: f64,
}

pub fn print_metrics_as_json<W: Write>(
    result: &SimulationResult,
    collector: Rc<RefCell<MetricsCollector>>,
    output: &mut W,
) -> Result<(), OutputError> {
    let metrics = collector.borrow();

    let metrics = MetricsJSON {
        report: &result.report,
        counters: Counters {
            vms_created: metrics.vms_created,
            vms_destroyed: metrics.vms_destroyed,
            injected_failures: metrics.injected_failures,
            vm_cost: metrics.vm_cost,
            processing_cost: metrics.processing_cost,
        },
        timings: Timings {
            task_execution_time: TimingsStats {
                min: metrics.task_execution_time_stats.min(),
                max: metrics.task_execution_time_stats.max(),
                mean: metrics.task_execution_time_stats.mean(),
                variance: metrics.task_execution_time_stats.population_variance(),
            },
        },
        tasks: &result.rows,
    };

    let serialized_json = serde_json::to_string_pretty(&metrics)?;
    output.write_all(serialized_json.as_bytes())?;
    Ok(())
}

pub fn print_rows_as_csv<W: Write>(
    rows: &[TaskResultRow],
    output: &mut W,
) -> Result<(), OutputError> {
    let mut writer = csv::Writer::from_writer(output);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
