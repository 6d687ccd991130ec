//! CLI binary for exploring a `BudgetPilot` data export.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use budgetpilot::analytics::{
    Alert, CategoryBreakdown, CategoryTrend, DEFAULT_MAJOR_CATEGORIES, DEFAULT_TOP_LIMIT, Forecast,
    Insights, LifetimeTotals, MonthComparison, MonthSummary, MonthlyTrendPoint, TipReport,
    aggregate_category_breakdown, aggregate_lifetime_totals, aggregate_monthly_trends,
    compare_with_previous, compute_category_trends, compute_insights, detect_anomalies_mad,
    detect_anomalies_zscore, forecast_next_month, month_summary, monthly_category_history,
    recommend_tips, top_spending_transactions,
};
use budgetpilot::backup::{Backup, Dataset};
use budgetpilot::error::BudgetPilotError;
use budgetpilot::filter::TransactionFilter;
use budgetpilot::models::{GoalId, MonthKey, SavingsGoal, Transaction};
use budgetpilot::planner::{BudgetLine, BudgetPlanner};
use budgetpilot::storage::{FileStorage, Storage};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;

/// Environment variable naming the input file.
const INPUT_ENV: &str = "BUDGETPILOT_INPUT";

/// Placeholder for missing values.
const NONE_MARK: &str = "\u{2014}";

/// `BudgetPilot` CLI: analyze transactions, plan budgets and track goals.
#[derive(Debug, Parser)]
#[command(name = "budgetpilot", version, about)]
struct Cli {
    /// Override the storage directory for budgets and goals (default: XDG data dir).
    #[arg(long, global = true, env = "BUDGETPILOT_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Backup file or transaction array to analyze.
    #[arg(long, short, global = true, env = "BUDGETPILOT_INPUT", value_name = "FILE")]
    input: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Lifetime income, expense, savings and monthly averages.
    Summary,
    /// Expense totals per category.
    Categories,
    /// Income, expense and savings per month.
    Monthly,
    /// Recent monthly series of the biggest expense categories.
    Trends {
        /// Number of categories to show.
        #[arg(long, default_value_t = DEFAULT_MAJOR_CATEGORIES)]
        top: usize,
    },
    /// Spending growth, savings ratio and year-over-year change.
    Insights,
    /// Largest expenses, optionally narrowed by month or category.
    Top(TopArgs),
    /// One month in detail, compared with the month before.
    Month {
        /// Month to show (`YYYY-MM`).
        month: MonthKey,
    },
    /// Predicted spending for next month.
    Forecast,
    /// Categories whose latest month stands out from their history.
    Anomalies {
        /// Outlier test to apply.
        #[arg(long, value_enum, default_value_t = AnomalyMethod::Zscore)]
        method: AnomalyMethod,
    },
    /// Rule-based saving tips.
    Tips,
    /// Monthly category budgets.
    #[command(subcommand)]
    Budget(BudgetCommand),
    /// Savings goals.
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Write a timestamped backup of the input.
    Backup {
        /// Output file (default: `budgetpilot_backup_<timestamp>.json`).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

/// Arguments for the `top` subcommand.
#[derive(Debug, Args)]
struct TopArgs {
    /// Maximum number of transactions.
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
    limit: usize,
    /// Only transactions in this month (`YYYY-MM`).
    #[arg(long)]
    month: Option<MonthKey>,
    /// Only transactions in this category.
    #[arg(long)]
    category: Option<String>,
}

/// Outlier tests for the `anomalies` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnomalyMethod {
    /// Standard score against mean and standard deviation.
    Zscore,
    /// Modified z-score against median and median absolute deviation.
    Mad,
}

/// Budget subcommands.
#[derive(Debug, Subcommand)]
enum BudgetCommand {
    /// Budget versus spend per expense category.
    Show {
        /// Month to report (`YYYY-MM`).
        month: MonthKey,
    },
    /// Set the budget of one category for a month.
    Set {
        /// Month (`YYYY-MM`).
        month: MonthKey,
        /// Category id or name.
        category: String,
        /// Budget amount.
        amount: f64,
    },
}

/// Savings goal subcommands.
#[derive(Debug, Subcommand)]
enum GoalCommand {
    /// List all goals.
    List,
    /// Create a goal.
    Add {
        /// Goal name.
        name: String,
        /// Target amount.
        target: f64,
        /// Amount already saved.
        #[arg(long, default_value_t = 0.0_f64)]
        saved: f64,
    },
    /// Update the saved amount of a goal.
    Save {
        /// Goal id.
        id: String,
        /// New saved amount.
        amount: f64,
    },
    /// Delete a goal.
    Delete {
        /// Goal id.
        id: String,
    },
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _dotenv = dotenvy::dotenv();

    dispatch(Cli::parse())
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> budgetpilot::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Reads and normalizes the input file.
fn load_dataset(input: Option<&Path>) -> budgetpilot::error::Result<Dataset> {
    let path = input.ok_or_else(|| {
        BudgetPilotError::InvalidInput(format!("no input file, pass --input or set {INPUT_ENV}"))
    })?;
    let json =
        fs::read_to_string(path).map_err(|err| BudgetPilotError::Storage(Box::new(err)))?;
    Dataset::from_json(&json)
}

/// Prints `error: <context>: <err>` and returns a failure exit code.
fn report_error<E: core::fmt::Display>(context: &str, err: &E) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Loads the input and hands it to `op`.
fn with_dataset<F>(input: Option<&Path>, op: F) -> io::Result<ExitCode>
where
    F: FnOnce(&Dataset) -> io::Result<ExitCode>,
{
    load_dataset(input).map_or_else(
        |err| report_error("failed to load input", &err),
        |dataset| op(&dataset),
    )
}

/// Opens the planner over file storage and hands it to `op`.
fn with_planner<F>(data_dir: Option<PathBuf>, op: F) -> io::Result<ExitCode>
where
    F: FnOnce(&BudgetPlanner<FileStorage>) -> io::Result<ExitCode>,
{
    let storage = match create_storage(data_dir) {
        Ok(storage) => storage,
        Err(err) => return report_error("failed to initialize storage", &err),
    };
    BudgetPlanner::builder().storage(storage).build().map_or_else(
        |err| report_error("failed to build planner", &err),
        |planner| op(&planner),
    )
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch(cli: Cli) -> io::Result<ExitCode> {
    let Cli {
        data_dir,
        input: input_path,
        command,
    } = cli;
    let input = input_path.as_deref();
    match command {
        Command::Summary => with_dataset(input, cmd_summary),
        Command::Categories => with_dataset(input, cmd_categories),
        Command::Monthly => with_dataset(input, cmd_monthly),
        Command::Trends { top } => with_dataset(input, |dataset| cmd_trends(dataset, top)),
        Command::Insights => with_dataset(input, cmd_insights),
        Command::Top(args) => with_dataset(input, |dataset| cmd_top(dataset, &args)),
        Command::Month { month } => with_dataset(input, |dataset| cmd_month(dataset, month)),
        Command::Forecast => with_dataset(input, cmd_forecast),
        Command::Anomalies { method } => {
            with_dataset(input, |dataset| cmd_anomalies(dataset, method))
        }
        Command::Tips => with_dataset(input, cmd_tips),
        Command::Budget(budget) => {
            with_planner(data_dir, |planner| cmd_budget(planner, budget, input))
        }
        Command::Goal(goal) => with_planner(data_dir, |planner| cmd_goal(planner, goal)),
        Command::Backup { out } => cmd_backup(input, out),
    }
}

/// Executes the `summary` subcommand.
fn cmd_summary(dataset: &Dataset) -> io::Result<ExitCode> {
    let totals = aggregate_lifetime_totals(&dataset.transactions);
    print_totals_table(&totals, dataset.transactions.len())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `categories` subcommand.
fn cmd_categories(dataset: &Dataset) -> io::Result<ExitCode> {
    print_breakdown_table(&aggregate_category_breakdown(&dataset.transactions))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `monthly` subcommand.
fn cmd_monthly(dataset: &Dataset) -> io::Result<ExitCode> {
    print_monthly_table(&aggregate_monthly_trends(&dataset.transactions))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `trends` subcommand.
fn cmd_trends(dataset: &Dataset, top: usize) -> io::Result<ExitCode> {
    print_trends_table(&compute_category_trends(&dataset.transactions, top))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `insights` subcommand.
fn cmd_insights(dataset: &Dataset) -> io::Result<ExitCode> {
    if dataset.transactions.is_empty() {
        writeln!(io::stdout().lock(), "{}", "No transactions found.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }
    print_insights(&compute_insights(&dataset.transactions))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the transaction filter for the `top` subcommand.
fn build_top_filter(args: &TopArgs) -> TransactionFilter {
    let mut filter = TransactionFilter::new();
    if let Some(month) = args.month {
        filter = filter.month(month);
    }
    if let Some(category) = args.category.as_deref() {
        filter = filter.category(category);
    }
    filter
}

/// Executes the `top` subcommand.
fn cmd_top(dataset: &Dataset, args: &TopArgs) -> io::Result<ExitCode> {
    let matching: Vec<Transaction> = build_top_filter(args)
        .apply(&dataset.transactions)
        .into_iter()
        .cloned()
        .collect();
    print_top_table(&top_spending_transactions(&matching, args.limit))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `month` subcommand.
fn cmd_month(dataset: &Dataset, month: MonthKey) -> io::Result<ExitCode> {
    let summary = month_summary(&dataset.transactions, month);
    let comparison = compare_with_previous(&dataset.transactions, month);
    print_month_summary(&summary, &comparison)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `forecast` subcommand.
fn cmd_forecast(dataset: &Dataset) -> io::Result<ExitCode> {
    print_forecast_table(&forecast_next_month(&dataset.transactions))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `anomalies` subcommand.
fn cmd_anomalies(dataset: &Dataset, method: AnomalyMethod) -> io::Result<ExitCode> {
    let history = monthly_category_history(&dataset.transactions);
    let alerts = match method {
        AnomalyMethod::Zscore => detect_anomalies_zscore(&history),
        AnomalyMethod::Mad => detect_anomalies_mad(&history),
    };
    print_alerts_table(&alerts)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `tips` subcommand.
fn cmd_tips(dataset: &Dataset) -> io::Result<ExitCode> {
    print_tips(&recommend_tips(&dataset.transactions))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `budget` subcommands.
///
/// Both read the input when one is given: `budget set` resolves category
/// names against its categories, `budget show` reports its spend.
fn cmd_budget<S: Storage>(
    planner: &BudgetPlanner<S>,
    command: BudgetCommand,
    input: Option<&Path>,
) -> io::Result<ExitCode> {
    let dataset = match input.map_or_else(|| Ok(Dataset::default()), |path| load_dataset(Some(path))) {
        Ok(dataset) => dataset,
        Err(err) => return report_error("failed to load input", &err),
    };
    match command {
        BudgetCommand::Show { month } => {
            match planner.budget_report(month, &dataset.categories, &dataset.transactions) {
                Ok(lines) => print_budget_table(month, &lines)?,
                Err(err) => return report_error("failed to read budgets", &err),
            }
        }
        BudgetCommand::Set {
            month,
            category,
            amount,
        } => {
            let key =
                match planner.set_category_budget(month, &dataset.categories, &category, amount) {
                    Ok(key) => key,
                    Err(err) => return report_error("failed to set budget", &err),
                };
            writeln!(
                io::stdout().lock(),
                "{} budget for {} in {month} set to {amount:.2} {}",
                "Saved".green().bold(),
                category.bold(),
                format_args!("(key {key})").dimmed()
            )?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Builds a goal stamped at `now`, moving the creation time forward one
/// millisecond at a time until its id is not taken.
fn unused_goal_slot<S: Storage>(
    planner: &BudgetPlanner<S>,
    name: &str,
    target: f64,
    saved: f64,
    now: DateTime<Utc>,
) -> budgetpilot::error::Result<SavingsGoal> {
    let taken: HashSet<GoalId> = planner.goals()?.into_iter().map(|goal| goal.id).collect();
    let mut created_at = now;
    loop {
        let goal = SavingsGoal::new(name, target, saved, created_at);
        if !taken.contains(&goal.id) {
            return Ok(goal);
        }
        created_at += TimeDelta::milliseconds(1);
    }
}

/// Executes the `goal` subcommands.
fn cmd_goal<S: Storage>(planner: &BudgetPlanner<S>, command: GoalCommand) -> io::Result<ExitCode> {
    let mut out = io::stdout().lock();
    match command {
        GoalCommand::List => match planner.goals() {
            Ok(goals) => print_goals_table(&goals)?,
            Err(err) => return report_error("failed to read goals", &err),
        },
        GoalCommand::Add {
            name,
            target,
            saved,
        } => {
            let goal = match unused_goal_slot(planner, &name, target, saved, Utc::now()) {
                Ok(goal) => goal,
                Err(err) => return report_error("failed to read goals", &err),
            };
            let id = goal.id.clone();
            if let Err(err) = planner.add_goal(goal) {
                return report_error("failed to add goal", &err);
            }
            writeln!(out, "{} goal {}", "Created".green().bold(), id.bold())?;
        }
        GoalCommand::Save { id, amount } => {
            match planner.set_goal_saved(&GoalId::from(id), amount) {
                Ok(goal) => writeln!(
                    out,
                    "{} {}: {:.2} of {:.2} ({}%)",
                    "Updated".green().bold(),
                    goal.name.bold(),
                    goal.saved,
                    goal.target,
                    goal.progress_percent()
                )?,
                Err(err) => return report_error("failed to update goal", &err),
            }
        }
        GoalCommand::Delete { id } => {
            let goal_id = GoalId::from(id);
            if let Err(err) = planner.delete_goal(&goal_id) {
                return report_error("failed to delete goal", &err);
            }
            writeln!(out, "{} goal {}", "Deleted".green().bold(), goal_id.bold())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `backup` subcommand: re-stamps the input and writes it
/// as pretty JSON.
fn cmd_backup(input: Option<&Path>, out: Option<PathBuf>) -> io::Result<ExitCode> {
    let Some(path) = input else {
        return report_error(
            "no input file",
            &format_args!("pass --input or set {INPUT_ENV}"),
        );
    };
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => return report_error("failed to read input", &err),
    };
    let now = Utc::now();
    let backup = match Backup::from_input_json(&json, now) {
        Ok(backup) => Backup {
            timestamp: now,
            ..backup
        },
        Err(err) => return report_error("failed to read input", &err),
    };
    let text = match backup.to_json_pretty() {
        Ok(text) => text,
        Err(err) => return report_error("failed to serialize backup", &err),
    };
    let target = out.unwrap_or_else(|| PathBuf::from(backup.file_name()));
    if let Err(err) = fs::write(&target, text) {
        return report_error("failed to write backup", &err);
    }
    writeln!(
        io::stdout().lock(),
        "{} {} {}",
        "Backup written to".green().bold(),
        target.display(),
        format_args!(
            "({} transactions, {} categories)",
            backup.transactions.len(),
            backup.categories.len()
        )
        .dimmed()
    )?;
    Ok(ExitCode::SUCCESS)
}

// ── Output helpers ──────────────────────────────────────────────────

/// Creates a table with the shared preset and cyan headers.
fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(
        headers
            .iter()
            .map(|header| Cell::new(header).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Writes a green title followed by a dimmed count.
fn write_title(out: &mut io::StdoutLock<'_>, title: &str, count: usize) -> io::Result<()> {
    writeln!(
        out,
        "{} {}",
        title.green().bold(),
        format_args!("({count})").dimmed()
    )?;
    writeln!(out)
}

/// Amount cell, red when negative.
fn signed_cell(value: f64) -> Cell {
    let cell = Cell::new(format!("{value:.2}"));
    if value < 0.0_f64 {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::Green)
    }
}

/// Percentage change cell where growth is bad (spending).
fn change_cell(pct: Option<f64>) -> Cell {
    match pct {
        None => Cell::new(NONE_MARK).fg(Color::DarkGrey),
        Some(value) if value > 0.0_f64 => Cell::new(format!("{value:+.1}%")).fg(Color::Red),
        Some(value) => Cell::new(format!("{value:+.1}%")).fg(Color::Green),
    }
}

/// Month or placeholder.
fn month_or_none(month: Option<MonthKey>) -> String {
    month.map_or_else(|| NONE_MARK.to_owned(), |key| key.to_string())
}

/// Prints lifetime totals.
fn print_totals_table(totals: &LifetimeTotals, count: usize) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if count == 0 {
        writeln!(out, "{}", "No transactions found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Metric", "Value"]);
    _ = table.add_row(vec![
        Cell::new("Total income"),
        Cell::new(format!("{:.2}", totals.total_income)).fg(Color::Green),
    ]);
    _ = table.add_row(vec![
        Cell::new("Total expense"),
        Cell::new(format!("{:.2}", totals.total_expense)).fg(Color::Red),
    ]);
    _ = table.add_row(vec![Cell::new("Savings"), signed_cell(totals.total_savings)]);
    _ = table.add_row(vec![
        Cell::new("Avg monthly income"),
        Cell::new(format!("{:.2}", totals.avg_monthly_income)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Avg monthly expense"),
        Cell::new(format!("{:.2}", totals.avg_monthly_expense)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Best saving month"),
        Cell::new(month_or_none(totals.best_saving_month)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Worst spending month"),
        Cell::new(month_or_none(totals.worst_spending_month)),
    ]);

    write_title(&mut out, "Lifetime Summary", count)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the category breakdown.
fn print_breakdown_table(breakdown: &CategoryBreakdown) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if breakdown.categories.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Category", "Total", "Share", "Avg / Month"]);
    for share in &breakdown.categories {
        _ = table.add_row(vec![
            Cell::new(&share.category),
            Cell::new(format!("{:.2}", share.total)),
            Cell::new(format!("{:.1}%", share.percent)),
            Cell::new(format!("{:.2}", share.avg_monthly)),
        ]);
    }

    write_title(&mut out, "Spending by Category", breakdown.categories.len())?;
    writeln!(out, "{table}")?;
    writeln!(
        out,
        "{} {:.2}",
        "Total expense:".bold(),
        breakdown.total_expense
    )?;
    Ok(())
}

/// Prints the monthly series.
fn print_monthly_table(points: &[MonthlyTrendPoint]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if points.is_empty() {
        writeln!(out, "{}", "No dated transactions found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Month", "Income", "Expense", "Savings"]);
    for point in points {
        _ = table.add_row(vec![
            Cell::new(point.month),
            Cell::new(format!("{:.2}", point.income)),
            Cell::new(format!("{:.2}", point.expense)),
            signed_cell(point.savings),
        ]);
    }

    write_title(&mut out, "Monthly Trends", points.len())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints per-category trend series.
fn print_trends_table(trends: &[CategoryTrend]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if trends.is_empty() {
        writeln!(out, "{}", "No category trends found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Category", "Months", "Latest", "Change"]);
    for trend in trends {
        let span = match (trend.months.first(), trend.months.last()) {
            (Some(first), Some(last)) if first != last => format!("{first} .. {last}"),
            (Some(first), _) => first.to_string(),
            (None, _) => NONE_MARK.to_owned(),
        };
        let latest = trend
            .values
            .last()
            .map_or_else(|| NONE_MARK.to_owned(), |value| format!("{value:.2}"));
        _ = table.add_row(vec![
            Cell::new(&trend.category),
            Cell::new(span),
            Cell::new(latest),
            change_cell(trend.pct_change),
        ]);
    }

    write_title(&mut out, "Category Trends", trends.len())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints headline insights.
fn print_insights(insights: &Insights) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mut table = new_table(&["Insight", "Value"]);
    _ = table.add_row(vec![
        Cell::new("Spending growth (6 months)"),
        change_cell(Some(insights.spending_growth_pct)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Savings ratio"),
        insights.savings_ratio.map_or_else(
            || Cell::new(NONE_MARK).fg(Color::DarkGrey),
            |ratio| Cell::new(format!("{ratio:.1}%")),
        ),
    ]);
    _ = table.add_row(vec![
        Cell::new("Biggest category"),
        Cell::new(insights.biggest_category.as_deref().unwrap_or(NONE_MARK)),
    ]);
    _ = table.add_row(vec![
        Cell::new("Biggest category amount"),
        Cell::new(
            insights
                .biggest_category_amount
                .map_or_else(|| NONE_MARK.to_owned(), |amount| format!("{amount:.2}")),
        ),
    ]);
    _ = table.add_row(vec![
        Cell::new("Year-over-year change"),
        change_cell(Some(insights.yoy_change_pct)),
    ]);

    writeln!(out, "{}", "Insights".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the largest expenses.
fn print_top_table(txs: &[&Transaction]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if txs.is_empty() {
        writeln!(out, "{}", "No expenses found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Date", "Category", "Amount", "Description"]);
    for tx in txs {
        let date = tx
            .date
            .map_or_else(|| NONE_MARK.to_owned(), |date| date.to_string());
        _ = table.add_row(vec![
            Cell::new(date),
            Cell::new(&tx.category.name),
            Cell::new(format!("{:.2}", tx.amount)).fg(Color::Red),
            Cell::new(tx.description.as_deref().unwrap_or("")),
        ]);
    }

    write_title(&mut out, "Top Expenses", txs.len())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints one month with its comparison to the previous month.
fn print_month_summary(summary: &MonthSummary, comparison: &MonthComparison) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let previous_label = month_or_none(comparison.previous_month);

    let mut flows = new_table(&["", "This month", previous_label.as_str()]);
    _ = flows.add_row(vec![
        Cell::new("Income"),
        Cell::new(format!("{:.2}", summary.income)),
        Cell::new(format!("{:.2}", comparison.previous.income)),
    ]);
    _ = flows.add_row(vec![
        Cell::new("Expense"),
        Cell::new(format!("{:.2}", summary.expense)),
        Cell::new(format!("{:.2}", comparison.previous.expense)),
    ]);
    _ = flows.add_row(vec![
        Cell::new("Savings"),
        signed_cell(summary.savings),
        signed_cell(comparison.previous.savings()),
    ]);

    writeln!(out, "{} {}", "Month".green().bold(), summary.month)?;
    writeln!(out)?;
    writeln!(out, "{flows}")?;
    writeln!(
        out,
        "{} {}",
        "Expense change:".bold(),
        comparison
            .expense_change_pct()
            .map_or_else(|| NONE_MARK.to_owned(), |pct| format!("{pct:+.1}%"))
    )?;

    if summary.by_category.is_empty() {
        writeln!(out, "{}", "No expenses this month.".dimmed())?;
        return Ok(());
    }
    let mut categories = new_table(&["Category", "Amount"]);
    for spend in &summary.by_category {
        _ = categories.add_row(vec![
            Cell::new(&spend.category),
            Cell::new(format!("{:.2}", spend.amount)),
        ]);
    }
    writeln!(out)?;
    writeln!(out, "{categories}")?;
    Ok(())
}

/// Prints next month's forecast.
fn print_forecast_table(forecast: &Forecast) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if forecast.categories.is_empty() {
        writeln!(out, "{}", "Not enough history to forecast.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Category", "Predicted"]);
    for (category, amount) in &forecast.categories {
        _ = table.add_row(vec![Cell::new(category), Cell::new(format!("{amount:.2}"))]);
    }
    _ = table.add_row(vec![
        Cell::new("Total").fg(Color::Yellow),
        Cell::new(format!("{:.2}", forecast.total)).fg(Color::Yellow),
    ]);

    write_title(&mut out, "Forecast", forecast.categories.len())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints anomaly alerts.
fn print_alerts_table(alerts: &[Alert]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if alerts.is_empty() {
        writeln!(out, "{}", "No anomalies detected.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Category", "Latest", "Baseline", "Score"]);
    for alert in alerts {
        _ = table.add_row(vec![
            Cell::new(&alert.category),
            Cell::new(format!("{:.2}", alert.value)).fg(Color::Red),
            Cell::new(format!("{:.2}", alert.baseline)),
            Cell::new(format!("{:.2}", alert.score)),
        ]);
    }

    write_title(&mut out, "Anomalies", alerts.len())?;
    writeln!(out, "{table}")?;
    for alert in alerts {
        writeln!(out, "  {} {}", "!".yellow().bold(), alert.message)?;
    }
    Ok(())
}

/// Prints saving tips.
fn print_tips(report: &TipReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write_title(&mut out, "Saving Tips", report.tips.len())?;
    for (idx, tip) in report.tips.iter().enumerate() {
        writeln!(out, "  {}. {}", idx.saturating_add(1), tip.message())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "{} {:.1}% {}",
        "Saving rate:".bold(),
        report.analysis.saving_rate,
        format_args!("({} transactions)", report.analysis.transaction_count).dimmed()
    )?;
    Ok(())
}

/// Prints the budget report for a month.
fn print_budget_table(month: MonthKey, lines: &[BudgetLine]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let mut table = new_table(&["Category", "Budget", "Spent", "Remaining", "Used"]);
    for line in lines {
        let percent = Cell::new(format!("{:.0}%", line.percent));
        let used = if line.over_budget {
            percent.fg(Color::Red)
        } else if line.is_near_limit() {
            percent.fg(Color::Yellow)
        } else {
            percent
        };
        _ = table.add_row(vec![
            Cell::new(&line.name),
            Cell::new(format!("{:.2}", line.budget)),
            Cell::new(format!("{:.2}", line.spent)),
            signed_cell(line.remaining),
            used,
        ]);
    }

    writeln!(out, "{} {month}", "Budget".green().bold())?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints savings goals.
fn print_goals_table(goals: &[SavingsGoal]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if goals.is_empty() {
        writeln!(out, "{}", "No savings goals found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Id", "Name", "Saved", "Target", "Progress", "Created"]);
    for goal in goals {
        _ = table.add_row(vec![
            Cell::new(&goal.id).fg(Color::DarkGrey),
            Cell::new(&goal.name),
            Cell::new(format!("{:.2}", goal.saved)),
            Cell::new(format!("{:.2}", goal.target)),
            Cell::new(format!("{:.0}%", goal.progress_percent())),
            Cell::new(goal.created_at.format("%Y-%m-%d")),
        ]);
    }

    write_title(&mut out, "Savings Goals", goals.len())?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // Last-resort error output; if stderr itself failed, nothing
            // we can do.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use budgetpilot::models::{CategoryRef, TransactionKind};
    use budgetpilot::storage::InMemoryStorage;
    use chrono::NaiveDate;
    use clap::CommandFactory as _;

    /// Export with two months of food spending and one salary.
    const SAMPLE_EXPORT: &str = r#"{
        "timestamp": "2024-03-05T09:30:15Z",
        "categories": [{"_id": "c1", "name": "Food", "type": "expense"}],
        "transactions": [
            {"_id": "t1", "amount": 120, "type": "expense", "date": "2024-02-10", "category": "c1"},
            {"_id": "t2", "amount": "80.5", "type": "expense", "date": "2024-03-02", "category": "c1"},
            {"_id": "t3", "amount": 2000, "type": "income", "date": "2024-03-01", "category": "Salary"}
        ]
    }"#;

    /// Writes [`SAMPLE_EXPORT`] to a temporary file.
    fn sample_input() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        fs::write(&path, SAMPLE_EXPORT).unwrap();
        (dir, path)
    }

    /// Loads [`SAMPLE_EXPORT`].
    fn sample_dataset() -> Dataset {
        Dataset::from_json(SAMPLE_EXPORT).unwrap()
    }

    /// Creates a planner over in-memory storage.
    fn mock_planner() -> BudgetPlanner<InMemoryStorage> {
        BudgetPlanner::builder()
            .storage(InMemoryStorage::new())
            .build()
            .unwrap()
    }

    fn month(text: &str) -> MonthKey {
        text.parse().unwrap()
    }

    // ── argument parsing ─────────────────────────────────────────────

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["budgetpilot", "summary", "--input", "a.json", "--data-dir", "d"])
                .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("a.json")));
        assert_eq!(cli.data_dir, Some(PathBuf::from("d")));
        assert!(matches!(cli.command, Command::Summary));
    }

    #[test]
    fn parses_month_and_rejects_bad_month() {
        let cli = Cli::try_parse_from(["budgetpilot", "month", "2024-03"]).unwrap();
        assert!(matches!(cli.command, Command::Month { month: parsed } if parsed == month("2024-03")));
        assert!(Cli::try_parse_from(["budgetpilot", "month", "2024-13"]).is_err());
        assert!(Cli::try_parse_from(["budgetpilot", "month", "March"]).is_err());
    }

    #[test]
    fn defaults_for_top_trends_and_anomalies() {
        let top = Cli::try_parse_from(["budgetpilot", "top"]).unwrap();
        assert!(matches!(top.command, Command::Top(TopArgs { limit, .. }) if limit == DEFAULT_TOP_LIMIT));

        let trends = Cli::try_parse_from(["budgetpilot", "trends"]).unwrap();
        assert!(matches!(trends.command, Command::Trends { top } if top == DEFAULT_MAJOR_CATEGORIES));

        let anomalies = Cli::try_parse_from(["budgetpilot", "anomalies", "--method", "mad"]).unwrap();
        assert!(matches!(
            anomalies.command,
            Command::Anomalies {
                method: AnomalyMethod::Mad
            }
        ));
    }

    #[test]
    fn parses_budget_and_goal_subcommands() {
        let set = Cli::try_parse_from(["budgetpilot", "budget", "set", "2024-03", "Food", "300"])
            .unwrap();
        assert!(matches!(
            set.command,
            Command::Budget(BudgetCommand::Set { category, .. }) if category == "Food"
        ));

        let add =
            Cli::try_parse_from(["budgetpilot", "goal", "add", "Laptop", "1500", "--saved", "200"])
                .unwrap();
        assert!(matches!(
            add.command,
            Command::Goal(GoalCommand::Add { target, saved, .. })
                if (target - 1500.0).abs() < f64::EPSILON && (saved - 200.0).abs() < f64::EPSILON
        ));
    }

    // ── create_storage / load_dataset ────────────────────────────────

    #[test]
    fn create_storage_with_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(storage.dir(), dir.path());
    }

    #[test]
    fn load_dataset_reads_file() {
        let (_dir, path) = sample_input();
        let dataset = load_dataset(Some(&path)).unwrap();
        assert_eq!(dataset.transactions.len(), 3);
        assert_eq!(dataset.transactions.first().unwrap().category.name, "Food");
    }

    #[test]
    fn load_dataset_requires_input() {
        assert!(matches!(
            load_dataset(None).unwrap_err(),
            BudgetPilotError::InvalidInput(_)
        ));
    }

    #[test]
    fn load_dataset_missing_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_dataset(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, BudgetPilotError::Storage(_)));
    }

    #[test]
    fn with_dataset_fails_without_input() {
        let code = with_dataset(None, |_| Ok(ExitCode::SUCCESS)).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    // ── analysis commands ────────────────────────────────────────────

    #[test]
    fn analysis_commands_succeed_on_sample() {
        let dataset = sample_dataset();
        assert_eq!(cmd_summary(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_categories(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_monthly(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_trends(&dataset, 3).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_insights(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_month(&dataset, month("2024-03")).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_forecast(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(
            cmd_anomalies(&dataset, AnomalyMethod::Zscore).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(
            cmd_anomalies(&dataset, AnomalyMethod::Mad).unwrap(),
            ExitCode::SUCCESS
        );
        assert_eq!(cmd_tips(&dataset).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn analysis_commands_succeed_on_empty_input() {
        let dataset = Dataset::default();
        assert_eq!(cmd_summary(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_categories(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_insights(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_forecast(&dataset).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_tips(&dataset).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn top_filter_narrows_by_month_and_category() {
        let dataset = sample_dataset();
        let args = TopArgs {
            limit: DEFAULT_TOP_LIMIT,
            month: Some(month("2024-02")),
            category: Some("Food".to_owned()),
        };
        let matching = build_top_filter(&args).apply(&dataset.transactions);
        assert_eq!(matching.len(), 1);
        assert!((matching.first().unwrap().amount - 120.0).abs() < f64::EPSILON);
        assert_eq!(cmd_top(&dataset, &args).unwrap(), ExitCode::SUCCESS);
    }

    // ── planner commands ─────────────────────────────────────────────

    #[test]
    fn budget_set_then_show() {
        let planner = mock_planner();
        let (_dir, path) = sample_input();
        let set = BudgetCommand::Set {
            month: month("2024-03"),
            category: "c1".to_owned(),
            amount: 100.0,
        };
        assert_eq!(cmd_budget(&planner, set, None).unwrap(), ExitCode::SUCCESS);
        assert!((planner.budget_for(month("2024-03"), "c1").unwrap() - 100.0).abs() < f64::EPSILON);

        let show = BudgetCommand::Show {
            month: month("2024-03"),
        };
        assert_eq!(
            cmd_budget(&planner, show, Some(&path)).unwrap(),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn budget_set_by_name_uses_category_id() {
        let planner = mock_planner();
        let (_dir, path) = sample_input();
        let set = BudgetCommand::Set {
            month: month("2024-03"),
            category: "food".to_owned(),
            amount: 250.0,
        };
        assert_eq!(
            cmd_budget(&planner, set, Some(&path)).unwrap(),
            ExitCode::SUCCESS
        );
        assert!((planner.budget_for(month("2024-03"), "c1").unwrap() - 250.0).abs() < f64::EPSILON);

        let dataset = sample_dataset();
        let report = planner
            .budget_report(month("2024-03"), &dataset.categories, &dataset.transactions)
            .unwrap();
        let food = report.first().unwrap();
        assert_eq!(food.name, "Food");
        assert!((food.budget - 250.0).abs() < f64::EPSILON);
        assert!((food.spent - 80.5).abs() < f64::EPSILON);
    }

    #[test]
    fn budget_set_rejects_negative_amount() {
        let planner = mock_planner();
        let set = BudgetCommand::Set {
            month: month("2024-03"),
            category: "Food".to_owned(),
            amount: -5.0,
        };
        assert_eq!(cmd_budget(&planner, set, None).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn goal_lifecycle() {
        let planner = mock_planner();
        let add = GoalCommand::Add {
            name: "Laptop".to_owned(),
            target: 1500.0,
            saved: 0.0,
        };
        assert_eq!(cmd_goal(&planner, add).unwrap(), ExitCode::SUCCESS);
        let id = planner.goals().unwrap().first().unwrap().id.clone();

        let save = GoalCommand::Save {
            id: id.as_inner().to_owned(),
            amount: 750.0,
        };
        assert_eq!(cmd_goal(&planner, save).unwrap(), ExitCode::SUCCESS);
        let goal = planner.goal(&id).unwrap().unwrap();
        assert!((goal.progress_percent() - 50.0).abs() < f64::EPSILON);

        assert_eq!(cmd_goal(&planner, GoalCommand::List).unwrap(), ExitCode::SUCCESS);
        let delete = GoalCommand::Delete {
            id: id.as_inner().to_owned(),
        };
        assert_eq!(cmd_goal(&planner, delete).unwrap(), ExitCode::SUCCESS);
        assert!(planner.goals().unwrap().is_empty());
    }

    #[test]
    fn goals_added_in_the_same_millisecond_get_distinct_ids() {
        let planner = mock_planner();
        let now = Utc::now();
        planner
            .add_goal(SavingsGoal::new("Laptop", 1500.0, 0.0, now))
            .unwrap();

        let next = unused_goal_slot(&planner, "Bike", 800.0, 0.0, now).unwrap();
        assert_eq!(next.created_at, now + TimeDelta::milliseconds(1));
        planner.add_goal(next).unwrap();

        let third = unused_goal_slot(&planner, "Trip", 300.0, 0.0, now).unwrap();
        assert_eq!(third.created_at, now + TimeDelta::milliseconds(2));
        planner.add_goal(third).unwrap();
        assert_eq!(planner.goals().unwrap().len(), 3);
    }

    #[test]
    fn saving_unknown_goal_fails() {
        let planner = mock_planner();
        let save = GoalCommand::Save {
            id: "g_missing".to_owned(),
            amount: 1.0,
        };
        assert_eq!(cmd_goal(&planner, save).unwrap(), ExitCode::FAILURE);
    }

    // ── backup ───────────────────────────────────────────────────────

    #[test]
    fn backup_writes_restamped_copy() {
        let (dir, path) = sample_input();
        let out = dir.path().join("backup.json");
        assert_eq!(
            cmd_backup(Some(&path), Some(out.clone())).unwrap(),
            ExitCode::SUCCESS
        );
        let written = Backup::from_json(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written.transactions.len(), 3);
        assert_eq!(written.categories.len(), 1);
        assert!(written.timestamp > Backup::from_json(SAMPLE_EXPORT).unwrap().timestamp);
    }

    #[test]
    fn backup_requires_input() {
        assert_eq!(cmd_backup(None, None).unwrap(), ExitCode::FAILURE);
    }

    // ── print helpers ────────────────────────────────────────────────

    #[test]
    fn print_helpers_handle_empty_inputs() {
        print_breakdown_table(&aggregate_category_breakdown(&[])).unwrap();
        print_monthly_table(&[]).unwrap();
        print_trends_table(&[]).unwrap();
        print_top_table(&[]).unwrap();
        print_alerts_table(&[]).unwrap();
        print_goals_table(&[]).unwrap();
    }

    #[test]
    fn print_top_table_with_undated_row() {
        let tx = Transaction::new(
            42.0,
            TransactionKind::Expense,
            None,
            CategoryRef::named("Misc"),
        );
        print_top_table(&[&tx]).unwrap();
        let dated = Transaction::new(
            10.0,
            TransactionKind::Expense,
            NaiveDate::from_ymd_opt(2024, 1, 5),
            CategoryRef::named("Food"),
        );
        print_top_table(&[&dated, &tx]).unwrap();
    }

    #[test]
    fn change_cell_marks_missing_values() {
        assert_eq!(change_cell(None).content(), NONE_MARK);
        assert_eq!(change_cell(Some(12.34)).content(), "+12.3%");
        assert_eq!(change_cell(Some(-5.0)).content(), "-5.0%");
    }
}
