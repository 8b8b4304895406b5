//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use soldeploy_ops::{
    DeploymentReport, OperationResult, PackageAction, PackageInfo, PhaseReport, PlanEntry,
};
use soldeploy_types::PackageStrategy;
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    json_output: bool,
    colors: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool, colors: bool) -> Self {
        Self {
            json_output,
            colors,
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            let json = result.to_json().map_err(io::Error::other)?;
            println!("{json}");
            return Ok(());
        }

        match result {
            OperationResult::PackageInfo(info) => self.render_package_info(info),
            OperationResult::HoldingStaged(path) => {
                println!("Holding copy written to {}", path.display());
            }
            OperationResult::Plan(entries) => self.render_plan(entries),
            OperationResult::Phase(report) => self.render_phase(report),
            OperationResult::Deployment(report) => self.render_deployment(report),
        }
        Ok(())
    }

    fn new_table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if !self.colors {
            table.force_no_tty();
        }
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
        table
    }

    fn render_package_info(&self, info: &PackageInfo) {
        let mut table = self.new_table(&["Field", "Value"]);
        let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

        table.add_row(vec!["Unique name".to_string(), info.unique_name.clone()]);
        table.add_row(vec!["Version".to_string(), info.version.to_string()]);
        table.add_row(vec!["Path".to_string(), info.path.display().to_string()]);
        table.add_row(vec!["Holding name".to_string(), info.holding_name.clone()]);
        table.add_row(vec![
            "Holding path".to_string(),
            info.holding_path.display().to_string(),
        ]);
        table.add_row(vec![
            "Installed".to_string(),
            or_dash(info.installed.map(|v| v.to_string())),
        ]);
        table.add_row(vec![
            "Holding installed".to_string(),
            or_dash(info.holding_installed.map(|v| v.to_string())),
        ]);
        println!("{table}");
    }

    fn render_plan(&self, entries: &[PlanEntry]) {
        if entries.is_empty() {
            println!("No packages configured.");
            return;
        }

        let mut table = self.new_table(&["Order", "Package", "Strategy", "Delete only", "Async"]);
        for entry in entries {
            table.add_row(vec![
                Cell::new(entry.install_order),
                Cell::new(entry.path.display()),
                Cell::new(strategy_label(entry.strategy)),
                Cell::new(yes_no(entry.delete_only)),
                Cell::new(yes_no(entry.use_async)),
            ]);
        }
        println!("{table}");
    }

    fn render_phase(&self, report: &PhaseReport) {
        println!("{} ({} ms)", report.phase, report.duration_ms);
        if report.outcomes.is_empty() {
            println!("No packages.");
            return;
        }

        let mut table = self.new_table(&["Package", "Version", "Action", "Detail"]);
        for outcome in &report.outcomes {
            let version = outcome
                .version
                .map_or_else(|| "-".to_string(), |v| v.to_string());
            table.add_row(vec![
                Cell::new(&outcome.package),
                Cell::new(version),
                self.action_cell(&outcome.action),
                Cell::new(outcome.detail.as_deref().unwrap_or("")),
            ]);
        }
        println!("{table}");
    }

    fn render_deployment(&self, report: &DeploymentReport) {
        for phase in &report.phases {
            self.render_phase(phase);
        }
        let changes: usize = report.phases.iter().map(|p| p.changes().count()).sum();
        match report.failed() {
            0 => println!("Deployment complete: {changes} changes."),
            failed => println!("Deployment finished with {failed} failed packages."),
        }
    }

    fn action_cell(&self, action: &PackageAction) -> Cell {
        let cell = Cell::new(action.to_string());
        if !self.colors {
            return cell;
        }
        match action {
            PackageAction::Failed { .. } => cell.fg(Color::Red),
            PackageAction::Skipped { .. } => cell.fg(Color::DarkGrey),
            _ => cell.fg(Color::Green),
        }
    }
}

fn strategy_label(strategy: PackageStrategy) -> &'static str {
    match strategy {
        PackageStrategy::LegacyHolding {
            force_upgrade: true,
        } => "legacy (forced)",
        PackageStrategy::LegacyHolding { .. } => "legacy",
        PackageStrategy::AtomicPromote => "promote",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
