//! Layout inspection for scribe.
//!
//! Shows the split tree scribe inferred for each window of a session.

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Table, presets::NOTHING};
use scribe_core::{Analyzer, Window, layout::simulate, tmux::Tmux};
use serde::Serialize;

/// JSON output format for one pane of the inferred layout
#[derive(Serialize)]
pub struct PaneRow {
    pub window: String,
    pub pane: String,
    pub parent: Option<String>,
    pub orientation: Option<String>,
    pub size: u8,
    /// Position within the window, in percent of its width and height
    pub region: String,
    pub directory: Option<String>,
    pub command: Option<String>,
}

fn rows(window: &Window) -> Vec<PaneRow> {
    // Deeply nested tiny panes may not fit a 100x100 canvas; show no region then
    let regions = simulate(window, 100, 100, 0).unwrap_or_default();
    window
        .panes
        .values()
        .map(|pane| PaneRow {
            window: window.id.clone(),
            pane: pane.id.clone(),
            parent: pane.parent.clone(),
            orientation: pane.orientation.map(|o| o.to_string()),
            size: pane.size,
            region: regions
                .get(&pane.id)
                .map(|r| r.to_string())
                .unwrap_or_default(),
            directory: pane.directory.clone(),
            command: pane.command.clone(),
        })
        .collect()
}

/// Print the inferred layout of every window of `session`
pub fn inspect(tmux: &Tmux, session: &str, json: bool) -> Result<()> {
    let analysis = Analyzer::new(tmux).detach(true).analyze(session)?;

    if json {
        let mut all = Vec::new();
        for window in analysis.session.windows.values() {
            all.extend(rows(window));
        }
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    for window in analysis.session.windows.values() {
        let directory = analysis
            .session
            .window_directory(window)
            .unwrap_or("-");
        println!(
            "{} {} {}",
            window.name.blue().bold(),
            window.id.dimmed(),
            directory.dimmed()
        );

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_header(vec![
            "pane", "parent", "split", "size", "region %", "directory", "command",
        ]);
        for row in rows(window) {
            table.add_row(vec![
                row.pane,
                row.parent.unwrap_or_else(|| "-".to_string()),
                row.orientation.unwrap_or_else(|| "root".to_string()),
                format!("{}%", row.size),
                row.region,
                row.directory.unwrap_or_else(|| "-".to_string()),
                row.command.unwrap_or_default(),
            ]);
        }
        println!("{table}\n");
    }

    Ok(())
}
