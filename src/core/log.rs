use crate::db::log::{LogRow, load_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;

const OP_WIDTH_MAX: usize = 40;

/// Colour for each operation written by `ttlog`
fn color_for_operation(op: &str) -> Colour {
    match op {
        "transition" => Colour::Green,
        "correction" => Colour::Yellow,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51), // orange
        _ => Colour::White,
    }
}

fn op_target(row: &LogRow) -> String {
    if row.target.is_empty() {
        row.operation.clone()
    } else {
        format!("{} ({})", row.operation, row.target)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut t: String = s.chars().take(max.saturating_sub(3)).collect();
        t.push_str("...");
        t
    } else {
        s.to_string()
    }
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &mut DbPool) -> AppResult<()> {
        let entries = load_log(&pool.conn)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let op_w = entries
            .iter()
            .map(|r| op_target(r).chars().count())
            .max()
            .unwrap_or(10)
            .min(OP_WIDTH_MAX);
        let id_w = entries
            .iter()
            .map(|r| r.id.to_string().len())
            .max()
            .unwrap_or(1);

        println!("📜 Internal log:\n");

        for row in &entries {
            let date = chrono::DateTime::parse_from_rfc3339(&row.date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or_else(|_| row.date.clone());

            // padding is computed on the visible text, before colouring
            let visible = truncate(&op_target(row), op_w);
            let padding = " ".repeat(op_w.saturating_sub(visible.chars().count()));
            let colored = match visible.split_once(' ') {
                Some((op, rest)) => {
                    format!("{} {}", color_for_operation(&row.operation).paint(op), rest)
                }
                None => color_for_operation(&row.operation)
                    .paint(visible.as_str())
                    .to_string(),
            };

            println!(
                "{:>id_w$}: {:<25} | {}{} => {}",
                row.id,
                date,
                colored,
                padding,
                row.message,
                id_w = id_w
            );
        }

        Ok(())
    }
}
