use std::io::Write;

use crate::components::tree::{indicator, TreeWidget};
use crate::error::Result;
use crate::tree::{FlatRow, GridState, RowKind};

/// Write the visible rows as plain text, one per line.
///
/// Uses the same guides and tags as the tree panel. Guides are left out
/// while a filter is active, since matches are shown without their ancestors.
pub fn write_rows<W: Write>(grid: &GridState, use_icons: bool, out: &mut W) -> Result<()> {
    let rows: Vec<&FlatRow> = grid.visible_rows().collect();
    let guides = !grid.is_filtering();

    for (idx, row) in rows.iter().enumerate() {
        let prefix = if guides {
            TreeWidget::build_prefix(row, &rows, idx)
        } else {
            String::new()
        };
        match row.kind {
            RowKind::LoadMore { remaining } => {
                writeln!(out, "{}{}{} more…", prefix, indicator(use_icons, None, false), remaining)?;
            }
            _ => {
                let Some(node) = grid.tree().get(row.id) else {
                    continue;
                };
                writeln!(
                    out,
                    "{}{}{}",
                    prefix,
                    indicator(use_icons, Some(node.kind), node.collapsed),
                    node.name
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
