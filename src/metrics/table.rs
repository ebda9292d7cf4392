// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Metrics table keyed by BSDF name

use super::summary::MetricsRow;
use serde::{Deserialize, Serialize};

/// Background of the active row in HTML output
pub const ACTIVE_ROW_STYLE: &str = "background-color: rgba(0, 255, 0, 0.1)";

/// Ordered table with one row per BSDF
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    rows: Vec<MetricsRow>,
}

impl MetricsTable {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Insert a row, replacing an existing row with the same name in place
    pub fn upsert(&mut self, row: MetricsRow) {
        match self.rows.iter_mut().find(|r| r.name == row.name) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    pub fn get(&self, name: &str) -> Option<&MetricsRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Markdown table; the active row name is bold
    pub fn to_markdown(&self, active: &str) -> String {
        let mut md = String::new();
        md.push_str("| BSDF |");
        for column in MetricsRow::COLUMNS {
            md.push_str(&format!(" {} |", column));
        }
        md.push('\n');
        md.push_str("|------|");
        for _ in MetricsRow::COLUMNS {
            md.push_str("---:|");
        }
        md.push('\n');

        for row in &self.rows {
            if row.name == active {
                md.push_str(&format!("| **{}** |", row.name));
            } else {
                md.push_str(&format!("| {} |", row.name));
            }
            for value in row.values() {
                md.push_str(&format!(" {:.2} |", value));
            }
            md.push('\n');
        }

        md
    }

    /// HTML table with the active row highlighted
    pub fn to_html(&self, active: &str) -> String {
        let mut html = String::from("<table class=\"metrics\">\n<thead><tr><th></th>");
        for column in MetricsRow::COLUMNS {
            html.push_str(&format!("<th>{}</th>", escape_html(column)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");

        for row in &self.rows {
            if row.name == active {
                html.push_str(&format!("<tr style=\"{}\">", ACTIVE_ROW_STYLE));
            } else {
                html.push_str("<tr>");
            }
            html.push_str(&format!("<th>{}</th>", escape_html(&row.name)));
            for value in row.values() {
                html.push_str(&format!("<td>{:.2}</td>", value));
            }
            html.push_str("</tr>\n");
        }

        html.push_str("</tbody>\n</table>");
        html
    }
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
