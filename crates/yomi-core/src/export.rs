//! Rendering of analyzed documents to HTML and Markdown.
//!
//! Both renderers emit blocks in reading order. Figures carry no text and
//! are skipped.

use crate::models::document::{Block, Document, Table};

const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '`', '#', '+', '-', '|', '{', '}', '.', '!',
];

/// Escape characters that are significant in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Backslash-escape Markdown punctuation.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Dense `n_row x n_col` text grid of a table. A spanning cell's text sits
/// at its top-left position; the other covered positions stay empty.
pub fn table_rows(table: &Table) -> Vec<Vec<String>> {
    let mut rows = vec![vec![String::new(); table.n_col]; table.n_row];
    for cell in &table.cells {
        let (r, c) = (cell.row - 1, cell.col - 1);
        if r < table.n_row && c < table.n_col {
            rows[r][c] = cell.contents.clone().unwrap_or_default();
        }
    }
    rows
}

fn table_to_html(table: &Table) -> String {
    let mut html = String::from("<table border='1' style='border-collapse: collapse'>");
    let mut current_row = None;

    for cell in &table.cells {
        if current_row != Some(cell.row) {
            if current_row.is_some() {
                html.push_str("</tr>");
            }
            html.push_str("<tr>");
            current_row = Some(cell.row);
        }
        let contents = escape_html(cell.contents.as_deref().unwrap_or_default()).replace('\n', "<br>");
        html.push_str(&format!(
            "<td rowspan=\"{}\" colspan=\"{}\">{}</td>",
            cell.row_span, cell.col_span, contents
        ));
    }

    if current_row.is_some() {
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Render the document as a standalone HTML page.
pub fn to_html(document: &Document) -> String {
    let mut body = String::new();
    for block in document.blocks() {
        match block {
            Block::Paragraph(p) => {
                let text = escape_html(p.contents.as_deref().unwrap_or_default()).replace('\n', "<br>");
                body.push_str(&format!("<p>{}</p>", text));
            }
            Block::Table(t) => body.push_str(&table_to_html(t)),
            Block::Figure(_) => {}
        }
    }
    format!("<html><body>{}</body></html>", body)
}

fn table_to_markdown(table: &Table) -> String {
    let mut md = String::new();
    for (i, row) in table_rows(table).iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|text| escape_markdown(&text.replace('\n', "<br>")))
            .collect();
        md.push_str(&format!("|{}|\n", cells.join("|")));

        if i == 0 {
            md.push_str(&format!("|{}|\n", vec!["-"; table.n_col].join("|")));
        }
    }
    md
}

/// Render the document as Markdown: escaped paragraphs and pipe tables.
pub fn to_markdown(document: &Document) -> String {
    let parts: Vec<String> = document
        .blocks()
        .into_iter()
        .filter_map(|block| match block {
            Block::Paragraph(p) => Some(format!("{}\n", escape_markdown(p.contents.as_deref().unwrap_or_default()))),
            Block::Table(t) => Some(table_to_markdown(t)),
            Block::Figure(_) => None,
        })
        .collect();
    parts.join("\n")
}
