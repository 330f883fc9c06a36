use crate::router::{join_path, RouteForest, RouteId, RouteRecord};
use crate::tags_view::TagView;

// Cap a column to keep output readable.
const MAX_COL_WIDTH: usize = 60;

/// Render rows as an ASCII table. An empty row set renders the header only.
pub fn render_table(cols: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = cols.iter().map(|c| display_len(c).min(MAX_COL_WIDTH)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(MAX_COL_WIDTH); }
        }
    }
    let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
    let sep = build_separator(&widths);
    let mut out = vec![sep.clone(), build_row(&header, &widths), sep.clone()];
    for r in rows {
        out.push(build_row(r, &widths));
    }
    out.push(sep);
    out.join("\n")
}

/// Registered routes, one row per record.
pub fn route_rows(records: &[RouteRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|r| {
            vec![
                r.path.clone(),
                r.name.clone().unwrap_or_default(),
                r.meta.title.clone().unwrap_or_default(),
                r.meta.roles.as_ref().map(|x| x.join(",")).unwrap_or_default(),
                r.redirect.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

pub fn print_routes(records: &[RouteRecord]) {
    println!("{}", render_table(&["path", "name", "title", "roles", "redirect"], &route_rows(records)));
    println!("routes: {}", records.len());
}

/// Sidebar entries: visible routes, children indented under their parent.
pub fn menu_rows(forest: &RouteForest) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for &r in forest.roots() {
        menu_walk(forest, r, "", 0, &mut rows);
    }
    rows
}

fn menu_walk(forest: &RouteForest, id: RouteId, base: &str, depth: usize, rows: &mut Vec<Vec<String>>) {
    let node = forest.node(id);
    if node.meta.hidden {
        return;
    }
    let path = join_path(base, &node.path);
    // a titleless parent with children (e.g. `/` holding the notice page) is transparent
    let shown = node.meta.title.is_some();
    if shown {
        let title = format!("{}{}", "  ".repeat(depth), node.meta.title.as_deref().unwrap_or_default());
        rows.push(vec![title, path.clone()]);
    }
    let next = if shown { depth + 1 } else { depth };
    for &c in forest.children(id) {
        menu_walk(forest, c, &path, next, rows);
    }
}

pub fn print_menu(forest: &RouteForest) {
    println!("{}", render_table(&["menu", "path"], &menu_rows(forest)));
}

pub fn print_tags(views: &[TagView], cached: &[String]) {
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|t| {
            let keep = t.name.as_ref().map(|n| cached.contains(n)).unwrap_or(false);
            vec![t.title().to_string(), t.full_path.clone(), if t.meta.affix { "yes".into() } else { String::new() }, if keep { "yes".into() } else { String::new() }]
        })
        .collect();
    println!("{}", render_table(&["tab", "full path", "affix", "cached"], &rows));
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let text = truncate(&cell, *w);
        s.push(' ');
        s.push_str(&text);
        s.push_str(&" ".repeat(w.saturating_sub(display_len(&text))));
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}
