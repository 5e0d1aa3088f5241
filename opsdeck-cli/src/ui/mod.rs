//! Frame rendering for the terminal command center.

pub mod theme;

pub use theme::styles;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
        canvas::{Canvas, Circle, Line as CanvasLine, Map, MapResolution, Rectangle},
    },
};

use opsdeck_core::mobile::{DockItem, IntelAction, LayerToggle};
use opsdeck_core::model::{DrawingMode, LayoutMode, MapTheme, MobilePanel};
use opsdeck_core::render::Panel;

use crate::app::{App, InputMode};
use crate::surface::{SurfaceSnapshot, lng_span};

pub fn draw(f: &mut Frame, app: &App) {
    theme::set_active(app.center.map_theme());
    let area = f.area();
    let compact = app.center.layout() == LayoutMode::Compact;
    let snapshot = app.map.snapshot();

    let sheet_height = app.center.visible_sheet().map_or(0, sheet_rows) as u16;
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(if sheet_height > 0 { sheet_height + 2 } else { 0 }),
            Constraint::Length(if compact { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(area);

    draw_top_bar(f, app, outer[0]);

    if compact {
        draw_map(f, &snapshot, outer[1]);
        if let Some(sheet) = app.center.visible_sheet() {
            draw_sheet(f, app, sheet, outer[2]);
        }
        draw_dock(f, app, outer[3]);
    } else {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(20)])
            .split(outer[1]);
        draw_sidebar(f, app, &snapshot, body[0]);
        draw_map(f, &snapshot, body[1]);
    }

    draw_footer(f, app, outer[4]);
    draw_panels(f, app, outer[1]);
}

fn sheet_rows(sheet: MobilePanel) -> usize {
    match sheet {
        MobilePanel::Layers => LayerToggle::ALL.len(),
        MobilePanel::Intel => IntelAction::ALL.len(),
        MobilePanel::Tools => DrawingMode::ALL.len(),
        MobilePanel::Missions | MobilePanel::Themes => 2,
    }
}

fn draw_top_bar(f: &mut Frame, app: &App, area: Rect) {
    let state = app.center.state();
    let module = state
        .active_module
        .map_or_else(|| "none".to_string(), |m| m.to_string());

    let mut spans = vec![
        Span::styled(" OPSDECK ", styles::accent_bold()),
        Span::styled("│ module ", styles::text_muted()),
        Span::styled(module, styles::text()),
    ];

    if app.center.handoff_scheduled() {
        spans.push(Span::styled("  ◌ handoff", styles::warn()));
    } else if app.center.pending_estimate().is_some() {
        spans.push(Span::styled("  ● estimate ready", styles::accent_bold()));
    }

    if app.mode == InputMode::Search {
        spans.push(Span::styled("  search ", styles::key_hint()));
        spans.push(Span::styled(format!("{}▏", app.search_input), styles::text()));
    } else if let Some(status) = &app.status {
        spans.push(Span::styled(format!("  {status}"), styles::text_dim()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_sidebar(f: &mut Frame, app: &App, snapshot: &SurfaceSnapshot, area: Rect) {
    let map = app.center.map_state();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_subtle())
        .title(Span::styled(" Layers ", styles::title()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    for layer in LayerToggle::ALL {
        let on = layer.is_on(map);
        lines.push(Line::from(vec![
            Span::styled(if on { " ■ " } else { " □ " }, styles::toggle(on)),
            Span::styled(layer.label(), styles::toggle(on)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" TOOL", styles::section_header())));
    let tool = map.active_mode.map_or("none", DrawingMode::label);
    lines.push(Line::from(Span::styled(format!(" {tool}"), styles::text())));
    lines.push(Line::from(Span::styled(
        format!(" {} shape(s)", snapshot.shapes.len()),
        styles::text_dim(),
    )));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" VIEW", styles::section_header())));
    lines.push(Line::from(Span::styled(
        format!(" {:.4}, {:.4}", map.lat, map.lng),
        styles::text(),
    )));
    lines.push(Line::from(Span::styled(
        format!(" zoom {:.0}  {}", map.zoom, map.imagery.label()),
        styles::text_dim(),
    )));
    if snapshot.street_view {
        lines.push(Line::from(Span::styled(" street view", styles::warn())));
    }
    if snapshot.last_saved.is_some() {
        lines.push(Line::from(Span::styled(" saved", styles::text_muted())));
    }

    lines.push(Line::from(""));
    let theme = match app.center.map_theme() {
        MapTheme::Division => "division",
        MapTheme::Animus => "animus",
    };
    lines.push(Line::from(vec![
        Span::styled(" theme ", styles::text_muted()),
        Span::styled(theme, styles::text()),
    ]));

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_map(f: &mut Frame, snapshot: &SurfaceSnapshot, area: Rect) {
    let palette = &theme::theme().palette;
    let span = lng_span(snapshot.zoom);
    let (x0, x1) = (snapshot.lng - span / 2.0, snapshot.lng + span / 2.0);
    let (y0, y1) = (snapshot.lat - span / 4.0, snapshot.lat + span / 4.0);
    let grid = palette.grid;
    let coast = palette.text_dim;
    let accent = palette.accent;
    let active = palette.active;
    let warn = palette.warn;

    let title = format!(" Map · {} ", snapshot.imagery.label());
    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_subtle())
                .title(Span::styled(title, styles::title())),
        )
        .marker(symbols::Marker::Braille)
        .x_bounds([x0, x1])
        .y_bounds([y0, y1])
        .paint(move |ctx| {
            let step = span / 8.0;
            for i in 1..8 {
                let x = x0 + step * f64::from(i);
                ctx.draw(&CanvasLine { x1: x, y1: y0, x2: x, y2: y1, color: grid });
                let y = y0 + step / 2.0 * f64::from(i);
                ctx.draw(&CanvasLine { x1: x0, y1: y, x2: x1, y2: y, color: grid });
            }
            ctx.draw(&Map {
                color: coast,
                resolution: MapResolution::High,
            });
            ctx.layer();

            for (mode, lat, lng) in &snapshot.shapes {
                let size = span / 40.0;
                match mode {
                    DrawingMode::Circle => ctx.draw(&Circle {
                        x: *lng,
                        y: *lat,
                        radius: size,
                        color: active,
                    }),
                    DrawingMode::Rectangle => ctx.draw(&Rectangle {
                        x: lng - size,
                        y: lat - size / 2.0,
                        width: size * 2.0,
                        height: size,
                        color: active,
                    }),
                    DrawingMode::Polyline | DrawingMode::Measure => ctx.draw(&CanvasLine {
                        x1: lng - size,
                        y1: *lat,
                        x2: lng + size,
                        y2: *lat,
                        color: active,
                    }),
                    DrawingMode::Marker => ctx.print(*lng, *lat, Span::styled("▼", styles::toggle(true))),
                }
            }

            if snapshot.weather_radar {
                ctx.draw(&Circle {
                    x: snapshot.lng - span / 6.0,
                    y: snapshot.lat + span / 12.0,
                    radius: span / 10.0,
                    color: warn,
                });
            }
            if snapshot.traffic {
                ctx.draw(&CanvasLine {
                    x1: x0,
                    y1: snapshot.lat - span / 20.0,
                    x2: x1,
                    y2: snapshot.lat + span / 30.0,
                    color: warn,
                });
            }
            if snapshot.crew_tracking {
                ctx.print(
                    snapshot.lng + span / 5.0,
                    snapshot.lat - span / 10.0,
                    Span::styled("◆ crew", styles::accent_bold()),
                );
            }
            if snapshot.parcels {
                ctx.draw(&Rectangle {
                    x: snapshot.lng - span / 8.0,
                    y: snapshot.lat - span / 16.0,
                    width: span / 4.0,
                    height: span / 8.0,
                    color: grid,
                });
            }

            ctx.draw(&CanvasLine {
                x1: snapshot.lng - span / 60.0,
                y1: snapshot.lat,
                x2: snapshot.lng + span / 60.0,
                y2: snapshot.lat,
                color: accent,
            });
            ctx.draw(&CanvasLine {
                x1: snapshot.lng,
                y1: snapshot.lat - span / 120.0,
                x2: snapshot.lng,
                y2: snapshot.lat + span / 120.0,
                color: accent,
            });
        });

    f.render_widget(canvas, area);
}

fn draw_dock(f: &mut Frame, app: &App, area: Rect) {
    let state = app.center.state();
    let mut spans = Vec::new();
    for (i, item) in DockItem::ALL.iter().enumerate() {
        let style = if item.is_active(state) {
            styles::selection()
        } else {
            styles::text()
        };
        spans.push(Span::styled(format!(" F{} ", i + 1), styles::key_hint()));
        spans.push(Span::styled(item.label(), style));
        spans.push(Span::raw("  "));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_sheet(f: &mut Frame, app: &App, sheet: MobilePanel, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(styles::border_focused())
        .title(Span::styled(format!(" {} ", sheet.label()), styles::title()));

    let row = |i: usize, text: String, on: bool| {
        let style = if i == app.sheet_pick {
            styles::selection()
        } else {
            styles::toggle(on)
        };
        ListItem::new(Line::from(Span::styled(text, style)))
    };

    let map = app.center.map_state();
    let items: Vec<ListItem> = match sheet {
        MobilePanel::Layers => LayerToggle::ALL
            .iter()
            .enumerate()
            .map(|(i, l)| row(i, format!(" {} ", l.label()), l.is_on(map)))
            .collect(),
        MobilePanel::Intel => IntelAction::ALL
            .iter()
            .enumerate()
            .map(|(i, a)| row(i, format!(" {} ", a.label()), true))
            .collect(),
        MobilePanel::Tools => DrawingMode::ALL
            .iter()
            .map(|m| {
                let on = map.active_mode == Some(*m);
                ListItem::new(Span::styled(format!(" {} ", m.label()), styles::toggle(on)))
            })
            .collect(),
        MobilePanel::Missions => vec![
            ListItem::new(Span::styled(" Dashboard (F1)", styles::text())),
            ListItem::new(Span::styled(" Jobs (Ctrl+N)", styles::text_dim())),
        ],
        MobilePanel::Themes => vec![
            ListItem::new(Span::styled(" Division", styles::toggle(app.center.map_theme() == MapTheme::Division))),
            ListItem::new(Span::styled(" Animus", styles::toggle(app.center.map_theme() == MapTheme::Animus))),
        ],
    };

    f.render_widget(Clear, area);
    f.render_widget(List::new(items).block(block).style(styles::panel()), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: &[(&str, &str)] = match app.mode {
        InputMode::Palette => &[("↑↓", "pick"), ("Enter", "open"), ("Esc", "close")],
        InputMode::Search => &[("Enter", "go to lat, lng"), ("Esc", "cancel")],
        InputMode::Normal => &[
            ("^K", "palette"),
            ("^/", "search"),
            ("Esc", "dismiss"),
            ("x", "close top"),
            ("←↑↓→", "pan"),
            ("+/-", "zoom"),
            ("t w e", "layers"),
            ("1-4 m", "tools"),
            ("q", "quit"),
        ],
    };

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {key}"), styles::key_hint()));
        spans.push(Span::styled(format!(" {label} "), styles::text_dim()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Mounted panels are stacked as cascaded popups over the map, the last
/// mounted one on top.
fn draw_panels(f: &mut Frame, app: &App, area: Rect) {
    let plan = app.center.mount_plan();
    let top = plan.len().saturating_sub(1);
    for (i, panel) in plan.iter().enumerate() {
        let rect = popup_rect(area, i as u16);
        f.render_widget(Clear, rect);

        let border = if i == top {
            styles::border_focused()
        } else {
            styles::border_subtle()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .style(styles::panel())
            .title(Span::styled(format!(" {} ", panel.title()), styles::title()));
        let inner = block.inner(rect);
        f.render_widget(block, rect);

        if *panel == Panel::CommandPalette {
            draw_palette(f, app, inner);
        } else {
            let body = Paragraph::new(panel_lines(app, *panel)).wrap(Wrap { trim: false });
            f.render_widget(body, inner);
        }
    }
}

fn popup_rect(area: Rect, depth: u16) -> Rect {
    let width = (area.width / 5 * 3).clamp(30u16.min(area.width), 72);
    let height = (area.height / 5 * 3).clamp(8u16.min(area.height), 20);
    let offset = depth * 2;
    let x = area.x + (area.width.saturating_sub(width) / 2 + offset).min(area.width.saturating_sub(width));
    let y = area.y + (area.height.saturating_sub(height) / 2 + depth).min(area.height.saturating_sub(height));
    Rect { x, y, width, height }
}

fn panel_lines(app: &App, panel: Panel) -> Vec<Line<'static>> {
    let mut lines = match panel {
        Panel::AiDetection => vec![
            Line::from(Span::styled("Scan the current viewport for pavement damage.", styles::text())),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter ", styles::key_hint()),
                Span::styled("run scan and send to estimate", styles::text()),
            ]),
            Line::from(Span::styled(format!("{} scan(s) this session", app.scans), styles::text_dim())),
        ],
        Panel::EstimateCalculator => estimate_lines(app),
        Panel::Settings => {
            let theme = match app.center.map_theme() {
                MapTheme::Division => "Division",
                MapTheme::Animus => "Animus",
            };
            vec![
                Line::from(vec![
                    Span::styled("Map theme  ", styles::text_muted()),
                    Span::styled(theme, styles::accent_bold()),
                ]),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Enter ", styles::key_hint()),
                    Span::styled("switch theme", styles::text()),
                ]),
            ]
        }
        _ => vec![Line::from(Span::styled("No live data in the terminal host.", styles::text_dim()))],
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("x ", styles::key_hint()),
        Span::styled("close  ", styles::text_dim()),
        Span::styled("Esc ", styles::key_hint()),
        Span::styled("dismiss", styles::text_dim()),
    ]));
    lines
}

fn estimate_lines(app: &App) -> Vec<Line<'static>> {
    let Some(analysis) = &app.estimate else {
        return vec![Line::from(Span::styled("Waiting for detection analysis…", styles::warn()))];
    };
    let mut lines = vec![Line::from(Span::styled("Detection analysis", styles::section_header()))];
    if let Some(fields) = analysis.as_object() {
        for (key, value) in fields {
            lines.push(Line::from(vec![
                Span::styled(format!("{key:>16} "), styles::text_muted()),
                Span::styled(value.to_string(), styles::text()),
            ]));
        }
    } else {
        lines.push(Line::from(Span::styled(analysis.to_string(), styles::text())));
    }
    lines
}

fn draw_palette(f: &mut Frame, app: &App, inner: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let prompt = "> ";
    let input_line = Line::from(vec![
        Span::styled(prompt, styles::accent_bold()),
        Span::styled(app.palette_query.clone(), styles::text()),
    ]);
    f.render_widget(Paragraph::new(input_line), parts[0]);

    let matches = app.palette_matches();
    let items: Vec<ListItem> = if matches.is_empty() {
        vec![ListItem::new(Span::styled("  no matching module", styles::text_muted()))]
    } else {
        matches
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let style = if i == app.palette_pick {
                    styles::selection()
                } else {
                    styles::text()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("  {}", entry.label), style),
                    Span::styled(format!("  {}", entry.module), styles::text_muted()),
                ]))
            })
            .collect()
    };
    f.render_widget(List::new(items), parts[1]);

    if app.mode == InputMode::Palette {
        let x = parts[0].x + (prompt.len() + app.palette_query.chars().count()) as u16;
        f.set_cursor_position((x.min(parts[0].right().saturating_sub(1)), parts[0].y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popups_cascade_inside_area() {
        let area = Rect::new(0, 1, 120, 40);
        let first = popup_rect(area, 0);
        let second = popup_rect(area, 1);
        assert_eq!(second.x, first.x + 2);
        assert_eq!(second.y, first.y + 1);

        let deep = popup_rect(area, 30);
        assert!(deep.right() <= area.right());
        assert!(deep.bottom() <= area.bottom());
    }

    #[test]
    fn test_popup_fits_tiny_terminal() {
        let area = Rect::new(0, 0, 20, 6);
        let rect = popup_rect(area, 0);
        assert!(rect.width <= 20 && rect.height <= 6);
    }
}
