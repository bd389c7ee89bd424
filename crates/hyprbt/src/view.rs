//! Rendering. Everything here is a pure function of [`App`] and a [`Theme`].

use crate::app::App;
use hyprbt_ctl::Device;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE: &str = " hyprbt - Bluetooth Device Manager ";
const SCANNING: &str = "Scanning for devices...";
const DISABLED: &str = "Bluetooth is disabled. Press 'e' to enable.";
const NO_DEVICES: &str = "No devices found. Press 's' to scan for devices.";
const UNKNOWN_NAME: &str = "Unknown Device";

const GLYPH_CONNECTED: &str = "●";
const GLYPH_PAIRED: &str = "◐";
const GLYPH_UNPAIRED: &str = "○";

/// Styles for every element of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub title: Style,
    pub power_on: Style,
    pub power_off: Style,
    pub scanning: Style,
    pub notice: Style,
    pub row: Style,
    pub selected: Style,
    pub connected: Style,
    pub paired: Style,
    pub unpaired: Style,
    pub details: Style,
    pub error: Style,
    pub help_key: Style,
    pub help_description: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let purple = Color::Rgb(0x7D, 0x56, 0xF4);
        let white = Color::Rgb(0xFA, 0xFA, 0xFA);
        let green = Color::Rgb(0x04, 0xB5, 0x75);
        let red = Color::Rgb(0xFF, 0x5F, 0x56);
        let orange = Color::Rgb(0xFF, 0xA5, 0x00);
        let gray = Color::Rgb(0x62, 0x62, 0x62);

        Self {
            title: Style::default()
                .fg(white)
                .bg(purple)
                .add_modifier(Modifier::BOLD),
            power_on: Style::default().fg(green).add_modifier(Modifier::BOLD),
            power_off: Style::default().fg(red).add_modifier(Modifier::BOLD),
            scanning: Style::default().fg(orange).add_modifier(Modifier::BOLD),
            notice: Style::default().fg(gray),
            row: Style::default(),
            selected: Style::default()
                .fg(white)
                .bg(Color::Rgb(0x38, 0x38, 0x38))
                .add_modifier(Modifier::BOLD),
            connected: Style::default().fg(green),
            paired: Style::default().fg(orange),
            unpaired: Style::default().fg(gray),
            details: Style::default().fg(gray),
            error: Style::default().fg(red).add_modifier(Modifier::BOLD),
            help_key: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            help_description: Style::default().fg(gray),
        }
    }
}

impl App {
    /// Screen row of the first device row.
    ///
    /// Derived from the same header builder the renderer uses, so click
    /// hit-testing cannot drift from what is drawn.
    pub fn list_top(&self) -> u16 {
        self.header().len() as u16
    }

    /// Whether device rows (as opposed to a notice) are on screen.
    pub fn shows_rows(&self) -> bool {
        self.power() != Some(false) && !self.devices().is_empty()
    }

    /// The whole screen, top to bottom, for a frame `width` columns wide.
    pub fn render_lines(&self, width: u16) -> Vec<Line<'static>> {
        let theme = self.theme();
        let mut lines = self.header();

        if self.power() == Some(false) {
            lines.push(Line::styled(DISABLED, theme.notice));
        } else if self.devices().is_empty() {
            lines.push(Line::styled(NO_DEVICES, theme.notice));
        } else {
            lines.extend(
                self.devices()
                    .iter()
                    .enumerate()
                    .map(|(index, device)| device_row(device, index == self.cursor(), theme)),
            );
        }

        if let Some(error) = self.error() {
            let text = format!("Error: {error}");
            lines.push(Line::default());
            lines.push(Line::styled(truncate(&text, usize::from(width)), theme.error));
        }

        lines.push(Line::default());
        lines.push(Line::default());
        lines.extend(self.legend());
        lines
    }

    pub(crate) fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Paragraph::new(self.render_lines(area.width)), area);
    }

    fn header(&self) -> Vec<Line<'static>> {
        let theme = self.theme();
        let mut lines = vec![Line::from(Span::styled(TITLE, theme.title))];
        match self.power() {
            Some(true) => lines.push(Line::styled("Bluetooth: ON", theme.power_on)),
            Some(false) => lines.push(Line::styled("Bluetooth: OFF", theme.power_off)),
            None => {}
        }
        lines.push(Line::default());
        if self.scanning() {
            lines.push(Line::styled(SCANNING, theme.scanning));
            lines.push(Line::default());
        }
        lines
    }

    fn legend(&self) -> Vec<Line<'static>> {
        let theme = self.theme();
        let mut lines = vec![Line::styled("Controls:", theme.help_description)];
        for row in self.keymap().legend_rows() {
            let mut spans = vec![Span::raw("  ")];
            for (i, binding) in row.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw("  "));
                }
                spans.push(Span::styled(binding.keys_label(), theme.help_key));
                spans.push(Span::styled(
                    format!(": {}", binding.description),
                    theme.help_description,
                ));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Status: ", theme.help_description),
            Span::styled(GLYPH_CONNECTED, theme.connected),
            Span::styled(" Connected  ", theme.help_description),
            Span::styled(GLYPH_PAIRED, theme.paired),
            Span::styled(" Paired  ", theme.help_description),
            Span::styled(GLYPH_UNPAIRED, theme.unpaired),
            Span::styled(" Unpaired", theme.help_description),
        ]));
        lines
    }
}

fn device_row(device: &Device, selected: bool, theme: &Theme) -> Line<'static> {
    let (glyph, glyph_style) = if device.connected {
        (GLYPH_CONNECTED, theme.connected)
    } else if device.paired {
        (GLYPH_PAIRED, theme.paired)
    } else {
        (GLYPH_UNPAIRED, theme.unpaired)
    };
    let name = if device.name.is_empty() {
        UNKNOWN_NAME
    } else {
        device.name.as_str()
    };

    let mut spans = vec![
        Span::raw(if selected { "> " } else { "  " }),
        Span::styled(glyph, glyph_style),
        Span::raw(format!(" {name} ({})", device.address)),
    ];

    let mut details = Vec::new();
    if !device.device_type.is_empty() {
        details.push(device.device_type.clone());
    }
    if device.trusted {
        details.push("trusted".to_string());
    }
    if !details.is_empty() {
        spans.push(Span::styled(format!("  {}", details.join(", ")), theme.details));
    }

    let line = Line::from(spans);
    if selected {
        line.style(theme.selected)
    } else {
        line.style(theme.row)
    }
}

/// Cut `text` to `width` display columns, marking the cut with `…`.
/// A width of zero means unknown and leaves the text alone.
fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.width() <= width {
        return text.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
