use anstyle::{AnsiColor, Effects, Style};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let (badge, badge_style) = status_badge(status);
            format!("{} {message}", colorize(badge_style, badge))
        }
    }
}

fn status_badge(status: &str) -> (&'static str, Style) {
    match status {
        "ok" => ("[OK]", tone(AnsiColor::BrightGreen)),
        "warn" => ("[WARN]", tone(AnsiColor::BrightYellow)),
        "err" => ("[ERR]", tone(AnsiColor::BrightRed)),
        _ => ("[..]", Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))),
    }
}

fn tone(color: AnsiColor) -> Style {
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
