use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Signed amount, green when positive and red when negative.
pub fn money_span(amount: f64, currency: &str) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount, currency), style)
}

pub enum ViewAction {
    Continue,
    Close,
}

pub trait View {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ViewAction;
}

/// Run an interactive ratatui view until it closes or Ctrl-C is pressed.
/// The terminal is restored on exit and on panic.
pub fn run_view(view: &mut dyn View) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| view.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match view.handle_key(key.code) {
                    ViewAction::Close => break Ok(()),
                    ViewAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
