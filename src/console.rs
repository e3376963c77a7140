use cgol3d::{Pos3, Volume};
use crossterm::{
    cursor,
    event::{self, KeyCode, KeyEvent, KeyModifiers},
    execute, queue, terminal,
};
use std::io;

pub enum ConsoleCommand {
    Exit,
    Handled,
}

/// Renders one z-slice of a volume to the terminal
///
/// `x` runs along the columns and `y` along the rows.
pub struct ConsoleRender {
    /// top-left corner of the view, `z` selects the slice
    tl: Pos3,
    report: String,
}
impl ConsoleRender {
    pub fn new(slice: i32) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), cursor::Hide)?;
        Ok(Self {
            tl: Pos3::new(0, 0, slice),
            report: String::new(),
        })
    }

    fn glyph(value: i32) -> &'static [u8] {
        if value < 0 { "▒".as_bytes() } else { "█".as_bytes() }
    }

    pub fn render(&self, volume: &Volume) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        // leave the last row for the footer
        let rows = rows.saturating_sub(1);
        let mut stdout = io::stdout();
        queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
        for row in 0..rows {
            for col in 0..cols {
                let pos = self.tl + Pos3::new(col as i32, row as i32, 0);
                match volume.get(pos) {
                    Some(v) if v != 0 => {
                        queue!(stdout, cursor::MoveTo(col, row))?;
                        io::Write::write_all(&mut stdout, Self::glyph(v))?;
                    }
                    _ => {}
                }
            }
        }

        // write footer
        queue!(stdout, cursor::MoveTo(0, rows))?;
        let footer = format!("z={} {}", self.tl.z, self.report);
        io::Write::write_all(&mut stdout, footer.as_bytes())?;

        io::Write::flush(&mut stdout)
    }

    pub fn poll_events(&mut self) -> io::Result<Option<ConsoleCommand>> {
        // make sure event is preset for us to take
        if !event::poll(std::time::Duration::from_secs(0))? {
            return Ok(None);
        }

        let mut outp = Ok(Some(ConsoleCommand::Handled));
        match event::read()? {
            // CTRL+C
            event::Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }) => {
                outp = Ok(Some(ConsoleCommand::Exit));
            }
            // arrows pan the view, page keys move between slices
            event::Event::Key(KeyEvent { code, .. }) => match code {
                KeyCode::Up => self.tl.y -= 1,
                KeyCode::Down => self.tl.y += 1,
                KeyCode::Left => self.tl.x -= 1,
                KeyCode::Right => self.tl.x += 1,
                KeyCode::PageUp => self.tl.z += 1,
                KeyCode::PageDown => self.tl.z -= 1,
                _ => {}
            },
            _ => {}
        }
        outp
    }

    pub fn set_report(&mut self, report: String) {
        self.report = report;
    }
}
impl Drop for ConsoleRender {
    fn drop(&mut self) {
        // if we can enable it, we should be able to disable it
        terminal::disable_raw_mode().expect("disable raw mode");
        execute!(io::stdout(), cursor::Show).expect("enable cursor");
    }
}
