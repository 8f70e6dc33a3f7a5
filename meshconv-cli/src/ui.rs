//! Utilities for printing and everything related to "UI".
//!
//! `info!`, `warn!` and `progress!` only print something in verbose mode (see
//! [`set_verbose`]). `error!` always prints, to stderr and without colors.

use std::sync::atomic::{AtomicBool, Ordering};

use term_painter::{Color, Style, ToStyle};


static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

macro_rules! print_msg {
    ($kind:ident: $icon:literal => $fmt:literal $($args:tt)*) => {{
        use crate::ui::MsgKind;
        use term_painter::ToStyle;

        if crate::ui::is_verbose() {
            let icon_style = MsgKind::$kind.icon_style();
            icon_style.with(|| {
                print!("[{}] ", $icon);
            });

            let body_style = MsgKind::$kind.body_style();
            let lines = crate::ui::wrap_lines(&format!($fmt $($args)*));

            for (i, line) in lines.iter().enumerate() {
                let prefix = match i {
                    0 => "",
                    _ if i == lines.len() - 1 => "    └ ",
                    _ => "    │ ",
                };

                println!("{}{}", icon_style.paint(prefix), body_style.paint(line));
            }
        }
    }};
}

/// Evaluates `$body` and, in verbose mode, prints the message together with
/// the time the body took.
macro_rules! progress {
    ([$fmt:literal $($args:tt)*] => $body:expr) => {{
        use std::{
            io::{stdout, Write},
            time::Instant,
        };
        use crate::ui::MsgKind;
        use term_painter::ToStyle;

        if crate::ui::is_verbose() {
            let print_body = || {
                MsgKind::Progress.body_style().with(|| {
                    print!($fmt $($args)*);
                    print!(" ... ");
                });
            };

            MsgKind::Progress.icon_style().with(|| print!("[…] "));
            print_body();
            let _ = stdout().flush();

            let before = Instant::now();
            let out = $body;
            let time = before.elapsed();

            print!("\r{} ", MsgKind::Progress.icon_style().paint("[✓]"));
            print_body();
            MsgKind::Progress.body_style().with(|| {
                println!("{} (in {:.2?})", MsgKind::Progress.icon_style().paint("done"), time);
            });

            out
        } else {
            $body
        }
    }};
}

macro_rules! info {
    ($($t:tt)*) => {
        print_msg!(Info: 'i' => $($t)*);
    };
}

macro_rules! warn {
    ($($t:tt)*) => {
        print_msg!(Warning: 'w' => $($t)*);
    };
}

macro_rules! error {
    ($($t:tt)*) => {
        eprintln!("[!] {}", format!($($t)*))
    };
}

pub enum MsgKind {
    Warning,
    Info,
    Progress,
}

impl MsgKind {
    pub fn icon_style(&self) -> Style {
        match self {
            MsgKind::Warning => Color::Yellow.bold(),
            MsgKind::Info => Color::Blue.bold(),
            MsgKind::Progress => Color::Green.bold(),
        }
    }

    pub fn body_style(&self) -> Style {
        match self {
            MsgKind::Warning => Color::BrightYellow.to_style(),
            MsgKind::Info => Color::NotSet.to_style(),
            MsgKind::Progress => Color::NotSet.to_style(),
        }
    }
}

/// Splits the message into lines that fit the terminal (but are never longer
/// than 100 characters).
pub fn wrap_lines(body: &str) -> Vec<String> {
    let line_len = term_size::dimensions()
        .map(|(w, _)| w)
        .unwrap_or(80)
        .min(100)
        .saturating_sub(7)
        .max(20);

    let mut lines = Vec::new();
    let mut current_line = String::new();
    for word in body.split_whitespace() {
        if !current_line.is_empty()
            && current_line.chars().count() + word.chars().count() >= line_len
        {
            lines.push(current_line.trim_end().to_string());
            current_line.clear();
        }

        current_line.push_str(word);
        current_line.push(' ');
    }
    lines.push(current_line.trim_end().to_string());

    lines
}

/// Formats the given integer with `,` as thousand separator.
pub fn fmt_with_thousand_sep(v: u64) -> String {
    let digits = v.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousand_sep() {
        assert_eq!(fmt_with_thousand_sep(0), "0");
        assert_eq!(fmt_with_thousand_sep(999), "999");
        assert_eq!(fmt_with_thousand_sep(1000), "1,000");
        assert_eq!(fmt_with_thousand_sep(1_234_567), "1,234,567");
        assert_eq!(fmt_with_thousand_sep(10_005), "10,005");
    }

    #[test]
    fn wrapping() {
        let long = "word ".repeat(100);
        let lines = wrap_lines(&long);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 100));
        assert_eq!(lines.iter().map(|l| l.split_whitespace().count()).sum::<usize>(), 100);

        assert_eq!(wrap_lines("short"), vec!["short".to_string()]);
    }
}
