//! Rofi dmenu wrapper for click-driven popups.

use std::collections::HashMap;
use std::fmt;
use std::process::Stdio;

use capy_applet::BoxError;
use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Where the menu window anchors on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    TopLeft,
    TopCenter,
    #[default]
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    fn as_theme_str(self) -> &'static str {
        match self {
            Position::TopLeft => "north west",
            Position::TopCenter => "north",
            Position::TopRight => "north east",
            Position::CenterLeft => "west",
            Position::Center => "center",
            Position::CenterRight => "east",
            Position::BottomLeft => "south west",
            Position::BottomCenter => "south",
            Position::BottomRight => "south east",
        }
    }
}

/// One selectable row. Urgent and active rows are highlighted by rofi
/// through index lists on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub icon: Option<String>,
    pub urgent: bool,
    pub active: bool,
}

impl Entry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: None,
            urgent: false,
            active: false,
        }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.icon {
            // Icon rows use rofi's NUL-separated row option syntax.
            Some(icon) => write!(f, "{}\x00icon\x1f{icon}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A dmenu invocation: entries in, chosen entry out.
#[derive(Debug, Default)]
pub struct Menu {
    entries: Vec<Entry>,
    message: Option<String>,
    position: Position,
    markup_rows: bool,
}

impl Menu {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            message: None,
            position: Position::default(),
            markup_rows: false,
        }
    }

    /// Message line shown under the prompt.
    pub fn message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Render entry names as pango markup instead of plain text.
    pub fn markup_rows(mut self) -> Self {
        self.markup_rows = true;
        self
    }

    fn args(&self) -> Vec<String> {
        let urgents: Vec<String> = indexes_where(&self.entries, |e| e.urgent);
        let actives: Vec<String> = indexes_where(&self.entries, |e| e.active);

        let mut args = vec!["-dmenu".to_string()];
        if !urgents.is_empty() {
            args.push("-u".to_string());
            args.push(urgents.join(","));
        }
        if !actives.is_empty() {
            args.push("-a".to_string());
            args.push(actives.join(","));
        }
        if let Some(message) = &self.message {
            args.push("-mesg".to_string());
            args.push(message.clone());
        }
        if self.markup_rows {
            args.push("-markup-rows".to_string());
        }
        args.push("-theme-str".to_string());
        args.push(format!(
            "window {{ position: {}; }}",
            self.position.as_theme_str()
        ));
        args.push("-theme-str".to_string());
        args.push(format!("listview {{ lines: {}; }}", self.entries.len()));

        args
    }

    /// Run rofi and return the chosen entry, `None` when dismissed.
    ///
    /// A missing rofi binary surfaces as the spawn error.
    pub async fn show(self) -> Result<Option<Entry>, BoxError> {
        let input = self
            .entries
            .iter()
            .map(Entry::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        let mut lookup: HashMap<String, Entry> = self
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.clone()))
            .collect();

        let mut child = Command::new("rofi")
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            debug!("rofi dismissed ({})", output.status);
            return Ok(None);
        }

        let choice = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(lookup.remove(&choice))
    }
}

fn indexes_where(entries: &[Entry], pred: impl Fn(&Entry) -> bool) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .map(|(i, _)| i.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_renders_icon_row_syntax() {
        assert_eq!(Entry::new("plain").to_string(), "plain");
        assert_eq!(
            Entry::new("phones").icon("audio-headphones").to_string(),
            "phones\u{0}icon\u{1f}audio-headphones"
        );
    }

    #[test]
    fn test_args_collect_urgent_and_active_indexes() {
        let menu = Menu::new(vec![
            Entry::new("a").urgent(true),
            Entry::new("b").active(true),
            Entry::new("c").urgent(true),
        ]);
        let args = menu.args();

        let u = args.iter().position(|a| a == "-u").unwrap();
        assert_eq!(args[u + 1], "0,2");
        let a = args.iter().position(|a| a == "-a").unwrap();
        assert_eq!(args[a + 1], "1");
        assert!(args.contains(&"listview { lines: 3; }".to_string()));
    }

    #[test]
    fn test_args_skip_empty_highlight_lists() {
        let args = Menu::new(vec![Entry::new("only")]).args();
        assert!(!args.contains(&"-u".to_string()));
        assert!(!args.contains(&"-a".to_string()));
    }

    #[test]
    fn test_args_carry_message_and_position() {
        let args = Menu::new(vec![Entry::new("x")])
            .message("pick one")
            .position(Position::BottomRight)
            .args();
        assert!(args.contains(&"pick one".to_string()));
        assert!(args.contains(&"window { position: south east; }".to_string()));
    }

    #[test]
    fn test_args_opt_into_markup_rows() {
        let plain = Menu::new(vec![Entry::new("x")]).args();
        assert!(!plain.contains(&"-markup-rows".to_string()));

        let markup = Menu::new(vec![Entry::new("x")]).markup_rows().args();
        assert!(markup.contains(&"-markup-rows".to_string()));
    }
}
