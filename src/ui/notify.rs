//! Desktop notifications through `notify-send`.
//!
//! Tracked notifications keep their server-side id in a file under the
//! runtime directory and replace themselves in place, so a volume applet
//! updates one popup instead of stacking a new one per keypress.

use std::path::PathBuf;
use std::process::Stdio;

use capy_applet::BoxError;
use log::{debug, warn};
use tokio::process::Command;

use crate::ui::colors::{self, Color};

/// A reusable notification emitter for one applet.
#[derive(Debug, Clone)]
pub struct Notification {
    name: String,
    icon: Option<String>,
    timeout_ms: u32,
    transient: bool,
    tracked: bool,
}

impl Notification {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: None,
            timeout_ms: 4000,
            transient: false,
            tracked: false,
        }
    }

    /// Default icon name or path, can be overridden per send.
    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Transient notifications skip the server's history.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Replace the previous notification from this applet instead of
    /// stacking a new one.
    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }

    pub async fn send(&self, title: &str, body: &str) -> Result<(), BoxError> {
        self.send_inner(title, body, None, None).await
    }

    /// Send with an explicit icon, overriding the configured default.
    pub async fn send_with_icon(&self, title: &str, body: &str, icon: &str) -> Result<(), BoxError> {
        self.send_inner(title, body, Some(icon), None).await
    }

    /// Send with a `value` hint; servers with progress support render a bar.
    pub async fn send_progress(&self, title: &str, body: &str, percent: u8) -> Result<(), BoxError> {
        self.send_inner(title, body, None, Some(percent)).await
    }

    async fn send_inner(
        &self,
        title: &str,
        body: &str,
        icon: Option<&str>,
        progress: Option<u8>,
    ) -> Result<(), BoxError> {
        let mut args: Vec<String> = vec![
            "-a".to_string(),
            self.name.clone(),
            "-t".to_string(),
            self.timeout_ms.to_string(),
        ];

        if let Some(icon) = icon.or(self.icon.as_deref()) {
            args.push("-i".to_string());
            args.push(icon.to_string());
        }
        if self.transient {
            args.push("-h".to_string());
            args.push("boolean:transient:true".to_string());
        }
        if let Some(percent) = progress {
            args.push("-h".to_string());
            args.push(format!("int:value:{}", percent.min(100)));
        }
        if self.tracked {
            args.push("-p".to_string());
            if let Some(id) = self.stored_id() {
                args.push("-r".to_string());
                args.push(id.to_string());
            }
        }
        args.push("--".to_string());
        args.push(title.to_string());
        args.push(body.to_string());

        let output = Command::new("notify-send")
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            warn!("notify-send failed for {} ({})", self.name, output.status);
            return Ok(());
        }

        if self.tracked {
            let printed = String::from_utf8_lossy(&output.stdout);
            if let Ok(id) = printed.trim().parse::<u32>() {
                self.store_id(id);
            }
        }

        Ok(())
    }

    fn id_file(&self) -> Option<PathBuf> {
        dirs::runtime_dir().map(|dir| dir.join("notifications").join(format!("{}.id", self.name)))
    }

    fn stored_id(&self) -> Option<u32> {
        let contents = std::fs::read_to_string(self.id_file()?).ok()?;
        contents.trim().parse().ok()
    }

    fn store_id(&self, id: u32) {
        let Some(path) = self.id_file() else {
            return;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("cannot create {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = std::fs::write(&path, id.to_string()) {
            warn!("cannot persist notification id to {}: {e}", path.display());
        } else {
            debug!("notification {} has id {id}", self.name);
        }
    }
}

/// Pango progress bar for notification bodies: a colored prefix and a
/// grey remainder, `width` monospace cells wide.
pub fn progress_bar(percent: i32) -> String {
    styled_progress_bar(percent, 20, Color::new(0x33, 0xCC, 0x33))
}

pub fn styled_progress_bar(percent: i32, width: u32, color: Color) -> String {
    let step = (100 / width.max(1)) as i32;
    let mut bar = format!(
        "<span font_desc='monospace' size='large'><span background='#{color}'>"
    );

    let mut remaining = percent;
    for _ in 0..width.max(1) {
        if remaining <= 0 && remaining > -step {
            bar.push_str(&format!("</span><span background='#{}'>", colors::DARK_GREY));
        }
        bar.push(' ');
        remaining -= step;
    }

    bar.push_str("</span></span>\n");
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colored_cells(bar: &str) -> usize {
        // Spaces between the opening spans and the grey switchover.
        let start = bar.find('>').and_then(|i| bar[i + 1..].find('>').map(|j| i + j + 2));
        let start = start.unwrap();
        match bar[start..].find("</span>") {
            Some(end) => bar[start..start + end].len(),
            None => 0,
        }
    }

    #[test]
    fn test_half_bar_layout() {
        assert_eq!(
            styled_progress_bar(50, 10, colors::CYAN),
            "<span font_desc='monospace' size='large'><span background='#55AAFF'>     \
             </span><span background='#666666'>     </span></span>\n"
        );
    }

    #[test]
    fn test_progress_bar_splits_at_the_level() {
        assert_eq!(colored_cells(&progress_bar(40)), 8);
        assert_eq!(colored_cells(&progress_bar(3)), 1);
        assert_eq!(colored_cells(&progress_bar(0)), 0);
    }

    #[test]
    fn test_full_progress_bar_has_no_grey_tail() {
        let bar = progress_bar(100);
        assert!(!bar.contains("666666"));
        assert_eq!(colored_cells(&bar), 20);
        assert!(bar.ends_with("</span></span>\n"));
    }
}
