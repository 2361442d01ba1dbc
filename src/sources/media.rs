//! MPRIS players through `playerctl`.
//!
//! Two follow-mode streams drive the media applet: one watching every
//! player's playback status, one watching a single player's track
//! metadata. Both use `\x01` as the field separator since titles can
//! contain anything printable.

use std::fmt;

use capy_applet::{BoxError, capture, run};

const SEP: char = '\u{1}';

/// Stream of `status\x01player` lines for all players.
pub fn status_stream_command() -> String {
    format!("playerctl -a -F metadata -f '{{{{lc(status)}}}}{SEP}{{{{playerName}}}}'")
}

fn track_format() -> String {
    format!("'{{{{artist}}}}{SEP}{{{{album}}}}{SEP}{{{{title}}}}{SEP}{{{{mpris:artUrl}}}}'")
}

/// Stream of one player's `artist\x01album\x01title\x01artUrl` lines.
pub fn metadata_stream_command(player: &str) -> String {
    format!("playerctl --player={player} -F metadata -f {}", track_format())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    Unknown,
}

impl PlaybackStatus {
    fn from_word(word: &str) -> Self {
        match word {
            "playing" => Self::Playing,
            "paused" => Self::Paused,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }
}

/// Parse one all-players stream line into `(player, status)`.
pub fn parse_status_line(line: &str) -> Option<(String, PlaybackStatus)> {
    let (status, player) = line.split_once(SEP)?;
    Some((player.to_string(), PlaybackStatus::from_word(status)))
}

/// One track as reported by the metadata stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: String,
    pub art_url: Option<String>,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.artist {
            Some(artist) => write!(f, "{} - {}", artist, self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Parse one metadata stream line. Lines without all four fields are not
/// track updates.
pub fn parse_track_line(line: &str) -> Option<Track> {
    let fields: Vec<&str> = line.splitn(4, SEP).collect();
    let [artist, album, title, art_url] = fields[..] else {
        return None;
    };

    Some(Track {
        artist: optional_field(artist),
        album: optional_field(album),
        title: title.to_string(),
        art_url: optional_field(art_url),
    })
}

/// playerctl renders missing metadata as an empty string or a literal
/// `None` depending on version.
fn optional_field(value: &str) -> Option<String> {
    match value {
        "" | "None" => None,
        other => Some(other.to_string()),
    }
}

/// One-shot metadata read for a single player. `None` when the player
/// is gone or reports no track.
pub async fn current_track(player: &str) -> Result<Option<Track>, BoxError> {
    let raw = capture(&format!(
        "playerctl --player={player} metadata -f {}",
        track_format()
    ))
    .await?;
    Ok(raw.lines().next().and_then(parse_track_line))
}

pub async fn play_pause() -> Result<(), BoxError> {
    run("playerctl play-pause").await?;
    Ok(())
}

pub async fn next_track() -> Result<(), BoxError> {
    run("playerctl next").await?;
    Ok(())
}

pub async fn previous_track() -> Result<(), BoxError> {
    run("playerctl previous").await?;
    Ok(())
}
