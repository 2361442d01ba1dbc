//! Media player bar segment.
//!
//! Follows every MPRIS player's status through one playerctl stream and
//! shows the reporting player's track. Clicks control playback. When
//! playerctl itself exits the applet completes and the bar supervisor
//! brings it back.

use capy_applet::{Applet, BoxError, Trigger};
use capybar::sources::media::{self, PlaybackStatus};
use capybar::ui::theme;
use capybar::util;

const NAME: &str = "capybar-media";

async fn render(player: &str, status: PlaybackStatus) -> Result<String, BoxError> {
    let set = theme::current();
    let icon = match status {
        PlaybackStatus::Playing => set.playing,
        PlaybackStatus::Paused => set.paused,
        PlaybackStatus::Stopped => set.stopped,
        PlaybackStatus::Unknown => set.unknown,
    };

    Ok(match media::current_track(player).await? {
        Some(track) => format!("{icon}{track}"),
        None => icon.to_string(),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    env_logger::init();
    util::set_pidfile(NAME)?;

    let mut applet = Applet::new(NAME);
    applet.add_stream_updater(&media::status_stream_command(), |line| async move {
        if line.is_empty() {
            // The stream goes blank when the last player leaves; a lone
            // space blanks the segment.
            return Ok(Some(" ".to_string()));
        }
        match media::parse_status_line(&line) {
            Some((player, status)) => Ok(Some(render(&player, status).await?)),
            None => Ok(None),
        }
    })?;
    applet.on_trigger(Trigger::Primary, || async { media::play_pause().await });
    applet.on_trigger(Trigger::Secondary, || async { media::next_track().await });
    applet.run().await
}
