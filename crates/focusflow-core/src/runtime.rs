//! Async driver for [`FocusApp`].
//!
//! Maps the app's virtual clock onto real time with tokio. Commands and
//! timer firings are handled on one task, one at a time, so a command is
//! always applied against a clock that has caught up with real time and no
//! tick can interleave with it.

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::app::{FocusApp, Snapshot};
use crate::error::CoreError;
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::kv::KeyValueStore;

/// User commands accepted by [`drive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ConfigureMinutes(u32),
    Start,
    Pause,
    Reset,
    SetNickname(String),
    Shutdown,
}

/// What changed after one wake-up of the driver.
#[derive(Debug)]
pub struct Update {
    pub snapshot: Snapshot,
    pub events: Vec<Event>,
    /// Rejection of the command handled in this wake-up, if any.
    pub error: Option<CoreError>,
}

/// Run `app` until a [`Command::Shutdown`] arrives or the command channel
/// closes. `on_update` is called once at startup and after every wake-up.
pub async fn drive<S, N, F>(
    app: &mut FocusApp<S, N>,
    mut commands: mpsc::Receiver<Command>,
    mut on_update: F,
) where
    S: KeyValueStore,
    N: Notifier,
    F: FnMut(Update),
{
    let origin = Instant::now();
    let base = app.now();

    on_update(Update {
        snapshot: app.snapshot(),
        events: Vec::new(),
        error: None,
    });

    loop {
        let deadline = app
            .next_deadline()
            .map(|due| origin + due.saturating_sub(base));

        let received = match deadline {
            Some(at) => tokio::select! {
                cmd = commands.recv() => Some(cmd),
                _ = tokio::time::sleep_until(at) => None,
            },
            None => Some(commands.recv().await),
        };

        let mut events = app.advance_to(base + origin.elapsed());
        let mut error = None;
        let mut stop = false;

        match received.map(|cmd| cmd.and_then(|c| apply(app, c))) {
            None => {}
            Some(None) => stop = true,
            Some(Some(Ok(event))) => events.push(event),
            Some(Some(Err(e))) => {
                tracing::debug!(error = %e, "command rejected");
                error = Some(e);
            }
        }

        on_update(Update {
            snapshot: app.snapshot(),
            events,
            error,
        });

        if stop {
            tracing::debug!("driver stopped");
            break;
        }
    }
}

/// Apply one command. `None` means the driver should stop.
fn apply<S, N>(app: &mut FocusApp<S, N>, command: Command) -> Option<Result<Event, CoreError>>
where
    S: KeyValueStore,
    N: Notifier,
{
    tracing::debug!(?command, "applying command");
    Some(match command {
        Command::ConfigureMinutes(minutes) => app.configure_minutes(minutes),
        Command::Start => app.start(),
        Command::Pause => app.pause(),
        Command::Reset => app.reset(),
        Command::SetNickname(nickname) => app.set_nickname(nickname),
        Command::Shutdown => return None,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::AppSettings;
    use crate::notify::MemoryNotifier;
    use crate::storage::MemoryStore;
    use crate::timer::TimerStatus;

    #[tokio::test(start_paused = true)]
    async fn pause_and_reset_through_driver() {
        let mut app = FocusApp::open(
            AppSettings::default(),
            MemoryStore::new(),
            MemoryNotifier::new(),
        );
        let (tx, rx) = mpsc::channel(8);
        let mut updates = Vec::new();

        let script = async move {
            for command in [
                Command::SetNickname("bob".into()),
                Command::ConfigureMinutes(10),
                Command::Start,
            ] {
                tx.send(command).await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(3500)).await;
            tx.send(Command::Pause).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            tx.send(Command::Reset).await.unwrap();
            tx.send(Command::Shutdown).await.unwrap();
        };

        tokio::join!(drive(&mut app, rx, |u| updates.push(u)), script);

        let paused = updates
            .iter()
            .find(|u| u.snapshot.status == TimerStatus::Paused)
            .unwrap();
        assert_eq!(paused.snapshot.remaining_secs, 597);

        let last = updates.last().unwrap();
        assert_eq!(last.snapshot.status, TimerStatus::Idle);
        assert_eq!(last.snapshot.remaining_secs, 600);
        assert!(updates.iter().all(|u| u.error.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn completes_and_holds_in_real_time() {
        let mut app = FocusApp::open(
            AppSettings::default(),
            MemoryStore::new(),
            MemoryNotifier::new(),
        );
        app.set_nickname("alice").unwrap();
        app.configure_minutes(1).unwrap();

        let (tx, rx) = mpsc::channel(8);
        let mut completions = 0;
        let mut final_status = None;

        let script = async move {
            tx.send(Command::Start).await.unwrap();
            tokio::time::sleep(Duration::from_secs(65)).await;
            drop(tx);
        };

        tokio::join!(
            drive(&mut app, rx, |u| {
                completions += u.events.iter().filter(|e| e.is_completion()).count();
                final_status = Some(u.snapshot.status);
            }),
            script
        );

        assert_eq!(completions, 1);
        assert_eq!(final_status, Some(TimerStatus::Idle));
        assert_eq!(app.records().records().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_command_is_reported() {
        let mut app = FocusApp::open(
            AppSettings::default(),
            MemoryStore::new(),
            MemoryNotifier::new(),
        );
        let (tx, rx) = mpsc::channel(8);
        tx.send(Command::Start).await.unwrap();
        tx.send(Command::Shutdown).await.unwrap();

        let mut errors = Vec::new();
        drive(&mut app, rx, |u| errors.extend(u.error)).await;

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            CoreError::Timer(crate::error::TimerError::IdentityRequired)
        ));
        assert_eq!(app.notifier().titles(), ["Nickname Required"]);
    }
}
