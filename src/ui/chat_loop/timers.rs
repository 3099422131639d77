//! Periodic tasks that drive a reveal.
//!
//! Each task only dispatches actions tagged with its reveal id and exits when
//! its cancellation token fires or the action channel closes.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::core::app::{AppAction, AppActionContext, AppActionDispatcher};
use crate::core::reveal::{REVEAL_TICK, SCROLL_KEEPALIVE};

/// Start the reveal tick and the scroll keep-alive for one reveal.
pub fn spawn_reveal_timers(
    dispatcher: &AppActionDispatcher,
    reveal_id: u64,
    cancel_token: CancellationToken,
) -> [JoinHandle<()>; 2] {
    debug!(reveal_id, "Starting reveal timers");
    [
        spawn_periodic(
            dispatcher.clone(),
            REVEAL_TICK,
            cancel_token.clone(),
            move || AppAction::RevealTick { reveal_id },
        ),
        spawn_periodic(
            dispatcher.clone(),
            SCROLL_KEEPALIVE,
            cancel_token,
            move || AppAction::ScrollKeepAlive { reveal_id },
        ),
    ]
}

fn spawn_periodic<F>(
    dispatcher: AppActionDispatcher,
    period: Duration,
    cancel_token: CancellationToken,
    make_action: F,
) -> JoinHandle<()>
where
    F: Fn() -> AppAction + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = interval.tick() => {
                    if !dispatcher.dispatch(make_action(), AppActionContext::default()) {
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app::AppActionEnvelope;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>) -> (usize, usize) {
        let (mut ticks, mut keepalives) = (0, 0);
        while let Ok(envelope) = rx.try_recv() {
            match envelope.action {
                AppAction::RevealTick { reveal_id: 7 } => ticks += 1,
                AppAction::ScrollKeepAlive { reveal_id: 7 } => keepalives += 1,
                other => panic!("unexpected action {other:?}"),
            }
        }
        (ticks, keepalives)
    }

    #[tokio::test]
    async fn timers_tick_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(tx);
        let token = CancellationToken::new();

        let handles = spawn_reveal_timers(&dispatcher, 7, token.clone());
        tokio::time::sleep(Duration::from_millis(350)).await;
        token.cancel();
        for handle in handles {
            handle.await.expect("timer task");
        }

        let (ticks, keepalives) = drain(&mut rx);
        assert!(ticks >= 2, "expected several reveal ticks, got {ticks}");
        assert!(keepalives >= 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(drain(&mut rx), (0, 0));
    }

    #[tokio::test]
    async fn timers_stop_when_channel_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = AppActionDispatcher::new(tx);
        drop(rx);

        let [tick, keepalive] = spawn_reveal_timers(&dispatcher, 7, CancellationToken::new());
        tick.await.expect("tick task");
        tokio::time::timeout(Duration::from_secs(2), keepalive)
            .await
            .expect("keep-alive exits")
            .expect("keep-alive task");
    }
}
