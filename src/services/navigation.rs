use std::time::Duration;
use tokio::sync::mpsc;

/// Destinations the flow can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Contest(i64),
}

/// Navigation port. The flow only ever schedules; actual routing belongs to
/// the host application.
pub trait Navigator {
    fn schedule(&self, route: Route, delay: Duration);
}

/// Delivers scheduled routes on a channel after the requested delay.
#[derive(Clone)]
pub struct TokioNavigator {
    tx: mpsc::UnboundedSender<Route>,
}

impl TokioNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Route>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for TokioNavigator {
    fn schedule(&self, route: Route, delay: Duration) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the app already navigated away.
            if tx.send(route).is_err() {
                log::debug!("navigation target dropped, discarding {route:?}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delivers_route_after_delay() {
        let (navigator, mut rx) = TokioNavigator::new();
        navigator.schedule(Route::Contest(5), Duration::from_secs(3));

        // Paused clock auto-advances across the sleep.
        let route = rx.recv().await.unwrap();
        assert_eq!(route, Route::Contest(5));
    }
}
