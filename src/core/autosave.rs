//! Periodic autosave driver.
//!
//! The timer owns nothing but a tokio task. Each tick calls back into the
//! adapter, which decides what saving means. Dropping the timer stops it.

use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

pub struct AutoSaveTimer {
    handle: JoinHandle<()>,
}

impl AutoSaveTimer {
    /// Call `tick` every `interval`, starting one interval from now.
    /// The timer stops by itself once `tick` returns false.
    pub fn start<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !tick() {
                    debug!("Autosave receiver gone, stopping timer");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for AutoSaveTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
