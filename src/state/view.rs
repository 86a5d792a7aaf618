//! Which screen the dashboard is on: the login boundary or the room view

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Login,
    Room,
}

/// Where a terminally failed session sends the user
pub trait LoginBoundary: Send + Sync {
    /// Navigate to the login view; no-op when already there
    fn redirect_to_login(&self);
}

#[derive(Debug)]
pub struct ViewRouter {
    view: watch::Sender<View>,
}

impl ViewRouter {
    pub fn new(initial: View) -> Self {
        let (view, _) = watch::channel(initial);
        Self { view }
    }

    pub fn current(&self) -> View {
        *self.view.borrow()
    }

    pub fn enter_room(&self) {
        if self.view.send_replace(View::Room) != View::Room {
            info!("Entering room view");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.view.subscribe()
    }
}

impl LoginBoundary for ViewRouter {
    fn redirect_to_login(&self) {
        if self.current() == View::Login {
            debug!("Already at login, not redirecting");
            return;
        }
        self.view.send_replace(View::Login);
        info!("Session ended, redirected to login");
    }
}
