use crate::domain::pledge::Pledge;
use crate::domain::ports::Notifier;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SuccessfulPledge { pledge_id: u64, user_id: u64 },
    FailedCard { pledge_id: u64, user_id: u64 },
}

/// Queues notifications for a background worker and returns immediately.
#[derive(Clone)]
pub struct ChannelMailer {
    outbox: UnboundedSender<Notification>,
}

impl ChannelMailer {
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (outbox, inbox) = unbounded_channel();
        (Self { outbox }, inbox)
    }

    /// Mailer whose deliveries are logged by a spawned task.
    ///
    /// The task ends once every mailer clone is dropped and yields how many
    /// notifications it handled.
    pub fn spawn_logging() -> (Self, JoinHandle<usize>) {
        let (mailer, mut inbox) = Self::channel();
        let worker = tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(notification) = inbox.recv().await {
                match notification {
                    Notification::SuccessfulPledge { pledge_id, user_id } => {
                        info!(pledge_id, user_id, "sending successful pledge email")
                    }
                    Notification::FailedCard { pledge_id, user_id } => {
                        info!(pledge_id, user_id, "sending failed card email")
                    }
                }
                delivered += 1;
            }
            delivered
        });
        (mailer, worker)
    }

    fn enqueue(&self, notification: Notification) {
        if let Err(err) = self.outbox.send(notification) {
            warn!(notification = ?err.0, "mail worker is gone, dropping notification");
        }
    }
}

impl Notifier for ChannelMailer {
    fn successful_pledge(&self, pledge: &Pledge) {
        self.enqueue(Notification::SuccessfulPledge {
            pledge_id: pledge.id,
            user_id: pledge.user_id,
        });
    }

    fn failed_card(&self, pledge: &Pledge) {
        self.enqueue(Notification::FailedCard {
            pledge_id: pledge.id,
            user_id: pledge.user_id,
        });
    }
}
