use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

use crate::shutdown::ShutdownReceiver;

use super::super::rate::Permits;

/// Fixed supply of request tickets shared by all workers.
#[derive(Debug)]
pub(in crate::http) struct TicketSupply {
    limit: u64,
    taken: AtomicU64,
}

impl TicketSupply {
    pub(in crate::http) const fn new(limit: u64) -> Self {
        Self {
            limit,
            taken: AtomicU64::new(0),
        }
    }

    /// Takes one ticket. `false` once the supply is exhausted.
    pub(in crate::http) fn try_take(&self) -> bool {
        loop {
            let current = self.taken.load(Ordering::Relaxed);
            if current >= self.limit {
                return false;
            }
            let Some(next) = current.checked_add(1) else {
                return false;
            };
            if self
                .taken
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    #[cfg(test)]
    pub(in crate::http) fn taken(&self) -> u64 {
        self.taken.load(Ordering::Relaxed)
    }
}

/// Decides whether a worker may issue another request.
#[derive(Debug, Clone)]
pub(in crate::http) enum WorkGate {
    Tickets(Arc<TicketSupply>),
    Deadline(Instant),
    Permits(Arc<Permits>),
}

impl WorkGate {
    /// Every gate refuses work once the shutdown signal has fired.
    pub(in crate::http) async fn admit(&self, shutdown: &mut ShutdownReceiver) -> bool {
        if shutdown.is_triggered() {
            return false;
        }
        match self {
            WorkGate::Tickets(supply) => supply.try_take(),
            WorkGate::Deadline(deadline) => Instant::now() < *deadline,
            WorkGate::Permits(permits) => permits.acquire(shutdown).await,
        }
    }
}
