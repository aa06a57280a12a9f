use std::sync::{Mutex, PoisonError};

/// Sink for change notifications. The consuming shell implements this to
/// re-render after each committed mutation; failed attempts only surface
/// through the returned error, never through a notification.
pub trait UpdateSender: Send + Sync {
    fn send_update(&self);
}

type Listener = Box<dyn Fn() + Send + Sync>;

/// Listener list for consumers without an event system of their own.
/// Listeners are invoked synchronously, in subscription order.
#[derive(Default)]
pub struct ListenerHub {
    listeners: Mutex<Vec<Listener>>,
}

impl ListenerHub {
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }
}

impl UpdateSender for ListenerHub {
    fn send_update(&self) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn test_listeners_run_in_order() {
        let hub = ListenerHub::default();
        let count = Arc::new(AtomicUsize::new(0));

        let count1 = count.clone();
        hub.subscribe(move || {
            count1.fetch_add(1, Ordering::SeqCst);
        });
        let count2 = count.clone();
        hub.subscribe(move || {
            count2.fetch_add(2, Ordering::SeqCst);
        });

        hub.send_update();
        assert_eq!(count.load(Ordering::SeqCst), 3);

        hub.send_update();
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }
}
