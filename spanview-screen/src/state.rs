use tokio::sync::watch;

/// Single observable field of the screen state.
///
/// Writers go through [`Observable::set`] or [`Observable::update`]; readers
/// either take a snapshot or subscribe and are woken on every real change.
#[derive(Debug)]
pub struct Observable<T> {
    sender: watch::Sender<T>,
}

impl<T> Observable<T>
where
    T: Clone + PartialEq,
{
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self { sender }
    }

    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.sender.borrow())
    }

    /// Stores `value`, notifying subscribers only if it differs from the current one.
    pub fn set(&self, value: T) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }

    /// Mutates in place; `modify` reports whether anything changed.
    pub fn update(&self, modify: impl FnOnce(&mut T) -> bool) -> bool {
        self.sender.send_if_modified(modify)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + PartialEq + Default,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
