use std::pin::Pin;

use tokio_stream::{wrappers::ReceiverStream, Stream};

use crate::{
    bridge::{FatalRx, NotificationRx},
    errors::Error,
    events::Notification,
    handle::WatcherHandle,
};

/// Notifications from a watcher as an async [`Stream`].
///
/// The stream ends once the loop stops, after which
/// [`take_error`][Self::take_error] tells whether it failed. Dropping it stops
/// the loop.
pub struct NotificationStream<H> {
    inner: ReceiverStream<Notification>,
    fatal: FatalRx,
    handle: WatcherHandle<H>,
}

impl<H> NotificationStream<H> {
    pub(crate) fn new(handle: WatcherHandle<H>, recv: NotificationRx, fatal: FatalRx) -> Self {
        Self {
            inner: ReceiverStream::new(recv),
            fatal,
            handle,
        }
    }

    /// Take the error which stopped the loop, if it stopped because of one.
    pub fn take_error(&mut self) -> Option<Error> {
        self.fatal.try_recv().ok()
    }

    /// Handle for adding and removing pins while the stream is consumed.
    pub fn handle(&self) -> &WatcherHandle<H> {
        &self.handle
    }
}

impl<H> Stream for NotificationStream<H> {
    type Item = Notification;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<H> Drop for NotificationStream<H> {
    fn drop(&mut self) {
        self.handle.shared.try_send_stop();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nix::errno::Errno;
    use tokio_stream::StreamExt;

    use crate::{
        builder::WatcherBuilder,
        errors::Error,
        events::{Pin, Value},
        handle::Watcher,
        testing::{FakeLine, FakeMux, FakePin},
    };

    fn watcher(mux: &FakeMux) -> Watcher<FakePin> {
        WatcherBuilder::new()
            .with_multiplexer(mux.clone())
            .with_wait_timeout(Duration::from_millis(5))
            .with_idle_interval(Duration::from_millis(5))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn next_receives_asynchronously() {
        let mux = FakeMux::new();
        let watcher = watcher(&mux);
        let handle = watcher.handle();

        let line = FakeLine::new(12);
        line.set(Value::Active);

        let attached = line.handle();
        tokio::task::spawn_blocking(move || handle.attach(Pin(3), attached))
            .await
            .unwrap()
            .unwrap();

        mux.ready([12]);

        let notification = watcher.next().await.unwrap();
        assert_eq!(notification.pin, Pin(3));
        assert_eq!(notification.value, Value::Active);
    }

    #[tokio::test]
    async fn stream_ends_when_loop_stops() {
        let mux = FakeMux::new();
        let mut stream = watcher(&mux).into_stream();
        let handle = stream.handle().clone();

        let line = FakeLine::new(30);
        let attached = line.handle();

        tokio::task::spawn_blocking(move || {
            handle.attach(Pin(21), attached).unwrap();
            handle
        })
        .await
        .unwrap();

        let waiting = mux.clone();
        tokio::task::spawn_blocking(move || waiting.wait_until_watching(1))
            .await
            .unwrap();

        line.set(Value::Active);
        mux.ready([30]);

        let first = stream.next().await.unwrap();
        assert_eq!((first.pin, first.value), (Pin(21), Value::Active));

        let handle = stream.handle().clone();
        tokio::task::spawn_blocking(move || handle.close())
            .await
            .unwrap();

        assert_eq!(stream.next().await, None);
        assert!(line.is_closed());
    }

    #[tokio::test]
    async fn stream_keeps_the_error_that_stopped_the_loop() {
        let mux = FakeMux::new();
        let mut stream = watcher(&mux).into_stream();
        let handle = stream.handle().clone();

        let line = FakeLine::new(8);
        let attached = line.handle();

        tokio::task::spawn_blocking(move || handle.attach(Pin(2), attached))
            .await
            .unwrap()
            .unwrap();

        let waiting = mux.clone();
        tokio::task::spawn_blocking(move || waiting.wait_until_watching(1))
            .await
            .unwrap();

        mux.fail(Errno::EBADF);

        assert_eq!(stream.next().await, None);
        assert!(matches!(
            stream.take_error(),
            Some(Error::Multiplex(Errno::EBADF))
        ));
        assert!(stream.take_error().is_none());
        assert!(line.is_closed());
    }

    #[tokio::test]
    async fn pins_are_managed_without_blocking_the_runtime() {
        let mux = FakeMux::new();
        let mut stream = watcher(&mux).into_stream();
        let handle = stream.handle().clone();

        let kept = FakeLine::new(14);
        let removed = FakeLine::new(15);
        handle.attach_async(Pin(6), kept.handle()).await.unwrap();
        handle.attach_async(Pin(7), removed.handle()).await.unwrap();
        handle.remove_pin_async(Pin(7)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            while !removed.is_closed() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();

        kept.set(Value::Active);
        mux.ready([14]);

        let first = stream.next().await.unwrap();
        assert_eq!((first.pin, first.value), (Pin(6), Value::Active));

        assert!(handle.close_async().await);
        assert_eq!(stream.next().await, None);
        assert!(stream.take_error().is_none());
        assert!(kept.is_closed());
    }
}
