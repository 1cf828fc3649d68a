use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;

/// Measures wall-clock time from first poll to completion.
#[pin_project]
pub(crate) struct Timed<F> {
    #[pin]
    inner: F,
    started: Option<Instant>,
}

impl<F> Timed<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            started: None,
        }
    }
}

impl<F: Future> Future for Timed<F> {
    type Output = (F::Output, Duration);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let started = *this.started.get_or_insert_with(Instant::now);
        match this.inner.poll(cx) {
            Poll::Ready(output) => Poll::Ready((output, started.elapsed())),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn measures_inner_duration() {
        let (value, elapsed) = Timed::new(async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            7
        })
        .await;
        assert_eq!(value, 7);
        assert_eq!(elapsed, Duration::from_millis(250));
    }
}
